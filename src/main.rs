use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod build;
mod check;
mod config;
mod content;
mod init;
mod media;
mod seo;
mod watch;

#[derive(Parser)]
#[command(name = "folio", about = "Markdown 博客发布管线", version = long_version())]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 构建页面数据、sitemap 与 RSS
    Build {
        /// 项目根目录（默认当前目录）
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// 包含草稿
        #[arg(long)]
        drafts: bool,

        /// 覆盖配置中的站点地址
        #[arg(long)]
        base_url: Option<String>,
    },

    /// 监听内容变更并自动重建（开发模式，默认包含草稿）
    Watch {
        /// 项目根目录（默认当前目录）
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },

    /// 检查项目完整性
    Check {
        /// 项目根目录（默认当前目录）
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },

    /// 初始化项目骨架
    Init {
        /// 项目根目录（默认当前目录）
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // None 等同于 Build { root: ".", drafts: false, base_url: None }
    let command = cli.command.unwrap_or(Commands::Build {
        root: PathBuf::from("."),
        drafts: false,
        base_url: None,
    });

    // 使用配置中的日志级别作为默认值，RUST_LOG 优先
    let default_level = match &command {
        Commands::Build { root, .. }
        | Commands::Watch { root }
        | Commands::Check { root }
        | Commands::Init { root } => {
            config::SiteConfig::load(&root.canonicalize().unwrap_or_else(|_| root.clone()))
                .ok()
                .map(|c| c.build.log_level.clone())
        }
    };

    let default_level = default_level.as_deref().unwrap_or("info");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match command {
        Commands::Build {
            root,
            drafts,
            base_url,
        } => {
            let root = root.canonicalize()?;
            let mut site_config = config::SiteConfig::load(&root)?;
            site_config.apply_env();
            site_config.apply_overrides(base_url, None);

            let params = build::BuildParams::new(config::Mode::Production, drafts);
            let _stats = build::run(&root, &site_config, params)?;
        }
        Commands::Watch { root } => {
            let root = root.canonicalize()?;
            watch::run(&root, false)?;
        }
        Commands::Check { root } => {
            let root = root.canonicalize()?;
            let result = check::run(&root)?;

            for w in &result.warnings {
                tracing::warn!("{w}");
            }
            for e in &result.errors {
                tracing::error!("{e}");
            }

            if result.errors.is_empty() {
                tracing::info!("检查通过（{} 个警告）", result.warnings.len());
            } else {
                anyhow::bail!(
                    "检查未通过：{} 个错误，{} 个警告",
                    result.errors.len(),
                    result.warnings.len()
                );
            }
        }
        Commands::Init { root } => {
            std::fs::create_dir_all(&root)?;
            let root = root.canonicalize()?;
            if init::ensure_initialized(&root)? {
                tracing::info!("已初始化项目：{}", root.display());
            } else {
                tracing::info!("{} 已存在，仅补全缺失的目录", config::CONFIG_FILE);
            }
        }
    }

    Ok(())
}

const fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\ncommit:  ",
        env!("FOLIO_GIT_COMMIT"),
        "\ntarget:  ",
        env!("FOLIO_BUILD_TARGET"),
        "\nprofile: ",
        env!("FOLIO_BUILD_PROFILE"),
    )
}
