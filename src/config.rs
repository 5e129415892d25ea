use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "folio.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub site: SiteInfo,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub sitemap: SitemapConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteInfo {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub author: AuthorInfo,
    #[serde(default)]
    pub organization: OrganizationInfo,
    /// 文章未设置封面时结构化数据使用的默认图片（站内路径）
    #[serde(default = "default_og_image")]
    pub default_image: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorInfo {
    #[serde(default = "default_author_name")]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationInfo {
    #[serde(default = "default_title")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_logo")]
    pub logo: String,
    #[serde(default)]
    pub same_as: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// 未设置时由运行模式决定（build 关闭，watch 开启）
    #[serde(default)]
    pub show_drafts: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    #[serde(default = "default_blog_dir")]
    pub blog_dir: String,
    #[serde(default = "default_moments_dir")]
    pub moments_dir: String,
    #[serde(default = "default_events_dir")]
    pub events_dir: String,
    /// 封面等本地媒体的根目录，路径解析不得越出此目录
    #[serde(default = "default_output_dir")]
    pub assets_dir: String,
    #[serde(default = "default_related_count")]
    pub related_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rss_file")]
    pub rss_file: String,
    #[serde(default = "default_moments_rss_file")]
    pub moments_file: String,
    #[serde(default = "default_true")]
    pub enclosures: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SitemapConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_static_routes")]
    pub static_routes: Vec<String>,
}

/// 运行模式：build 视为生产环境，watch 视为开发环境
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Production,
    Development,
}

impl SiteConfig {
    /// 读取项目根目录下的 folio.toml，文件不存在时使用默认配置
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("读取 {CONFIG_FILE} 失败：{e}"))?;
        let config: SiteConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("解析 {CONFIG_FILE} 失败：{e}"))?;
        Ok(config)
    }

    /// 应用环境变量覆盖：SITE_URL 与 SHOW_DRAFTS
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var("SITE_URL").ok(),
            std::env::var("SHOW_DRAFTS").ok(),
        );
    }

    pub fn apply_overrides(&mut self, site_url: Option<String>, show_drafts: Option<String>) {
        if let Some(url) = site_url.filter(|u| !u.trim().is_empty()) {
            self.site.url = url.trim().to_string();
        }
        if let Some(flag) = show_drafts {
            match flag.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => self.build.show_drafts = Some(true),
                "false" | "0" | "no" => self.build.show_drafts = Some(false),
                other => tracing::warn!("忽略无法识别的 SHOW_DRAFTS 取值：{other}"),
            }
        }
    }

    /// 草稿是否可见：命令行强制开启优先，其次显式配置，最后按运行模式
    pub fn show_drafts(&self, mode: Mode, force: bool) -> bool {
        force
            || self
                .build
                .show_drafts
                .unwrap_or(mode == Mode::Development)
    }

    /// 去掉末尾斜线的站点地址
    pub fn base_url(&self) -> &str {
        self.site.url.trim_end_matches('/')
    }

    pub fn output_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.build.output_dir)
    }

    pub fn assets_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.content.assets_dir)
    }
}

// 默认值函数
fn default_title() -> String { "My Blog".into() }
fn default_url() -> String { "https://example.com".into() }
fn default_language() -> String { "en-us".into() }
fn default_author_name() -> String { "Anonymous".into() }
fn default_og_image() -> String { "/og-image.png".into() }
fn default_logo() -> String { "/logo.png".into() }
fn default_output_dir() -> String { "public".into() }
fn default_data_dir() -> String { ".folio/data".into() }
fn default_log_level() -> String { "info".into() }
fn default_true() -> bool { true }
fn default_blog_dir() -> String { "content/blog".into() }
fn default_moments_dir() -> String { "content/moments".into() }
fn default_events_dir() -> String { "content/events".into() }
fn default_related_count() -> usize { crate::content::related::DEFAULT_LIMIT }
fn default_rss_file() -> String { "rss.xml".into() }
fn default_moments_rss_file() -> String { "moments-rss.xml".into() }
fn default_static_routes() -> Vec<String> {
    ["", "/blog", "/moments", "/events", "/about", "/contact"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            title: default_title(),
            description: String::new(),
            url: default_url(),
            language: default_language(),
            author: AuthorInfo::default(),
            organization: OrganizationInfo::default(),
            default_image: default_og_image(),
        }
    }
}

impl Default for AuthorInfo {
    fn default() -> Self {
        Self {
            name: default_author_name(),
            email: String::new(),
        }
    }
}

impl Default for OrganizationInfo {
    fn default() -> Self {
        Self {
            name: default_title(),
            description: String::new(),
            logo: default_logo(),
            same_as: Vec::new(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            parallel: true,
            show_drafts: None,
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            blog_dir: default_blog_dir(),
            moments_dir: default_moments_dir(),
            events_dir: default_events_dir(),
            assets_dir: default_output_dir(),
            related_count: default_related_count(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rss_file: default_rss_file(),
            moments_file: default_moments_rss_file(),
            enclosures: true,
        }
    }
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            static_routes: default_static_routes(),
        }
    }
}
