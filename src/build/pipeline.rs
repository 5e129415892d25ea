use crate::build::stages;
use crate::build::stages::finalize::FeedContext;
use crate::build::stages::load::LoadContext;
use crate::build::{BuildParams, BuildStats};
use crate::config::SiteConfig;
use crate::content::markdown::MarkdownRenderer;
use anyhow::Result;
use chrono::NaiveDate;
use std::path::Path;

/// 构建管道上下文，聚合构建所需的全部参数
struct BuildContext<'a> {
    project_root: &'a Path,
    config: &'a SiteConfig,
    renderer: MarkdownRenderer,
    show_drafts: bool,
    today: NaiveDate,
}

/// 执行一次完整构建：加载、生成页面数据、写出页面数据、生成 feed 与 sitemap
pub fn execute(project_root: &Path, config: &SiteConfig, params: BuildParams) -> Result<BuildStats> {
    tracing::info!("开始构建...");
    let start = std::time::Instant::now();

    let show_drafts = config.show_drafts(params.mode, params.force_drafts);
    if show_drafts {
        tracing::info!("包含草稿");
    }

    let bctx = BuildContext {
        project_root,
        config,
        renderer: MarkdownRenderer::new(),
        show_drafts,
        today: params.today,
    };

    let stats = run_pipeline(&bctx)?;

    tracing::info!(
        "构建完成，耗时 {:.2}s（{} 篇文章，{} 条动态，{} 个活动，{} 个页面，{} 个产物）",
        start.elapsed().as_secs_f64(),
        stats.posts,
        stats.moments,
        stats.events,
        stats.pages,
        stats.artifacts,
    );
    Ok(stats)
}

fn run_pipeline(bctx: &BuildContext<'_>) -> Result<BuildStats> {
    let project_root = bctx.project_root;
    let config = bctx.config;
    let assets_dir = config.assets_dir(project_root);

    // 阶段 1: content.load
    let content = stages::load::load_content(&LoadContext {
        project_root,
        config,
        renderer: &bctx.renderer,
        show_drafts: bctx.show_drafts,
        today: bctx.today,
    });

    // 阶段 2: page.generate
    let pages = stages::generate::generate_pages(&content, config, &assets_dir);
    tracing::info!("生成了 {} 个页面", pages.len());

    // 阶段 3: page.render
    let data_dir = project_root.join(&config.build.data_dir);
    let rendered = stages::render::render_pages(&data_dir, &pages)?;

    // 阶段 4: build.finalize
    let output_dir = config.output_dir(project_root);
    let artifacts = stages::finalize::finalize(
        &output_dir,
        &FeedContext {
            config,
            assets_dir: &assets_dir,
            today: bctx.today,
        },
        &content,
    )?;

    Ok(BuildStats {
        posts: content.posts.len(),
        moments: content.moments.len(),
        events: content.events.len(),
        pages: rendered,
        artifacts: artifacts.len(),
    })
}

#[cfg(test)]
mod tests {
    use crate::build::{self, BuildParams, BuildStats};
    use crate::config::{Mode, SiteConfig};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project() -> TempDir {
        let root = TempDir::new().unwrap();
        let r = root.path();
        write(r, "content/blog/2024-01-15-hello.md", "---\ntitle: Hello\ntags: [rust, web]\ncover: /images/cover.png\n---\n# Hello\n\n## Intro\n\n> [!TIP] Try it\n> Works.\n\n```mermaid\ngraph TD; A-->B\n```\n\n![pic](/images/cover.png)\n");
        write(r, "content/blog/2024-02-01-second.md", "---\ntitle: Second\ntags: [rust]\n---\nSee www.example.org (c) 2024\n");
        write(r, "content/blog/2024-03-01-wip.md", "---\ntitle: WIP\npublish_status: draft\n---\nsecret draft\n");
        write(r, "content/moments/2024-04-01.md", "Short moment with a [link](/blog/hello).\n");
        write(r, "content/events/rustconf.md", "---\ntitle: RustConf\ndates: [2024-09-10, 2024-09-12]\n---\nTalks.\n");
        fs::create_dir_all(r.join("public/images")).unwrap();
        fs::write(r.join("public/images/cover.png"), [7u8; 16]).unwrap();
        root
    }

    fn params() -> BuildParams {
        BuildParams {
            mode: Mode::Production,
            force_drafts: false,
            today: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        }
    }

    /// 收集输出与页面数据目录下的所有文件内容
    fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
        let mut files = BTreeMap::new();
        for dir in ["public", ".folio/data"] {
            collect(root, &root.join(dir), &mut files);
        }
        files
    }

    fn collect(root: &Path, dir: &Path, files: &mut BTreeMap<String, Vec<u8>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                collect(root, &path, files);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
                files.insert(rel, fs::read(&path).unwrap());
            }
        }
    }

    #[test]
    fn full_build_produces_artifacts() {
        let root = project();
        let stats = build::run(root.path(), &SiteConfig::default(), params()).unwrap();
        assert_eq!(
            stats,
            BuildStats {
                posts: 2,
                moments: 1,
                events: 1,
                pages: 6,
                artifacts: 3,
            }
        );

        let rss = fs::read_to_string(root.path().join("public/rss.xml")).unwrap();
        assert!(!rss.contains("secret draft"));
        assert!(rss.contains("<enclosure url=\"https://example.com/images/cover.png\" length=\"16\" type=\"image/png\" />"));
        assert!(rss.contains("src=\"https://example.com/images/cover.png\""));
        assert!(rss.contains("<a href=\"http://www.example.org\">www.example.org</a>"));

        let sitemap = fs::read_to_string(root.path().join("public/sitemap.xml")).unwrap();
        assert_eq!(sitemap.matches("<url>").count(), 6 + 2);

        let moments = fs::read_to_string(root.path().join("public/moments-rss.xml")).unwrap();
        assert!(moments.contains("href=\"https://example.com/blog/hello\""));

        let page = fs::read_to_string(root.path().join(".folio/data/blog/hello/index.json")).unwrap();
        let page: serde_json::Value = serde_json::from_str(&page).unwrap();
        assert_eq!(page["context"]["has_mermaid"], true);
        assert_eq!(page["context"]["related"][0]["slug"], "second");
        let html = page["context"]["post"]["html"].as_str().unwrap();
        assert!(html.contains("admonition-tip"));
        assert!(html.contains("<h2 id=\"intro\">"));
    }

    #[test]
    fn drafts_are_included_on_request() {
        let root = project();
        let mut p = params();
        p.force_drafts = true;
        let stats = build::run(root.path(), &SiteConfig::default(), p).unwrap();
        assert_eq!(stats.posts, 3);
        let rss = fs::read_to_string(root.path().join("public/rss.xml")).unwrap();
        assert!(rss.contains("secret draft"));
    }

    #[test]
    fn repeated_builds_are_byte_identical() {
        let root = project();
        let config = SiteConfig::default();

        build::run(root.path(), &config, params()).unwrap();
        let first = snapshot(root.path());
        build::run(root.path(), &config, params()).unwrap();
        let second = snapshot(root.path());

        assert!(first.contains_key("public/rss.xml"));
        assert_eq!(first, second);
    }

    #[test]
    fn stale_page_data_is_removed() {
        let root = project();
        let config = SiteConfig::default();
        build::run(root.path(), &config, params()).unwrap();
        assert!(root.path().join(".folio/data/blog/second/index.json").exists());

        fs::remove_file(root.path().join("content/blog/2024-02-01-second.md")).unwrap();
        build::run(root.path(), &config, params()).unwrap();
        assert!(!root.path().join(".folio/data/blog/second/index.json").exists());
    }
}
