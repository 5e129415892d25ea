use crate::config::SiteConfig;
use crate::content::{Content, ContentRecord, Moment, Post, SiteContent};
use crate::media::{self, MediaInfo};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static FIRST_H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<h1[^>]*>.*?</h1>\s*").unwrap());
static ROOT_RELATIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\b(src|href)="/([^/])"#).unwrap());

const SITEMAP_FILE: &str = "sitemap.xml";

/// feed 与 sitemap 生成所需的只读参数
pub struct FeedContext<'a> {
    pub config: &'a SiteConfig,
    /// 封面等本地媒体的根目录
    pub assets_dir: &'a Path,
    pub today: NaiveDate,
}

/// 构建收尾：生成 sitemap.xml 与两份 RSS，返回写出的文件
pub fn finalize(output_dir: &Path, ctx: &FeedContext<'_>, content: &SiteContent) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("无法创建输出目录 {}", output_dir.display()))?;

    let config = ctx.config;
    let mut written = Vec::new();

    if config.sitemap.enabled {
        let path = output_dir.join(SITEMAP_FILE);
        write_artifact(&path, &sitemap_xml(ctx, content.posts.items()))?;
        tracing::info!("已生成 {SITEMAP_FILE}（{} 篇文章）", content.posts.len());
        written.push(path);
    }

    if config.feed.enabled {
        let path = output_dir.join(&config.feed.rss_file);
        write_artifact(&path, &rss_xml(ctx, content.posts.items()))?;
        tracing::info!("已生成 {}", config.feed.rss_file);
        written.push(path);

        let path = output_dir.join(&config.feed.moments_file);
        write_artifact(&path, &moments_rss_xml(ctx, content.moments.items()))?;
        tracing::info!("已生成 {}", config.feed.moments_file);
        written.push(path);
    }

    Ok(written)
}

/// 写出产物，去掉首尾空白
fn write_artifact(path: &Path, xml: &str) -> Result<()> {
    std::fs::write(path, xml.trim()).with_context(|| format!("写入 {} 失败", path.display()))
}

pub fn sitemap_xml(ctx: &FeedContext<'_>, posts: &[Post]) -> String {
    let base = ctx.config.base_url();
    let today = ctx.today.format("%Y-%m-%d").to_string();

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");

    for route in &ctx.config.sitemap.static_routes {
        let priority = if route.is_empty() { "1.0" } else { "0.8" };
        push_url(&mut xml, &format!("{base}{route}"), &today, priority);
    }

    for post in posts {
        let lastmod = post.record.date.format("%Y-%m-%d").to_string();
        push_url(&mut xml, &format!("{base}/blog/{}", post.record.slug), &lastmod, "0.7");
    }

    xml.push_str("</urlset>\n");
    xml
}

fn push_url(xml: &mut String, loc: &str, lastmod: &str, priority: &str) {
    xml.push_str(&format!(
        "  <url>\n    <loc>{}</loc>\n    <lastmod>{lastmod}</lastmod>\n    <priority>{priority}</priority>\n  </url>\n",
        xml_escape(loc)
    ));
}

/// 博客文章 RSS
pub fn rss_xml(ctx: &FeedContext<'_>, posts: &[Post]) -> String {
    let config = ctx.config;
    let base = config.base_url();
    let items: Vec<String> = posts
        .iter()
        .map(|post| {
            let url = format!("{base}/blog/{}", post.record.slug);
            feed_item(ctx, &post.record, &url)
        })
        .collect();

    channel(
        ctx,
        &config.site.title,
        &config.site.description,
        &config.feed.rss_file,
        &items,
    )
}

/// 动态 RSS，条目链接指向动态页上的锚点
pub fn moments_rss_xml(ctx: &FeedContext<'_>, moments: &[Moment]) -> String {
    let config = ctx.config;
    let base = config.base_url();
    let items: Vec<String> = moments
        .iter()
        .map(|moment| {
            let url = format!("{base}/moments#{}", moment.record().slug);
            feed_item(ctx, moment.record(), &url)
        })
        .collect();

    channel(
        ctx,
        &format!("{} - Moments", config.site.title),
        &config.site.description,
        &config.feed.moments_file,
        &items,
    )
}

fn channel(ctx: &FeedContext<'_>, title: &str, description: &str, self_file: &str, items: &[String]) -> String {
    let config = ctx.config;
    let base = config.base_url();

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n");
    xml.push_str(
        "<rss version=\"2.0\" xmlns:content=\"http://purl.org/rss/1.0/modules/content/\" xmlns:atom=\"http://www.w3.org/2005/Atom\" xmlns:media=\"http://search.yahoo.com/mrss/\">\n",
    );
    xml.push_str("  <channel>\n");
    xml.push_str(&format!("    <title>{}</title>\n", xml_escape(title)));
    xml.push_str(&format!("    <link>{}</link>\n", xml_escape(base)));
    xml.push_str(&format!("    <description>{}</description>\n", xml_escape(description)));
    xml.push_str(&format!("    <language>{}</language>\n", xml_escape(&config.site.language)));
    xml.push_str(&format!("    <lastBuildDate>{}</lastBuildDate>\n", rfc2822(ctx.today)));
    xml.push_str(&format!(
        "    <atom:link href=\"{}/{}\" rel=\"self\" type=\"application/rss+xml\" />\n",
        xml_escape(base),
        xml_escape(self_file.trim_start_matches('/'))
    ));
    for item in items {
        xml.push_str(item);
    }
    xml.push_str("  </channel>\n</rss>\n");
    xml
}

fn feed_item(ctx: &FeedContext<'_>, record: &ContentRecord, url: &str) -> String {
    let config = ctx.config;
    let base = config.base_url();

    let cover = if config.feed.enclosures {
        record
            .cover
            .as_deref()
            .and_then(|c| media::resolve_local_media(c, ctx.assets_dir, base))
    } else {
        None
    };

    let mut html = feed_html(record.html(), base);
    if let Some(media) = &cover {
        html = format!(
            "<p><img src=\"{}\" alt=\"{}\" /></p>{html}",
            xml_escape(&media.absolute_url),
            xml_escape(&record.title)
        );
    }

    let mut item = String::from("    <item>\n");
    item.push_str(&format!("      <title>{}</title>\n", xml_escape(&record.title)));
    item.push_str(&format!("      <link>{}</link>\n", xml_escape(url)));
    item.push_str(&format!("      <guid isPermaLink=\"true\">{}</guid>\n", xml_escape(url)));
    item.push_str(&format!("      <description>{}</description>\n", xml_escape(&record.description)));
    item.push_str(&format!("      <content:encoded>{}</content:encoded>\n", cdata(&html)));
    item.push_str(&format!("      <pubDate>{}</pubDate>\n", rfc2822(record.date)));
    item.push_str(&format!("      <author>{}</author>\n", xml_escape(&author_field(config, &record.author))));
    for tag in &record.tags {
        item.push_str(&format!("      <category>{}</category>\n", xml_escape(tag)));
    }
    if let Some(media) = &cover {
        item.push_str(&enclosure(media));
    }
    item.push_str("    </item>\n");
    item
}

fn enclosure(media: &MediaInfo) -> String {
    let url = xml_escape(&media.absolute_url);
    format!(
        "      <enclosure url=\"{url}\" length=\"{size}\" type=\"{mime}\" />\n      <media:content url=\"{url}\" fileSize=\"{size}\" type=\"{mime}\" medium=\"image\" />\n",
        size = media.file_size,
        mime = media.mime_type,
    )
}

/// RSS 作者字段：`EMAIL (NAME)`，未配置邮箱时只写名字
fn author_field(config: &SiteConfig, name: &str) -> String {
    let email = config.site.author.email.trim();
    if email.is_empty() {
        name.to_string()
    } else {
        format!("{email} ({name})")
    }
}

/// feed 正文：去掉首个 h1，站内根路径改写为绝对地址（`//` 开头的保持不变）
pub fn feed_html(html: &str, base_url: &str) -> String {
    let without_title = FIRST_H1_RE.replacen(html, 1, "");
    ROOT_RELATIVE_RE
        .replace_all(&without_title, |caps: &Captures| {
            format!("{}=\"{base_url}/{}", &caps[1], &caps[2])
        })
        .into_owned()
}

/// CDATA 包裹，内容中的 `]]>` 拆到两个区段
pub fn cdata(s: &str) -> String {
    format!("<![CDATA[{}]]>", s.replace("]]>", "]]]]><![CDATA[>"))
}

fn rfc2822(date: NaiveDate) -> String {
    date.format("%a, %d %b %Y 00:00:00 GMT").to_string()
}

pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::testing::{post, record};
    use crate::content::{Collection, PublishStatus};
    use std::fs;
    use tempfile::TempDir;

    fn config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.site.url = "https://blog.example/".into();
        config.site.title = "Blog & Co".into();
        config.site.author.email = "me@blog.example".into();
        config
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    #[test]
    fn sitemap_lists_static_routes_and_posts() {
        let config = config();
        let dir = TempDir::new().unwrap();
        let ctx = FeedContext { config: &config, assets_dir: dir.path(), today: today() };
        let posts = vec![post("second", "2024-02-01", &[]), post("first", "2024-01-01", &[])];

        let xml = sitemap_xml(&ctx, &posts);
        assert_eq!(xml.matches("<url>").count(), config.sitemap.static_routes.len() + 2);
        assert!(xml.contains("<loc>https://blog.example</loc>\n    <lastmod>2024-06-30</lastmod>\n    <priority>1.0</priority>"));
        assert!(xml.contains("<loc>https://blog.example/blog</loc>\n    <lastmod>2024-06-30</lastmod>\n    <priority>0.8</priority>"));
        assert!(xml.contains("<loc>https://blog.example/blog/second</loc>\n    <lastmod>2024-02-01</lastmod>\n    <priority>0.7</priority>"));
        assert_eq!(xml.matches("<priority>1.0</priority>").count(), 1);
    }

    #[test]
    fn feed_html_strips_title_and_absolutises_links() {
        let html = "<h1>Title</h1>\n<p><a href=\"/blog/x\">x</a> <img src=\"/img/a.png\" /> <a href=\"//cdn.example/y\">y</a> <a href=\"https://o.example/\">o</a></p>\n<h1>Second</h1>";
        let out = feed_html(html, "https://blog.example");
        assert!(out.starts_with("<p>"));
        assert!(out.contains("href=\"https://blog.example/blog/x\""));
        assert!(out.contains("src=\"https://blog.example/img/a.png\""));
        assert!(out.contains("href=\"//cdn.example/y\""));
        assert!(out.contains("href=\"https://o.example/\""));
        assert!(out.contains("<h1>Second</h1>"));
    }

    #[test]
    fn cdata_splits_terminator() {
        assert_eq!(cdata("a]]>b"), "<![CDATA[a]]]]><![CDATA[>b]]>");
    }

    #[test]
    fn rss_items_carry_metadata_and_enclosure() {
        let config = config();
        let assets = TempDir::new().unwrap();
        fs::create_dir_all(assets.path().join("images")).unwrap();
        fs::write(assets.path().join("images/cover.png"), [0u8; 42]).unwrap();
        let ctx = FeedContext { config: &config, assets_dir: assets.path(), today: today() };

        let mut with_cover = post("covered", "2024-01-15", &["rust", "a&b"]);
        with_cover.record.cover = Some("images/cover.png".into());
        with_cover.record.title = "Tom's post".into();
        let mut remote = post("remote", "2024-01-10", &[]);
        remote.record.cover = Some("https://evil.example/x.png".into());

        let xml = rss_xml(&ctx, &[with_cover, remote]);
        assert!(xml.contains("xmlns:media=\"http://search.yahoo.com/mrss/\""));
        assert!(xml.contains("<title>Blog &amp; Co</title>"));
        assert!(xml.contains("<lastBuildDate>Sun, 30 Jun 2024 00:00:00 GMT</lastBuildDate>"));
        assert!(xml.contains("<atom:link href=\"https://blog.example/rss.xml\" rel=\"self\""));
        assert!(xml.contains("<title>Tom&apos;s post</title>"));
        assert!(xml.contains("<guid isPermaLink=\"true\">https://blog.example/blog/covered</guid>"));
        assert!(xml.contains("<pubDate>Mon, 15 Jan 2024 00:00:00 GMT</pubDate>"));
        assert!(xml.contains("<author>me@blog.example (Tester)</author>"));
        assert!(xml.contains("<category>rust</category>"));
        assert!(xml.contains("<category>a&amp;b</category>"));
        assert!(xml.contains("<![CDATA[<p><img src=\"https://blog.example/images/cover.png\" alt=\"Tom&apos;s post\" /></p><p>covered</p>"));
        assert!(xml.contains("<enclosure url=\"https://blog.example/images/cover.png\" length=\"42\" type=\"image/png\" />"));
        assert!(xml.contains("<media:content url=\"https://blog.example/images/cover.png\" fileSize=\"42\" type=\"image/png\" medium=\"image\" />"));
        assert_eq!(xml.matches("<enclosure").count(), 1);
        assert!(!xml.contains("evil.example"));
    }

    #[test]
    fn moments_feed_links_to_anchor() {
        let config = config();
        let dir = TempDir::new().unwrap();
        let ctx = FeedContext { config: &config, assets_dir: dir.path(), today: today() };
        let moment = Moment { record: record("coffee", "2024-05-01", &[], PublishStatus::Unset) };

        let xml = moments_rss_xml(&ctx, &[moment]);
        assert!(xml.contains("<title>Blog &amp; Co - Moments</title>"));
        assert!(xml.contains("<link>https://blog.example/moments#coffee</link>"));
        assert!(xml.contains("<atom:link href=\"https://blog.example/moments-rss.xml\""));
    }

    #[test]
    fn finalize_writes_trimmed_artifacts_without_drafts() {
        let config = config();
        let root = TempDir::new().unwrap();
        let output = root.path().join("public");
        let ctx = FeedContext { config: &config, assets_dir: &output, today: today() };

        let mut draft = post("secret", "2024-03-01", &[]);
        draft.record.publish_status = PublishStatus::Draft;
        let content = SiteContent {
            posts: Collection::assemble(vec![draft, post("open", "2024-01-01", &[])], false),
            ..Default::default()
        };

        let written = finalize(&output, &ctx, &content).unwrap();
        assert_eq!(written.len(), 3);

        let sitemap = fs::read_to_string(output.join("sitemap.xml")).unwrap();
        let rss = fs::read_to_string(output.join("rss.xml")).unwrap();
        let moments = fs::read_to_string(output.join("moments-rss.xml")).unwrap();
        assert!(sitemap.ends_with("</urlset>"));
        assert!(rss.ends_with("</rss>"));
        assert!(!sitemap.contains("secret") && !rss.contains("secret"));
        assert!(rss.contains("/blog/open"));
        assert!(!moments.contains("<item>"));
    }

    #[test]
    fn disabled_outputs_are_skipped() {
        let mut config = config();
        config.feed.enabled = false;
        let root = TempDir::new().unwrap();
        let ctx = FeedContext { config: &config, assets_dir: root.path(), today: today() };
        let written = finalize(root.path(), &ctx, &SiteContent::default()).unwrap();
        assert_eq!(written, [root.path().join("sitemap.xml")]);
    }
}
