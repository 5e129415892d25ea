use crate::config::SiteConfig;
use crate::content::excerpt;
use crate::content::frontmatter::{self, FrontMatter};
use crate::content::markdown::{self, MarkdownRenderer, RenderOptions};
use crate::content::{Collection, ContentRecord, EventItem, Moment, Post, SiteContent};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// 加载阶段的共享参数，解析期间只读
pub struct LoadContext<'a> {
    pub project_root: &'a Path,
    pub config: &'a SiteConfig,
    pub renderer: &'a MarkdownRenderer,
    pub show_drafts: bool,
    /// 本次构建的处理日期，缺少日期的内容以此为准
    pub today: NaiveDate,
}

/// 读取并解析完的单个源文件
struct Source {
    filename: String,
    slug: String,
    front_matter: FrontMatter,
    body: String,
}

/// 加载文章、动态和活动三个集合
pub fn load_content(ctx: &LoadContext<'_>) -> SiteContent {
    let content = &ctx.config.content;
    let posts = load_posts(&ctx.project_root.join(&content.blog_dir), ctx);
    let moments = load_moments(&ctx.project_root.join(&content.moments_dir), ctx);
    let events = load_events(&ctx.project_root.join(&content.events_dir), ctx);

    tracing::info!(
        "加载了 {} 篇文章，{} 条动态，{} 个活动",
        posts.len(),
        moments.len(),
        events.len()
    );

    SiteContent {
        posts,
        moments,
        events,
    }
}

pub fn load_posts(dir: &Path, ctx: &LoadContext<'_>) -> Collection<Post> {
    let posts = parse_all(dir, ctx, |source| {
        let html = ctx.renderer.render(&source.body);
        let reading_time = markdown::reading_time(markdown::count_words(&source.body));
        let date = resolve_date(&source, ctx.today);
        Post {
            record: build_record(source, ctx, date, html, String::new()),
            reading_time,
        }
    });
    Collection::assemble(posts, ctx.show_drafts)
}

pub fn load_moments(dir: &Path, ctx: &LoadContext<'_>) -> Collection<Moment> {
    let moments = parse_all(dir, ctx, |mut source| {
        let html = ctx.renderer.render_with(&source.body, RenderOptions::fragment());
        let date = resolve_date(&source, ctx.today);

        // 动态通常没有标题，取正文摘要
        if source.front_matter.title.is_none() {
            let title = excerpt::excerpt(&html, excerpt::TITLE_CHARS);
            source.front_matter.title = (!title.is_empty()).then_some(title);
        }
        let summary = excerpt::excerpt(&html, excerpt::DESCRIPTION_CHARS);

        Moment {
            record: build_record(source, ctx, date, html, summary),
        }
    });
    Collection::assemble(moments, ctx.show_drafts)
}

pub fn load_events(dir: &Path, ctx: &LoadContext<'_>) -> Collection<EventItem> {
    let events = parse_all(dir, ctx, |mut source| {
        let dates: Vec<NaiveDate> = source
            .front_matter
            .dates
            .iter()
            .filter_map(|d| match frontmatter::parse_date(d) {
                Ok(date) => Some(date),
                Err(e) => {
                    tracing::warn!("{}：忽略无效的活动日期：{e}", source.filename);
                    None
                }
            })
            .collect();
        let date = dates.iter().max().copied().unwrap_or(ctx.today);

        // 描述取 front matter，缺省时取正文
        let description = source
            .front_matter
            .description
            .take()
            .unwrap_or_else(|| source.body.trim().to_string());
        let html = ctx.renderer.render_with(&description, RenderOptions::fragment());

        let image_alt = source
            .front_matter
            .image_alt
            .clone()
            .or_else(|| source.front_matter.title.clone())
            .unwrap_or_else(|| "Event image".to_string());
        let image_credit = source.front_matter.image_credit.clone();

        EventItem {
            record: build_record(source, ctx, date, html, description),
            dates,
            image_alt,
            image_credit,
        }
    });
    Collection::assemble(events, ctx.show_drafts)
}

/// 并行解析目录下的所有 Markdown 文件，结果保持文件名顺序
fn parse_all<T, F>(dir: &Path, ctx: &LoadContext<'_>, build: F) -> Vec<T>
where
    T: Send,
    F: Fn(Source) -> T + Sync,
{
    let files = list_markdown_files(dir);
    if ctx.config.build.parallel {
        files
            .par_iter()
            .filter_map(|path| read_source(path).map(&build))
            .collect()
    } else {
        files
            .iter()
            .filter_map(|path| read_source(path).map(&build))
            .collect()
    }
}

/// 列出目录下的 `.md` 文件，按文件名排序；目录不存在时为空
pub fn list_markdown_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("内容目录不可用 {}：{e}", dir.display());
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();
    files
}

/// 读取单个文件；读取失败时跳过，front matter 损坏时按无元数据处理
fn read_source(path: &Path) -> Option<Source> {
    let filename = path.file_name()?.to_string_lossy().into_owned();
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("跳过无法读取的文件 {}：{e}", path.display());
            return None;
        }
    };

    let (front_matter, body) = match frontmatter::parse_content(&raw) {
        Ok(parsed) => (FrontMatter::from_metadata(&parsed.metadata), parsed.body),
        Err(e) => {
            tracing::warn!("{filename}：{e}，按无元数据处理");
            (
                FrontMatter::default(),
                frontmatter::strip_front_matter(&raw).to_string(),
            )
        }
    };

    Some(Source {
        slug: frontmatter::slug_from_filename(&filename),
        filename,
        front_matter,
        body,
    })
}

/// 日期优先取 front matter，其次文件名前缀，最后是处理日期
fn resolve_date(source: &Source, today: NaiveDate) -> NaiveDate {
    if let Some(raw) = &source.front_matter.date {
        match frontmatter::parse_date(raw) {
            Ok(date) => return date,
            Err(e) => tracing::warn!("{}：{e}，改用文件名或当天日期", source.filename),
        }
    }
    frontmatter::date_from_filename(&source.filename).unwrap_or(today)
}

fn build_record(
    source: Source,
    ctx: &LoadContext<'_>,
    date: NaiveDate,
    html: String,
    fallback_description: String,
) -> ContentRecord {
    let fm = source.front_matter;
    let title = fm.title.unwrap_or_else(|| source.slug.clone());
    ContentRecord::new(
        source.slug,
        title,
        fm.description.unwrap_or(fallback_description),
        date,
        fm.author
            .unwrap_or_else(|| ctx.config.site.author.name.clone()),
        fm.tags,
        fm.cover,
        fm.publish_status,
        source.body,
        html,
    )
}
