use crate::config::SiteConfig;
use crate::content::excerpt;
use crate::content::markdown;
use crate::content::related;
use crate::content::{Content, Post, SiteContent};
use crate::media;
use crate::seo::{self, BlogPosting, SeoMeta};
use serde::Serialize;
use serde_json::{Value, json};
use std::path::Path;

/// 交给外部页面模板的数据文档
#[derive(Debug, Serialize)]
pub struct PageData {
    pub url: String,
    pub kind: PageKind,
    pub context: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Home,
    Post,
    BlogIndex,
    MomentsIndex,
    EventsIndex,
}

/// 首页展示的最新文章数
const HOME_RECENT_POSTS: usize = 3;

/// 根据已加载的内容生成所有页面数据
pub fn generate_pages(content: &SiteContent, config: &SiteConfig, assets_dir: &Path) -> Vec<PageData> {
    let posts = content.posts.items();
    let mut pages = Vec::with_capacity(posts.len() + 4);

    pages.push(home_page(content, config));

    // 文章页；集合按日期降序，prev 为更早的一篇
    for (i, post) in posts.iter().enumerate() {
        let prev = posts.get(i + 1).map(post_summary);
        let next = i.checked_sub(1).and_then(|j| posts.get(j)).map(post_summary);
        pages.push(post_page(post, posts, prev, next, config, assets_dir));
    }

    pages.push(PageData {
        url: "/blog".into(),
        kind: PageKind::BlogIndex,
        context: json!({
            "posts": posts.iter().map(post_summary).collect::<Vec<_>>(),
            "seo": seo::meta_tags(&index_meta(config, "Blog", "/blog")),
        }),
    });

    pages.push(PageData {
        url: "/moments".into(),
        kind: PageKind::MomentsIndex,
        context: json!({
            "moments": content.moments.items(),
            "seo": seo::meta_tags(&index_meta(config, "Moments", "/moments")),
        }),
    });

    pages.push(PageData {
        url: "/events".into(),
        kind: PageKind::EventsIndex,
        context: json!({
            "events": content.events.items().iter().map(|event| json!({
                "event": event,
                "description_html": event.record().html(),
                "latest_date": event.sort_date(),
            })).collect::<Vec<_>>(),
            "seo": seo::meta_tags(&index_meta(config, "Events", "/events")),
        }),
    });

    pages
}

fn home_page(content: &SiteContent, config: &SiteConfig) -> PageData {
    let meta = SeoMeta {
        title: config.site.title.clone(),
        description: config.site.description.clone(),
        canonical: Some(config.base_url().to_string()),
        og_image: Some(seo::absolute_url(config.base_url(), &config.site.default_image)),
        ..Default::default()
    };

    PageData {
        url: "/".into(),
        kind: PageKind::Home,
        context: json!({
            "recent_posts": content
                .posts
                .items()
                .iter()
                .take(HOME_RECENT_POSTS)
                .map(post_summary)
                .collect::<Vec<_>>(),
            "seo": seo::meta_tags(&meta),
            "json_ld": seo::organization_json_ld(config),
        }),
    }
}

fn post_page(
    post: &Post,
    posts: &[Post],
    prev: Option<Value>,
    next: Option<Value>,
    config: &SiteConfig,
    assets_dir: &Path,
) -> PageData {
    let record = &post.record;
    let base = config.base_url();
    let url = format!("/blog/{}", record.slug);
    let canonical = format!("{base}{url}");

    let description = if record.description.is_empty() {
        excerpt::excerpt(record.html(), excerpt::DESCRIPTION_CHARS)
    } else {
        record.description.clone()
    };
    let cover = record
        .cover
        .as_deref()
        .and_then(|c| media::resolve_local_media(c, assets_dir, base));
    let image = cover.as_ref().map(|m| m.absolute_url.clone());

    let meta = SeoMeta {
        title: format!("{} | {}", record.title, config.site.title),
        description: description.clone(),
        canonical: Some(canonical.clone()),
        og_image: Some(
            image
                .clone()
                .unwrap_or_else(|| seo::absolute_url(base, &config.site.default_image)),
        ),
        og_type: Some("article".into()),
        noindex: record.publish_status.is_draft(),
    };

    let date = record.date.format("%Y-%m-%d").to_string();
    let json_ld = seo::blog_posting_json_ld(
        &BlogPosting {
            title: &record.title,
            description: &description,
            date_published: &date,
            date_modified: &date,
            author: &record.author,
            url: &canonical,
            image: image.as_deref(),
        },
        config,
    );

    let related: Vec<Value> = related::related_posts(post, posts, config.content.related_count)
        .into_iter()
        .map(post_summary)
        .collect();

    PageData {
        url,
        kind: PageKind::Post,
        context: json!({
            "post": post,
            "cover": cover.map(|m| json!({
                "url": m.url_path,
                "absolute_url": m.absolute_url,
                "mime_type": m.mime_type,
            })),
            "related": related,
            "prev_post": prev,
            "next_post": next,
            "seo": seo::meta_tags(&meta),
            "json_ld": json_ld,
            "word_count": markdown::count_words(record.raw_body()),
            "has_mermaid": markdown::has_mermaid_diagrams(record.html()),
            "has_language_tabs": markdown::has_language_tabs(record.html()),
        }),
    }
}

fn index_meta(config: &SiteConfig, section: &str, path: &str) -> SeoMeta {
    SeoMeta {
        title: format!("{section} | {}", config.site.title),
        description: config.site.description.clone(),
        canonical: Some(format!("{}{path}", config.base_url())),
        ..Default::default()
    }
}

/// 列表和相邻导航用的文章摘要，不含正文
fn post_summary(post: &Post) -> Value {
    let record = &post.record;
    json!({
        "slug": record.slug,
        "title": record.title,
        "description": record.description,
        "date": record.date,
        "author": record.author,
        "tags": record.tags,
        "cover": record.cover,
        "reading_time": post.reading_time,
        "url": format!("/blog/{}", record.slug),
    })
}
