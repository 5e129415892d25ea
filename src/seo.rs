//! 页面头部元信息与 schema.org 结构化数据。

use crate::config::SiteConfig;
use serde_json::{Value, json};

#[derive(Debug, Clone, Default)]
pub struct SeoMeta {
    pub title: String,
    pub description: String,
    pub canonical: Option<String>,
    pub og_image: Option<String>,
    /// 缺省为 `website`
    pub og_type: Option<String>,
    pub noindex: bool,
}

/// 生成 `<head>` 内的 title、description、Open Graph 与 Twitter 标签
pub fn meta_tags(meta: &SeoMeta) -> String {
    let title = escape_attr(&meta.title);
    let description = escape_attr(&meta.description);
    let og_type = escape_attr(meta.og_type.as_deref().unwrap_or("website"));

    let mut tags = vec![
        format!("<title>{title}</title>"),
        format!("<meta name=\"description\" content=\"{description}\" />"),
        format!("<meta property=\"og:title\" content=\"{title}\" />"),
        format!("<meta property=\"og:description\" content=\"{description}\" />"),
        format!("<meta property=\"og:type\" content=\"{og_type}\" />"),
        "<meta name=\"twitter:card\" content=\"summary_large_image\" />".to_string(),
        format!("<meta name=\"twitter:title\" content=\"{title}\" />"),
        format!("<meta name=\"twitter:description\" content=\"{description}\" />"),
    ];

    if let Some(canonical) = &meta.canonical {
        let canonical = escape_attr(canonical);
        tags.push(format!("<link rel=\"canonical\" href=\"{canonical}\" />"));
        tags.push(format!("<meta property=\"og:url\" content=\"{canonical}\" />"));
    }

    if let Some(image) = &meta.og_image {
        let image = escape_attr(image);
        tags.push(format!("<meta property=\"og:image\" content=\"{image}\" />"));
        tags.push(format!("<meta name=\"twitter:image\" content=\"{image}\" />"));
    }

    if meta.noindex {
        tags.push("<meta name=\"robots\" content=\"noindex\" />".to_string());
    }

    tags.join("\n  ")
}

/// 文章的 BlogPosting 结构化数据
pub struct BlogPosting<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub date_published: &'a str,
    pub date_modified: &'a str,
    pub author: &'a str,
    pub url: &'a str,
    pub image: Option<&'a str>,
}

pub fn blog_posting_json_ld(post: &BlogPosting<'_>, site: &SiteConfig) -> String {
    let base = site.base_url();
    let image = post
        .image
        .map(str::to_string)
        .unwrap_or_else(|| absolute_url(base, &site.site.default_image));

    let data = json!({
        "@context": "https://schema.org",
        "@type": "BlogPosting",
        "headline": post.title,
        "description": post.description,
        "image": image,
        "datePublished": post.date_published,
        "dateModified": post.date_modified,
        "author": {
            "@type": "Person",
            "name": post.author,
            "url": base,
        },
        "publisher": {
            "@type": "Organization",
            "name": site.site.organization.name,
            "logo": {
                "@type": "ImageObject",
                "url": absolute_url(base, &site.site.organization.logo),
            },
        },
        "url": post.url,
    });
    script_tag(&data)
}

/// 站点所属组织的结构化数据
pub fn organization_json_ld(site: &SiteConfig) -> String {
    let org = &site.site.organization;
    let data = json!({
        "@context": "https://schema.org",
        "@type": "Organization",
        "name": org.name,
        "url": site.base_url(),
        "description": org.description,
        "sameAs": org.same_as,
    });
    script_tag(&data)
}

/// `<` 转义为 `<`，防止内容提前闭合 script 标签
fn script_tag(data: &Value) -> String {
    let json = data.to_string().replace('<', "\\u003c");
    format!("<script type=\"application/ld+json\">{json}</script>")
}

/// 站内路径拼接为绝对地址，已是完整地址时原样返回
pub fn absolute_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// 属性值转义，单引号使用数字实体
pub fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}
