use regex::{Captures, Regex};
use std::sync::LazyLock;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<h([2-6])([^>]*)>(.*?)</h([2-6])>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static ID_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bid\s*="#).unwrap());
static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s_-]+").unwrap());

const LINK_ICON: &str = "<svg xmlns=\"http://www.w3.org/2000/svg\" fill=\"none\" viewBox=\"0 0 24 24\" stroke-width=\"1.5\" stroke=\"currentColor\" class=\"heading-anchor-icon\"><path stroke-linecap=\"round\" stroke-linejoin=\"round\" d=\"M13.19 8.688a4.5 4.5 0 011.242 7.244l-4.5 4.5a4.5 4.5 0 01-6.364-6.364l1.757-1.757m13.35-.622l1.757-1.757a4.5 4.5 0 00-6.364-6.364l-4.5 4.5a4.5 4.5 0 001.242 7.244\" /></svg>";

/// 为 h2–h6 添加 id 与锚点链接。
///
/// 同名标题不去重，后出现的标题会得到重复的 id。
pub fn add_heading_anchors(html: &str) -> String {
    HEADING_RE
        .replace_all(html, |caps: &Captures| {
            let level = &caps[1];
            let attrs = &caps[2];
            let content = &caps[3];
            if level != &caps[4] || ID_ATTR_RE.is_match(attrs) {
                return caps[0].to_string();
            }

            let slug = slugify(&heading_text(content));
            format!(
                "<h{level} id=\"{slug}\"{attrs}>{content}<a href=\"#{slug}\" class=\"heading-anchor\" aria-label=\"Link to this section\">{LINK_ICON}</a></h{level}>"
            )
        })
        .into_owned()
}

/// 去掉标签并还原常见实体，得到标题的纯文本
fn heading_text(content: &str) -> String {
    TAG_RE
        .replace_all(content, "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// 标题文本转锚点 slug：小写、去除非单词字符、空白与下划线折叠为连字符
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let cleaned = NON_WORD_RE.replace_all(lowered.trim(), "");
    let collapsed = SEPARATOR_RE.replace_all(&cleaned, "-");
    collapsed.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_rules() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rust & Safety  "), "rust-safety");
        assert_eq!(slugify("snake_case -- style"), "snake-case-style");
        assert_eq!(slugify("-Leading and trailing-"), "leading-and-trailing");
        assert_eq!(slugify("C++ Programming"), "c-programming");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn slugify_keeps_unicode_words() {
        assert_eq!(slugify("Café Crème"), "café-crème");
        assert_eq!(slugify("中文 标题"), "中文-标题");
    }

    #[test]
    fn adds_id_and_anchor() {
        let html = add_heading_anchors("<h2>Hello, World!</h2>\n");
        assert!(html.starts_with("<h2 id=\"hello-world\">Hello, World!<a href=\"#hello-world\" class=\"heading-anchor\""));
        assert!(html.contains("aria-label=\"Link to this section\""));
        assert!(html.trim_end().ends_with("</a></h2>"));
    }

    #[test]
    fn h1_is_left_alone() {
        let html = "<h1>Title</h1>\n";
        assert_eq!(add_heading_anchors(html), html);
    }

    #[test]
    fn inline_markup_is_stripped_for_slug() {
        let html = add_heading_anchors("<h3>Using <code>Vec&lt;T&gt;</code> &amp; friends</h3>");
        assert!(html.contains("id=\"using-vect-friends\""));
        assert!(html.contains("<code>Vec&lt;T&gt;</code>"));
    }

    #[test]
    fn existing_attributes_are_kept() {
        let html = add_heading_anchors("<h4 class=\"x\">Part</h4>");
        assert!(html.starts_with("<h4 id=\"part\" class=\"x\">Part"));

        let with_id = "<h2 id=\"custom\">Part</h2>";
        assert_eq!(add_heading_anchors(with_id), with_id);
    }

    #[test]
    fn duplicate_headings_share_an_id() {
        let html = add_heading_anchors("<h2>Setup</h2>\n<h2>Setup</h2>\n");
        assert_eq!(html.matches("id=\"setup\"").count(), 2);
    }

    #[test]
    fn renderer_output_gets_anchors() {
        let html = crate::content::markdown::MarkdownRenderer::new().render("# Top\n\n## Hello, World!\n");
        assert!(html.contains("<h1>Top</h1>"));
        assert!(html.contains("<h2 id=\"hello-world\">"));
    }
}
