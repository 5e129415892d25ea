//! 行内文本处理：裸链接自动转为链接，以及 (c) (tm) 等排版替换。

use pulldown_cmark::{CowStr, Event, LinkType, Tag, TagEnd};
use regex::Regex;
use std::sync::LazyLock;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:https?://|www\.)[^\s<>]+").unwrap());
static SYMBOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\((c|r|tm)\)|\+-").unwrap());

pub fn transform(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut result = Vec::with_capacity(events.len());
    let mut in_code_block = false;
    let mut link_depth = 0usize;

    for event in events {
        match event {
            Event::Start(Tag::CodeBlock(_)) => {
                in_code_block = true;
                result.push(event);
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                result.push(event);
            }
            Event::Start(Tag::Link { .. } | Tag::Image { .. }) => {
                link_depth += 1;
                result.push(event);
            }
            Event::End(TagEnd::Link | TagEnd::Image) => {
                link_depth = link_depth.saturating_sub(1);
                result.push(event);
            }
            // 原始 HTML 写的 <a> 内同样不再自动链接
            Event::InlineHtml(ref html) => {
                let tag = html.trim_start().to_ascii_lowercase();
                if tag.starts_with("<a ") || tag.starts_with("<a>") {
                    link_depth += 1;
                } else if tag.starts_with("</a") {
                    link_depth = link_depth.saturating_sub(1);
                }
                result.push(event);
            }
            Event::Text(text) if !in_code_block => {
                if link_depth == 0 {
                    linkify(&text, &mut result);
                } else {
                    result.push(Event::Text(CowStr::from(replace_symbols(&text))));
                }
            }
            _ => result.push(event),
        }
    }

    result
}

/// 排版符号替换
pub fn replace_symbols(text: &str) -> String {
    SYMBOL_RE
        .replace_all(text, |caps: &regex::Captures| {
            match caps.get(1).map(|m| m.as_str().to_ascii_lowercase()).as_deref() {
                Some("c") => "©",
                Some("r") => "®",
                Some("tm") => "™",
                _ => "±",
            }
        })
        .into_owned()
}

/// 将文本中的裸链接拆分为链接事件，排版替换只作用于链接以外的文本
fn linkify<'a>(text: &str, out: &mut Vec<Event<'a>>) {
    let mut last = 0;
    for m in URL_RE.find_iter(text) {
        let url = trim_url(m.as_str());
        if url.is_empty() || url.eq_ignore_ascii_case("www.") {
            continue;
        }
        let start = m.start();
        let end = start + url.len();

        if start > last {
            out.push(Event::Text(CowStr::from(replace_symbols(&text[last..start]))));
        }

        let href = if url.len() >= 4 && url[..4].eq_ignore_ascii_case("www.") {
            format!("http://{url}")
        } else {
            url.to_string()
        };
        out.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(href),
            title: CowStr::from(""),
            id: CowStr::from(""),
        }));
        out.push(Event::Text(CowStr::from(url.to_string())));
        out.push(Event::End(TagEnd::Link));
        last = end;
    }

    if last < text.len() {
        out.push(Event::Text(CowStr::from(replace_symbols(&text[last..]))));
    }
}

/// 去掉链接末尾的标点和不成对的右括号
fn trim_url(url: &str) -> &str {
    let mut url = url;
    loop {
        let trimmed = url.trim_end_matches(['.', ',', ':', ';', '!', '?', '\'', '"', '\u{2019}', '\u{201d}']);
        let trimmed = if trimmed.ends_with(')') && trimmed.matches(')').count() > trimmed.matches('(').count() {
            &trimmed[..trimmed.len() - 1]
        } else {
            trimmed
        };
        if trimmed.len() == url.len() {
            return url;
        }
        url = trimmed;
    }
}
