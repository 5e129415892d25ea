//! GitHub 风格提示块：`> [!WARNING] 标题` 形式的引用块改写为带图标的容器。
//!
//! 在 pulldown-cmark 事件列表上做一次显式遍历：找到引用块开标签后，
//! 用深度计数匹配与之平衡的闭标签，而不是遇到的第一个闭标签。

use crate::content::markdown::escape_html;
use pulldown_cmark::{CowStr, Event, Tag, TagEnd};
use regex::Regex;
use std::sync::LazyLock;

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\[!(NOTE|TIP|IMPORTANT|WARNING|CAUTION|INFO)\](?:[ \t]+(.*))?$").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmonitionKind {
    Note,
    Tip,
    Important,
    Warning,
    Caution,
    Info,
}

impl AdmonitionKind {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "note" => Some(Self::Note),
            "tip" => Some(Self::Tip),
            "important" => Some(Self::Important),
            "warning" => Some(Self::Warning),
            "caution" => Some(Self::Caution),
            "info" => Some(Self::Info),
            _ => None,
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Tip => "tip",
            Self::Important => "important",
            Self::Warning => "warning",
            Self::Caution => "caution",
            Self::Info => "info",
        }
    }

    /// 未给出标题时使用的默认标题（首字母大写的关键字）
    pub fn default_title(self) -> &'static str {
        match self {
            Self::Note => "Note",
            Self::Tip => "Tip",
            Self::Important => "Important",
            Self::Warning => "Warning",
            Self::Caution => "Caution",
            Self::Info => "Info",
        }
    }

    fn icon(self) -> String {
        let paths: &[&str] = match self {
            Self::Note => &[
                "M16.862 4.487l1.687-1.688a1.875 1.875 0 112.652 2.652L10.582 16.07a4.5 4.5 0 01-1.897 1.13L6 18l.8-2.685a4.5 4.5 0 011.13-1.897l8.932-8.931zm0 0L19.5 7.125M18 14v4.75A2.25 2.25 0 0115.75 21H5.25A2.25 2.25 0 013 18.75V8.25A2.25 2.25 0 015.25 6H10",
            ],
            Self::Tip => &[
                "M15.362 5.214A8.252 8.252 0 0112 21 8.25 8.25 0 016.038 7.047 8.287 8.287 0 009 9.601a8.983 8.983 0 013.361-6.867 8.21 8.21 0 003 2.48z",
                "M12 18a3.75 3.75 0 00.495-7.468 5.99 5.99 0 00-1.925 3.547 5.975 5.975 0 01-2.133-1.001A3.75 3.75 0 0012 18z",
            ],
            Self::Info => &[
                "M11.25 11.25l.041-.02a.75.75 0 011.063.852l-.708 2.836a.75.75 0 001.063.853l.041-.021M21 12a9 9 0 11-18 0 9 9 0 0118 0zm-9-3.75h.008v.008H12V8.25z",
            ],
            Self::Warning => &[
                "M12 9v3.75m-9.303 3.376c-.866 1.5.217 3.374 1.948 3.374h14.71c1.73 0 2.813-1.874 1.948-3.374L13.949 3.378c-.866-1.5-3.032-1.5-3.898 0L2.697 16.126zM12 15.75h.007v.008H12v-.008z",
            ],
            Self::Important => &[
                "M9.879 7.519c1.171-1.025 3.071-1.025 4.242 0 1.172 1.025 1.172 2.687 0 3.712-.203.179-.43.326-.67.442-.745.361-1.45.999-1.45 1.827v.75M21 12a9 9 0 11-18 0 9 9 0 0118 0zm-9 5.25h.008v.008H12v-.008z",
            ],
            Self::Caution => &[
                "M12 9v3.75m9-.75a9 9 0 11-18 0 9 9 0 0118 0zm-9 3.75h.008v.008H12v-.008z",
            ],
        };

        let mut svg = String::from(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" fill=\"none\" viewBox=\"0 0 24 24\" stroke-width=\"1.5\" stroke=\"currentColor\" class=\"admonition-icon\">",
        );
        for d in paths {
            svg.push_str(&format!(
                "<path stroke-linecap=\"round\" stroke-linejoin=\"round\" d=\"{d}\" />"
            ));
        }
        svg.push_str("</svg>");
        svg
    }
}

/// 引用块首行识别出的提示标记
#[derive(Debug, PartialEq, Eq)]
struct Marker {
    kind: AdmonitionKind,
    title: String,
    /// 首行占用的事件数（含行尾换行事件）
    line_len: usize,
}

/// 改写事件列表中所有以提示标记开头的引用块
pub fn transform(mut events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut i = 0;
    while i < events.len() {
        if matches!(events[i], Event::Start(Tag::BlockQuote(_)))
            && let Some(marker) = detect_marker(&events, i)
            && let Some(close) = find_matching_close(&events, i)
        {
            rewrite(&mut events, i, close, marker);
        }
        i += 1;
    }
    events
}

/// 首个子节点必须是段落，且段落首行完整匹配 `[!KIND] 标题`
fn detect_marker(events: &[Event<'_>], open: usize) -> Option<Marker> {
    if !matches!(events.get(open + 1), Some(Event::Start(Tag::Paragraph))) {
        return None;
    }

    let mut line = String::new();
    let mut line_len = 0;
    for event in &events[open + 2..] {
        match event {
            Event::Text(text) | Event::Code(text) => {
                line.push_str(text);
                line_len += 1;
            }
            Event::SoftBreak | Event::HardBreak => {
                line_len += 1;
                break;
            }
            Event::End(TagEnd::Paragraph) => break,
            // 首行中的行内标签等事件也一并移除
            _ => line_len += 1,
        }
    }

    let caps = MARKER_RE.captures(&line)?;
    let kind = AdmonitionKind::from_keyword(&caps[1])?;
    let title = caps
        .get(2)
        .map(|m| m.as_str().trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| kind.default_title().to_string());

    Some(Marker {
        kind,
        title,
        line_len,
    })
}

/// 用深度计数找到与 `open` 平衡的引用块闭标签
fn find_matching_close(events: &[Event<'_>], open: usize) -> Option<usize> {
    let quote_end = Tag::BlockQuote(None).to_end();
    let mut depth = 0usize;
    for (j, event) in events.iter().enumerate().skip(open) {
        match event {
            Event::Start(Tag::BlockQuote(_)) => depth += 1,
            Event::End(end) if *end == quote_end => {
                depth -= 1;
                if depth == 0 {
                    return Some(j);
                }
            }
            _ => {}
        }
    }
    None
}

fn rewrite(events: &mut Vec<Event<'_>>, open: usize, close: usize, marker: Marker) {
    let kind = marker.kind;
    events[close] = Event::Html(CowStr::from("</div></div>\n"));
    events[open] = Event::Html(CowStr::from(format!(
        "<div class=\"admonition admonition-{class}\"><div class=\"admonition-title\">{icon}{title}</div><div class=\"admonition-content\">\n",
        class = kind.class_name(),
        icon = kind.icon(),
        title = escape_html(&marker.title),
    )));

    // 移除标记行；段落因此变空时连同段落标签一起移除
    let first = open + 2;
    events.drain(first..first + marker.line_len);
    if matches!(events.get(first), Some(Event::End(TagEnd::Paragraph))) {
        events.drain(open + 1..=first);
    }
}
