use crate::content::PublishStatus;
use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use gray_matter::engine::YAML;
use gray_matter::{Matter, ParsedEntity};
use serde_json::{Map, Value};
use thiserror::Error;

pub type Metadata = Map<String, Value>;

/// Front Matter 无法解析；调用方可按“无元数据”降级处理
#[derive(Debug, Error)]
pub enum MetadataParseError {
    #[error("front matter 不是合法的 YAML：{0}")]
    Yaml(String),

    #[error("front matter 必须是键值映射，实际为 {0}")]
    NotAMapping(&'static str),
}

#[derive(Debug)]
pub struct ParsedContent {
    pub metadata: Metadata,
    pub body: String,
}

/// 解析内容字符串，分离 Front Matter 和正文
pub fn parse_content(content: &str) -> Result<ParsedContent, MetadataParseError> {
    let matter = Matter::<YAML>::new();
    let parsed: ParsedEntity<Value> = matter
        .parse(content)
        .map_err(|e| MetadataParseError::Yaml(e.to_string()))?;

    let metadata = match parsed.data {
        None | Some(Value::Null) if !is_blank_yaml(&parsed.matter) => {
            return Err(MetadataParseError::Yaml("front matter 内容无法解析".into()));
        }
        None | Some(Value::Null) => Metadata::new(),
        Some(Value::Object(map)) => map,
        Some(Value::Array(_)) => return Err(MetadataParseError::NotAMapping("列表")),
        Some(_) => return Err(MetadataParseError::NotAMapping("标量")),
    };

    Ok(ParsedContent {
        metadata,
        body: parsed.content,
    })
}

/// 只含空行或注释的 front matter 视为空
fn is_blank_yaml(matter: &str) -> bool {
    matter
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#'))
}

/// 元数据损坏时的降级：去掉开头的 `---` 围栏块，只保留正文
pub fn strip_front_matter(content: &str) -> &str {
    let Some(rest) = content
        .strip_prefix("---\r\n")
        .or_else(|| content.strip_prefix("---\n"))
    else {
        return content;
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        if line.trim_end() == "---" {
            return &rest[offset..];
        }
    }
    content
}

/// 已识别字段的类型化视图
#[derive(Debug, Default, Clone)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub cover: Option<String>,
    pub image_alt: Option<String>,
    pub image_credit: Option<String>,
    pub dates: Vec<String>,
    pub publish_status: PublishStatus,
}

impl FrontMatter {
    pub fn from_metadata(meta: &Metadata) -> Self {
        Self {
            title: string_field(meta, "title"),
            description: string_field(meta, "description"),
            date: string_field(meta, "date"),
            author: string_field(meta, "author"),
            tags: list_field(meta, "tags"),
            cover: string_field(meta, "cover").or_else(|| string_field(meta, "image")),
            image_alt: string_field(meta, "image_alt"),
            image_credit: string_field(meta, "image_credit"),
            dates: match meta.get("dates") {
                Some(Value::Array(_)) => list_field(meta, "dates"),
                _ => string_field(meta, "dates")
                    .or_else(|| string_field(meta, "date"))
                    .into_iter()
                    .collect(),
            },
            publish_status: PublishStatus::from_meta(string_field(meta, "publish_status").as_deref()),
        }
    }
}

/// 读取字符串字段；数字和布尔值转为字符串，空串视为缺失
fn string_field(meta: &Metadata, key: &str) -> Option<String> {
    let value = match meta.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!value.is_empty()).then_some(value)
}

/// 读取字符串列表；非列表视为空，列表中的非标量项被丢弃
fn list_field(meta: &Metadata, key: &str) -> Vec<String> {
    let Some(Value::Array(items)) = meta.get(key) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

/// 从文件名推导 slug（去除扩展名和一次 YYYY-MM-DD- 日期前缀）
pub fn slug_from_filename(filename: &str) -> String {
    let name = filename.strip_suffix(".md").unwrap_or(filename);
    if name.len() > 11 && has_date_prefix(name) {
        name[11..].to_string()
    } else {
        name.to_string()
    }
}

/// 文件名开头的 YYYY-MM-DD 日期
pub fn date_from_filename(filename: &str) -> Option<NaiveDate> {
    if filename.len() < 10 || !has_date_prefix(filename) {
        return None;
    }
    NaiveDate::parse_from_str(&filename[..10], "%Y-%m-%d").ok()
}

fn has_date_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 10
        && bytes[0..4].iter().all(|b| b.is_ascii_digit())
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(|b| b.is_ascii_digit())
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(|b| b.is_ascii_digit())
        && (bytes.len() == 10 || bytes[10] == b'-' || bytes[10] == b'.')
}

/// 解析日期字符串，带时间的格式截取日期部分
pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    let s = date_str.trim();

    // RFC 3339: 2024-01-15T10:30:00+08:00
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    // 带时间不带时区: 2024-01-15T10:30:00、2024-01-15 10:30:00、2024-01-15 10:30
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    // 纯日期: 2024-01-15
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    // 斜线格式: 2024/01/15
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y/%m/%d") {
        return Ok(date);
    }
    anyhow::bail!("无法解析日期：{}", s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_metadata_and_body() {
        let input = "---\ntitle: Hello\ntags:\n  - rust\n  - web\npublish_status: draft\n---\n# Heading\n\nBody text.\n";
        let parsed = parse_content(input).unwrap();
        let fm = FrontMatter::from_metadata(&parsed.metadata);
        assert_eq!(fm.title.as_deref(), Some("Hello"));
        assert_eq!(fm.tags, ["rust", "web"]);
        assert_eq!(fm.publish_status, PublishStatus::Draft);
        assert!(parsed.body.trim_start().starts_with("# Heading"));
        assert!(parsed.body.contains("Body text."));
        assert!(!parsed.body.contains("title:"));
    }

    #[test]
    fn no_fence_means_empty_metadata() {
        let input = "# Just content\n\nNo metadata here.\n";
        let parsed = parse_content(input).unwrap();
        assert!(parsed.metadata.is_empty());
        assert_eq!(parsed.body.trim(), input.trim());
    }

    #[test]
    fn malformed_yaml_is_reported() {
        let input = "---\ntitle: [unclosed\n  - : :\n---\nBody\n";
        assert!(parse_content(input).is_err());
    }

    #[test]
    fn scalar_front_matter_is_not_a_mapping() {
        let input = "---\njust a string\n---\nBody\n";
        assert!(parse_content(input).is_err());
    }

    #[test]
    fn strip_front_matter_recovers_body() {
        let input = "---\ntitle: [unclosed\n---\nBody line\n";
        assert_eq!(strip_front_matter(input), "Body line\n");
        assert_eq!(strip_front_matter("plain"), "plain");
        assert_eq!(strip_front_matter("---\nnever closed\n"), "---\nnever closed\n");
    }

    #[test]
    fn malformed_tags_become_empty() {
        let parsed = parse_content("---\ntags: rust\n---\nx\n").unwrap();
        assert!(FrontMatter::from_metadata(&parsed.metadata).tags.is_empty());

        let parsed = parse_content("---\ntags:\n  - rust\n  - {a: 1}\n  - 42\n---\nx\n").unwrap();
        assert_eq!(FrontMatter::from_metadata(&parsed.metadata).tags, ["rust", "42"]);
    }

    #[test]
    fn cover_falls_back_to_image() {
        let parsed = parse_content("---\nimage: /img/a.png\n---\nx\n").unwrap();
        let fm = FrontMatter::from_metadata(&parsed.metadata);
        assert_eq!(fm.cover.as_deref(), Some("/img/a.png"));
    }

    #[test]
    fn event_dates_accept_list_or_single() {
        let parsed = parse_content("---\ndates:\n  - 2024-05-01\n  - 2024-05-02\n---\nx\n").unwrap();
        assert_eq!(FrontMatter::from_metadata(&parsed.metadata).dates, ["2024-05-01", "2024-05-02"]);

        let parsed = parse_content("---\ndate: 2024-05-01\n---\nx\n").unwrap();
        assert_eq!(FrontMatter::from_metadata(&parsed.metadata).dates, ["2024-05-01"]);
    }

    #[test]
    fn slug_strips_date_prefix_once() {
        assert_eq!(slug_from_filename("2024-01-15-hello-world.md"), "hello-world");
        assert_eq!(slug_from_filename("2024-01-15-2023-12-01-nested.md"), "2023-12-01-nested");
        assert_eq!(slug_from_filename("hello.md"), "hello");
        assert_eq!(slug_from_filename("2024-1-15-odd.md"), "2024-1-15-odd");
        assert_eq!(slug_from_filename("2024-01-15.md"), "2024-01-15");
    }

    #[test]
    fn date_from_filename_prefix() {
        assert_eq!(
            date_from_filename("2024-02-29-leap.md"),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(
            date_from_filename("2024-03-01.md"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(date_from_filename("2023-02-30-bad.md"), None);
        assert_eq!(date_from_filename("notes.md"), None);
    }

    #[test]
    fn parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(parse_date("2024-01-15").unwrap(), expected);
        assert_eq!(parse_date("2024/01/15").unwrap(), expected);
        assert_eq!(parse_date("2024-01-15T10:30:00").unwrap(), expected);
        assert_eq!(parse_date("2024-01-15T10:30:00+08:00").unwrap(), expected);
        assert_eq!(parse_date("2024-01-15 10:30:00").unwrap(), expected);
        assert_eq!(parse_date("2024-01-15 10:30").unwrap(), expected);
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn space_separated_datetime_from_front_matter() {
        let parsed = parse_content("---\ndate: 2024-01-15 10:30:00\n---\nx\n").unwrap();
        let fm = FrontMatter::from_metadata(&parsed.metadata);
        let raw = fm.date.unwrap();
        assert_eq!(parse_date(&raw).unwrap(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }
}
