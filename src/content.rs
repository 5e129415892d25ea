pub mod admonition;
pub mod anchors;
pub mod excerpt;
pub mod frontmatter;
pub mod inline;
pub mod markdown;
pub mod related;

use chrono::NaiveDate;
use serde::Serialize;

/// 发布状态；未设置视为已发布
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    Draft,
    Published,
    #[default]
    Unset,
}

impl PublishStatus {
    pub fn from_meta(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("draft") => Self::Draft,
            Some("published") => Self::Published,
            _ => Self::Unset,
        }
    }

    pub fn is_draft(self) -> bool {
        self == Self::Draft
    }
}

/// 文章、动态、活动共有的内容记录
#[derive(Debug, Clone, Serialize)]
pub struct ContentRecord {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub author: String,
    pub tags: Vec<String>,
    pub cover: Option<String>,
    pub publish_status: PublishStatus,
    #[serde(skip)]
    raw_body: String,
    html: String,
}

impl ContentRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        slug: String,
        title: String,
        description: String,
        date: NaiveDate,
        author: String,
        tags: Vec<String>,
        cover: Option<String>,
        publish_status: PublishStatus,
        raw_body: String,
        html: String,
    ) -> Self {
        Self {
            slug,
            title,
            description,
            date,
            author,
            tags,
            cover,
            publish_status,
            raw_body,
            html,
        }
    }

    /// 去掉 front matter 后的 Markdown 原文
    pub fn raw_body(&self) -> &str {
        &self.raw_body
    }

    /// 渲染后的 HTML，创建后不可变
    pub fn html(&self) -> &str {
        &self.html
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    #[serde(flatten)]
    pub record: ContentRecord,
    pub reading_time: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Moment {
    #[serde(flatten)]
    pub record: ContentRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventItem {
    #[serde(flatten)]
    pub record: ContentRecord,
    pub dates: Vec<NaiveDate>,
    pub image_alt: String,
    pub image_credit: Option<String>,
}

/// 集合内的可排序内容
pub trait Content: Send {
    fn record(&self) -> &ContentRecord;

    /// 排序用日期，默认取记录日期
    fn sort_date(&self) -> NaiveDate {
        self.record().date
    }
}

impl Content for Post {
    fn record(&self) -> &ContentRecord {
        &self.record
    }
}

impl Content for Moment {
    fn record(&self) -> &ContentRecord {
        &self.record
    }
}

impl Content for EventItem {
    fn record(&self) -> &ContentRecord {
        &self.record
    }

    /// 多日期活动按最晚的日期排序
    fn sort_date(&self) -> NaiveDate {
        self.dates.iter().max().copied().unwrap_or(self.record.date)
    }
}

/// 按日期降序排列的同类内容集合，同日按 slug 升序
#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T: Content> Collection<T> {
    /// 过滤草稿并排序，必须在所有文件解析完成后调用
    pub fn assemble(items: Vec<T>, show_drafts: bool) -> Self {
        let mut items: Vec<T> = items
            .into_iter()
            .filter(|item| {
                let keep = show_drafts || !item.record().publish_status.is_draft();
                if !keep {
                    tracing::debug!("跳过草稿：{}", item.record().slug);
                }
                keep
            })
            .collect();
        items.sort_by(|a, b| {
            b.sort_date()
                .cmp(&a.sort_date())
                .then_with(|| a.record().slug.cmp(&b.record().slug))
        });
        Self { items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, slug: &str) -> Option<&T> {
        self.items.iter().find(|item| item.record().slug == slug)
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

/// 一次构建读取到的全部内容
#[derive(Debug, Default)]
pub struct SiteContent {
    pub posts: Collection<Post>,
    pub moments: Collection<Moment>,
    pub events: Collection<EventItem>,
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn publish_status_parsing() {
        assert_eq!(PublishStatus::from_meta(Some("draft")), PublishStatus::Draft);
        assert_eq!(PublishStatus::from_meta(Some(" Published ")), PublishStatus::Published);
        assert_eq!(PublishStatus::from_meta(Some("archived")), PublishStatus::Unset);
        assert_eq!(PublishStatus::from_meta(None), PublishStatus::Unset);
    }

    #[test]
    fn assemble_sorts_descending_with_slug_tiebreak() {
        let posts = vec![
            post("b", "2024-01-01", &[]),
            post("c", "2024-03-01", &[]),
            post("a", "2024-01-01", &[]),
        ];
        let collection = Collection::assemble(posts, false);
        let slugs: Vec<_> = collection.items().iter().map(|p| p.record.slug.as_str()).collect();
        assert_eq!(slugs, ["c", "a", "b"]);
    }

    #[test]
    fn assemble_drops_drafts_unless_shown() {
        let mut draft = post("draft", "2024-05-01", &[]);
        draft.record.publish_status = PublishStatus::Draft;
        let posts = vec![draft.clone(), post("live", "2024-01-01", &[])];

        let hidden = Collection::assemble(posts.clone(), false);
        assert_eq!(hidden.len(), 1);
        assert!(hidden.find("draft").is_none());

        let shown = Collection::assemble(posts, true);
        assert_eq!(shown.len(), 2);
        assert_eq!(shown.items()[0].record.slug, "draft");
    }

    #[test]
    fn events_sort_by_latest_date() {
        let early = EventItem {
            record: record("early", "2024-01-01", &[], PublishStatus::Unset),
            dates: vec![day("2024-01-01"), day("2024-06-01")],
            image_alt: String::new(),
            image_credit: None,
        };
        let late = EventItem {
            record: record("late", "2024-03-01", &[], PublishStatus::Unset),
            dates: vec![day("2024-03-01")],
            image_alt: String::new(),
            image_credit: None,
        };
        let collection = Collection::assemble(vec![late, early], false);
        assert_eq!(collection.items()[0].record.slug, "early");
        assert_eq!(collection.items()[0].sort_date(), day("2024-06-01"));
    }
}
