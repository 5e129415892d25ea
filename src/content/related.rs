use crate::content::Post;

pub const DEFAULT_LIMIT: usize = 3;

/// 每个共同标签的得分
const TAG_WEIGHT: f64 = 10.0;
/// 日期差按天折算的衰减系数
const DAY_DECAY: f64 = 100.0;

/// 相关度启发式：共同标签优先，日期相近次之
pub fn relatedness(target: &Post, candidate: &Post) -> f64 {
    let shared = target
        .record
        .tags
        .iter()
        .filter(|tag| candidate.record.tags.contains(tag))
        .count() as f64;
    let days = (target.record.date - candidate.record.date).num_days().abs() as f64;
    shared * TAG_WEIGHT - days / DAY_DECAY
}

/// 从 pool 中挑选与 target 最相关的文章，同分保持原有顺序
pub fn related_posts<'a>(target: &Post, pool: &'a [Post], limit: usize) -> Vec<&'a Post> {
    let mut scored: Vec<(f64, &Post)> = pool
        .iter()
        .filter(|p| p.record.slug != target.record.slug)
        .map(|p| (relatedness(target, p), p))
        .collect();

    // sort_by 是稳定排序
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().take(limit).map(|(_, p)| p).collect()
}
