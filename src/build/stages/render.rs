use crate::build::stages::generate::PageData;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const PAGE_FILE: &str = "index.json";

/// 将页面数据写入 `<data_dir>/<url>/index.json`，返回写入的页面数
pub fn render_pages(data_dir: &Path, pages: &[PageData]) -> Result<usize> {
    for page in pages {
        let file_path = page_path(data_dir, &page.url);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("无法创建目录 {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(page)
            .with_context(|| format!("序列化页面 {} 失败", page.url))?;
        std::fs::write(&file_path, json)
            .with_context(|| format!("写入 {} 失败", file_path.display()))?;
        tracing::debug!("已写入：{}", file_path.display());
    }

    tracing::info!("页面数据写出完成，共 {} 个页面", pages.len());
    Ok(pages.len())
}

fn page_path(data_dir: &Path, url: &str) -> PathBuf {
    let rel = url.trim_matches('/');
    if rel.is_empty() {
        data_dir.join(PAGE_FILE)
    } else {
        data_dir.join(rel).join(PAGE_FILE)
    }
}
