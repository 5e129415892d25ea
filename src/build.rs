pub mod pipeline;
pub mod stages;

use crate::config::{Mode, SiteConfig};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::Path;

/// 构建运行参数
#[derive(Debug, Clone, Copy)]
pub struct BuildParams {
    pub mode: Mode,
    /// 命令行 `--drafts`，强制包含草稿
    pub force_drafts: bool,
    /// 处理日期，整次构建只取一次
    pub today: NaiveDate,
}

impl BuildParams {
    pub fn new(mode: Mode, force_drafts: bool) -> Self {
        Self {
            mode,
            force_drafts,
            today: chrono::Local::now().date_naive(),
        }
    }
}

/// 构建统计信息
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildStats {
    pub posts: usize,
    pub moments: usize,
    pub events: usize,
    pub pages: usize,
    pub artifacts: usize,
}

pub fn run(project_root: &Path, config: &SiteConfig, params: BuildParams) -> Result<BuildStats> {
    let output_dir = config.output_dir(project_root);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("无法创建输出目录 {}", output_dir.display()))?;

    // 每次构建都从零生成页面数据，清掉上次遗留的页面
    let data_dir = project_root.join(&config.build.data_dir);
    if data_dir.exists() {
        std::fs::remove_dir_all(&data_dir)
            .with_context(|| format!("无法清理页面数据目录 {}", data_dir.display()))?;
        tracing::debug!("已清除页面数据目录：{}", data_dir.display());
    }

    pipeline::execute(project_root, config, params)
}
