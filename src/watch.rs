//! watch 模式：监听内容目录与配置文件，变更平息后整体重建。

use crate::build::{self, BuildParams};
use crate::config::{CONFIG_FILE, Mode, SiteConfig};
use anyhow::{Context, Result};
use notify::{EventKind, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

/// 最后一次变更后等待的静默时间
const DEBOUNCE: Duration = Duration::from_millis(300);

pub fn run(project_root: &Path, force_drafts: bool) -> Result<()> {
    let (tx, rx) = mpsc::channel();

    // 先启动监听再做首次构建，构建期间的变更会在通道中排队
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })
    .context("无法启动文件监听")?;

    let config = load_config(project_root)?;
    for dir in watch_dirs(project_root, &config) {
        if dir.is_dir() {
            watcher
                .watch(&dir, RecursiveMode::Recursive)
                .with_context(|| format!("无法监听 {}", dir.display()))?;
            tracing::info!("监听：{}", dir.display());
        } else {
            tracing::warn!("目录不存在，跳过监听：{}", dir.display());
        }
    }
    watcher
        .watch(project_root, RecursiveMode::NonRecursive)
        .with_context(|| format!("无法监听 {}", project_root.display()))?;

    rebuild(project_root, force_drafts);

    while let Ok(first) = rx.recv() {
        let mut changed = BTreeSet::new();
        collect_changes(first, project_root, &config, &mut changed);
        while let Ok(next) = rx.recv_timeout(DEBOUNCE) {
            collect_changes(next, project_root, &config, &mut changed);
        }

        if changed.is_empty() {
            continue;
        }
        for path in &changed {
            tracing::debug!("变更：{}", path.display());
        }
        tracing::info!("检测到 {} 个文件变更，重新构建", changed.len());
        rebuild(project_root, force_drafts);
    }

    Ok(())
}

fn load_config(project_root: &Path) -> Result<SiteConfig> {
    let mut config = SiteConfig::load(project_root)?;
    config.apply_env();
    Ok(config)
}

/// 每次重建都重新读取配置；构建失败只记录日志，继续监听
fn rebuild(project_root: &Path, force_drafts: bool) {
    let result = load_config(project_root).and_then(|config| {
        build::run(project_root, &config, BuildParams::new(Mode::Development, force_drafts))
    });
    if let Err(e) = result {
        tracing::error!("构建失败：{e:#}");
    }
}

fn watch_dirs(project_root: &Path, config: &SiteConfig) -> Vec<PathBuf> {
    [
        &config.content.blog_dir,
        &config.content.moments_dir,
        &config.content.events_dir,
    ]
    .into_iter()
    .map(|dir| project_root.join(dir))
    .collect()
}

fn collect_changes(
    event: notify::Result<notify::Event>,
    project_root: &Path,
    config: &SiteConfig,
    changed: &mut BTreeSet<PathBuf>,
) {
    let event = match event {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("文件监听出错：{e}");
            return;
        }
    };
    if matches!(event.kind, EventKind::Access(_)) {
        return;
    }
    changed.extend(
        event
            .paths
            .into_iter()
            .filter(|p| is_relevant(p, project_root, config)),
    );
}

/// 只有内容目录中的 Markdown 文件和配置文件会触发重建
fn is_relevant(path: &Path, project_root: &Path, config: &SiteConfig) -> bool {
    if path == project_root.join(CONFIG_FILE) {
        return true;
    }
    path.extension().is_some_and(|ext| ext == "md")
        && watch_dirs(project_root, config)
            .iter()
            .any(|dir| path.starts_with(dir))
}
