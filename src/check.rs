use crate::build::stages::load::list_markdown_files;
use crate::config::{CONFIG_FILE, SiteConfig};
use crate::content::frontmatter::{self, FrontMatter};
use crate::media;
use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;

pub struct CheckResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// 执行项目完整性检查，依次验证配置、内容目录和每个内容文件
pub fn run(project_root: &Path) -> Result<CheckResult> {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let config = check_config(project_root, &mut errors, &mut warnings);
    if let Some(config) = config {
        check_content(project_root, &config, &mut errors, &mut warnings);
    }

    Ok(CheckResult { errors, warnings })
}

fn check_config(root: &Path, errors: &mut Vec<String>, warnings: &mut Vec<String>) -> Option<SiteConfig> {
    if !root.join(CONFIG_FILE).exists() {
        warnings.push(format!("缺少 {CONFIG_FILE}，将使用默认配置"));
    }
    let config = match SiteConfig::load(root) {
        Ok(cfg) => cfg,
        Err(e) => {
            errors.push(format!("{e}"));
            return None;
        }
    };

    let url = config.site.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(format!("site.url 必须是 http(s) 地址：{url}"));
    }
    if config.site.author.email.trim().is_empty() {
        warnings.push("未配置 site.author.email，RSS 作者字段只包含名字".to_string());
    }
    Some(config)
}

fn check_content(root: &Path, config: &SiteConfig, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let assets_dir = config.assets_dir(root);
    let dirs = [
        (&config.content.blog_dir, false),
        (&config.content.moments_dir, false),
        (&config.content.events_dir, true),
    ];

    for (rel, is_events) in dirs {
        let dir = root.join(rel);
        if !dir.is_dir() {
            warnings.push(format!("{rel}/ 目录不存在"));
            continue;
        }

        let mut slugs: HashMap<String, String> = HashMap::new();
        for path in list_markdown_files(&dir) {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let display = format!("{rel}/{filename}");

            let slug = frontmatter::slug_from_filename(&filename);
            if let Some(other) = slugs.insert(slug.clone(), display.clone()) {
                errors.push(format!("{display} 与 {other} 的 slug 重复：{slug}"));
            }

            check_file(&path, &display, is_events, &assets_dir, config.base_url(), warnings);
        }
    }
}

fn check_file(
    path: &Path,
    display: &str,
    is_events: bool,
    assets_dir: &Path,
    base_url: &str,
    warnings: &mut Vec<String>,
) {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warnings.push(format!("{display} 无法读取：{e}"));
            return;
        }
    };

    let fm = match frontmatter::parse_content(&raw) {
        Ok(parsed) => FrontMatter::from_metadata(&parsed.metadata),
        Err(e) => {
            warnings.push(format!("{display}：{e}"));
            return;
        }
    };

    if let Some(date) = &fm.date
        && let Err(e) = frontmatter::parse_date(date)
    {
        warnings.push(format!("{display}：{e}"));
    }
    if is_events {
        if fm.dates.is_empty() {
            warnings.push(format!("{display} 未设置活动日期"));
        }
        for date in &fm.dates {
            if let Err(e) = frontmatter::parse_date(date) {
                warnings.push(format!("{display}：{e}"));
            }
        }
    }
    if let Some(cover) = &fm.cover
        && media::resolve_local_media(cover, assets_dir, base_url).is_none()
    {
        warnings.push(format!("{display} 的封面无法解析为本地图片：{cover}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn empty_project_only_warns() {
        let root = TempDir::new().unwrap();
        let result = run(root.path()).unwrap();
        assert!(result.errors.is_empty());
        assert!(result.warnings.iter().any(|w| w.contains(CONFIG_FILE)));
        assert!(result.warnings.iter().any(|w| w.contains("content/blog/")));
    }

    #[test]
    fn invalid_config_is_an_error() {
        let root = TempDir::new().unwrap();
        write(root.path(), CONFIG_FILE, "[site\nbroken");
        let result = run(root.path()).unwrap();
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn reports_content_problems() {
        let root = TempDir::new().unwrap();
        let r = root.path();
        write(r, CONFIG_FILE, "[site]\nurl = \"https://blog.example\"\n[site.author]\nemail = \"me@blog.example\"\n");
        write(r, "content/blog/2024-01-01-same.md", "---\ntitle: A\n---\nx\n");
        write(r, "content/blog/same.md", "---\ntitle: B\ndate: someday\ncover: https://remote.example/a.png\n---\nx\n");
        write(r, "content/blog/broken.md", "---\ntitle: [oops\n---\nx\n");
        write(r, "content/moments/2024-01-01.md", "hi\n");
        write(r, "content/events/tbd.md", "---\ntitle: TBD\n---\nx\n");

        let result = run(r).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("same"));

        let warnings = result.warnings.join("\n");
        assert!(warnings.contains("content/blog/same.md：无法解析日期"));
        assert!(warnings.contains("封面无法解析"));
        assert!(warnings.contains("content/blog/broken.md"));
        assert!(warnings.contains("content/events/tbd.md 未设置活动日期"));
        assert!(!warnings.contains(CONFIG_FILE));
    }
}
