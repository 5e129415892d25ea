use crate::config::CONFIG_FILE;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

// 默认 folio.toml
const DEFAULT_CONFIG: &str = r#"[site]
title = "My Blog"
description = ""
url = "https://example.com"
language = "en-us"
default_image = "/og-image.png"

[site.author]
name = "Anonymous"
email = ""

[site.organization]
name = "My Blog"
description = ""
logo = "/logo.png"
same_as = []

[build]
output_dir = "public"
data_dir = ".folio/data"
log_level = "info"

[content]
blog_dir = "content/blog"
moments_dir = "content/moments"
events_dir = "content/events"
assets_dir = "public"
related_count = 3

[feed]
enabled = true
rss_file = "rss.xml"
moments_file = "moments-rss.xml"

[sitemap]
enabled = true
"#;

const WELCOME_POST: &str = r#"---
title: Hello, World
description: The first post on this blog.
tags:
  - meta
publish_status: published
---

## Welcome

This post was created by `folio init`. Edit or delete it, then run `folio build`.

> [!TIP] Drafts
> Set `publish_status: draft` to keep a post out of the feeds.
"#;

/// 初始化项目骨架，已有文件不会被覆盖。
/// 返回 `true` 表示创建了配置文件，`false` 表示配置已存在。
pub fn ensure_initialized(root: &Path) -> Result<bool> {
    let dirs = ["content/blog", "content/moments", "content/events", "public"];
    for dir in &dirs {
        let path = root.join(dir);
        fs::create_dir_all(&path).with_context(|| format!("无法创建目录 {}", path.display()))?;
    }

    let config_path = root.join(CONFIG_FILE);
    if config_path.exists() {
        return Ok(false);
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("写入 {} 失败", config_path.display()))?;

    let blog_dir = root.join("content/blog");
    let has_posts = fs::read_dir(&blog_dir)?.next().is_some();
    if !has_posts {
        let today = chrono::Local::now().date_naive();
        let post_path = blog_dir.join(format!("{}-hello-world.md", today.format("%Y-%m-%d")));
        fs::write(&post_path, WELCOME_POST)
            .with_context(|| format!("写入 {} 失败", post_path.display()))?;
    }

    Ok(true)
}
