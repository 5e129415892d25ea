//! 本地媒体文件解析：把内容里引用的图片路径安全地映射到资源目录下的文件。

use image::ImageFormat;
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*:").unwrap());

/// 已确认存在于资源目录中的媒体文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInfo {
    /// 站点内路径，以 `/` 开头
    pub url_path: String,
    pub absolute_url: String,
    pub file_size: u64,
    pub mime_type: &'static str,
}

/// 解析内容中引用的本地媒体路径。
///
/// 远程地址、协议相对地址、含反斜杠的路径以及越出资源目录的路径一律返回 None。
pub fn resolve_local_media(path: &str, assets_root: &Path, base_url: &str) -> Option<MediaInfo> {
    let path = path.trim();
    if path.starts_with("//") || SCHEME_RE.is_match(path) || path.contains('\\') {
        tracing::debug!("跳过非本地媒体：{path}");
        return None;
    }

    let relative = path.trim_start_matches('/');
    if relative.is_empty() {
        return None;
    }

    let Some(normalized) = normalize(Path::new(relative)) else {
        tracing::debug!("媒体路径越出资源目录：{path}");
        return None;
    };
    let file_path = assets_root.join(&normalized);

    // 符号链接指向目录外时同样拒绝
    if let (Ok(canonical), Ok(root)) = (file_path.canonicalize(), assets_root.canonicalize())
        && !canonical.starts_with(&root)
    {
        tracing::debug!("媒体路径经链接越出资源目录：{path}");
        return None;
    }

    let metadata = match std::fs::metadata(&file_path) {
        Ok(m) if m.is_file() => m,
        Ok(_) => {
            tracing::debug!("媒体路径不是普通文件：{}", file_path.display());
            return None;
        }
        Err(e) => {
            tracing::debug!("媒体文件不可用 {}：{e}", file_path.display());
            return None;
        }
    };

    let Some(mime_type) = mime_for(&file_path) else {
        tracing::debug!("不支持的媒体类型：{path}");
        return None;
    };

    let url_path = format!(
        "/{}",
        normalized
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    );

    Some(MediaInfo {
        absolute_url: format!("{}{url_path}", base_url.trim_end_matches('/')),
        url_path,
        file_size: metadata.len(),
        mime_type,
    })
}

/// 词法规范化相对路径；`..` 越过起点时返回 None
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.iter().collect())
}

/// 允许的图片扩展名对应的 MIME
/// 只认 png、jpg/jpeg、gif、webp 四种扩展名；apng、jfif 等别名不放行
fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let format = match ext.as_str() {
        "png" => ImageFormat::Png,
        "jpg" | "jpeg" => ImageFormat::Jpeg,
        "gif" => ImageFormat::Gif,
        "webp" => ImageFormat::WebP,
        _ => return None,
    };
    Some(format.to_mime_type())
}
