/// 动态标题的最大字符数
pub const TITLE_CHARS: usize = 60;
/// 缺省描述的最大字符数
pub const DESCRIPTION_CHARS: usize = 160;

/// 从 HTML 提取纯文本，并在词边界处截断为摘要
pub fn excerpt(html: &str, max_chars: usize) -> String {
    let plain = plain_text(html);
    let chars: Vec<char> = plain.chars().collect();
    if chars.len() <= max_chars {
        return plain;
    }

    // 优先在空白处截断；找不到时（如连续中文）按字符截断
    let end = (max_chars / 2..=max_chars)
        .rev()
        .find(|&i| chars[i].is_whitespace())
        .unwrap_or(max_chars);

    let mut excerpt: String = chars[..end].iter().collect();
    let trimmed_len = excerpt.trim_end_matches([' ', ',', ';', ':', '，', '、']).len();
    excerpt.truncate(trimmed_len);
    excerpt.push('…');
    excerpt
}

/// 去除 HTML 标签、还原常见实体并压缩空白
pub fn plain_text(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut entity: Option<String> = None;

    for ch in html.chars() {
        if in_tag {
            if ch == '>' {
                in_tag = false;
            }
            continue;
        }
        if let Some(buf) = entity.as_mut() {
            if ch == ';' {
                buf.push(ch);
                result.push_str(decode_entity(buf));
                entity = None;
                continue;
            }
            if ch.is_ascii_alphanumeric() || ch == '#' {
                buf.push(ch);
                continue;
            }
            // 不是实体，原样保留
            result.push_str(buf);
            entity = None;
        }
        match ch {
            '<' => in_tag = true,
            '&' => entity = Some(String::from("&")),
            c => result.push(c),
        }
    }
    if let Some(buf) = entity {
        result.push_str(&buf);
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entity(entity: &str) -> &str {
    match entity {
        "&amp;" => "&",
        "&lt;" => "<",
        "&gt;" => ">",
        "&quot;" => "\"",
        "&#39;" | "&#039;" | "&apos;" => "'",
        "&nbsp;" => " ",
        other => other,
    }
}
