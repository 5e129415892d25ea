use crate::content::{admonition, anchors, inline};
use pulldown_cmark::{
    CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, TextMergeStream, html,
};
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

/// 交给前端 Mermaid 渲染的代码块语言标记
pub const DIAGRAM_LANG: &str = "mermaid";
pub const DIAGRAM_CLASS: &str = "mermaid-diagram";

/// 单次渲染可开关的扩展
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub admonitions: bool,
    pub heading_anchors: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            admonitions: true,
            heading_anchors: true,
        }
    }
}

impl RenderOptions {
    /// 动态与活动描述：不注入标题锚点
    pub fn fragment() -> Self {
        Self {
            admonitions: true,
            heading_anchors: false,
        }
    }
}

/// Markdown 渲染器，持有已加载的语法定义，构建期间只读共享
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    options: Options,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);
        // 不开启 ENABLE_GFM：[!NOTE] 等提示块由 admonition 扩展自行处理

        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            options,
        }
    }

    /// 使用全部扩展渲染
    pub fn render(&self, source: &str) -> String {
        self.render_with(source, RenderOptions::default())
    }

    pub fn render_with(&self, source: &str, opts: RenderOptions) -> String {
        let events: Vec<Event> = TextMergeStream::new(Parser::new_ext(source, self.options)).collect();

        let events = if opts.admonitions {
            admonition::transform(events)
        } else {
            events
        };
        let events = inline::transform(events);
        let events = self.dispatch_code_blocks(events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        if opts.heading_anchors {
            anchors::add_heading_anchors(&html_output)
        } else {
            html_output
        }
    }

    /// 将围栏代码块替换为高亮 HTML、图表块或转义后的纯文本
    fn dispatch_code_blocks<'a>(&self, events: Vec<Event<'a>>) -> Vec<Event<'a>> {
        let mut in_code_block = false;
        let mut code_lang = String::new();
        let mut code_text = String::new();
        let mut result = Vec::with_capacity(events.len());

        for event in events {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code_text.clear();
                    code_lang = match &kind {
                        CodeBlockKind::Fenced(info) => {
                            info.split_whitespace().next().unwrap_or_default().to_string()
                        }
                        CodeBlockKind::Indented => String::new(),
                    };
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code_block = false;
                    let html = self.render_code_block(&code_text, &code_lang);
                    result.push(Event::Html(CowStr::from(html)));
                }
                Event::Text(text) if in_code_block => {
                    code_text.push_str(&text);
                }
                _ => result.push(event),
            }
        }

        result
    }

    fn render_code_block(&self, code: &str, lang: &str) -> String {
        if lang == DIAGRAM_LANG {
            return format!("<pre class=\"{DIAGRAM_CLASS}\">{}</pre>\n", escape_html(code));
        }

        if !lang.is_empty()
            && let Some(highlighted) = self.highlight_code(code, lang)
        {
            return highlighted;
        }

        if lang.is_empty() {
            format!("<pre><code>{}</code></pre>\n", escape_html(code))
        } else {
            format!(
                "<pre><code class=\"language-{}\">{}</code></pre>\n",
                escape_html(lang),
                escape_html(code)
            )
        }
    }

    /// 语言未识别或高亮失败时返回 None，由调用方降级为纯文本
    fn highlight_code(&self, code: &str, lang: &str) -> Option<String> {
        let syntax = self.syntax_set.find_syntax_by_token(lang)?;
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, ClassStyle::Spaced);
        for line in LinesWithEndings::from(code) {
            if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
                tracing::debug!("代码高亮失败（{lang}），降级为纯文本：{e}");
                return None;
            }
        }
        let highlighted = generator.finalize();
        Some(format!(
            "<pre class=\"code-highlight\"><code class=\"language-{}\">{highlighted}</code></pre>\n",
            escape_html(lang)
        ))
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// HTML 文本转义
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// 按空白分词统计字数
pub fn count_words(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

/// 预估阅读时间（分钟），每分钟 200 词，至少 1 分钟
pub fn reading_time(word_count: u32) -> u32 {
    word_count.div_ceil(200).max(1)
}

/// 页面是否需要加载 Mermaid
pub fn has_mermaid_diagrams(html: &str) -> bool {
    html.contains(&format!("class=\"{DIAGRAM_CLASS}\""))
}

/// 页面是否包含多语言代码标签页
pub fn has_language_tabs(html: &str) -> bool {
    html.contains("<lang-tabs>")
}
