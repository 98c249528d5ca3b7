//! Markdown-to-HTML rendering capability.

use pulldown_cmark::{html, Event, Options, Parser};

/// Renders markdown source to HTML.
pub trait MarkdownRenderer {
    fn render(&self, markdown: &str) -> String;
}

/// `pulldown-cmark` renderer with tables, strikethrough and task lists.
///
/// Soft line breaks render as `<br />`, so single newlines inside a
/// paragraph survive in the output.
#[derive(Debug, Clone, Copy, Default)]
pub struct CmarkRenderer;

impl MarkdownRenderer for CmarkRenderer {
    fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let parser = Parser::new_ext(markdown, options).map(|event| match event {
            Event::SoftBreak => Event::HardBreak,
            other => other,
        });

        let mut output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut output, parser);
        output
    }
}

/// Renders markdown with the default renderer.
pub fn render_to_html(content: &str) -> String {
    CmarkRenderer.render(content)
}
