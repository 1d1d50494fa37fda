//! Markdown to HTML conversion.
//!
//! pulldown-cmark auto-closes unterminated structure at end of input
//! instead of erroring, which is exactly the tolerance the streaming
//! render path needs: a prefix of the eventual message always renders.

use pulldown_cmark::{Options, Parser, html};

#[must_use]
pub fn render_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
