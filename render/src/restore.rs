//! Placeholder to rendering-directive restoration.
//!
//! Runs after markdown-to-HTML conversion. Every placeholder is replaced
//! by either an interactive container directive (a div the client-side
//! behavior materializes into a widget) or, when the captured content
//! fails JSON validation after all, a plain escaped code block. Either
//! way, raw LLM-authored text never reaches the output unescaped.

use pulldown_cmark_escape::escape_html;
use serde_json::Value;

use crate::extract::{BlockFormat, Extraction, VisualBlock, placeholder};

/// Substitute every placeholder in `html` with its rendering directive.
///
/// Renderers wrap a bare placeholder line in a paragraph, so the
/// `<p>token</p>` form is matched before the raw token.
#[must_use]
pub fn restore_visual_blocks(html: &str, extraction: &Extraction) -> String {
    let mut out = html.to_string();
    for block in &extraction.blocks {
        let token = placeholder(block.id);
        let wrapped = format!("<p>{token}</p>");
        let directive = directive_for(block);
        if out.contains(&wrapped) {
            out = out.replace(&wrapped, &directive);
        } else {
            out = out.replace(&token, &directive);
        }
    }
    out
}

fn directive_for(block: &VisualBlock) -> String {
    let valid = match block.format {
        // The two-line gate can still let a false positive through; at
        // least one line must actually parse before the block is handed
        // to the interactive widget.
        BlockFormat::Jsonl => block.content.lines().any(|line| {
            let line = line.trim();
            !line.is_empty() && serde_json::from_str::<Value>(line).is_ok()
        }),
        BlockFormat::Json => serde_json::from_str::<Value>(&block.content).is_ok(),
    };

    let escaped = escape(&block.content);
    if valid {
        format!(
            r#"<div id="visual-block-{id}" class="visual-block" data-format="{format}" data-spec="{escaped}"></div>"#,
            id = block.id,
            format = block.format.as_str(),
        )
    } else {
        tracing::debug!(block = block.id, "invalid visual block content, degrading to code block");
        format!("<pre><code>{escaped}</code></pre>")
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let _ = escape_html(&mut out, text);
    out
}
