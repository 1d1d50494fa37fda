//! Safe rendering of LLM-authored markdown with embedded visual blocks.
//!
//! Assistant messages may carry structured "visual block" specifications
//! (JSON/JSONL) inline in their markdown. Rendering happens in three
//! stages so the markdown renderer never mangles them:
//!
//! 1. [`extract_visual_blocks`] pulls every block out of the raw text,
//!    replacing it with an opaque placeholder token;
//! 2. the cleaned text goes through markdown-to-HTML conversion;
//! 3. [`restore_visual_blocks`] swaps each placeholder (bare or
//!    paragraph-wrapped) for an escaped rendering directive, degrading to
//!    a plain code block when the captured content turns out not to be
//!    valid JSON after all.
//!
//! Everything here is a pure transformation: extraction state (the
//! placeholder id counter, the block table) lives in a per-call
//! [`Extraction`] value, never in process-wide storage. A render call can
//! therefore run concurrently with any number of others.

mod extract;
mod markdown;
mod restore;

pub use extract::{
    BlockFormat, ExtractOptions, Extraction, RenderMode, VisualBlock, extract_visual_blocks,
    extract_visual_blocks_with,
};
pub use markdown::render_html;
pub use restore::restore_visual_blocks;

/// Full pipeline: extract, render markdown, restore directives.
#[must_use]
pub fn render_message(markdown: &str, mode: RenderMode) -> String {
    render_message_with(markdown, mode, &ExtractOptions::default())
}

/// [`render_message`] with explicit heuristic policy.
#[must_use]
pub fn render_message_with(text: &str, mode: RenderMode, options: &ExtractOptions) -> String {
    let extraction = extract_visual_blocks_with(text, mode, options);
    let html = markdown::render_html(&extraction.text);
    restore_visual_blocks(&html, &extraction)
}
