//! Four-pass visual block extraction.
//!
//! Passes run in order, each feeding the next, all placeholders
//! accumulating into one per-call table:
//!
//! 1. primary fence (```visual) - JSONL patch content, always extracted;
//! 2. legacy fence (```visual-spec) - one JSON object, always extracted;
//! 3. fallback fence (```json) - extracted only when the decoded value
//!    matches a recognized spec shape, so genuine JSON examples stay
//!    ordinary code blocks;
//! 4. heuristic unfenced scan - consecutive bare JSONL patch lines.
//!
//! Fenced matches are replaced in reverse span order so earlier
//! replacements cannot invalidate later offsets within a pass.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockFormat {
    Jsonl,
    Json,
}

impl BlockFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BlockFormat::Jsonl => "jsonl",
            BlockFormat::Json => "json",
        }
    }
}

/// Whether the input is the final message text or a streamed prefix of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Final,
    Streaming,
}

/// Policy knobs for the heuristic unfenced pass.
///
/// The two-line minimum and blank-line buffering are a precision/recall
/// tradeoff against false positives in prose; they are policy, not
/// invariants.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Minimum consecutive patch lines before an unfenced candidate commits.
    pub min_patch_lines: usize,
    /// Buffer blank lines inside an open candidate instead of closing it.
    pub buffer_blank_lines: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            min_patch_lines: 2,
            buffer_blank_lines: true,
        }
    }
}

/// One extracted block, keyed by the placeholder id embedded in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualBlock {
    pub id: u64,
    pub format: BlockFormat,
    pub content: String,
}

/// Result of an extraction call: cleaned text plus the block table.
///
/// Created and consumed within a single render call; never persisted.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub text: String,
    pub blocks: Vec<VisualBlock>,
}

pub(crate) fn placeholder(id: u64) -> String {
    format!("@@visual-block-{id}@@")
}

static VISUAL_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^```visual[ \t]*$\n(.*?)^```[ \t]*$").expect("static fence regex")
});

static VISUAL_SPEC_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^```visual-spec[ \t]*$\n(.*?)^```[ \t]*$").expect("static fence regex")
});

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^```json[ \t]*$\n(.*?)^```[ \t]*$").expect("static fence regex")
});

/// Extract with default policy.
#[must_use]
pub fn extract_visual_blocks(text: &str, mode: RenderMode) -> Extraction {
    extract_visual_blocks_with(text, mode, &ExtractOptions::default())
}

/// Extract with explicit heuristic policy.
#[must_use]
pub fn extract_visual_blocks_with(
    text: &str,
    mode: RenderMode,
    options: &ExtractOptions,
) -> Extraction {
    let mut extractor = Extractor::default();
    let text = extractor.fenced_pass(text, &VISUAL_FENCE, BlockFormat::Jsonl, |_| true);
    let text = extractor.fenced_pass(&text, &VISUAL_SPEC_FENCE, BlockFormat::Json, |_| true);
    let text = extractor.fenced_pass(&text, &JSON_FENCE, BlockFormat::Json, is_recognized_spec);
    let text = extractor.heuristic_pass(&text, mode, options);
    Extraction {
        text,
        blocks: extractor.blocks,
    }
}

/// Per-call extraction context: the id counter and the accumulated table.
#[derive(Debug, Default)]
struct Extractor {
    next_id: u64,
    blocks: Vec<VisualBlock>,
}

impl Extractor {
    /// Record a block and hand back the placeholder token that stands in
    /// for it in the text.
    fn allocate(&mut self, format: BlockFormat, content: String) -> String {
        let id = self.next_id;
        self.next_id += 1;
        self.blocks.push(VisualBlock {
            id,
            format,
            content,
        });
        placeholder(id)
    }

    fn fenced_pass(
        &mut self,
        text: &str,
        fence: &Regex,
        format: BlockFormat,
        accept: impl Fn(&str) -> bool,
    ) -> String {
        let mut replacements: Vec<(usize, usize, String)> = Vec::new();
        for caps in fence.captures_iter(text) {
            let whole = caps.get(0).expect("regex match has a whole span");
            let content = caps.get(1).map_or("", |m| m.as_str());
            let content = content.strip_suffix('\n').unwrap_or(content);
            if accept(content) {
                let token = self.allocate(format, content.to_string());
                replacements.push((whole.start(), whole.end(), token));
            }
        }

        let mut out = text.to_string();
        for (start, end, token) in replacements.into_iter().rev() {
            out.replace_range(start..end, &token);
        }
        out
    }

    fn heuristic_pass(&mut self, text: &str, mode: RenderMode, options: &ExtractOptions) -> String {
        let mut out = String::with_capacity(text.len());
        // Raw lines (terminators included) accumulated for the open candidate.
        let mut candidate: Vec<&str> = Vec::new();
        let mut patch_lines = 0usize;
        let mut blanks: Vec<&str> = Vec::new();

        for line in text.split_inclusive('\n') {
            let trimmed = line.trim();
            if is_patch_line(trimmed) {
                // Buffered blanks between patch lines join the span.
                candidate.append(&mut blanks);
                candidate.push(line);
                patch_lines += 1;
            } else if trimmed.is_empty() && patch_lines > 0 && options.buffer_blank_lines {
                blanks.push(line);
            } else {
                self.close_candidate(&mut out, &mut candidate, &mut patch_lines, options, true);
                for blank in blanks.drain(..) {
                    out.push_str(blank);
                }
                out.push_str(line);
            }
        }

        // End of input. A streamed prefix may still be receiving the block,
        // so only the final render commits a trailing candidate.
        let commit = matches!(mode, RenderMode::Final);
        self.close_candidate(&mut out, &mut candidate, &mut patch_lines, options, commit);
        for blank in blanks.drain(..) {
            out.push_str(blank);
        }
        out
    }

    fn close_candidate(
        &mut self,
        out: &mut String,
        candidate: &mut Vec<&str>,
        patch_lines: &mut usize,
        options: &ExtractOptions,
        commit: bool,
    ) {
        if candidate.is_empty() {
            return;
        }
        let raw = candidate.concat();
        if commit && *patch_lines >= options.min_patch_lines {
            let had_newline = raw.ends_with('\n');
            let content = raw.strip_suffix('\n').unwrap_or(&raw).to_string();
            tracing::debug!(lines = *patch_lines, "extracted unfenced patch block");
            let token = self.allocate(BlockFormat::Jsonl, content);
            out.push_str(&token);
            if had_newline {
                out.push('\n');
            }
        } else {
            // A lone qualifying line is not confident enough; restore it.
            out.push_str(&raw);
        }
        candidate.clear();
        *patch_lines = 0;
    }
}

/// A bare line that looks like one JSON-patch operation.
fn is_patch_line(trimmed: &str) -> bool {
    trimmed.starts_with("{\"op\"") && trimmed.contains("\"path\"")
}

/// Shape gate for the fallback ```json pass: a nested
/// `{"root": {"type":…, "props":…}}` or a flat
/// `{"root": …, "elements": {…}}`.
fn is_recognized_spec(content: &str) -> bool {
    let Ok(value) = serde_json::from_str::<Value>(content) else {
        return false;
    };
    let Value::Object(map) = value else {
        return false;
    };
    let Some(root) = map.get("root") else {
        return false;
    };
    let nested = matches!(
        root,
        Value::Object(fields) if fields.contains_key("type") && fields.contains_key("props")
    );
    let flat = map.get("elements").is_some_and(Value::is_object);
    nested || flat
}
