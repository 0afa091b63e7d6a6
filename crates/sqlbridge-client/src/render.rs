//! Text rendering of tool results for display.
//!
//! Truncation happens here, never in the executor.

use sqlbridge_core::protocol::CallToolResult;

/// Longest rendering shown before truncation, in characters.
pub const MAX_RENDERED_CHARS: usize = 50_000;

pub const TRUNCATION_NOTICE: &str = "\n\n...(response truncated due to size)...";

pub const RAW_TRUNCATION_NOTICE: &str =
    "\n\n...(response truncated due to size, check server logs for full output)...";

/// Render a tool result.
///
/// A leading text part is pretty-printed when it holds JSON and shown as-is
/// otherwise. Results without a leading text part are shown as the whole
/// result in pretty JSON.
pub fn render_result(result: &CallToolResult) -> String {
    match result.first_text() {
        Some(text) => {
            let rendered = serde_json::from_str::<serde_json::Value>(text)
                .ok()
                .and_then(|json| serde_json::to_string_pretty(&json).ok())
                .unwrap_or_else(|| text.to_string());
            truncate(rendered, TRUNCATION_NOTICE)
        }
        None => {
            let rendered = serde_json::to_string_pretty(result)
                .unwrap_or_else(|e| format!("Error: failed to render result: {}", e));
            truncate(rendered, RAW_TRUNCATION_NOTICE)
        }
    }
}

/// Keep the first [`MAX_RENDERED_CHARS`] characters and append `notice`.
pub fn truncate(text: String, notice: &str) -> String {
    match text.char_indices().nth(MAX_RENDERED_CHARS) {
        Some((cut, _)) => {
            let mut out = text;
            out.truncate(cut);
            out.push_str(notice);
            out
        }
        None => text,
    }
}
