//! Response cleanup for LLM outputs.
//!
//! Models asked for bare SQL still sometimes wrap it in a markdown code
//! block; this strips that wrapper and nothing else.

/// Removes a surrounding markdown code fence from generated text.
///
/// If the trimmed text starts with ```` ``` ````, the first line (the
/// opening fence with any language tag) is dropped, and the last line is
/// dropped too when it is a bare closing fence. The remainder is trimmed.
/// Text without a leading fence is only trimmed.
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let lines: Vec<&str> = trimmed.split('\n').collect();
    let end = match lines.last() {
        Some(last) if lines.len() > 1 && last.trim() == "```" => lines.len() - 1,
        _ => lines.len(),
    };

    lines[1..end].join("\n").trim().to_string()
}
