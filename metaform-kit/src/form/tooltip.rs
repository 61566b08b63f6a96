//! Tooltip text normalization.

/// Escaped newline spellings, combined form first.
///
/// Checking `\n` or `\r` before `\r\n` would leave half of a combined
/// escape behind.
const ESCAPES: [&str; 3] = ["\\r\\n", "\\n", "\\r"];

/// Normalize a raw tooltip.
///
/// The first escape spelling found is replaced everywhere with a real CRLF.
/// An absent or empty tip clears the tooltip.
pub fn normalize_tooltip(raw: Option<&str>) -> Option<String> {
    let raw = raw.filter(|t| !t.is_empty())?;

    match ESCAPES.iter().find(|escape| raw.contains(**escape)) {
        Some(escape) => Some(raw.replace(*escape, "\r\n")),
        None => Some(raw.to_string()),
    }
}
