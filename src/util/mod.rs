pub(crate) fn now_ms() -> i64 {
    js_sys::Date::now().round() as i64
}

/// Plain-text excerpt of markdown content for list cards.
///
/// Strips the inline markers that would look like noise in a one-line
/// preview; this is not a markdown parser and does not try to be.
pub(crate) fn excerpt(content: &str, max_chars: usize) -> String {
    if content.trim().is_empty() {
        return "This note has no content yet.".to_string();
    }

    let plain: String = content
        .chars()
        .filter(|c| !matches!(c, '*' | '_' | '#' | '`' | '~' | '>'))
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    let plain = plain.trim();

    if plain.chars().count() <= max_chars {
        return plain.to_string();
    }

    let cut: String = plain.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

/// "2024-05-02T11:30:45.123456Z" -> "2024-05-02 11:30".
///
/// Backend timestamps are ISO-8601; for list cards and the editor footer a
/// minute-resolution prefix is enough, so this avoids pulling in a date
/// library on the wasm side.
pub(crate) fn short_timestamp(iso: &str) -> String {
    let trimmed = iso.trim();
    match (trimmed.get(..10), trimmed.get(11..16)) {
        (Some(date), Some(time)) if trimmed.as_bytes().get(10) == Some(&b'T') => {
            format!("{date} {time}")
        }
        _ => trimmed.to_string(),
    }
}

/// Reading time estimate used in the editor footer (about 500 chars/minute).
pub(crate) fn read_minutes(content: &str) -> usize {
    let chars = content.chars().count();
    chars.div_ceil(500).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_strips_markdown_markers() {
        assert_eq!(excerpt("# Hello **world**", 60), "Hello world");
    }

    #[test]
    fn excerpt_truncates_long_content() {
        let long = "a".repeat(100);
        let e = excerpt(&long, 10);
        assert_eq!(e, format!("{}...", "a".repeat(10)));
    }

    #[test]
    fn excerpt_placeholder_for_empty_content() {
        assert_eq!(excerpt("   ", 60), "This note has no content yet.");
    }

    #[test]
    fn short_timestamp_formats_iso() {
        assert_eq!(
            short_timestamp("2024-05-02T11:30:45.123456Z"),
            "2024-05-02 11:30"
        );
    }

    #[test]
    fn short_timestamp_passes_through_unexpected_shapes() {
        assert_eq!(short_timestamp("yesterday"), "yesterday");
        assert_eq!(short_timestamp(""), "");
    }

    #[test]
    fn short_timestamp_passes_through_multibyte_lookalikes() {
        // Byte 10 is 'T' but the slice boundaries land inside multi-byte
        // characters; the input must come back untouched, not panic.
        let odd = "0123456789Tééé";
        assert_eq!(short_timestamp(odd), odd);
        assert_eq!(short_timestamp("あいうえおかきくけこTさしすせそ"), "あいうえおかきくけこTさしすせそ");
    }

    #[test]
    fn read_minutes_rounds_up_and_floors_at_one() {
        assert_eq!(read_minutes(""), 1);
        assert_eq!(read_minutes(&"x".repeat(499)), 1);
        assert_eq!(read_minutes(&"x".repeat(501)), 2);
    }
}
