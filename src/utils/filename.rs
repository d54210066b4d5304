//! Filename sanitization for export paths.

/// Make a string safe to use as a filename across platforms.
///
/// Reserved characters and whitespace runs become single underscores, the
/// result is trimmed and capped at 50 characters, and an empty input falls
/// back to "scan".
pub fn sanitize_filename(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    for c in name.chars() {
        let mapped = match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() || c.is_whitespace() => '_',
            c => c,
        };
        if mapped == '_' && sanitized.ends_with('_') {
            continue;
        }
        sanitized.push(mapped);
    }

    let trimmed: String = sanitized
        .trim_matches(|c| c == '_' || c == '.')
        .chars()
        .take(50)
        .collect();
    let trimmed = trimmed.trim_end_matches(['_', '.']);

    if trimmed.is_empty() {
        "scan".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_reserved_characters() {
        assert_eq!(sanitize_filename("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_filename("report?.pdf"), "report_.pdf");
    }

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(sanitize_filename("march   invoice  3"), "march_invoice_3");
    }

    #[test]
    fn test_sanitize_trims_and_caps() {
        assert_eq!(sanitize_filename("__scan__"), "scan");
        assert_eq!(sanitize_filename(""), "scan");
        let long = "x".repeat(120);
        assert_eq!(sanitize_filename(&long).len(), 50);
    }
}
