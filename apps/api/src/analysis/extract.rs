//! Contact detail extraction over raw resume text.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email pattern")
});

/// Ten digits, optionally grouped, with an optional `+<country code>` prefix. The number
/// must stand on its own: it may not start or end inside a longer run of digits.
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9+])((?:\+\d{1,3}[-. ]?)?\(?\d{3}\)?[-. ]?\d{3}[-. ]?\d{4})\b")
        .expect("phone pattern")
});

const NAME_MIN_CHARS: usize = 3;
const NAME_MAX_CHARS: usize = 49;

/// First non-blank line, if it looks like a name rather than a contact line or a paragraph.
pub fn extract_name(content: &str) -> Option<String> {
    let line = content.lines().map(str::trim).find(|l| !l.is_empty())?;
    let len = line.chars().count();
    if (NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) && !line.contains('@') {
        Some(line.to_string())
    } else {
        None
    }
}

pub fn extract_email(content: &str) -> Option<String> {
    EMAIL_PATTERN.find(content).map(|m| m.as_str().to_string())
}

pub fn extract_phone(content: &str) -> Option<String> {
    PHONE_PATTERN
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
