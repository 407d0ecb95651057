//! Terminal escape sequence stripping.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Matches CSI/OSC sequences introduced by ESC or the 8-bit CSI byte.
static ANSI_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[\x1B\x{9B}][\[\]()#;?]*(?:(?:(?:[a-zA-Z\d]*(?:;[a-zA-Z\d]*)*)?\x07)|(?:(?:\d{1,4}(?:;\d{0,4})*)?[\dA-PRZcf-ntqry=><~]))",
    )
    .expect("ANSI pattern is valid")
});

/// Remove color and cursor escape sequences from `text`.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    ANSI_REGEX.replace_all(text, "")
}
