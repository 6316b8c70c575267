//! Rendering of reviewed attempts as chat messages.
//!
//! Messages use Telegram's HTML parse mode so the lesson title becomes a link.

use crate::models::ReviewAttempt;

/// Verdict line for work returned with errors.
pub const NEGATIVE_VERDICT: &str = "Unfortunately, the reviewer found errors in your work.";

/// Verdict line for accepted work.
pub const APPROVED_VERDICT: &str =
    "The reviewer approved your work, you can proceed to the next lesson!";

/// Build the notification text for a reviewed attempt.
///
/// # Example
///
/// ```
/// use reviewbot_core::{format_attempt, ReviewAttempt};
///
/// let attempt = ReviewAttempt::new("Lesson 1", "https://dvmn.org/lessons/1/", false);
/// let message = format_attempt(&attempt);
/// assert!(message.contains(r#"<a href="https://dvmn.org/lessons/1/">Lesson 1</a>"#));
/// ```
pub fn format_attempt(attempt: &ReviewAttempt) -> String {
    let verdict = if attempt.is_negative {
        NEGATIVE_VERDICT
    } else {
        APPROVED_VERDICT
    };

    format!(
        "Your work \"<a href=\"{}\">{}</a>\" has been reviewed.\n\n{}\n",
        escape_html(&attempt.lesson_url),
        escape_html(&attempt.lesson_title),
        verdict
    )
}

/// Escape the characters Telegram's HTML parser treats as markup.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
