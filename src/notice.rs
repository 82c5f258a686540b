//! Notification text shaping.
//!
//! IRC messages are size-limited, so the notice is fitted into a fixed
//! character budget that covers the whole decorated line: bracketed label,
//! message body, and parenthesized link. The body is what gives way when
//! the budget is tight.

/// Total character budget for one formatted notice.
pub const MAX_NOTICE_LENGTH: usize = 400;

/// Marker appended to a truncated body.
const ELLIPSIS: &str = "...";

/// Render `[label] message (link)` within [`MAX_NOTICE_LENGTH`] characters.
///
/// Line breaks inside the message are flattened to spaces first; IRC has no
/// multi-line messages. If the flattened body exceeds the remaining budget
/// it is cut and suffixed with `...`, which makes the truncated output
/// exactly [`MAX_NOTICE_LENGTH`] characters long. An empty link drops the
/// parenthesized part entirely. Counting is in characters, so truncation
/// never splits a multi-byte sequence.
pub fn format_notice(label: &str, message: &str, link: &str) -> String {
    let flat = message.lines().collect::<Vec<_>>().join(" ");

    // "[", "] " around the label; " (", ")" around the link when present.
    let decoration = if link.is_empty() {
        label.chars().count() + 3
    } else {
        label.chars().count() + link.chars().count() + 6
    };
    let budget = MAX_NOTICE_LENGTH.saturating_sub(decoration);

    let body = if flat.chars().count() > budget {
        let kept: String = flat
            .chars()
            .take(budget.saturating_sub(ELLIPSIS.len()))
            .collect();
        format!("{kept}{ELLIPSIS}")
    } else {
        flat
    };

    if link.is_empty() {
        format!("[{label}] {body}")
    } else {
        format!("[{label}] {body} ({link})")
    }
}
