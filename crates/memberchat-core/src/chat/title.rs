//! Conversation titles derived from the opening message.

/// Maximum title length in characters, including the ellipsis.
pub const MAX_TITLE_CHARS: usize = 60;

/// Title used when the opening message has no visible text.
pub const DEFAULT_TITLE: &str = "New conversation";

const ELLIPSIS: &str = "...";

/// Derive a title: whitespace collapsed, truncated on a char boundary.
pub fn derive_title(first_message: &str) -> String {
    let collapsed = first_message.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return DEFAULT_TITLE.to_string();
    }

    if collapsed.chars().count() <= MAX_TITLE_CHARS {
        return collapsed;
    }

    let keep = MAX_TITLE_CHARS - ELLIPSIS.len();
    let mut title: String = collapsed.chars().take(keep).collect();
    title.truncate(title.trim_end().len());
    title.push_str(ELLIPSIS);
    title
}
