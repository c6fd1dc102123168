//! Argument parsing for callback identifiers
//!
//! Formats:
//! - `task_view_12`, `confirm_delete_task12`: trailing task id
//! - `len_12_4096`, `set_min_12_5`: task id then value
//! - `settings_copy_3_9`: source then target task id
//! - `preset_apply_12_fast`: task id then preset name (may contain `_`)
//! - `set_mode_quote_12`: mode then task id
//! - `source_remove_12_-1001234`: task id then chat id

/// The run of ASCII digits ending the identifier.
pub fn trailing_number(id: &str) -> Option<i64> {
    let head = id.trim_end_matches(|c: char| c.is_ascii_digit());
    id[head.len()..].parse().ok()
}

/// `<a>_<b>` after `prefix`.
pub fn two_numbers(id: &str, prefix: &str) -> Option<(i64, i64)> {
    let (a, b) = id.strip_prefix(prefix)?.split_once('_')?;
    Some((a.parse().ok()?, b.parse().ok()?))
}

/// `<task_id>_<name>` after `prefix`; the name must not be blank.
pub fn task_and_name<'a>(id: &'a str, prefix: &str) -> Option<(i64, &'a str)> {
    let (task, name) = id.strip_prefix(prefix)?.split_once('_')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((task.parse().ok()?, name))
}

/// Non-blank remainder after `prefix`.
pub fn suffix<'a>(id: &'a str, prefix: &str) -> Option<&'a str> {
    id.strip_prefix(prefix).map(str::trim).filter(|rest| !rest.is_empty())
}

/// Typed chat reference: `-1001234567890 Optional title`.
pub fn chat_and_title(text: &str) -> Option<(i64, Option<&str>)> {
    let text = text.trim();
    let (id, title) = match text.split_once(char::is_whitespace) {
        Some((id, title)) => (id, Some(title.trim()).filter(|t| !t.is_empty())),
        None => (text, None),
    };
    Some((id.parse().ok()?, title))
}
