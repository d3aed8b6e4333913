/// Validates a stored-file name before it is allowed anywhere near the
/// filesystem: a 5-character alphanumeric identifier, a dot, and a 2-4
/// character alphanumeric extension. Anything else (path separators,
/// traversal sequences, odd lengths) is rejected.
pub fn is_valid_filename(name: &str) -> bool {
    let Some((id, ext)) = name.split_once('.') else {
        return false;
    };

    id.len() == 5
        && id.bytes().all(|b| b.is_ascii_alphanumeric())
        && (2..=4).contains(&ext.len())
        && ext.bytes().all(|b| b.is_ascii_alphanumeric())
}
