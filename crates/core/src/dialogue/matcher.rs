/// Resolve a free-text choice against an ordered candidate list.
///
/// Two passes: trimmed case-insensitive exact equality first, then
/// case-insensitive substring containment (the input inside the candidate
/// name). The first match in original candidate order wins; there is no
/// scoring and no edit-distance fallback, so the result is deterministic for
/// a given input and listing order.
pub fn resolve<'a, T, F>(input: &str, candidates: &'a [T], name_of: F) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    if let Some(exact) = candidates.iter().find(|c| name_of(c).trim().to_lowercase() == needle) {
        return Some(exact);
    }

    candidates.iter().find(|c| name_of(c).to_lowercase().contains(&needle))
}
