use std::collections::HashSet;

/// Case-insensitive substring filter that keeps only the most recent copy of
/// each distinct matching entry.
///
/// `entries` is oldest first and so is the result. An empty `term` returns
/// every entry unchanged.
pub fn filter_recent_unique<'a, I>(entries: I, term: &str) -> Vec<String>
where
    I: DoubleEndedIterator<Item = &'a str>,
{
    if term.is_empty() {
        return entries.map(str::to_string).collect();
    }

    let needle = fold_case(term);
    let mut seen: HashSet<&str> = HashSet::new();
    let mut kept: Vec<String> = Vec::new();

    for entry in entries.rev() {
        if seen.contains(entry) || !fold_case(entry).contains(&needle) {
            continue;
        }
        seen.insert(entry);
        kept.push(entry.to_string());
    }

    kept.reverse();
    kept
}

/// Per-character lowercase with final sigma folded onto medial sigma, so
/// matching does not depend on where a letter sits in a word.
fn fold_case(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'ς' { 'σ' } else { c })
        .collect()
}
