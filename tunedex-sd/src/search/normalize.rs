//! Display-name normalization for fuzzy matching
//!
//! Every string compared by the matcher goes through [`normalize`] first,
//! both candidate keys (computed once at catalog load) and incoming
//! queries (computed per request). Matching is only meaningful when both
//! sides use the identical pipeline.

/// Normalize a display name or query for comparison
///
/// Applies, in order:
/// 1. Lowercase
/// 2. Strip one leading `"the "` article
/// 3. Hyphens become spaces
/// 4. Runs of whitespace collapse to a single space
/// 5. Trim leading and trailing whitespace
///
/// The result may be empty (e.g. for `"The "` or all-whitespace input);
/// empty keys simply never match anything, they are not an error.
pub fn normalize(input: &str) -> String {
    let lower = input.to_lowercase();
    let rest = lower.strip_prefix("the ").unwrap_or(lower.as_str());

    let mut out = String::with_capacity(rest.len());
    for ch in rest.chars() {
        let ch = if ch == '-' { ' ' } else { ch };
        if ch.is_whitespace() {
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
        } else {
            out.push(ch);
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Normalize an optional display name; missing names yield an empty key
pub fn normalize_opt(input: Option<&str>) -> String {
    input.map(normalize).unwrap_or_default()
}
