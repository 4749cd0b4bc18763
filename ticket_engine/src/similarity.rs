//! String similarity scores, expressed as integer percentages.
//!
//! Two measures are used by the engine: a plain edit-distance ratio for the
//! near-match audit, and an order-insensitive token-set ratio for the merge
//! decisions, so that "SMITH JOHN" and "JOHN SMITH" score 100.

use std::collections::BTreeSet;

use strsim::levenshtein;

/// Edit similarity between two strings, 0-100: the Levenshtein distance
/// normalized by the longer input.
pub fn ratio(a: &str, b: &str) -> u32 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 100;
    }
    let dist = levenshtein(a, b);
    ((1.0 - dist as f64 / max_len as f64) * 100.0).round() as u32
}

/// Token-set similarity, 0-100.
///
/// Both labels are split into unique, sorted word tokens. The shared tokens
/// and each side's leftover tokens are recombined into three strings that
/// are compared pairwise with [`ratio`]; the best score wins. Shared-word
/// overlap therefore dominates word order and repeated tokens.
pub fn token_set_ratio(a: &str, b: &str) -> u32 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    let shared = join_tokens(tokens_a.intersection(&tokens_b));
    let only_a = join_tokens(tokens_a.difference(&tokens_b));
    let only_b = join_tokens(tokens_b.difference(&tokens_a));

    let combined_a = join_parts(&shared, &only_a);
    let combined_b = join_parts(&shared, &only_b);

    [
        ratio(&shared, &combined_a),
        ratio(&shared, &combined_b),
        ratio(&combined_a, &combined_b),
    ]
    .into_iter()
    .max()
    .unwrap_or(0)
}

fn join_tokens<'a, I: Iterator<Item = &'a &'a str>>(tokens: I) -> String {
    tokens.cloned().collect::<Vec<&str>>().join(" ")
}

fn join_parts(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (_, true) => head.to_string(),
        _ => format!("{} {}", head, tail),
    }
}
