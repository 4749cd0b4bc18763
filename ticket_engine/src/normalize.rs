//! Rule-based cleanup of candidate and office labels.
//!
//! Everything here is deterministic and element-wise: no fuzzy logic, no
//! cross-label context. The step order matters, later steps assume the
//! earlier cleanup has already run. Applying the pipeline twice yields the
//! same output as applying it once.

/// Tokens representing non-candidate ballot categories (void ballots,
/// running totals, over/under votes) and their canonical spellings.
const PROCEDURALS: &[(&str, &str)] = &[
    ("VOIDS", "VOID"),
    ("BLANKS", "BLANK"),
    ("TOTALS", "BALLOTS"),
    ("TOTAL", "BALLOTS"),
    ("TOTAL VOTES", "BALLOTS"),
    ("BALLOTS CAST", "BALLOTS"),
    ("OVER VOTES", "OVER"),
    ("UNDER VOTES", "UNDER"),
    ("SCATTERING", "SCATTER"),
];

/// Joint-ticket delimiters. A label like "A / B" lists a ticket of two
/// running mates; only the head name is kept.
const DELIMS: &[&str] = &["/", "\\", " AND "];

/// Leading party tags occasionally glued onto candidate names.
const PARTY_TAGS: &[&str] = &["REP", "DEM", "IND"];

/// Normalizes a batch of candidate labels. Order-preserving.
pub fn normalize_candidates(labels: &[String]) -> Vec<String> {
    labels.iter().map(|l| normalize_candidate(l)).collect()
}

/// Normalizes a batch of office labels. Order-preserving.
pub fn normalize_offices(labels: &[String]) -> Vec<String> {
    labels.iter().map(|l| normalize_office(l)).collect()
}

/// Full cleanup of one candidate label.
pub fn normalize_candidate(label: &str) -> String {
    let mut s = substitute_chars(&label.trim().to_uppercase());
    s = map_procedural(&s);
    s = truncate_at_delimiter(&s);
    s = s.replace("WRITE IN ", "WRITE INS ");
    s = collapse_whitespace(&s);
    s = strip_affixes(&s);
    canonicalize_write_in(&s)
}

/// Cleanup of one office label: case, characters and whitespace only.
pub fn normalize_office(label: &str) -> String {
    collapse_whitespace(&substitute_chars(&label.trim().to_uppercase()))
}

fn substitute_chars(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '.' | ',' | ':' | '"' | '\u{201c}' | '\u{201d}' => {}
            '-' | '\'' => out.push(' '),
            '&' => out.push_str("AND"),
            _ => out.push(c),
        }
    }
    out
}

fn map_procedural(s: &str) -> String {
    for (from, to) in PROCEDURALS {
        if s == *from {
            return (*to).to_string();
        }
    }
    s.to_string()
}

fn truncate_at_delimiter(s: &str) -> String {
    let mut out = s.to_string();
    for d in DELIMS {
        if let Some(idx) = out.find(d) {
            out.truncate(idx);
        }
    }
    out
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Cuts party tags, parenthetical asides and quoted nicknames out of an
/// already uppercased, whitespace-collapsed label.
fn strip_affixes(s: &str) -> String {
    let mut out = s.to_string();
    for tag in PARTY_TAGS {
        if let Some(rest) = out.strip_prefix(tag) {
            out = rest.to_string();
            break;
        }
    }
    out = remove_span(&out, '(', ')');
    out = remove_span(&out, '"', '"');
    collapse_whitespace(&out)
}

// Removes the widest span between the two markers, markers included.
fn remove_span(s: &str, open: char, close: char) -> String {
    match (s.find(open), s.rfind(close)) {
        (Some(i), Some(j)) if j > i => {
            let mut out = String::with_capacity(s.len());
            out.push_str(&s[..i]);
            out.push_str(&s[j + close.len_utf8()..]);
            out
        }
        _ => s.to_string(),
    }
}

/// Reduces a write-in label to the candidate name preceding the token.
/// A bare or unqualified write-in collapses to exactly "WRITE INS".
fn canonicalize_write_in(s: &str) -> String {
    match s.find("WRITE INS") {
        Some(idx) => {
            let prefix = s[..idx].trim();
            if prefix.is_empty() || prefix == "UNQUALIFIED" {
                "WRITE INS".to_string()
            } else {
                prefix.to_string()
            }
        }
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_and_case() {
        assert_eq!(normalize_candidate("SMITH, JOHN D."), "SMITH JOHN D");
        assert_eq!(normalize_candidate("Smith John D."), "SMITH JOHN D");
        assert_eq!(normalize_candidate("  SMITH JOHN D "), "SMITH JOHN D");
    }

    #[test]
    fn hyphen_and_apostrophe_become_spaces() {
        assert_eq!(normalize_candidate("O'BRIEN, MARY-JO"), "O BRIEN MARY JO");
    }

    #[test]
    fn procedural_tokens() {
        assert_eq!(normalize_candidate(" over votes "), "OVER");
        assert_eq!(normalize_candidate("UNDER VOTES"), "UNDER");
        assert_eq!(normalize_candidate("Ballots Cast"), "BALLOTS");
        assert_eq!(normalize_candidate("SCATTERING"), "SCATTER");
        assert_eq!(normalize_candidate("VOIDS"), "VOID");
    }

    #[test]
    fn joint_tickets_keep_the_head_name() {
        assert_eq!(normalize_candidate("OBAMA / BIDEN"), "OBAMA");
        assert_eq!(normalize_candidate("OBAMA \\ BIDEN"), "OBAMA");
        assert_eq!(normalize_candidate("OBAMA AND BIDEN"), "OBAMA");
        // Ampersands turn into AND before the delimiter split runs.
        assert_eq!(normalize_candidate("OBAMA & BIDEN"), "OBAMA");
    }

    #[test]
    fn party_tags_and_asides() {
        assert_eq!(normalize_candidate("REP JANE DOE"), "JANE DOE");
        assert_eq!(normalize_candidate("JANE DOE"), "JANE DOE");
        assert_eq!(normalize_candidate("DEM JOHN ROE"), "JOHN ROE");
        assert_eq!(normalize_candidate("JANE (INCUMBENT) DOE"), "JANE DOE");
    }

    #[test]
    fn write_in_variants() {
        // The singular form is unified first, so a leading "WRITE IN" leaves
        // no prefix to keep.
        assert_eq!(normalize_candidate("WRITE IN JONES"), "WRITE INS");
        assert_eq!(normalize_candidate("JONES WRITE INS"), "JONES");
        assert_eq!(normalize_candidate("JONES WRITE IN"), "JONES WRITE IN");
        assert_eq!(normalize_candidate("WRITE INS"), "WRITE INS");
        assert_eq!(normalize_candidate("UNQUALIFIED WRITE INS"), "WRITE INS");
    }

    #[test]
    fn offices_only_get_the_light_cleanup() {
        assert_eq!(normalize_office("  u.s. senate "), "US SENATE");
        // No write-in or procedural handling for offices.
        assert_eq!(normalize_office("WRITE IN AUDITOR"), "WRITE IN AUDITOR");
    }

    #[test]
    fn idempotent_on_clean_labels() {
        let raw = vec![
            "SMITH, JOHN D.".to_string(),
            "rep jane doe".to_string(),
            "UNQUALIFIED WRITE INS".to_string(),
            "OVER VOTES".to_string(),
            "OBAMA / BIDEN".to_string(),
        ];
        let once = normalize_candidates(&raw);
        let twice = normalize_candidates(&once);
        assert_eq!(once, twice);

        let offices = vec!["U.S.  Senate".to_string(), "state   auditor".to_string()];
        let once = normalize_offices(&offices);
        let twice = normalize_offices(&once);
        assert_eq!(once, twice);
    }
}
