//! Input validation for the store boundary and the command line.
//!
//! Plan ranks accept their symbolic names or a synonym. Three-tier
//! resolution: exact match → synonym lookup → error with suggestion.

use crate::error::{Error, Result};
use crate::model::PlanType;
use std::collections::HashMap;
use std::sync::LazyLock;

// ── Synonym map ──────────────────────────────────────────────

pub static PLAN_TYPE_SYNONYMS: LazyLock<HashMap<&str, PlanType>> = LazyLock::new(|| {
    [
        ("five-year", PlanType::FiveYear),
        ("fiveyear", PlanType::FiveYear),
        ("5y", PlanType::FiveYear),
        ("5-year", PlanType::FiveYear),
        ("vision", PlanType::FiveYear),
        ("annual", PlanType::Year),
        ("yearly", PlanType::Year),
        ("y", PlanType::Year),
        ("quarterly", PlanType::Quarter),
        ("q", PlanType::Quarter),
        ("monthly", PlanType::Month),
        ("milestone", PlanType::Month),
        ("m", PlanType::Month),
        ("weekly", PlanType::Week),
        ("action", PlanType::Week),
        ("w", PlanType::Week),
    ]
    .into_iter()
    .collect()
});

/// Trim a title and reject it when nothing is left.
///
/// # Errors
///
/// Returns `Error::RequiredField("title")` for blank input.
pub fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::RequiredField("title"));
    }
    Ok(trimmed.to_string())
}

/// Normalize a plan rank via exact match or synonym lookup.
///
/// Returns the rank, or the original input and an optional suggestion.
pub fn normalize_plan_type(input: &str) -> std::result::Result<PlanType, (String, Option<String>)> {
    let upper = input.trim().to_uppercase().replace('-', "_");

    // Tier 1: symbolic name
    if let Some(t) = PlanType::parse(&upper) {
        return Ok(t);
    }

    // Tier 2: synonym lookup
    let lower = input.trim().to_lowercase();
    if let Some(&t) = PLAN_TYPE_SYNONYMS.get(lower.as_str()) {
        return Ok(t);
    }

    // Tier 3: closest suggestion
    Err((input.to_string(), find_closest_match(&lower)))
}

/// Parse a plan rank for the command line, mapping failures to `Error`.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` naming the closest valid rank, if any.
pub fn parse_plan_type(input: &str) -> Result<PlanType> {
    normalize_plan_type(input).map_err(|(value, suggestion)| {
        let message = match suggestion {
            Some(s) => format!("unknown plan type '{value}' (did you mean {s}?)"),
            None => format!("unknown plan type '{value}'"),
        };
        Error::InvalidArgument(message)
    })
}

/// Enforce the rank edge: a plan's parent sits exactly one rank above it,
/// and only 5-year visions have no parent.
///
/// `parent` is the rank of the referenced parent, or `None` when the plan
/// has no parent.
///
/// # Errors
///
/// `MissingParent` when a non-root plan has no parent, `InvalidParent` when
/// the parent's rank is wrong (including any parent on a root plan).
pub fn check_parent_rank(child: PlanType, parent: Option<PlanType>) -> Result<()> {
    match (child.parent_type(), parent) {
        (None, None) => Ok(()),
        (Some(_), None) => Err(Error::MissingParent { plan_type: child }),
        (expected, Some(actual)) if expected == Some(actual) => Ok(()),
        (_, Some(actual)) => Err(Error::InvalidParent {
            child,
            parent: actual,
        }),
    }
}

/// Find the closest rank name across symbolic names and synonyms.
fn find_closest_match(input: &str) -> Option<String> {
    let names = PlanType::ALL.map(|t| t.as_str().to_lowercase());
    let mut best: Option<(PlanType, usize)> = None;

    let candidates = PlanType::ALL
        .iter()
        .zip(names.iter())
        .map(|(t, name)| (*t, name.as_str()))
        .chain(PLAN_TYPE_SYNONYMS.iter().map(|(name, t)| (*t, *name)));

    for (t, name) in candidates {
        // Single-letter synonyms match almost anything
        if name.len() < 3 {
            continue;
        }
        let dist = levenshtein_distance(input, name);
        if dist <= 3 && best.is_none_or(|(_, d)| dist < d) {
            best = Some((t, dist));
        }
    }

    best.map(|(t, _)| t.as_str().to_string())
}

// ── Levenshtein distance ─────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
#[must_use]
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let a_len = a.len();
    let b_len = b.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    // Single-row optimization (O(min(m,n)) space)
    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for i in 1..=a_len {
        curr[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1) // deletion
                .min(curr[j - 1] + 1) // insertion
                .min(prev[j - 1] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}
