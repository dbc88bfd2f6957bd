//! Keyword list handling
//!
//! The source accepts at most five terms per query and reports each query on
//! its own 0–100 scale, so long lists are either folded into `" + "` (OR)
//! terms or split into groups that all carry the benchmark term.

use crate::models::MAX_QUERY_TERMS;

/// Lists longer than this are folded into OR-terms when splitting is enabled
pub const KW_LIMIT: usize = 20;

/// Folded terms stay shorter than this many characters
pub const COMBINED_MAX_LEN: usize = 100;

/// Share of exact 1s above which a benchmark series is considered too weak
pub const TOO_SMALL_TOLERANCE: f64 = 0.2;

/// Separator the source interprets as OR between terms
pub const OR_SEPARATOR: &str = " + ";

/// Fold consecutive keywords into `" + "`-joined terms shorter than `max_len`
///
/// A keyword that is already longer than `max_len` forms a term on its own.
#[must_use]
pub fn combine_keywords<S: AsRef<str>>(keywords: &[S], max_len: usize) -> Vec<String> {
    let mut combined = Vec::new();
    let mut current: Option<String> = None;

    for keyword in keywords {
        let keyword = keyword.as_ref();
        current = Some(match current.take() {
            None => keyword.to_string(),
            Some(acc) => {
                let joined = format!("{acc}{OR_SEPARATOR}{keyword}");
                if joined.chars().count() < max_len {
                    joined
                } else {
                    combined.push(acc);
                    keyword.to_string()
                }
            }
        });
    }
    combined.extend(current);
    combined
}

/// Split `terms` into query groups led by `terms[0]`
///
/// Every group is `[anchor] + up to group_size - 1 further terms`. A
/// one-element list yields a single group holding only the anchor.
#[must_use]
pub fn search_groups<S: AsRef<str>>(terms: &[S], group_size: usize) -> Vec<Vec<String>> {
    let Some((anchor, rest)) = terms.split_first() else {
        return Vec::new();
    };
    let anchor = anchor.as_ref().to_string();
    if rest.is_empty() {
        return vec![vec![anchor]];
    }

    let step = group_size.clamp(2, MAX_QUERY_TERMS) - 1;
    rest.chunks(step)
        .map(|chunk| {
            std::iter::once(anchor.clone())
                .chain(chunk.iter().map(|t| t.as_ref().to_string()))
                .collect()
        })
        .collect()
}

/// Whether a series has any zero or more than `tol` of its values equal to 1
#[must_use]
pub fn too_small(values: &[f64], tol: f64) -> bool {
    if values.is_empty() {
        return true;
    }
    let zeros = values.iter().filter(|v| **v == 0.0).count();
    let ones = values.iter().filter(|v| **v == 1.0).count() as f64 / values.len() as f64;
    zeros > 0 || ones > tol
}
