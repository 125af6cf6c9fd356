//! Token-level text similarity metrics for comparing answers with references.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Anything that is not a word char, whitespace, digit, other-number
/// (`½`, `²`), `đ` or `₫`.
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s\d\p{No}đ₫]").expect("valid regex"));

/// Lowercase, collapse whitespace, strip punctuation.
///
/// Input is composed to NFC first so decomposed Vietnamese (`o` + U+031B +
/// U+0309) compares equal to the precomposed `ở`. Marks that have no
/// precomposed form survive, since `\w` includes combining marks.
pub fn normalize_text(text: &str) -> String {
    let composed: String = text.nfc().collect();
    let lowered = composed.to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    PUNCTUATION.replace_all(&collapsed, "").into_owned()
}

fn tokens(text: &str) -> Vec<String> {
    normalize_text(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

pub fn exact_match(predicted: &str, reference: &str) -> f64 {
    if normalize_text(predicted) == normalize_text(reference) {
        1.0
    } else {
        0.0
    }
}

/// F1 over the sets of distinct tokens.
pub fn f1_score(predicted: &str, reference: &str) -> f64 {
    let pred: HashSet<String> = tokens(predicted).into_iter().collect();
    let refs: HashSet<String> = tokens(reference).into_iter().collect();
    if pred.is_empty() || refs.is_empty() {
        return 0.0;
    }

    let common = pred.intersection(&refs).count();
    if common == 0 {
        return 0.0;
    }

    let precision = common as f64 / pred.len() as f64;
    let recall = common as f64 / refs.len() as f64;
    2.0 * precision * recall / (precision + recall)
}

fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    if n == 0 || tokens.len() < n {
        return counts;
    }
    for gram in tokens.windows(n) {
        *counts.entry(gram).or_insert(0) += 1;
    }
    counts
}

/// Clipped n-gram precision of `predicted` against `reference`, without
/// brevity penalty. Zero when either side has fewer than `n` tokens.
pub fn bleu(predicted: &str, reference: &str, n: usize) -> f64 {
    let pred_tokens = tokens(predicted);
    let ref_tokens = tokens(reference);
    let pred = ngram_counts(&pred_tokens, n);
    let refs = ngram_counts(&ref_tokens, n);
    if pred.is_empty() || refs.is_empty() {
        return 0.0;
    }

    let overlap: usize = pred
        .iter()
        .map(|(gram, &count)| count.min(refs.get(gram).copied().unwrap_or(0)))
        .sum();
    let total: usize = pred.values().sum();

    if total == 0 {
        0.0
    } else {
        overlap as f64 / total as f64
    }
}

/// Length of the longest common subsequence of two token sequences.
fn lcs_length(a: &[String], b: &[String]) -> usize {
    // Rolling single row of the DP table
    let mut row = vec![0usize; b.len() + 1];
    for x in a {
        let mut diag = 0;
        for (j, y) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if x == y {
                diag + 1
            } else {
                above.max(row[j])
            };
            diag = above;
        }
    }
    row[b.len()]
}

/// ROUGE-L F-measure from the LCS of the token sequences.
pub fn rouge_l(predicted: &str, reference: &str) -> f64 {
    let pred = tokens(predicted);
    let refs = tokens(reference);
    if pred.is_empty() || refs.is_empty() {
        return 0.0;
    }

    let lcs = lcs_length(&pred, &refs) as f64;
    let precision = lcs / pred.len() as f64;
    let recall = lcs / refs.len() as f64;
    if precision + recall == 0.0 {
        return 0.0;
    }
    2.0 * precision * recall / (precision + recall)
}
