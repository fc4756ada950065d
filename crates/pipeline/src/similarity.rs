//! Business-name similarity.
//!
//! Scores are Ratcliff/Obershelp ratios (`2·M / (|a| + |b|)`, where `M` is the
//! total size of the longest matching blocks) over normalized names. Matching
//! blocks tolerate truncation and dropped punctuation far better than edit
//! distance does for names like "Joe's Electric Ltd" / "Joes Electric".

use std::collections::HashMap;

/// Trailing legal-form tokens ignored when comparing names.
const LEGAL_SUFFIXES: [&str; 8] = [
    "ltd",
    "limited",
    "inc",
    "incorporated",
    "corp",
    "corporation",
    "co",
    "llc",
];

/// Similarity of two business names in `[0, 1]`.
///
/// Case-insensitive and symmetric; identical names score `1.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let (na, nb) = (normalize_name(a), normalize_name(b));
    if na.is_empty() || nb.is_empty() {
        return sequence_ratio(a, b);
    }
    sequence_ratio(&na, &nb)
}

/// Case-folded Ratcliff/Obershelp ratio with no name normalization.
///
/// The pair is compared in lexicographic order so the result never depends
/// on argument order.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let (first, second) = if a <= b { (a, b) } else { (b, a) };

    let first: Vec<char> = first.chars().collect();
    let second: Vec<char> = second.chars().collect();

    let total = first.len() + second.len();
    if total == 0 {
        return 1.0;
    }
    let matched = matching_characters(&first, &second);
    2.0 * matched as f64 / total as f64
}

/// Lower-case, drop apostrophes, fold punctuation to spaces and strip
/// trailing legal-form tokens while more than one token remains.
pub fn normalize_name(name: &str) -> String {
    let folded: String = name
        .to_lowercase()
        .chars()
        .filter(|c| *c != '\'' && *c != '\u{2019}')
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut tokens: Vec<&str> = folded.split_whitespace().collect();
    while tokens.len() > 1 {
        match tokens.last() {
            Some(last) if LEGAL_SUFFIXES.contains(last) => {
                tokens.pop();
            }
            _ => break,
        }
    }
    tokens.join(" ")
}

/// Total size of the matching blocks between `a` and `b`.
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        b2j.entry(*c).or_default().push(j);
    }

    let mut total = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, size) = longest_match(a, &b2j, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        total += size;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            queue.push((i + size, ahi, j + size, bhi));
        }
    }
    total
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]`.
///
/// Returns `(i, j, size)`; ties resolve to the earliest block in `a`, then `b`.
fn longest_match(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
    // j -> length of the match ending at (i - 1, j)
    let mut run_lengths: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b2j.get(c) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let prev = if j == 0 {
                    0
                } else {
                    run_lengths.get(&(j - 1)).copied().unwrap_or(0)
                };
                let k = prev + 1;
                next.insert(j, k);
                if k > best_size {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_size = k;
                }
            }
        }
        run_lengths = next;
    }

    (best_i, best_j, best_size)
}
