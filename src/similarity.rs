//! Ratcliff/Obershelp similarity between normalized keys.

/// Matching ratio in [0.0, 1.0]: twice the total matched character count
/// over the combined length of both strings. Matched characters come from
/// repeatedly taking the longest common contiguous run and recursing on
/// the unmatched remainders on each side.
///
/// Arguments are ordered canonically before scoring, so the greedy
/// tie-break between equally long runs cannot make `similarity(a, b)`
/// differ from `similarity(b, a)`. Two empty strings score 1.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let (a, b) = if a <= b { (a, b) } else { (b, a) };
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = matched_chars(&a, &b);
    2.0 * matched as f64 / total as f64
}

fn matched_chars(a: &[char], b: &[char]) -> usize {
    let (ai, bi, len) = longest_common_run(a, b);
    if len == 0 {
        return 0;
    }
    len + matched_chars(&a[..ai], &b[..bi]) + matched_chars(&a[ai + len..], &b[bi + len..])
}

/// Start positions and length of the longest common contiguous run,
/// preferring the earliest occurrence in `a`, then in `b`, on ties.
fn longest_common_run(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    // prev[j+1] holds the run length ending at a[i-1], b[j]
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                let run = prev[j] + 1;
                row[j + 1] = run;
                if run > best.2 {
                    best = (i + 1 - run, j + 1 - run, run);
                }
            } else {
                row[j + 1] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut row);
    }
    best
}
