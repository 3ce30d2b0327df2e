/// Canonical form of a join key: case-folded with every whitespace
/// character removed, interior runs included.
///
/// Keys that normalize identically are treated as exactly equal when
/// grouping rows at the merge frontier, regardless of similarity score.
pub fn normalize_key(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
