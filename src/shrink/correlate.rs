//! Filtering of parallel lists.
//!
//! Several structures store one logical list as two vectors, e.g. the names of the
//! nested classes of a Kotlin class next to the classes they resolve to. Entry `i` of
//! the secondary list belongs to entry `i` of the primary list, and both must stay
//! aligned after filtering.

/// Filters `primary` by `keep` and drops the corresponding entries of `secondary`.
///
/// `keep[i]` decides entry `i` of both lists; entries past the end of `keep` are
/// kept. Afterwards `secondary` is truncated to the new length of `primary`, so a
/// secondary list that was longer than its primary loses the excess. A shorter
/// secondary list is never padded.
///
/// # Arguments
///
/// * `primary` - The list that defines the logical entries.
/// * `secondary` - The list running parallel to `primary`.
/// * `keep` - Retention decision per primary index.
///
/// # Examples
///
/// ```rust
/// use classhrink::shrink::retain_correlated;
///
/// let mut names = vec!["A", "B", "C"];
/// let mut ids = vec![1, 2, 3];
/// retain_correlated(&mut names, &mut ids, &[true, false, true]);
///
/// assert_eq!(names, ["A", "C"]);
/// assert_eq!(ids, [1, 3]);
/// ```
pub fn retain_correlated<P, S>(primary: &mut Vec<P>, secondary: &mut Vec<S>, keep: &[bool]) {
    let retained = |index: usize| keep.get(index).copied().unwrap_or(true);

    let mut index = 0;
    primary.retain(|_| {
        let decision = retained(index);
        index += 1;
        decision
    });

    let mut index = 0;
    secondary.retain(|_| {
        let decision = retained(index);
        index += 1;
        decision
    });
    secondary.truncate(primary.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retain_correlated_keeps_alignment() {
        let mut primary = vec!["a", "b", "c", "d"];
        let mut secondary = vec![10, 20, 30, 40];
        retain_correlated(&mut primary, &mut secondary, &[false, true, false, true]);
        assert_eq!(primary, ["b", "d"]);
        assert_eq!(secondary, [20, 40]);
    }

    #[test]
    fn test_longer_secondary_is_truncated() {
        let mut primary = vec!["a", "b"];
        let mut secondary = vec![1, 2, 3, 4];
        retain_correlated(&mut primary, &mut secondary, &[true, false]);
        assert_eq!(primary, ["a"]);
        assert_eq!(secondary, [1]);
    }

    #[test]
    fn test_shorter_secondary_is_not_padded() {
        let mut primary = vec!["a", "b", "c"];
        let mut secondary = vec![1];
        retain_correlated(&mut primary, &mut secondary, &[true, false]);
        assert_eq!(primary, ["a", "c"]);
        assert_eq!(secondary, [1]);
    }

    #[test]
    fn test_empty_mask_keeps_everything() {
        let mut primary = vec![1, 2];
        let mut secondary: Vec<u8> = Vec::new();
        retain_correlated(&mut primary, &mut secondary, &[]);
        assert_eq!(primary, [1, 2]);
        assert!(secondary.is_empty());
    }
}
