//! Literal substring scanning

/// Yield the starting and ending byte offset of every occurrence of
/// `needle` in `haystack`, left to right.
///
/// The search restarts one character past each match's *start*, not past
/// its end, so overlapping occurrences of the same literal are all
/// reported. An empty needle yields nothing.
pub fn find_all<'a>(
    haystack: &'a str,
    needle: &'a str,
) -> impl Iterator<Item = (usize, usize)> + 'a {
    // restart offset: one char, not one byte, or the next slice could
    // start inside a multibyte character
    let step = needle.chars().next().map_or(1, char::len_utf8);
    let mut from = 0;
    std::iter::from_fn(move || {
        if needle.is_empty() || from > haystack.len() {
            return None;
        }
        let pos = haystack[from..].find(needle)? + from;
        from = pos + step;
        Some((pos, pos + needle.len()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn collect(haystack: &str, needle: &str) -> Vec<(usize, usize)> {
        find_all(haystack, needle).collect()
    }

    #[test]
    fn test_no_match() {
        assert_eq!(collect("abcdef", "{x}"), vec![]);
    }

    #[test]
    fn test_single_match() {
        assert_eq!(collect("ab{x}cd", "{x}"), vec![(2, 5)]);
    }

    #[test]
    fn test_multiple_matches() {
        assert_eq!(collect("{x}..{x}..{x}", "{x}"), vec![(0, 3), (5, 8), (10, 13)]);
    }

    #[test]
    fn test_match_at_end() {
        assert_eq!(collect("ab{x}", "{x}"), vec![(2, 5)]);
    }

    #[test]
    fn test_overlapping_matches_are_found() {
        // restarting at start+1 keeps overlapping occurrences visible
        assert_eq!(collect("aaa", "aa"), vec![(0, 2), (1, 3)]);
    }

    #[test]
    fn test_empty_needle() {
        assert_eq!(collect("abc", ""), vec![]);
    }

    #[test]
    fn test_multibyte_haystack() {
        // offsets are byte offsets
        assert_eq!(collect("è{x}è{x}", "{x}"), vec![(2, 5), (7, 10)]);
    }

    #[test]
    fn test_multibyte_needle() {
        // restarting must not land inside a multibyte character
        assert_eq!(collect("èè", "è"), vec![(0, 2), (2, 4)]);
        assert_eq!(collect("èèè", "èè"), vec![(0, 4), (2, 6)]);
    }
}
