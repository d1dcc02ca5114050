use crate::identity::strip_count_suffix;
use crate::url::Link;

/// Resolves a navigation label against a set of rendered links
///
/// A candidate matches when its visible text equals `label` exactly, or
/// equals it once a trailing "(N)" listing count is removed. The first
/// matching candidate in document order wins.
///
/// # Arguments
///
/// * `label` - The category or subcategory name being looked for
/// * `candidates` - Links in the order they appear on the page
///
/// # Returns
///
/// * `Some(&Link)` - The first matching link
/// * `None` - No candidate carries this label
///
/// # Examples
///
/// ```
/// use yp_harvest::url::{resolve, Link};
///
/// let links = vec![
///     Link::new("Bếp Gas (140)", "https://www.yellowpages.vn/cls/1/bep-gas.html"),
///     Link::new("Bếp Điện (12)", "https://www.yellowpages.vn/cls/2/bep-dien.html"),
/// ];
///
/// let found = resolve("Bếp Điện", &links).unwrap();
/// assert_eq!(found.href, "https://www.yellowpages.vn/cls/2/bep-dien.html");
/// assert!(resolve("Bếp Than", &links).is_none());
/// ```
pub fn resolve<'a>(label: &str, candidates: &'a [Link]) -> Option<&'a Link> {
    let wanted = label.trim();
    if wanted.is_empty() {
        return None;
    }

    candidates.iter().find(|link| {
        let text = link.text.trim();
        text == wanted || strip_count_suffix(text).0 == wanted
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> Vec<Link> {
        vec![
            Link::new("Ăn Uống", "https://yp.test/cat/an-uong"),
            Link::new("Xây Dựng", "https://yp.test/cat/xay-dung"),
            Link::new("Bánh Kẹo (12)", "https://yp.test/sub/banh-keo"),
            Link::new("  Bếp Gas (140) ", "https://yp.test/sub/bep-gas"),
        ]
    }

    #[test]
    fn test_exact_match() {
        let links = links();
        let found = resolve("Xây Dựng", &links).unwrap();
        assert_eq!(found.href, "https://yp.test/cat/xay-dung");
    }

    #[test]
    fn test_count_suffix_match() {
        let links = links();
        assert_eq!(
            resolve("Bánh Kẹo", &links).unwrap().href,
            "https://yp.test/sub/banh-keo"
        );
        assert_eq!(
            resolve("Bếp Gas", &links).unwrap().href,
            "https://yp.test/sub/bep-gas"
        );
    }

    #[test]
    fn test_label_with_count_matches_exactly() {
        let links = links();
        assert!(resolve("Bánh Kẹo (12)", &links).is_some());
    }

    #[test]
    fn test_no_partial_match() {
        let links = links();
        assert!(resolve("Bánh", &links).is_none());
        assert!(resolve("Ăn", &links).is_none());
        assert!(resolve("ăn uống", &links).is_none());
    }

    #[test]
    fn test_empty_label_never_matches() {
        let links = vec![Link::new("", "https://yp.test/empty")];
        assert!(resolve("", &links).is_none());
        assert!(resolve("   ", &links).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let links = vec![
            Link::new("Dịch Vụ (3)", "https://yp.test/first"),
            Link::new("Dịch Vụ", "https://yp.test/second"),
        ];
        assert_eq!(resolve("Dịch Vụ", &links).unwrap().href, "https://yp.test/first");
    }

    #[test]
    fn test_empty_candidates() {
        assert!(resolve("Ăn Uống", &[]).is_none());
    }
}
