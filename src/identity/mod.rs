//! Stable identities for crawled entities and category partitions
//!
//! Two kinds of keys are derived here:
//!
//! - `category_key`: an ASCII, lowercase, underscore-joined form of a main
//!   category label. It names the entity partition in storage and the export
//!   file on disk, so it must be stable across runs.
//! - `entity_key`: the identity of a company inside one partition. It is the
//!   listing name with surrounding and repeated whitespace collapsed; case and
//!   diacritics are preserved.

use deunicode::deunicode;

/// Fallback key used when a label folds to nothing
const EMPTY_CATEGORY_KEY: &str = "unnamed";

/// Folds a category label into a filesystem-safe partition key
///
/// # Normalization Steps
///
/// 1. Transliterate to ASCII (removes Vietnamese diacritics, `đ` → `d`)
/// 2. Drop everything that is not alphanumeric, `_`, `-` or whitespace
/// 3. Collapse runs of whitespace and `-` into a single `_`
/// 4. Lowercase
///
/// # Examples
///
/// ```
/// use yp_harvest::identity::category_key;
///
/// assert_eq!(category_key("Bếp Gas & Thiết Bị"), "bep_gas_thiet_bi");
/// assert_eq!(category_key("Điện - Điện Tử"), "dien_dien_tu");
/// ```
pub fn category_key(label: &str) -> String {
    let folded = deunicode(label.trim());

    let mut key = String::with_capacity(folded.len());
    let mut pending_separator = false;

    for c in folded.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_separator && !key.is_empty() {
                key.push('_');
            }
            pending_separator = false;
            key.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_separator = true;
        }
    }

    if key.is_empty() {
        EMPTY_CATEGORY_KEY.to_string()
    } else {
        key
    }
}

/// Derives the identity of a company from its listed name
///
/// ```
/// use yp_harvest::identity::entity_key;
///
/// assert_eq!(entity_key("  Công Ty   TNHH\nABC "), "Công Ty TNHH ABC");
/// ```
pub fn entity_key(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits a trailing "(N)" listing count off a navigation label
///
/// Subcategory links on the directory carry the number of listed companies,
/// e.g. `"Bếp Gas (140)"`. Returns the bare label and the parsed count.
///
/// ```
/// use yp_harvest::identity::strip_count_suffix;
///
/// assert_eq!(strip_count_suffix("Bếp Gas (140)"), ("Bếp Gas".to_string(), Some(140)));
/// assert_eq!(strip_count_suffix("Bếp Gas"), ("Bếp Gas".to_string(), None));
/// ```
pub fn strip_count_suffix(label: &str) -> (String, Option<u32>) {
    let trimmed = label.trim();

    if let Some(without_close) = trimmed.strip_suffix(')') {
        if let Some(open) = without_close.rfind('(') {
            let digits = &without_close[open + 1..];
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                if let Ok(count) = digits.parse::<u32>() {
                    let bare = without_close[..open].trim_end().to_string();
                    return (bare, Some(count));
                }
            }
        }
    }

    (trimmed.to_string(), None)
}
