//! Locale-style string collation.
//!
//! Tag ordering follows the default Unicode collation closely enough for tag
//! text: whitespace sorts before punctuation, punctuation before digits and
//! digits before letters. Letters compare case-insensitively first; on a tie
//! the lowercase form sorts first.

use std::cmp::Ordering;

/// Compare two strings the way a reader would expect them ordered.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use tagmap_tags::locale_compare;
///
/// assert_eq!(locale_compare("def", "Fullname"), Ordering::Less);
/// assert_eq!(locale_compare("abc", "ABC"), Ordering::Less);
/// assert_eq!(locale_compare("ship:x", "shipname:x"), Ordering::Less);
/// ```
#[must_use]
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    a.chars()
        .map(weight)
        .cmp(b.chars().map(weight))
        .then_with(|| case_order(a, b))
        .then_with(|| a.cmp(b))
}

/// Primary collation weight: character class, then case-folded character.
fn weight(c: char) -> (u8, char) {
    let class = if c.is_whitespace() {
        0
    } else if c.is_numeric() {
        2
    } else if c.is_alphabetic() {
        3
    } else {
        1
    };
    (class, c.to_lowercase().next().unwrap_or(c))
}

/// Tertiary weight: the first case difference decides, lowercase first.
fn case_order(a: &str, b: &str) -> Ordering {
    for (x, y) in a.chars().zip(b.chars()) {
        if x == y {
            continue;
        }
        match (x.is_lowercase(), y.is_lowercase()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
    }
    Ordering::Equal
}
