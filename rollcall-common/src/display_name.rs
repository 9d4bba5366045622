//! Display name and username derivation from institutional emails
//!
//! Institutional addresses follow `first_last@domain`. Both functions are
//! pure and total: malformed input degrades to a best-effort result.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Separates the first and last name segments of the local part
const NAME_SEPARATOR: char = '_';

/// Split an email's local part into (first, last) raw segments.
///
/// Only the first two segments are used; anything after a second
/// separator is ignored.
fn name_segments(email: &str) -> (&str, &str) {
    let local = email.split('@').next().unwrap_or_default();
    let mut parts = local.split(NAME_SEPARATOR);
    let first = parts.next().unwrap_or_default();
    let last = parts.next().unwrap_or_default();
    (first, last)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(head) => {
            let mut out: String = head.to_uppercase().collect();
            out.push_str(&chars.as_str().to_lowercase());
            out
        }
        None => String::new(),
    }
}

/// Capitalise each hyphen-separated piece: `dela-cruz` → `Dela-Cruz`
fn prettify_segment(segment: &str) -> String {
    segment
        .split('-')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join("-")
}

/// Derive a human-readable name from an email's local part.
///
/// ```
/// use rollcall_common::derive_display_name;
///
/// assert_eq!(derive_display_name("juan_delacruz@x.edu"), "Juan Delacruz");
/// assert_eq!(derive_display_name("maria@x.edu"), "Maria");
/// assert_eq!(derive_display_name("ana-marie_santos@x.edu"), "Ana-Marie Santos");
/// ```
pub fn derive_display_name(email: &str) -> String {
    let (first, last) = name_segments(email);
    [prettify_segment(first), prettify_segment(last)]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Username layout produced by [`derive_username`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UsernameStrategy {
    /// `first.last`
    #[default]
    Dot,
    /// `firstlast`
    Concat,
    /// `flast`
    FirstInitialLast,
    /// `lastf`
    LastFirstInitial,
}

impl std::str::FromStr for UsernameStrategy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dot" => Ok(Self::Dot),
            "concat" => Ok(Self::Concat),
            "firstInitialLast" => Ok(Self::FirstInitialLast),
            "lastFirstInitial" => Ok(Self::LastFirstInitial),
            other => Err(crate::Error::Validation(format!(
                "Unknown username strategy: {}",
                other
            ))),
        }
    }
}

/// Strip diacritics and anything outside `[a-z0-9._-]`, then lower-case
fn sanitize(input: &str) -> String {
    input
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect::<String>()
        .to_ascii_lowercase()
}

fn first_char(s: &str) -> String {
    s.chars().next().map(String::from).unwrap_or_default()
}

/// Derive an account-style username from an email
pub fn derive_username(email: &str, strategy: UsernameStrategy) -> String {
    let (first, last) = name_segments(email);
    let first = sanitize(first);
    let last = sanitize(last);

    match strategy {
        UsernameStrategy::Dot => [first, last]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("."),
        UsernameStrategy::Concat => format!("{}{}", first, last),
        UsernameStrategy::FirstInitialLast => format!("{}{}", first_char(&first), last),
        UsernameStrategy::LastFirstInitial => format!("{}{}", last, first_char(&first)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_two_segments() {
        assert_eq!(derive_display_name("juan_delacruz@x.edu"), "Juan Delacruz");
    }

    #[test]
    fn test_display_name_without_separator() {
        assert_eq!(derive_display_name("maria@x.edu"), "Maria");
    }

    #[test]
    fn test_display_name_normalises_case() {
        assert_eq!(derive_display_name("JUAN_DELACRUZ@X.EDU"), "Juan Delacruz");
        assert_eq!(derive_display_name("mArIa_sAnToS@x.edu"), "Maria Santos");
    }

    #[test]
    fn test_display_name_hyphenated_segments() {
        assert_eq!(
            derive_display_name("jean-paul_garcia-lopez@x.edu"),
            "Jean-Paul Garcia-Lopez"
        );
    }

    #[test]
    fn test_display_name_ignores_third_segment() {
        assert_eq!(derive_display_name("juan_dela_cruz@x.edu"), "Juan Dela");
    }

    #[test]
    fn test_display_name_degrades_gracefully() {
        assert_eq!(derive_display_name(""), "");
        assert_eq!(derive_display_name("@x.edu"), "");
        assert_eq!(derive_display_name("_santos@x.edu"), "Santos");
        assert_eq!(derive_display_name("no-at-sign"), "No-At-Sign");
    }

    #[test]
    fn test_display_name_is_deterministic() {
        let a = derive_display_name("ana_reyes@x.edu");
        let b = derive_display_name("ana_reyes@x.edu");
        assert_eq!(a, b);
    }

    #[test]
    fn test_username_strategies() {
        let email = "Juan_DelaCruz@x.edu";
        assert_eq!(derive_username(email, UsernameStrategy::Dot), "juan.delacruz");
        assert_eq!(derive_username(email, UsernameStrategy::Concat), "juandelacruz");
        assert_eq!(derive_username(email, UsernameStrategy::FirstInitialLast), "jdelacruz");
        assert_eq!(derive_username(email, UsernameStrategy::LastFirstInitial), "delacruzj");
    }

    #[test]
    fn test_username_strips_diacritics() {
        assert_eq!(
            derive_username("josé_peñaflor@x.edu", UsernameStrategy::Dot),
            "jose.penaflor"
        );
    }

    #[test]
    fn test_username_single_segment() {
        assert_eq!(derive_username("maria@x.edu", UsernameStrategy::Dot), "maria");
        assert_eq!(derive_username("maria@x.edu", UsernameStrategy::LastFirstInitial), "m");
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("concat".parse::<UsernameStrategy>().unwrap(), UsernameStrategy::Concat);
        assert!("bogus".parse::<UsernameStrategy>().is_err());
    }
}
