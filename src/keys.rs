//! Tag key normalization.
//!
//! OSM tag keys come in three forms: plain (`name`), namespaced
//! (`addr:street`), and garbage (keys containing characters the flat schema
//! cannot represent). [`split_key`] classifies a raw key into exactly one of
//! those, splitting namespaced keys into a type prefix and a base key.

use regex::Regex;
use std::sync::LazyLock;

/// Characters a key may not contain if it is to survive into the flat schema.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PROBLEM_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[=+/&<>;'"?%#$@,. \t\r\n]"#).expect("valid regex"));

/// A lowercase namespace prefix followed by a colon.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LOWER_COLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z_]+):(.+)$").expect("valid regex"));

/// Outcome of normalizing one raw tag key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySplit {
    /// The key contains a disallowed character; drop the attribute entirely.
    Drop,
    /// A plain key with no namespace prefix.
    Plain(String),
    /// A namespaced key, split at the first colon.
    Namespaced { prefix: String, key: String },
}

/// Normalize a raw tag key.
///
/// Keys with two or more colons keep everything after the FIRST colon as the
/// base key (`gnis:county:name` becomes prefix `gnis`, key `county:name`);
/// the prefix must be a lowercase token for the split to apply.
///
/// # Examples
/// ```
/// use osm_tidy::keys::{split_key, KeySplit};
///
/// assert_eq!(split_key("highway"), KeySplit::Plain("highway".to_string()));
/// assert_eq!(
///     split_key("addr:street"),
///     KeySplit::Namespaced {
///         prefix: "addr".to_string(),
///         key: "street".to_string(),
///     }
/// );
/// assert_eq!(split_key("a,b"), KeySplit::Drop);
/// ```
#[must_use]
pub fn split_key(raw: &str) -> KeySplit {
    if PROBLEM_CHARS.is_match(raw) {
        return KeySplit::Drop;
    }

    if let Some(caps) = LOWER_COLON.captures(raw) {
        return KeySplit::Namespaced {
            prefix: caps[1].to_string(),
            key: caps[2].to_string(),
        };
    }

    KeySplit::Plain(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn namespaced(prefix: &str, key: &str) -> KeySplit {
        KeySplit::Namespaced {
            prefix: prefix.to_string(),
            key: key.to_string(),
        }
    }

    #[test]
    fn test_plain_key_passes_through() {
        assert_eq!(split_key("highway"), KeySplit::Plain("highway".to_string()));
        assert_eq!(split_key("name"), KeySplit::Plain("name".to_string()));
        assert_eq!(
            split_key("STREETNAME"),
            KeySplit::Plain("STREETNAME".to_string())
        );
    }

    #[test]
    fn test_namespaced_key_splits_at_first_colon() {
        assert_eq!(split_key("addr:street"), namespaced("addr", "street"));
        assert_eq!(split_key("addr:postcode"), namespaced("addr", "postcode"));
    }

    #[test]
    fn test_double_colon_keeps_full_remainder() {
        assert_eq!(
            split_key("gnis:county:name"),
            namespaced("gnis", "county:name")
        );
        assert_eq!(
            split_key("railway:signal:direction"),
            namespaced("railway", "signal:direction")
        );
    }

    #[test]
    fn test_non_lowercase_prefix_is_not_a_namespace() {
        // The prefix must be a lowercase token for the split to apply.
        assert_eq!(split_key("Foo:bar"), KeySplit::Plain("Foo:bar".to_string()));
        assert_eq!(
            split_key("name:1995-1996"),
            namespaced("name", "1995-1996")
        );
    }

    #[test]
    fn test_problem_characters_drop_the_key() {
        assert_eq!(split_key("a,b"), KeySplit::Drop);
        assert_eq!(split_key("has space"), KeySplit::Drop);
        assert_eq!(split_key("dotted.key"), KeySplit::Drop);
        assert_eq!(split_key("semi;colon"), KeySplit::Drop);
        assert_eq!(split_key("quo\"te"), KeySplit::Drop);
        assert_eq!(split_key("tab\tkey"), KeySplit::Drop);
        assert_eq!(split_key("per%cent"), KeySplit::Drop);
    }

    #[test]
    fn test_underscore_prefix_is_lowercase_token() {
        assert_eq!(split_key("turn_lanes:forward"), namespaced("turn_lanes", "forward"));
    }
}
