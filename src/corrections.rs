//! Street name correction.
//!
//! Street values in the source data end in wildly inconsistent suffixes:
//! compass abbreviations (`NE`), type abbreviations (`St`, `Rd.`), casing
//! variants (`AVENUE`), and a handful of streets with no usable suffix at
//! all. The correction table maps each known-bad trailing token to its
//! canonical replacement. It is loaded once before the pass begins and never
//! mutated; the specific full-name overrides were verified against the map
//! by coordinates before being added.

use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Trailing whitespace-delimited token of a street value.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
pub(crate) static TRAILING_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+$").expect("valid regex"));

/// Canonical street types that need no correction.
///
/// Used by the audit pass to flag suffixes outside this list.
pub const EXPECTED_STREET_TYPES: [&str; 23] = [
    "Street",
    "Court",
    "Boulevard",
    "Lane",
    "Parkway",
    "Circle",
    "Avenue",
    "Place",
    "Drive",
    "Square",
    "Trail",
    "Commons",
    "Northeast",
    "Northwest",
    "Southwest",
    "Southeast",
    "Esplanade",
    "Broadway",
    "US-101",
    "US-2",
    "WA-99",
    "Road",
    "Plateau",
];

/// Fixed mapping from a known bad or abbreviated trailing token to its
/// canonical replacement.
static STREET_CORRECTIONS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        // Full-name overrides for streets with no usable type suffix.
        ("Mcgarigle", "Mcgarigle Road"),
        ("Park", "Park Lane"),
        ("bjuin", "Bjune Drive Southeast"),
        ("Broad", "Broadway"),
        ("Douglas", "Douglas Street"),
        ("Kincaid", "West Kincaid Street"),
        ("4114", "187th Avenue Southeast"),
        ("Roosevelt", "Roosevelt Avenue"),
        ("Kulshan", "Kulshan Avenue"),
        ("Cleveland", "Cleveland Avenue"),
        ("Milwaukee", "Milwaukee Street"),
        ("Maple", "Maple Street"),
        ("FIXME", "235th Avenue Northeast"),
        (
            "http://local.safeway.com/wa/tacoma-1594.html",
            "South 56th Street",
        ),
        ("Yesler", "Yesler Terrace"),
        ("Burwell", "Burwell Street"),
        ("Snoqualmie", "Montgomery Street"),
        ("Market", "North Market Boulevard"),
        ("Central", "Central Way"),
        ("Myrtle", "Myrtle Street"),
        ("Murdock", "Murdock Street"),
        ("Laventure", "North Laventure Road"),
        // Directional abbreviations.
        ("SE", "Southeast"),
        ("NW", "Northwest"),
        ("NE", "Northeast"),
        ("SW", "Southwest"),
        ("N", "North"),
        ("S", "South"),
        ("W", "West"),
        ("E", "East"),
        ("N.E.", "Northeast"),
        ("S.E.", "Southeast"),
        ("W.", "West"),
        ("E.", "East"),
        ("E,", "East"),
        ("S.", "South"),
        ("n", "North"),
        ("se", "Southeast"),
        ("west", "West"),
        ("south", "South"),
        ("southwest", "Southwest"),
        // Street-type abbreviations and casing variants.
        ("St", "Street"),
        ("St.", "Street"),
        ("ST", "Street"),
        ("st", "Street"),
        ("street", "Street"),
        ("Rd", "Road"),
        ("Rd.", "Road"),
        ("ROAD", "Road"),
        ("Ln", "Lane"),
        ("Ln.", "Lane"),
        ("Blvd", "Boulevard"),
        ("Blvd.", "Boulevard"),
        ("boulevard", "Boulevard"),
        ("avenue", "Avenue"),
        ("AVENUE", "Avenue"),
        ("AVE", "Avenue"),
        ("av.", "Avenue"),
        ("Wy", "Way"),
        ("WY", "Way"),
        ("Pkwy", "Parkway"),
        ("PL", "Place"),
        ("Ct", "Court"),
    ])
});

/// Correct a street value's trailing token against the correction table.
///
/// Extracts the trailing whitespace-delimited token; if it is a key in the
/// table, splices in the replacement, otherwise returns the input unchanged.
/// A value with no extractable token (empty, all whitespace) is returned
/// unchanged rather than failing. Idempotent on already-canonical input.
///
/// # Examples
/// ```
/// use osm_tidy::corrections::correct_street_name;
///
/// assert_eq!(correct_street_name("4114 NE"), "4114 Northeast");
/// assert_eq!(correct_street_name("123 Main Street"), "123 Main Street");
/// assert_eq!(correct_street_name("Park"), "Park Lane");
/// ```
#[must_use]
pub fn correct_street_name(value: &str) -> Cow<'_, str> {
    let Some(m) = TRAILING_TOKEN.find(value) else {
        return Cow::Borrowed(value);
    };

    match STREET_CORRECTIONS.get(m.as_str()) {
        Some(replacement) => {
            let mut fixed = String::with_capacity(m.start() + replacement.len());
            fixed.push_str(&value[..m.start()]);
            fixed.push_str(replacement);
            Cow::Owned(fixed)
        }
        None => Cow::Borrowed(value),
    }
}
