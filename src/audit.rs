//! Street and address audits over a raw export.
//!
//! The audit is a read-only survey run before (or instead of) an extract: it
//! streams the input once and collects every address value that looks off,
//! so the correction table in [`crate::corrections`] can be extended by hand.
//! Each address field is checked by its own pattern; a miss on one field
//! never suppresses or reuses the match of another.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::corrections::{EXPECTED_STREET_TYPES, TRAILING_TOKEN};
use crate::error::Result;
use crate::reader::ElementReader;
use crate::types::ElementKind;

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z .'-]*$").expect("valid city regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static HOUSENUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+").expect("valid housenumber regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static POSTCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{5}").expect("valid postcode regex"));

/// Everything one audit pass collects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    /// Unexpected trailing street token, mapped to the full names using it.
    pub street_types: BTreeMap<String, BTreeSet<String>>,
    /// Distinct city spellings seen in addresses.
    pub cities: BTreeSet<String>,
    /// City values with non-alphabetic content.
    pub odd_cities: BTreeSet<String>,
    /// House numbers that do not start with a digit.
    pub odd_housenumbers: BTreeSet<String>,
    /// Postcodes without a five-digit run anywhere in the value.
    pub odd_postcodes: BTreeSet<String>,
    /// Elements inspected, per kind.
    pub scanned: [(ElementKind, u64); 3],
}

impl AuditReport {
    fn new() -> Self {
        Self {
            street_types: BTreeMap::new(),
            cities: BTreeSet::new(),
            odd_cities: BTreeSet::new(),
            odd_housenumbers: BTreeSet::new(),
            odd_postcodes: BTreeSet::new(),
            scanned: [
                (ElementKind::Node, 0),
                (ElementKind::Way, 0),
                (ElementKind::Relation, 0),
            ],
        }
    }

    /// True when no field raised anything worth a manual look.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.street_types.is_empty()
            && self.odd_cities.is_empty()
            && self.odd_housenumbers.is_empty()
            && self.odd_postcodes.is_empty()
    }

    fn inspect(&mut self, key: &str, value: &str) {
        match key {
            "addr:street" => self.inspect_street(value),
            "addr:city" => {
                self.cities.insert(value.to_string());
                if !CITY.is_match(value) {
                    self.odd_cities.insert(value.to_string());
                }
            }
            "addr:housenumber" => {
                if !HOUSENUMBER.is_match(value) {
                    self.odd_housenumbers.insert(value.to_string());
                }
            }
            "addr:postcode" => {
                if !POSTCODE.is_match(value) {
                    self.odd_postcodes.insert(value.to_string());
                }
            }
            _ => {}
        }
    }

    fn inspect_street(&mut self, value: &str) {
        let Some(m) = TRAILING_TOKEN.find(value) else {
            return;
        };
        let street_type = m.as_str();
        if !EXPECTED_STREET_TYPES.contains(&street_type) {
            debug!(street = value, "unexpected street type");
            self.street_types
                .entry(street_type.to_string())
                .or_default()
                .insert(value.to_string());
        }
    }
}

/// Stream `input` once and audit every address tag on every element.
pub fn audit_file(input: &Path) -> Result<AuditReport> {
    let mut report = AuditReport::new();
    for record in ElementReader::from_path(input)? {
        let record = record?;
        for slot in &mut report.scanned {
            if slot.0 == record.kind() {
                slot.1 += 1;
            }
        }
        for tag in record.tags() {
            report.inspect(&tag.key, &tag.value);
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn audit_xml(body: &str) -> AuditReport {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<osm>{body}</osm>").unwrap();
        audit_file(file.path()).unwrap()
    }

    fn node_with(tags: &str) -> String {
        format!(
            "<node id='1' lat='47.6' lon='-122.3' user='u' uid='1' \
             version='1' changeset='9' timestamp='2015-01-01T00:00:00Z'>{tags}</node>"
        )
    }

    #[test]
    fn test_unexpected_street_type_collected() {
        let report = audit_xml(&node_with(
            "<tag k='addr:street' v='5th Ave NE'/>\
             <tag k='addr:street' v='Union Street'/>",
        ));
        let names = report.street_types.get("NE").unwrap();
        assert!(names.contains("5th Ave NE"));
        // Only the trailing token is classified, so "Ave" never shows.
        assert_eq!(report.street_types.len(), 1);
    }

    #[test]
    fn test_address_fields_checked_independently() {
        // A street miss must not leak into the housenumber or postcode checks.
        let report = audit_xml(&node_with(
            "<tag k='addr:street' v='1st Ave'/>\
             <tag k='addr:housenumber' v='Suite B'/>\
             <tag k='addr:postcode' v='WA 981'/>\
             <tag k='addr:city' v='Seattle; WA'/>",
        ));
        assert!(report.street_types.contains_key("Ave"));
        assert_eq!(
            report.odd_housenumbers,
            BTreeSet::from(["Suite B".to_string()])
        );
        assert_eq!(report.odd_postcodes, BTreeSet::from(["WA 981".to_string()]));
        assert_eq!(report.odd_cities, BTreeSet::from(["Seattle; WA".to_string()]));
        assert_eq!(report.cities, BTreeSet::from(["Seattle; WA".to_string()]));
    }

    #[test]
    fn test_valid_values_pass() {
        let report = audit_xml(&node_with(
            "<tag k='addr:street' v='Boren Avenue'/>\
             <tag k='addr:city' v='Mount Vernon'/>\
             <tag k='addr:housenumber' v='1200'/>\
             <tag k='addr:postcode' v='98101-2702'/>",
        ));
        assert!(report.is_clean());
        assert_eq!(report.scanned[0], (ElementKind::Node, 1));
    }

    #[test]
    fn test_ways_and_relations_audited_too() {
        let report = audit_xml(
            "<way id='2' user='u' uid='1' version='1' changeset='9' \
             timestamp='2015-01-01T00:00:00Z'>\
             <nd ref='1'/><tag k='addr:street' v='Pine St'/></way>",
        );
        assert!(report.street_types.contains_key("St"));
        assert_eq!(report.scanned[1], (ElementKind::Way, 1));
    }
}
