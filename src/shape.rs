//! Element shaping: one record in, a bundle of flat rows out.
//!
//! Each record variant maps to a fixed set of row shapes; no nested structure
//! survives past this point. Street values are corrected here, and tags whose
//! keys fail normalization are excluded from every output and counted.

use serde::Serialize;
use tracing::debug;

use crate::config::REGULAR_TAG_TYPE;
use crate::corrections::correct_street_name;
use crate::keys::{split_key, KeySplit};
use crate::types::{Record, Tag};

/// One row of `nodes.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRow {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    pub user: String,
    pub uid: String,
    pub version: String,
    pub changeset: String,
    pub timestamp: String,
}

/// One row of `ways.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WayRow {
    pub id: i64,
    pub user: String,
    pub uid: String,
    pub version: String,
    pub changeset: String,
    pub timestamp: String,
}

/// One row of a `*_tags.csv` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRow {
    pub id: i64,
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub tag_type: String,
}

/// One row of `ways_nodes.csv`: ordered way membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WayNodeRow {
    pub id: i64,
    pub node_id: i64,
    /// Zero-based position in the way; reconstructs the way's geometry.
    pub position: u64,
}

/// One row of `rels_members.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRow {
    pub reference: i64,
    pub role: String,
    #[serde(rename = "type")]
    pub member_type: String,
}

/// The flat rows produced from one record.
#[derive(Debug, Clone, PartialEq)]
pub enum RowBundle {
    Node {
        row: NodeRow,
        tags: Vec<TagRow>,
    },
    Way {
        row: WayRow,
        nodes: Vec<WayNodeRow>,
        tags: Vec<TagRow>,
    },
    Relation {
        tags: Vec<TagRow>,
        members: Vec<MemberRow>,
    },
}

/// Maps records to row bundles, tracking dropped attributes.
#[derive(Debug, Default)]
pub struct Shaper {
    dropped: u64,
}

impl Shaper {
    /// Create a shaper with a zeroed drop counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tags excluded so far because their keys failed normalization.
    #[must_use]
    pub fn dropped_tags(&self) -> u64 {
        self.dropped
    }

    /// Shape one record into its flat rows.
    pub fn shape(&mut self, record: &Record) -> RowBundle {
        match record {
            Record::Node(node) => RowBundle::Node {
                row: NodeRow {
                    id: node.id,
                    lat: node.lat,
                    lon: node.lon,
                    user: node.meta.user.clone(),
                    uid: node.meta.uid.clone(),
                    version: node.meta.version.clone(),
                    changeset: node.meta.changeset.clone(),
                    timestamp: node.meta.timestamp.clone(),
                },
                tags: self.shape_tags(node.id, &node.tags, true),
            },
            Record::Way(way) => RowBundle::Way {
                row: WayRow {
                    id: way.id,
                    user: way.meta.user.clone(),
                    uid: way.meta.uid.clone(),
                    version: way.meta.version.clone(),
                    changeset: way.meta.changeset.clone(),
                    timestamp: way.meta.timestamp.clone(),
                },
                nodes: way
                    .node_refs
                    .iter()
                    .enumerate()
                    .map(|(position, node_id)| WayNodeRow {
                        id: way.id,
                        node_id: *node_id,
                        position: position as u64,
                    })
                    .collect(),
                tags: self.shape_tags(way.id, &way.tags, true),
            },
            Record::Relation(rel) => RowBundle::Relation {
                tags: self.shape_tags(rel.id, &rel.tags, false),
                members: rel
                    .members
                    .iter()
                    .map(|m| MemberRow {
                        reference: m.reference,
                        role: m.role.clone(),
                        member_type: m.member_type.clone(),
                    })
                    .collect(),
            },
        }
    }

    /// Shape one record's tags, correcting street values where asked.
    ///
    /// Street correction applies only to the address-line key on nodes and
    /// ways; relations pass `correct_streets = false`.
    fn shape_tags(&mut self, id: i64, tags: &[Tag], correct_streets: bool) -> Vec<TagRow> {
        let mut rows = Vec::with_capacity(tags.len());

        for tag in tags {
            let (tag_type, key) = match split_key(&tag.key) {
                KeySplit::Drop => {
                    self.dropped += 1;
                    debug!(record = id, key = %tag.key, "dropping tag with disallowed characters");
                    continue;
                }
                KeySplit::Plain(key) => (REGULAR_TAG_TYPE.to_string(), key),
                KeySplit::Namespaced { prefix, key } => (prefix, key),
            };

            let value = if correct_streets && tag_type == "addr" && key == "street" {
                correct_street_name(&tag.value).into_owned()
            } else {
                tag.value.clone()
            };

            rows.push(TagRow {
                id,
                key,
                value,
                tag_type,
            });
        }

        rows
    }
}
