//! Batch row writer: seven CSV destinations, opened once per run.
//!
//! Column orders are fixed at initialization and must match the table
//! declarations in [`crate::db`] exactly; header rows are written up front so
//! even an empty destination is self-describing. Output is UTF-8 throughout
//! (the `csv` crate quotes as needed) and strictly append-only.

use std::fs::File;
use std::path::Path;

use csv::WriterBuilder;

use crate::config::{
    NODES_CSV, NODE_TAGS_CSV, REL_MEMBERS_CSV, REL_TAGS_CSV, WAYS_CSV, WAY_NODES_CSV, WAY_TAGS_CSV,
};
use crate::error::Result;
use crate::shape::RowBundle;

/// Header of the node record file.
const NODES_HEADER: [&str; 8] = [
    "id", "lat", "lon", "user", "uid", "version", "changeset", "timestamp",
];

/// Header of all three tag files.
const TAGS_HEADER: [&str; 4] = ["id", "key", "value", "type"];

/// Header of the way and relation record files.
const WAYS_HEADER: [&str; 6] = ["id", "user", "uid", "version", "changeset", "timestamp"];

/// Header of the ordered way-membership file.
const WAY_NODES_HEADER: [&str; 3] = ["id", "node_id", "position"];

/// Header of the relation-membership file.
const REL_MEMBERS_HEADER: [&str; 3] = ["reference", "role", "type"];

/// All seven CSV writers for one extraction run.
pub struct CsvSink {
    nodes: csv::Writer<File>,
    node_tags: csv::Writer<File>,
    ways: csv::Writer<File>,
    way_nodes: csv::Writer<File>,
    way_tags: csv::Writer<File>,
    rel_tags: csv::Writer<File>,
    rel_members: csv::Writer<File>,
}

/// Open one destination and write its header row.
fn open_writer(dir: &Path, name: &str, header: &[&str]) -> Result<csv::Writer<File>> {
    // Headers are written explicitly; serde serialization must not add its own.
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(dir.join(name))?;
    writer.write_record(header)?;
    Ok(writer)
}

impl CsvSink {
    /// Create (or truncate) all seven destination files under `dir`.
    pub fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            nodes: open_writer(dir, NODES_CSV, &NODES_HEADER)?,
            node_tags: open_writer(dir, NODE_TAGS_CSV, &TAGS_HEADER)?,
            ways: open_writer(dir, WAYS_CSV, &WAYS_HEADER)?,
            way_nodes: open_writer(dir, WAY_NODES_CSV, &WAY_NODES_HEADER)?,
            way_tags: open_writer(dir, WAY_TAGS_CSV, &TAGS_HEADER)?,
            rel_tags: open_writer(dir, REL_TAGS_CSV, &TAGS_HEADER)?,
            rel_members: open_writer(dir, REL_MEMBERS_CSV, &REL_MEMBERS_HEADER)?,
        })
    }

    /// Append all rows of one bundle to their destinations.
    pub fn write_bundle(&mut self, bundle: &RowBundle) -> Result<()> {
        match bundle {
            RowBundle::Node { row, tags } => {
                self.nodes.serialize(row)?;
                for tag in tags {
                    self.node_tags.serialize(tag)?;
                }
            }
            RowBundle::Way { row, nodes, tags } => {
                self.ways.serialize(row)?;
                for node in nodes {
                    self.way_nodes.serialize(node)?;
                }
                for tag in tags {
                    self.way_tags.serialize(tag)?;
                }
            }
            RowBundle::Relation { tags, members } => {
                for tag in tags {
                    self.rel_tags.serialize(tag)?;
                }
                for member in members {
                    self.rel_members.serialize(member)?;
                }
            }
        }
        Ok(())
    }

    /// Flush and close every destination.
    pub fn finish(mut self) -> Result<()> {
        self.nodes.flush()?;
        self.node_tags.flush()?;
        self.ways.flush()?;
        self.way_nodes.flush()?;
        self.way_tags.flush()?;
        self.rel_tags.flush()?;
        self.rel_members.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ALL_CSV_FILES;
    use crate::shape::{NodeRow, TagRow};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_create_writes_all_headers() {
        let dir = tempdir().unwrap();
        let sink = CsvSink::create(dir.path()).unwrap();
        sink.finish().unwrap();

        for name in ALL_CSV_FILES {
            let content = std::fs::read_to_string(dir.path().join(name)).unwrap();
            assert_eq!(content.lines().count(), 1, "{name} should hold only a header");
        }

        let nodes = std::fs::read_to_string(dir.path().join(NODES_CSV)).unwrap();
        assert_eq!(
            nodes.trim_end(),
            "id,lat,lon,user,uid,version,changeset,timestamp"
        );
        let members = std::fs::read_to_string(dir.path().join(REL_MEMBERS_CSV)).unwrap();
        assert_eq!(members.trim_end(), "reference,role,type");
    }

    #[test]
    fn test_bundle_rows_land_in_matching_files() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::create(dir.path()).unwrap();

        let bundle = RowBundle::Node {
            row: NodeRow {
                id: 1,
                lat: 47.61,
                lon: -122.33,
                user: "glassman".to_string(),
                uid: "100".to_string(),
                version: "2".to_string(),
                changeset: "900".to_string(),
                timestamp: "2015-02-01T12:00:00Z".to_string(),
            },
            tags: vec![TagRow {
                id: 1,
                key: "name".to_string(),
                value: "Caffè Vita".to_string(),
                tag_type: "regular".to_string(),
            }],
        };
        sink.write_bundle(&bundle).unwrap();
        sink.finish().unwrap();

        let nodes = std::fs::read_to_string(dir.path().join(NODES_CSV)).unwrap();
        assert!(nodes.contains("1,47.61,-122.33,glassman,100,2,900,2015-02-01T12:00:00Z"));

        // Non-ASCII text survives intact.
        let tags = std::fs::read_to_string(dir.path().join(NODE_TAGS_CSV)).unwrap();
        assert!(tags.contains("1,name,Caffè Vita,regular"));

        // Nothing leaked into the way files.
        let ways = std::fs::read_to_string(dir.path().join(WAYS_CSV)).unwrap();
        assert_eq!(ways.lines().count(), 1);
    }
}
