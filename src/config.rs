//! Configuration constants for the pipeline.

/// Output file for node records.
pub const NODES_CSV: &str = "nodes.csv";

/// Output file for node tags.
pub const NODE_TAGS_CSV: &str = "nodes_tags.csv";

/// Output file for way records.
pub const WAYS_CSV: &str = "ways.csv";

/// Output file for ordered way-node membership.
pub const WAY_NODES_CSV: &str = "ways_nodes.csv";

/// Output file for way tags.
pub const WAY_TAGS_CSV: &str = "ways_tags.csv";

/// Output file for relation tags.
pub const REL_TAGS_CSV: &str = "rels_tags.csv";

/// Output file for relation members.
pub const REL_MEMBERS_CSV: &str = "rels_members.csv";

/// All seven output files, in write order.
pub const ALL_CSV_FILES: [&str; 7] = [
    NODES_CSV,
    NODE_TAGS_CSV,
    WAYS_CSV,
    WAY_NODES_CSV,
    WAY_TAGS_CSV,
    REL_TAGS_CSV,
    REL_MEMBERS_CSV,
];

/// Default sampling interval: keep every 30000th top-level element.
///
/// Chosen so a metro-area export in the low gigabytes samples down to a few
/// hundred elements, small enough to inspect by hand.
pub const DEFAULT_SAMPLE_INTERVAL: usize = 30_000;

/// Default SQLite database file.
pub const DEFAULT_DB_FILE: &str = "osm.db";

/// The tag value written as `type` when a key carries no namespace prefix.
pub const REGULAR_TAG_TYPE: &str = "regular";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_file_list_is_complete() {
        assert_eq!(ALL_CSV_FILES.len(), 7);
        assert!(ALL_CSV_FILES.contains(&NODES_CSV));
        assert!(ALL_CSV_FILES.contains(&REL_MEMBERS_CSV));
    }
}
