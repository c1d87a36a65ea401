//! End-to-end integration tests for the pipeline.
//!
//! Runs the complete path from raw XML through CSV extraction, the SQLite
//! load, the quality filters, and the report queries, on a small inline
//! export that exercises the correction table and every filter rule.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

use osm_tidy::config::{ALL_CSV_FILES, NODE_TAGS_CSV};
use osm_tidy::db::{self, RecordTable};
use osm_tidy::{extract_to_csv, write_sample};

const OSM_FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="test">
  <node id="1" lat="47.6097" lon="-122.3331" user="glassman" uid="100" version="2" changeset="900" timestamp="2015-02-01T12:00:00Z">
    <tag k="addr:street" v="E Pine St"/>
    <tag k="addr:housenumber" v="1200"/>
    <tag k="amenity" v="restaurant"/>
    <tag k="cuisine" v="Nepalese,_Indian,_Tibetan"/>
  </node>
  <node id="2" lat="47.60" lon="-122.30" user="seattlefyi" uid="102" version="1" changeset="1" timestamp="2013-06-01T12:00:00Z"/>
  <node id="3" lat="47.62" lon="-122.35" user="sctrojan79" uid="101" version="1" changeset="901" timestamp="2013-06-01T12:00:00Z">
    <tag k="fixme" v="resurvey"/>
    <tag k="cuisine" v="coffee_shop"/>
    <tag k="amenity" v="community_centre"/>
  </node>
  <way id="10" user="glassman" uid="100" version="1" changeset="902" timestamp="2015-03-01T12:00:00Z">
    <nd ref="1"/>
    <nd ref="3"/>
    <tag k="tiger:county" v="King, WA"/>
    <tag k="tiger:reviewed" v="no"/>
    <tag k="not:name" v="Old Name"/>
  </way>
  <relation id="20" user="glassman" uid="100" version="1" changeset="903" timestamp="2015-04-01T12:00:00Z">
    <member type="way" ref="10" role="outer"/>
    <tag k="type" v="multipolygon"/>
  </relation>
</osm>
"#;

fn write_fixture(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("fixture.osm");
    fs::write(&path, OSM_FIXTURE).unwrap();
    path
}

#[test]
fn test_extract_load_filter_report() {
    let work = tempfile::tempdir().unwrap();
    let input = write_fixture(work.path());
    let csv_dir = work.path().join("csv");

    // Extract
    let summary = extract_to_csv(&input, &csv_dir).unwrap();
    assert_eq!(summary.nodes, 3);
    assert_eq!(summary.ways, 1);
    assert_eq!(summary.relations, 1);
    assert_eq!(summary.dropped_tags, 0);
    for file in ALL_CSV_FILES {
        assert!(csv_dir.join(file).is_file(), "missing {file}");
    }

    // Street correction applied on the way to CSV
    let node_tags = fs::read_to_string(csv_dir.join(NODE_TAGS_CSV)).unwrap();
    assert!(node_tags.contains("1,street,E Pine Street,addr"));
    assert!(!node_tags.contains("E Pine St,"));

    // Load
    let db_path = work.path().join("osm.db");
    let mut conn = db::open(&db_path).unwrap();
    db::create_tables(&conn).unwrap();
    let loaded = db::load_csv_dir(&mut conn, &csv_dir).unwrap();
    // 3 nodes + 7 node tags + 1 way + 2 way nodes + 3 way tags + 1 rel tag + 1 member
    assert_eq!(loaded.total(), 18);

    // Quality filters
    let filters = db::apply_quality_filters(&conn).unwrap();
    assert_eq!(filters.fixme_rows, 1);
    assert_eq!(filters.bad_type_rows, 1); // not:name on the way
    assert_eq!(filters.centre_fixed, 0); // community_centre is not a bare 'centre'
    assert_eq!(filters.cuisine_collapsed, 1);

    // Report queries
    assert_eq!(db::distinct_user_count(&conn, RecordTable::Nodes).unwrap(), 3);
    let top = db::top_contributors(&conn, RecordTable::Ways, 5).unwrap();
    assert_eq!(top[0].user, "glassman");

    let years = db::records_by_year(&conn, RecordTable::Nodes).unwrap();
    let labels: Vec<&str> = years.iter().map(|p| p.period.as_str()).collect();
    assert_eq!(labels, vec!["2013", "2015"]);

    let cuisines = db::cuisine_counts(&conn, 10).unwrap();
    assert_eq!(cuisines.len(), 2);
    assert!(cuisines.iter().any(|c| c.cuisine == "indian"));
    assert!(cuisines
        .iter()
        .all(|c| (c.share_percent - 50.0).abs() < 1e-9));

    assert_eq!(db::county_values(&conn).unwrap(), vec!["King, WA".to_string()]);
    assert_eq!(db::unreviewed_count(&conn).unwrap(), 1);
}

#[test]
fn test_sample_then_extract() {
    let work = tempfile::tempdir().unwrap();
    let input = write_fixture(work.path());
    let sampled = work.path().join("sampled.osm");

    // k=2 keeps elements 1, 3, and 20 of the five top-level elements
    let sample = write_sample(&input, &sampled, 2).unwrap();
    assert_eq!(sample.scanned, 5);
    assert_eq!(sample.kept, 3);

    let csv_dir = work.path().join("csv");
    let summary = extract_to_csv(&sampled, &csv_dir).unwrap();
    assert_eq!(summary.total(), 3);
}

#[test]
fn test_cli_extract_reports_counts() {
    let work = tempfile::tempdir().unwrap();
    let input = write_fixture(work.path());
    let csv_dir = work.path().join("csv");

    Command::cargo_bin("osm-tidy")
        .unwrap()
        .args(["extract"])
        .arg(&input)
        .arg("--out-dir")
        .arg(&csv_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Nodes: 3"))
        .stdout(predicate::str::contains("Shaped 5 elements"));
}

#[test]
fn test_cli_rejects_missing_input() {
    Command::cargo_bin("osm-tidy")
        .unwrap()
        .args(["audit", "no-such-file.osm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}
