//! osm-tidy - Clean an OpenStreetMap XML export into CSV and SQLite.
//!
//! This crate streams a raw `.osm` export, normalizes tag keys, corrects
//! abbreviated street names against a hand-built table, shapes each element
//! into flat rows, and writes seven CSV files ready for a schema-matched
//! SQLite load with declared data-quality filters.
//!
//! # Example
//!
//! ```
//! use osm_tidy::correct_street_name;
//!
//! assert_eq!(correct_street_name("8th Ave NE"), "8th Ave Northeast");
//! assert_eq!(correct_street_name("Cherry St"), "Cherry Street");
//! assert_eq!(correct_street_name("Union Street"), "Union Street");
//! ```
//!
//! # Architecture
//!
//! The pipeline is organized into several modules:
//!
//! - [`config`]: File names and defaults
//! - [`types`]: Core data types (Node, Way, Relation, Record)
//! - [`error`]: Error types and Result alias
//! - [`reader`]: Streaming XML element reader and sampler
//! - [`keys`]: Tag key normalization
//! - [`corrections`]: Street name correction table
//! - [`shape`]: Element-to-row shaping
//! - [`writer`]: CSV batch writer
//! - [`extract`]: Single-pass extract orchestration
//! - [`db`]: SQLite load, quality filters, and queries
//! - [`audit`]: Street and address audits
//! - [`cli`]: Command-line interface

pub mod audit;
pub mod cli;
pub mod config;
pub mod corrections;
pub mod db;
pub mod error;
pub mod extract;
pub mod keys;
pub mod reader;
pub mod shape;
pub mod types;
pub mod writer;

// Re-export main functions
pub use extract::{extract_to_csv, ExtractSummary};

// Re-export commonly used items
pub use corrections::correct_street_name;
pub use error::{Result, TidyError};
pub use keys::{split_key, KeySplit};
pub use reader::{write_sample, ElementReader};
pub use types::{ElementKind, Node, Record, Relation, Way};
