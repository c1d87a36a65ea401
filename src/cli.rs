//! Command-line interface for the pipeline.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::audit::audit_file;
use crate::config::{DEFAULT_DB_FILE, DEFAULT_SAMPLE_INTERVAL};
use crate::db::{self, RecordTable};
use crate::error::{Result, TidyError};
use crate::extract::extract_to_csv_with_progress;
use crate::reader::write_sample;

/// osm-tidy - Clean an OpenStreetMap XML export into CSV and SQLite.
#[derive(Parser)]
#[command(name = "osm-tidy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a smaller export containing every k-th top-level element.
    Sample {
        /// Input OSM XML file
        input: PathBuf,

        /// Output XML file
        output: PathBuf,

        /// Keep one element out of every this many
        #[arg(short = 'k', long, default_value_t = DEFAULT_SAMPLE_INTERVAL)]
        every: usize,
    },

    /// Clean an export and shape it into the seven CSV files.
    Extract {
        /// Input OSM XML file
        input: PathBuf,

        /// Directory for the CSV files (default: current directory)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Load the CSV files into SQLite and apply the data-quality filters.
    Load {
        /// Directory holding the CSV files (default: current directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Database file to create (default: osm.db)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Print summary statistics from a loaded database.
    Report {
        /// Database file (default: osm.db)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Also break one year down by month
        #[arg(short, long)]
        year: Option<u16>,
    },

    /// Survey street and address values without writing anything.
    Audit {
        /// Input OSM XML file
        input: PathBuf,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sample {
            input,
            output,
            every,
        } => sample_command(&input, &output, every),
        Commands::Extract { input, out_dir } => extract_command(&input, out_dir.as_deref()),
        Commands::Load { dir, db } => load_command(dir.as_deref(), db.as_deref()),
        Commands::Report { db, year } => report_command(db.as_deref(), year),
        Commands::Audit { input } => audit_command(&input),
    }
}

fn require_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(TidyError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Input file does not exist: {}", path.display()),
        )));
    }
    Ok(())
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Execute the sample command.
fn sample_command(input: &Path, output: &Path, every: usize) -> Result<()> {
    require_file(input)?;

    println!(
        "{} every {} element of {}",
        style("Sampling").bold(),
        style(format!("{every}th")).cyan(),
        style(input.display()).green()
    );

    let pb = spinner();
    pb.set_message("Copying elements...");

    let summary = match write_sample(input, output, every) {
        Ok(summary) => summary,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    pb.finish_and_clear();

    println!(
        "{} {} of {} elements to {}",
        style("Kept").green().bold(),
        summary.kept,
        summary.scanned,
        output.display()
    );
    Ok(())
}

/// Execute the extract command.
fn extract_command(input: &Path, out_dir: Option<&Path>) -> Result<()> {
    require_file(input)?;
    let out_dir = out_dir.unwrap_or_else(|| Path::new("."));

    println!(
        "{} {} into {}",
        style("Extracting").bold(),
        style(input.display()).cyan(),
        style(out_dir.display()).green()
    );
    println!();

    let pb = spinner();
    pb.set_message("Reading elements...");

    let summary = match extract_to_csv_with_progress(input, out_dir, |n| {
        pb.set_message(format!("Shaped {n} elements..."));
    }) {
        Ok(summary) => summary,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    pb.finish_and_clear();

    println!("  Nodes: {}", style(summary.nodes).green());
    println!("  Ways: {}", style(summary.ways).green());
    println!("  Relations: {}", style(summary.relations).green());
    if summary.dropped_tags > 0 {
        println!(
            "  Dropped tags: {}",
            style(summary.dropped_tags).yellow().bold()
        );
    }

    println!();
    println!(
        "{} {} elements",
        style("Shaped").green().bold(),
        summary.total()
    );
    Ok(())
}

/// Execute the load command.
fn load_command(dir: Option<&Path>, db_path: Option<&Path>) -> Result<()> {
    let dir = dir.unwrap_or_else(|| Path::new("."));
    let db_path = db_path.unwrap_or_else(|| Path::new(DEFAULT_DB_FILE));

    println!(
        "{} {} into {}",
        style("Loading").bold(),
        style(dir.display()).cyan(),
        style(db_path.display()).green()
    );

    let pb = spinner();
    pb.set_message("Loading CSV files...");

    let mut conn = match db::open(db_path) {
        Ok(conn) => conn,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };

    let result = db::create_tables(&conn)
        .and_then(|()| db::load_csv_dir(&mut conn, dir))
        .and_then(|loaded| {
            pb.set_message("Applying quality filters...");
            db::apply_quality_filters(&conn).map(|filters| (loaded, filters))
        });
    let (loaded, filters) = match result {
        Ok(pair) => pair,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    pb.finish_and_clear();

    for (table, rows) in &loaded.rows {
        println!("  {table}: {}", style(rows).green());
    }
    println!(
        "  Removed: {} fixme rows, {} misplaced rows",
        style(filters.fixme_rows).yellow(),
        style(filters.bad_type_rows).yellow()
    );
    println!(
        "  Rewritten: {} values",
        style(filters.centre_fixed + filters.cuisine_collapsed).yellow()
    );

    println!();
    println!(
        "{} {} rows",
        style("Loaded").green().bold(),
        loaded.total()
    );
    Ok(())
}

/// Execute the report command.
fn report_command(db_path: Option<&Path>, year: Option<u16>) -> Result<()> {
    let db_path = db_path.unwrap_or_else(|| Path::new(DEFAULT_DB_FILE));
    require_file(db_path)?;
    let conn = db::open(db_path)?;

    println!("{}", style("Table sizes").bold());
    for count in db::table_counts(&conn)? {
        println!("  {}: {}", count.table, style(count.rows).green());
    }

    println!();
    println!("{}", style("Contributors").bold());
    println!(
        "  Distinct node users: {}",
        style(db::distinct_user_count(&conn, RecordTable::Nodes)?).green()
    );
    println!(
        "  Distinct way users: {}",
        style(db::distinct_user_count(&conn, RecordTable::Ways)?).green()
    );
    for top in db::top_contributors(&conn, RecordTable::Nodes, 10)? {
        println!("  {}: {}", top.user, top.entries);
    }

    println!();
    println!("{}", style("Node edits by year").bold());
    for period in db::records_by_year(&conn, RecordTable::Nodes)? {
        println!("  {}: {}", period.period, period.entries);
    }
    if let Some(year) = year {
        println!();
        println!("{}", style(format!("Node edits in {year} by month")).bold());
        for period in db::records_by_month(&conn, RecordTable::Nodes, year)? {
            println!("  {}: {}", period.period, period.entries);
        }
    }

    println!();
    println!("{}", style("Cuisines").bold());
    for cuisine in db::cuisine_counts(&conn, 10)? {
        println!(
            "  {}: {} ({:.1}%)",
            cuisine.cuisine, cuisine.entries, cuisine.share_percent
        );
    }

    println!();
    println!("{}", style("Counties on ways").bold());
    for county in db::county_values(&conn)? {
        println!("  {county}");
    }
    println!(
        "  Unreviewed way tags: {}",
        style(db::unreviewed_count(&conn)?).yellow()
    );

    Ok(())
}

/// Execute the audit command.
fn audit_command(input: &Path) -> Result<()> {
    require_file(input)?;

    println!("{} {}", style("Auditing").bold(), style(input.display()).cyan());

    let pb = spinner();
    pb.set_message("Scanning addresses...");

    let report = match audit_file(input) {
        Ok(report) => report,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    pb.finish_and_clear();

    for (kind, count) in report.scanned {
        println!("  {}s scanned: {}", kind.as_str(), style(count).green());
    }

    println!();
    if report.street_types.is_empty() {
        println!("{}", style("All street types look expected").green());
    } else {
        println!("{}", style("Unexpected street types").yellow().bold());
        for (street_type, names) in &report.street_types {
            println!("  {street_type}:");
            for name in names {
                println!("    {name}");
            }
        }
    }

    if !report.odd_cities.is_empty() {
        println!();
        println!("{}", style("Odd city values").yellow().bold());
        for value in &report.odd_cities {
            println!("  {value}");
        }
    }
    if !report.odd_housenumbers.is_empty() {
        println!();
        println!("{}", style("Odd house numbers").yellow().bold());
        for value in &report.odd_housenumbers {
            println!("  {value}");
        }
    }
    if !report.odd_postcodes.is_empty() {
        println!();
        println!("{}", style("Odd postcodes").yellow().bold());
        for value in &report.odd_postcodes {
            println!("  {value}");
        }
    }

    println!();
    println!("{}", style("Cities seen").bold());
    for city in &report.cities {
        println!("  {city}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_sample_defaults() {
        let cli = Cli::parse_from(["osm-tidy", "sample", "in.osm", "out.osm"]);

        let Commands::Sample {
            input,
            output,
            every,
        } = cli.command
        else {
            panic!("expected sample command");
        };
        assert_eq!(input, PathBuf::from("in.osm"));
        assert_eq!(output, PathBuf::from("out.osm"));
        assert_eq!(every, DEFAULT_SAMPLE_INTERVAL);
    }

    #[test]
    fn test_cli_parse_extract_with_out_dir() {
        let cli = Cli::parse_from(["osm-tidy", "extract", "in.osm", "--out-dir", "csv"]);

        let Commands::Extract { input, out_dir } = cli.command else {
            panic!("expected extract command");
        };
        assert_eq!(input, PathBuf::from("in.osm"));
        assert_eq!(out_dir, Some(PathBuf::from("csv")));
    }

    #[test]
    fn test_cli_parse_report_year() {
        let cli = Cli::parse_from(["osm-tidy", "report", "--db", "x.db", "-y", "2015"]);

        let Commands::Report { db, year } = cli.command else {
            panic!("expected report command");
        };
        assert_eq!(db, Some(PathBuf::from("x.db")));
        assert_eq!(year, Some(2015));
    }
}
