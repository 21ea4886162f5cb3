//! aircot: classify ADS-B reports into CoT types from the command line.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use serde::Serialize;
use tracing::{debug, info, warn};

use aircot_core::config::{self, Config};
use aircot_core::{parse_address, ClassificationResult, Classifier, Report, TableSet};

#[derive(Parser)]
#[command(name = "aircot", version, about = "ADS-B report to Cursor-on-Target type classifier")]
struct Cli {
    /// Config file (default: ~/.aircot/config.yaml)
    #[arg(long, global = true, env = "AIRCOT_CONFIG")]
    config: Option<PathBuf>,

    /// ICAO range table (JSON or .csv), overrides the config
    #[arg(long, global = true)]
    ranges: Option<PathBuf>,

    /// Known-craft table (JSON or .csv), overrides the config
    #[arg(long, global = true)]
    known_craft: Option<PathBuf>,

    /// Emitter category table (JSON), overrides the config
    #[arg(long, global = true)]
    categories: Option<PathBuf>,

    /// Emergency squawk table (JSON), overrides the config
    #[arg(long, global = true)]
    emergency: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single report
    Classify {
        /// ICAO address, hex (e.g. A1B2C3)
        #[arg(long)]
        icao: Option<String>,

        #[arg(long)]
        callsign: Option<String>,

        /// Emitter category (A0-D7 or GDL90 number)
        #[arg(long)]
        category: Option<String>,

        /// Transponder code, 4 octal digits
        #[arg(long)]
        squawk: Option<String>,

        /// Registration / tail number
        #[arg(long)]
        registration: Option<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify JSON-lines reports from a file ("-" for stdin)
    Batch {
        file: PathBuf,

        /// Print a summary table instead of JSON lines
        #[arg(long)]
        table: bool,
    },

    /// Load the configured reference tables and print statistics
    Check,

    /// Show the effective configuration
    Config {
        /// Save it to the config file
        #[arg(long)]
        write: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = effective_config(&cli);

    match cli.command {
        Commands::Classify {
            icao,
            callsign,
            category,
            squawk,
            registration,
            json,
        } => {
            let report = Report {
                icao: icao.as_deref().and_then(parse_icao_arg),
                callsign,
                category,
                squawk,
                registration,
            };
            cmd_classify(&config, &report, json);
        }
        Commands::Batch { file, table } => cmd_batch(&config, &file, table),
        Commands::Check => cmd_check(&config),
        Commands::Config { write } => cmd_config(&config, cli.config.as_deref(), write),
    }
}

/// Initialize logging on stderr; stdout carries results.
fn init_logging(verbose: bool) {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_level(true);

    if verbose {
        subscriber.with_max_level(tracing::Level::DEBUG).init();
        debug!("Verbose logging enabled (DEBUG level)");
    } else {
        subscriber.with_max_level(tracing::Level::WARN).init();
    }
}

/// Config file plus command-line table overrides.
fn effective_config(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    };
    let overrides = [
        (&cli.ranges, &mut config.tables.ranges),
        (&cli.known_craft, &mut config.tables.known_craft),
        (&cli.categories, &mut config.tables.categories),
        (&cli.emergency, &mut config.tables.emergency),
    ];
    for (arg, slot) in overrides {
        if let Some(p) = arg {
            *slot = Some(p.display().to_string());
        }
    }
    config
}

fn parse_icao_arg(hex: &str) -> Option<u32> {
    match parse_address(hex) {
        Ok(addr) => Some(addr),
        Err(e) => {
            warn!(icao = hex, error = %e, "ignoring ICAO address");
            None
        }
    }
}

fn build_classifier(config: &Config) -> Classifier {
    let tables = TableSet::load(&config.dataset_paths()).unwrap_or_else(|e| {
        eprintln!("Error loading reference tables: {e}");
        std::process::exit(1);
    });
    Classifier::new(tables, config.classifier_options())
}

fn cmd_classify(config: &Config, report: &Report, json: bool) {
    let classifier = build_classifier(config);
    let result = classifier.classify(report);

    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error encoding result: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    println!("{}", result.type_string);
    println!();
    println!("  Label:      {}", result.label.as_deref().unwrap_or("-"));
    println!("  Source:     {} ({:?})", result.source.as_str(), result.confidence);
    println!("  Attitude:   {:?}", result.attitude);
    println!("  Operator:   {:?}", result.operator);
    println!("  Airframe:   {:?}", result.airframe);
    println!("  Country:    {}", result.country.as_deref().unwrap_or("-"));
    println!(
        "  Emergency:  {}",
        result
            .emergency
            .map(|e| e.to_string())
            .unwrap_or("-".into())
    );
    println!(
        "  Display:    {:?} / {:?}",
        result.display_hint.icon, result.display_hint.color
    );
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// One JSON-lines output record.
#[derive(Serialize)]
struct BatchRow {
    icao: Option<String>,
    #[serde(flatten)]
    result: ClassificationResult,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct BatchCounts {
    classified: u64,
    malformed: u64,
}

fn cmd_batch(config: &Config, file: &Path, table: bool) {
    let classifier = build_classifier(config);

    let reader: Box<dyn BufRead> = if file.to_str() == Some("-") {
        Box::new(io::stdin().lock())
    } else {
        let f = std::fs::File::open(file).unwrap_or_else(|e| {
            eprintln!("Error opening {}: {e}", file.display());
            std::process::exit(1);
        });
        Box::new(io::BufReader::new(f))
    };

    let mut rows = Vec::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let counts = classify_lines(&classifier, reader, |row| {
        if table {
            rows.push(row);
            return Ok(());
        }
        let line = serde_json::to_string(&row).map_err(io::Error::other)?;
        writeln!(out, "{line}")
    });
    let counts = counts.unwrap_or_else(|e| {
        eprintln!("Error during batch: {e}");
        std::process::exit(1);
    });

    if table {
        print_table(&rows);
    }
    info!(
        classified = counts.classified,
        malformed = counts.malformed,
        "batch complete"
    );
    if counts.malformed > 0 {
        eprintln!("{} malformed line(s) skipped", counts.malformed);
    }
}

/// Classify each JSON line, handing results to `emit`. Blank lines and `#`
/// comments are skipped; malformed lines are reported and counted.
fn classify_lines<R, F>(classifier: &Classifier, reader: R, mut emit: F) -> io::Result<BatchCounts>
where
    R: BufRead,
    F: FnMut(BatchRow) -> io::Result<()>,
{
    let mut counts = BatchCounts::default();

    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let report: Report = match serde_json::from_str(text) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("line {}: {e}", n + 1);
                counts.malformed += 1;
                continue;
            }
        };

        let result = classifier.classify(&report);
        counts.classified += 1;
        emit(BatchRow {
            icao: report.address().map(aircot_core::address_to_hex),
            result,
        })?;
    }

    Ok(counts)
}

fn print_table(rows: &[BatchRow]) {
    println!();
    println!("Reports: {}", rows.len());
    println!();

    if rows.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "ICAO", "Label", "CoT Type", "Source", "Airframe", "Emergency", "Country",
    ]);

    for row in rows {
        let r = &row.result;
        table.add_row(vec![
            Cell::new(row.icao.as_deref().unwrap_or("-")),
            Cell::new(r.label.as_deref().unwrap_or("-")),
            Cell::new(r.type_string.as_str()),
            Cell::new(r.source.as_str()),
            Cell::new(format!("{:?}", r.airframe)),
            Cell::new(
                r.emergency
                    .map(|e| e.to_string())
                    .unwrap_or("-".into()),
            ),
            Cell::new(r.country.as_deref().unwrap_or("-")),
        ]);
    }

    println!("{table}");
}

// ---------------------------------------------------------------------------
// Check / config
// ---------------------------------------------------------------------------

fn cmd_check(config: &Config) {
    let tables = TableSet::load(&config.dataset_paths()).unwrap_or_else(|e| {
        eprintln!("Reference tables failed to load: {e}");
        std::process::exit(1);
    });
    let stats = tables.stats();
    let version = |v: &Option<String>| v.clone().unwrap_or("-".into());
    let origin = |p: &Option<String>| p.clone().unwrap_or("embedded".into());

    println!();
    println!("Reference tables OK");
    println!();

    let mut table = Table::new();
    table.set_header(vec!["Table", "Entries", "Duplicates", "Version", "Source"]);
    table.add_row(vec![
        Cell::new("ranges"),
        Cell::new(stats.ranges),
        Cell::new(0),
        Cell::new(version(&stats.ranges_version)),
        Cell::new(origin(&config.tables.ranges)),
    ]);
    table.add_row(vec![
        Cell::new("known_craft"),
        Cell::new(format!(
            "{} by address, {} by registration",
            stats.known_addresses, stats.known_registrations
        )),
        Cell::new(stats.known_duplicates),
        Cell::new(version(&stats.known_craft_version)),
        Cell::new(origin(&config.tables.known_craft)),
    ]);
    table.add_row(vec![
        Cell::new("categories"),
        Cell::new(stats.categories),
        Cell::new(stats.category_duplicates),
        Cell::new(version(&stats.categories_version)),
        Cell::new(origin(&config.tables.categories)),
    ]);
    table.add_row(vec![
        Cell::new("emergency"),
        Cell::new(stats.emergency_codes),
        Cell::new(0),
        Cell::new(version(&stats.emergency_version)),
        Cell::new(origin(&config.tables.emergency)),
    ]);
    println!("{table}");
}

fn cmd_config(config: &Config, path: Option<&Path>, write: bool) {
    print!("{}", config::serialize_config(config));
    if write {
        let saved = match path {
            Some(p) => config::save_config_to(config, p).map(|()| p.to_path_buf()),
            None => config::save_config(config),
        };
        let path = saved.unwrap_or_else(|e| {
            eprintln!("Error writing config: {e}");
            std::process::exit(1);
        });
        println!();
        println!("Saved to {}", path.display());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
