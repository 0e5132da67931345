/// Interactive terminal session for labeling brick-kiln tiles.
///
/// Loads a land-cover CSV, applies a filter, then steps through the
/// matching tiles one at a time. Each tile can be opened on a satellite
/// basemap via a generated preview page; labels are exported to a
/// timestamped CSV.
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;

use kiln_core::coords::LatLon;
use kiln_core::export;
use kiln_core::filter::{self, FilterPolicy};
use kiln_core::map::{MapProvider, MapView};
use kiln_core::profile::{FilterMode, Profile};
use kiln_core::session::{Label, LabelPolicy, LabelSession};
use kiln_core::table::{self, CategoryTable};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "labeler", about = "Filter land-cover tiles and label brick kiln presence")]
struct Args {
    /// Land-cover CSV (discovered from --dir when omitted).
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory searched for CSVs when --input is omitted.
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Variant profile JSON; defaults apply when omitted.
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Filter mode: specific, any-max, or all.
    #[arg(long)]
    mode: Option<String>,

    /// Category for specific-category filtering.
    #[arg(long)]
    category: Option<String>,

    /// Minimum percentage threshold.
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Comma-separated categories for any-max (omit to consider all).
    #[arg(long)]
    consider: Option<String>,

    /// Labeling policy: explicit or default-no.
    #[arg(long)]
    policy: Option<String>,

    /// Basemap: esri, google, or osm.
    #[arg(long)]
    provider: Option<String>,

    /// Directory for exported label CSVs.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Where the map preview page is written.
    #[arg(long, default_value = "tile_preview.html")]
    map_html: PathBuf,
}

// ── Profile resolution ───────────────────────────────────────────────────────

fn resolve_profile(args: &Args) -> Result<Profile> {
    let mut profile = match &args.profile {
        Some(path) => Profile::load(path).with_context(|| format!("loading profile {}", path.display()))?,
        None => Profile::default(),
    };

    if let Some(mode) = &args.mode {
        profile.filter_mode = match mode.as_str() {
            "specific" => FilterMode::SpecificCategory,
            "any-max" => FilterMode::AnyCategoryMax,
            "all" => FilterMode::AllLocations,
            other => bail!("unknown filter mode `{other}` (expected specific, any-max, or all)"),
        };
    }
    if let Some(t) = args.threshold {
        profile.default_threshold = t;
    }
    if let Some(c) = &args.category {
        profile.default_category = c.clone();
    }
    if let Some(policy) = &args.policy {
        profile.label_policy = match policy.as_str() {
            "explicit" => LabelPolicy::Explicit,
            "default-no" => LabelPolicy::DefaultNo,
            other => bail!("unknown labeling policy `{other}` (expected explicit or default-no)"),
        };
    }
    if let Some(provider) = &args.provider {
        profile.map_provider = match provider.as_str() {
            "esri" => MapProvider::EsriWorldImagery,
            "google" => MapProvider::GoogleSatellite,
            "osm" => MapProvider::OpenStreetMap,
            other => bail!("unknown map provider `{other}` (expected esri, google, or osm)"),
        };
    }
    Ok(profile)
}

/// Filter policy for the session. A default category missing from the
/// table falls back to the first column, as the original screens did.
fn build_policy(profile: &Profile, table: &CategoryTable, consider: &[String]) -> FilterPolicy {
    match profile.filter_mode {
        FilterMode::SpecificCategory => {
            let name = if table.categories.iter().any(|c| c == &profile.default_category) {
                profile.default_category.clone()
            } else {
                table.categories[0].clone()
            };
            FilterPolicy::SpecificCategory { name, threshold: profile.default_threshold }
        }
        FilterMode::AnyCategoryMax => FilterPolicy::AnyCategoryMax {
            threshold: profile.default_threshold,
            consider: consider.to_vec(),
        },
        FilterMode::AllLocations => FilterPolicy::AllLocations,
    }
}

// ── Main loop ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    let profile = resolve_profile(&args)?;

    let input = match &args.input {
        Some(path) => path.clone(),
        None => {
            let found = table::available_csvs(&args.dir)?;
            if found.is_empty() {
                bail!(
                    "no CSV files found in {} - add CSV files there or under data/",
                    args.dir.display()
                );
            }
            eprintln!("Available CSVs:");
            for p in &found {
                eprintln!("  {}", p.display());
            }
            found[0].clone()
        }
    };

    let report = table::load_csv(&input).with_context(|| format!("loading {}", input.display()))?;
    if report.used_fallback_encoding {
        eprintln!("note: {} loaded with Latin-1 fallback encoding", input.display());
    }
    for w in report.warnings.iter().take(5) {
        eprintln!("warning: {w}");
    }
    if report.warnings.len() > 5 {
        eprintln!("warning: ... and {} more rows skipped", report.warnings.len() - 5);
    }

    let table = report.table;
    eprintln!("Loaded {}: {} locations, {} categories", input.display(), table.len(), table.categories.len());

    let consider: Vec<String> = args
        .consider
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let policy = build_policy(&profile, &table, &consider);
    let subset = filter::apply(&table, &policy)?;
    println!("Found {} locations matching: {}", subset.len(), policy.describe());

    let mut session = LabelSession::new(subset, profile.label_policy);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    print_help();
    loop {
        print_status(&session);
        print!("> ");
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap_or("");
        let arg = parts.next();

        match cmd {
            "" | "n" => session.advance(),
            "p" => session.retreat(),
            "g" => match arg.and_then(|a| a.parse::<usize>().ok()) {
                Some(seq) if seq >= 1 => {
                    if let Err(e) = session.goto(seq - 1) {
                        eprintln!("{e}");
                    }
                }
                _ => eprintln!("usage: g <image number>"),
            },
            "y" => session.set_label(Label::Present),
            "x" => session.set_label(Label::Absent),
            "." => session.mark_no_and_advance(),
            "m" => {
                if let Some(row) = session.current() {
                    let view = MapView::for_tile(
                        &row.id,
                        LatLon::new(row.lat, row.lon),
                        profile.map_provider,
                        profile.zoom,
                    );
                    match fs::write(&args.map_html, view.leaflet_html()) {
                        Ok(()) => println!("map preview written to {}", args.map_html.display()),
                        Err(e) => eprintln!("map preview failed: {e}"),
                    }
                } else {
                    eprintln!("no current tile");
                }
            }
            "f" => match arg.and_then(|a| a.parse::<f64>().ok()) {
                Some(t) => {
                    let mut updated = profile.clone();
                    updated.default_threshold = t;
                    let new_policy = build_policy(&updated, &table, &consider);
                    match filter::apply(&table, &new_policy) {
                        Ok(subset) => {
                            println!("Found {} locations matching: {}", subset.len(), new_policy.describe());
                            session = LabelSession::new(subset, profile.label_policy);
                        }
                        Err(e) => eprintln!("{e}"),
                    }
                }
                None => eprintln!("usage: f <threshold>"),
            },
            "e" => {
                let outcome = export::records(&session)
                    .and_then(|records| export::write_csv(&records, &args.output, Local::now()).map(|p| (p, records.len())));
                match outcome {
                    Ok((path, count)) => {
                        let summary = session.summary();
                        println!("wrote {} ({count} records)", path.display());
                        println!(
                            "summary: {} kilns in {} labeled of {} total",
                            summary.kilns, summary.labeled, summary.total
                        );
                    }
                    Err(e) => eprintln!("export failed: {e}"),
                }
            }
            "s" => {
                let summary = session.summary();
                println!(
                    "{} labeled of {} total, {} kilns",
                    summary.labeled, summary.total, summary.kilns
                );
                if !summary.kiln_sequences.is_empty() {
                    let seqs: Vec<String> = summary.kiln_sequences.iter().map(usize::to_string).collect();
                    println!("kiln images: {}", seqs.join(", "));
                }
            }
            "q" => break,
            "h" | "?" => print_help(),
            other => {
                eprintln!("unknown command `{other}`");
                print_help();
            }
        }
    }

    Ok(())
}

// ── Display ──────────────────────────────────────────────────────────────────

fn print_status(session: &LabelSession) {
    let Some(row) = session.current() else {
        println!("0 locations in the current subset - adjust the filter (f) or quit (q)");
        return;
    };

    let label = match session.current_label() {
        Some(Label::Present) => "KILN",
        Some(Label::Absent) => "no kiln",
        None => "unlabeled",
    };
    let done = if session.at_end() { "  [last image]" } else { "" };
    println!(
        "IMAGE #{}/{}  {}  ({:.4}, {:.4}){done}",
        session.cursor() + 1,
        session.len(),
        row.id,
        row.lat,
        row.lon
    );
    println!(
        "  dominant: {} {:.2}%  label: {}  labeled {}/{}",
        row.max_category,
        row.max_percentage,
        label,
        session.labeled_count(),
        session.len()
    );
}

fn print_help() {
    println!(
        "commands: n/enter next, p prev, g N goto, y kiln, x no kiln, \
         . quick-no, m map, f T refilter, e export, s summary, q quit"
    );
}
