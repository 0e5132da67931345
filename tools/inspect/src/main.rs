/// CSV discovery and table summary tool.
///
/// Lists candidate land-cover CSVs and prints the shape, columns and
/// first rows of one of them - the checks an operator runs before
/// starting a labeling session.
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use kiln_core::table;

#[derive(Parser, Debug)]
#[command(name = "inspect", about = "List land-cover CSVs and summarize one")]
struct Args {
    /// Directory searched for CSVs (plus its data/ subdirectory).
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// CSV to summarize; defaults to the first one found.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Number of rows to preview.
    #[arg(long, default_value = "2")]
    head: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

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
            println!("Available CSVs:");
            for p in &found {
                println!("  {}", p.display());
            }
            println!();
            found[0].clone()
        }
    };

    let report = table::load_csv(&input).with_context(|| format!("loading {}", input.display()))?;
    let table = report.table;

    println!("{}", input.display());
    println!("  shape: {} rows x {} categories", table.len(), table.categories.len());
    println!("  id column: {}", table.id_column);
    println!("  categories: {}", table.categories.join(", "));
    if report.used_fallback_encoding {
        println!("  encoding: Latin-1 fallback");
    }
    if !report.warnings.is_empty() {
        println!("  skipped rows: {}", report.warnings.len());
        for w in report.warnings.iter().take(5) {
            println!("    {w}");
        }
    }

    for row in table.rows.iter().take(args.head) {
        let values: Vec<String> = row.values.iter().map(|v| format!("{v:.2}")).collect();
        println!("  {}  ({:.4}, {:.4})  [{}]", row.id, row.lat, row.lon, values.join(", "));
    }

    Ok(())
}
