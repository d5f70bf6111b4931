//! Cube history scanner for CubeCobra.
//!
//! Fetches a cube's blog newest-first, replays every card swap in
//! chronological order, and reports which slot changed the most and how
//! many slots never changed.
//!
//! ```bash
//! cargo run -p cubehist -- modernclassics --max-pages 5
//! ```

use cubehist_core::{session, ScanConfig, ScanOutcome, DEFAULT_CUBE_ID, DEFAULT_MAX_PAGES};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {message}");
            eprintln!("Run with --help for usage.");
            std::process::exit(1);
        }
    };

    let mut config = ScanConfig::new(options.cube_id).with_max_pages(options.max_pages);
    if let Some(base_url) = options.base_url {
        config = config.with_base_url(base_url);
    }

    let outcome = match session::run(config).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_report(&outcome);
    }

    Ok(())
}

/// Parsed command-line options.
struct CliOptions {
    cube_id: String,
    max_pages: usize,
    base_url: Option<String>,
    json: bool,
}

/// Parse command line arguments (program name already stripped).
fn parse_args(args: &[String]) -> Result<CliOptions, String> {
    let mut cube_id: Option<String> = None;
    let mut max_pages = DEFAULT_MAX_PAGES;
    let mut base_url = None;
    let mut json = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--max-pages" => {
                let value = args
                    .get(i + 1)
                    .ok_or("--max-pages requires a value".to_string())?;
                max_pages = value
                    .parse()
                    .map_err(|_| format!("invalid --max-pages value '{value}'"))?;
                i += 1;
            }
            "--base-url" => {
                let value = args
                    .get(i + 1)
                    .ok_or("--base-url requires a value".to_string())?;
                base_url = Some(value.clone());
                i += 1;
            }
            "--json" => json = true,
            other if other.starts_with('-') => {
                return Err(format!("unknown option '{other}'"));
            }
            other => {
                if cube_id.is_some() {
                    return Err(format!("unexpected argument '{other}'"));
                }
                cube_id = Some(other.to_string());
            }
        }
        i += 1;
    }

    Ok(CliOptions {
        cube_id: cube_id.unwrap_or_else(|| DEFAULT_CUBE_ID.to_string()),
        max_pages,
        base_url,
        json,
    })
}

/// Print the human-readable report.
fn print_report(outcome: &ScanOutcome) {
    println!("=== Cube History: {} ===", outcome.cube_id);
    for stats in &outcome.pages {
        println!(
            "page {}: {} additions, {} changes",
            stats.page, stats.additions, stats.changes
        );
    }
    println!(
        "{} slots, {} changes replayed",
        outcome.slots, outcome.changes_applied
    );
    println!();

    match &outcome.report {
        Some(report) => {
            println!(
                "Most varied: {}, {}",
                report.most_varied.variations, report.most_varied.history
            );
            println!("{} slots have never changed", report.unchanged_slots);
        }
        None => {
            println!("no slots recorded");
        }
    }
}

fn print_help() {
    println!("cubehist - CubeCobra cube history scanner");
    println!();
    println!("Reconstructs the history of a cube's card slots from its blog and");
    println!("reports the most varied slot and how many slots never changed.");
    println!();
    println!("USAGE:");
    println!("  cubehist [OPTIONS] [CUBE_ID]");
    println!();
    println!("ARGS:");
    println!("  CUBE_ID            Cube to scan (default: {DEFAULT_CUBE_ID})");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help         Show this help message");
    println!("  --max-pages <N>    Blog pages to fetch, newest first (default: {DEFAULT_MAX_PAGES})");
    println!("  --base-url <URL>   CubeCobra base URL (or CUBECOBRA_BASE_URL env var)");
    println!("  --json             Print the full scan outcome as JSON");
    println!();
    println!("EXAMPLES:");
    println!("  cubehist                           # Scan {DEFAULT_CUBE_ID}");
    println!("  cubehist vintagecube --max-pages 3");
    println!("  cubehist modernclassics --json");
}
