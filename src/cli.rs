//! Command-line interface implementation

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::models::Pack;
use crate::sheet::RasterBackend;
use crate::verify::{verify_pack, VerifyReport};

const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_INVALID_ARGS: u8 = 2;

/// spritepack - verify sprite pack definitions against their sheet images
#[derive(Parser)]
#[command(name = "spak")]
#[command(about = "Verify sprite pack definitions against their sheet images")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify pack definition files: structural checks, sprite bounds
    /// against the decoded sheet, and a diagnostic preview image
    Verify {
        /// Pack definition JSON files (index files are skipped)
        #[arg(required = true)]
        packs: Vec<PathBuf>,

        /// Directory holding extracted pack archives, one subdirectory
        /// per pack id
        #[arg(long, default_value = ".cache")]
        cache_dir: PathBuf,

        /// Skip writing the preview grid image
        #[arg(long)]
        no_preview: bool,

        /// Print reports as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Verify {
            packs,
            cache_dir,
            no_preview,
            json,
        } => run_verify(&packs, &cache_dir, no_preview, json),
    }
}

/// Execute the verify command over a list of definition files.
fn run_verify(packs: &[PathBuf], cache_dir: &Path, no_preview: bool, json: bool) -> ExitCode {
    let mut total_errors = 0usize;

    for def_path in packs {
        // Index files list packs, they are not packs themselves
        if def_path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().ends_with("_index.json"))
        {
            continue;
        }

        if !def_path.exists() {
            eprintln!("File not found: {}", def_path.display());
            total_errors += 1;
            continue;
        }

        let report = verify_one(def_path, cache_dir, no_preview);
        total_errors += report.errors.len();

        if json {
            match serde_json::to_string_pretty(&report) {
                Ok(out) => println!("{}", out),
                Err(e) => {
                    eprintln!("Error: failed to serialize report: {}", e);
                    return ExitCode::from(EXIT_INVALID_ARGS);
                }
            }
        } else {
            print_report(def_path, &report);
        }
    }

    if total_errors > 0 {
        eprintln!("\n{} error(s) found.", total_errors);
        ExitCode::from(EXIT_ERROR)
    } else {
        println!("\nAll packs valid.");
        ExitCode::from(EXIT_SUCCESS)
    }
}

/// Verify a single definition file, folding load problems into the report
/// so the caller always gets the one-report-per-pack contract.
fn verify_one(def_path: &Path, cache_dir: &Path, no_preview: bool) -> VerifyReport {
    let mut report = VerifyReport {
        valid: false,
        sprite_count: 0,
        errors: Vec::new(),
        warnings: Vec::new(),
        preview_path: None,
    };

    let content = match std::fs::read_to_string(def_path) {
        Ok(c) => c,
        Err(e) => {
            report.errors.push(format!("Cannot read file: {}", e));
            return report;
        }
    };

    let pack = match Pack::from_str(&content) {
        Ok(p) => p,
        Err(e) => {
            report.errors.push(format!("Invalid JSON: {}", e));
            return report;
        }
    };

    // Fetching/extracting archives is external; an unfetched pack is a
    // resolution error for this pack only
    let pack_dir = cache_dir.join(&pack.id);
    if !pack.id.is_empty() && !pack_dir.exists() {
        report.sprite_count = pack.sprites.len();
        report.errors.push(format!(
            "Pack directory not found: {} (fetch the pack first)",
            pack_dir.display()
        ));
        return report;
    }

    let preview_path = if no_preview {
        None
    } else {
        let dir = def_path.parent().unwrap_or(Path::new("."));
        Some(dir.join(format!("{}-preview.png", pack.id)))
    };

    verify_pack(&pack, &pack_dir, Some(&RasterBackend), preview_path.as_deref())
}

fn print_report(def_path: &Path, report: &VerifyReport) {
    println!("\nVerifying: {}", def_path.display());

    if !report.errors.is_empty() {
        println!("  ERRORS:");
        for err in &report.errors {
            println!("    - {}", err);
        }
    }

    if !report.warnings.is_empty() {
        println!("  WARNINGS:");
        for warn in &report.warnings {
            println!("    - {}", warn);
        }
    }

    if let Some(path) = &report.preview_path {
        println!("  Preview: {}", path.display());
    }

    println!(
        "  Status: {} ({} sprites)",
        if report.valid { "VALID" } else { "INVALID" },
        report.sprite_count
    );
}
