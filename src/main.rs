use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use texglue::fetch::{self, FetchJob};

/// Populate vendor/temml with the artifacts of the pinned Temml release.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Project root holding the TEMML-VERSION pin file (default: current directory)
    #[arg(long)]
    root: Option<PathBuf>,
    /// Override the pinned release tag, e.g. 0.11.02
    #[arg(long)]
    tag: Option<String>,
    /// JSON manifest mapping vendored file names to expected SHA-256 digests
    #[arg(long)]
    checksums: Option<PathBuf>,
    /// Override the host release archives are fetched from (mirrors)
    #[arg(long)]
    repo_base: Option<String>,
    /// Override the host the license is fetched from (mirrors)
    #[arg(long)]
    raw_base: Option<String>,
    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let job = FetchJob {
        root: args.root.unwrap_or_else(|| PathBuf::from(".")),
        tag: args.tag,
        checksums: args.checksums,
        repo_base: args.repo_base,
        raw_base: args.raw_base,
    };

    match fetch::run(&job) {
        Ok(report) => info!(
            version = %report.version,
            files = report.files.len(),
            dir = %report.vendor_dir.display(),
            "vendor directory up to date"
        ),
        Err(e) => {
            error!(error = %e, "vendor fetch failed");
            std::process::exit(1);
        }
    }
}
