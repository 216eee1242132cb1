// src/main.rs
mod edgar;
mod extractors;
mod storage;
mod utils;

use clap::Parser;
use edgar::client::Company;
use extractors::locator;
use extractors::patterns::{PatternRegistry, PhraseSets};
use extractors::section::AcquisitionScanner;
use std::path::PathBuf;
use storage::{ExtractionReport, StorageManager};
use utils::AppError;

/// Command Line Interface for the acquisition-section miner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// SEC Central Index Key of the filer to scan
    #[arg(long)]
    cik: String,

    /// Target company name (or regex pattern) to search for
    #[arg(short, long)]
    target_name: String,

    /// Existing download index; when absent the filings are downloaded
    #[arg(long)]
    index_file: Option<PathBuf>,

    /// Earliest filing date to consider when downloading
    #[arg(long, default_value = "2006/01/01")]
    since: String,

    /// Download cursor start date (empty = latest filings)
    #[arg(long, default_value = "")]
    prior_to: String,

    /// Filing types to download and scan
    #[arg(long = "filing-type", default_values_t = [String::from("10-K"), String::from("10-Q")])]
    filing_types: Vec<String>,

    /// Match the target name (and body phrases) case-insensitively
    #[arg(long)]
    ignore_case: bool,

    /// Directory the downloaded filings are placed under
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Output directory for extracted reports
    #[arg(short, long, default_value = "./output")]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting scan for args: {:?}", args);

    // 3. Compile the pattern registry once; malformed patterns are fatal here
    let registry =
        PatternRegistry::compile(&PhraseSets::default(), &args.target_name, args.ignore_case)?;

    // 4. Ensure the download index exists, fetching the filings if needed
    let index_path = match &args.index_file {
        Some(path) if path.exists() => path.clone(),
        configured => {
            if let Some(path) = configured {
                tracing::info!("index {} missing, downloading filings", path.display());
            }
            let company = Company::fetch(&args.cik).await?;
            tracing::info!(
                "downloading {} documents for CIK {} ({})",
                args.filing_types.join("/"),
                args.cik,
                company.name
            );
            company
                .download_documents(&args.since, &args.prior_to, &args.filing_types, &args.data_dir)
                .await?
        }
    };

    // 5. Byte-level pre-filter over the index
    let entries = locator::load_index(&index_path)?;
    let candidates = locator::locate_candidates(&entries, &registry.entity_bytes);
    tracing::info!(
        "{} of {} indexed documents mention '{}'",
        candidates.len(),
        entries.len(),
        args.target_name
    );

    // 6. Scan candidates chronologically; the first hit is the initial
    //    acquisition report and ends the batch
    let scanner = AcquisitionScanner::new(registry);
    let storage = StorageManager::new(&args.output_dir)?;
    let candidate_count = candidates.len();
    let mut located = false;

    for entry in candidates {
        tracing::info!("analyzing {}...", entry.path.display());
        let Some(content) = scanner.extract_from_file(&entry.path) else {
            continue;
        };
        tracing::info!(
            "located acquisition asset report: CIK {} target '{}' date {} {}: {}",
            args.cik,
            args.target_name,
            entry.filing_date,
            entry.filing_type,
            entry.path.display()
        );
        tracing::info!("filing details: {}", entry.source_url);
        tracing::info!("{}", content);

        let report = ExtractionReport {
            cik: args.cik.clone(),
            target_name: args.target_name.clone(),
            filing_type: entry.filing_type.clone(),
            filing_date: entry.filing_date.clone(),
            source_doc: entry.path.clone(),
            source_url: entry.source_url.clone(),
            content,
        };
        match storage.save_report(&report) {
            Ok(path) => tracing::info!("Saved report content to: {}", path.display()),
            Err(e) => tracing::error!("Failed to save report content: {}", e),
        }
        match storage.save_report_metadata(&report) {
            Ok(path) => tracing::info!("Saved report metadata to: {}", path.display()),
            Err(e) => tracing::error!("Failed to save report metadata: {}", e),
        }
        located = true;
        break;
    }

    if !located {
        // an ordinary outcome: the section is simply absent from this batch
        tracing::info!(
            "no acquisition asset report located for '{}' in {} candidate documents",
            args.target_name,
            candidate_count
        );
    }

    Ok(())
}
