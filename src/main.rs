//! CLI tool that downloads the Gmail attachments linked from PDFs in the
//! current directory.
//!
//! Every `*.pdf` is moved into its own folder as `message.pdf`; the
//! attachments of each Gmail message linked from it land in that folder's
//! `downloads/` directory.

use pdfgmailfetch::{find_pdf_files, Authenticator, FetchError, FetcherConfig, PdfProcessor, Result};
use std::{env, process};
use tracing_subscriber::EnvFilter;

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    if args.iter().skip(1).any(|a| a == "--help" || a == "-h") {
        print_usage(&args[0]);
        return;
    }

    let config = FetcherConfig::default();

    match run(&config) {
        Ok(()) => println!("\n✅ All PDFs processed."),
        Err(FetchError::NoPdfFiles(_)) => {
            println!("No PDF files found in the current directory.");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("\n❌ Error: {}", e);
            process::exit(1);
        }
    }
}

/// Progress goes to stderr as plain lines; `RUST_LOG` overrides the level.
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(false)
        .without_time()
        .init();
}

fn print_usage(program_name: &str) {
    println!("📄 pdfgmailfetch - download Gmail attachments linked from PDFs");
    println!();
    println!("USAGE:");
    println!("    {}", program_name);
    println!();
    println!("Run it in a directory containing PDF printouts of Gmail messages.");
    println!("For every <name>.pdf it will:");
    println!("  • create <name>/ (or <name> (1)/, <name> (2)/, … if taken)");
    println!("  • move the PDF to <name>/message.pdf");
    println!("  • download the attachments of every linked message into <name>/downloads/");
    println!();
    println!("FILES:");
    println!("    credentials.json   OAuth client secrets (needed for the first authorization)");
    println!("    token.json         Cached credential, created and refreshed automatically");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help     Show this help message");
}

fn run(config: &FetcherConfig) -> Result<()> {
    let pdf_files = find_pdf_files(&config.working_directory)?;
    if pdf_files.is_empty() {
        return Err(FetchError::NoPdfFiles(config.working_directory.clone()));
    }

    let gmail = Authenticator::new(config).connect().map_err(|e| {
        eprintln!("Failed to initialize Gmail service");
        e
    })?;

    let processor = PdfProcessor::new(&gmail, config);

    for pdf_path in &pdf_files {
        println!("{}", "─".repeat(60));

        let report = processor.process(pdf_path)?;

        if !report.links.is_empty() {
            println!(
                "📊 Download complete for {}: {} file(s) saved, {} failed",
                pdf_path.display(),
                report.saved_count(),
                report.failed_count()
            );
            println!("   • Output directory: {}", report.folder.downloads_dir.display());
        }
        println!();
    }

    Ok(())
}
