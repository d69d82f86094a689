//! unearth - carve image files out of raw disk images.

mod report;

use anyhow::{Context, Result};
use clap::Parser;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use unearth_core::{Carver, CarverConfig, ImageFormat, DEFAULT_MAX_WINDOW};
use unearth_io::{DirectorySink, MappedSource};

use report::ManifestEntry;

#[derive(Parser, Debug)]
#[command(name = "unearth")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Raw disk image to scan.
    image: PathBuf,

    #[arg(short, long, default_value = "./recovered")]
    output: PathBuf,

    /// Largest candidate a validator is allowed to examine, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_WINDOW)]
    max_window: usize,

    /// Write a manifest.json next to the recovered files.
    #[arg(long, default_value_t = false)]
    manifest: bool,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("failed to set Ctrl+C handler")?;

    run_scan(&args, running)
}

fn run_scan(args: &Args, running: Arc<AtomicBool>) -> Result<()> {
    let start_time = Instant::now();

    let source = MappedSource::open(&args.image)
        .with_context(|| format!("failed to open image {}", args.image.display()))?;
    let mut sink = DirectorySink::new(&args.output)
        .with_context(|| format!("failed to prepare output dir {}", args.output.display()))?;

    println!("Scanning: {}", args.image.display());
    println!("Image size: {}", format_size(source.len(), BINARY));

    let pb = ProgressBar::new(source.len());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:50.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .expect("invalid progress bar template - this is a bug")
            .progress_chars("##-"),
    );

    let config = CarverConfig {
        max_window: args.max_window,
    };
    let mut carver = Carver::with_config(source.bytes(), config);

    let mut counts = [0u64; ImageFormat::ALL.len()];
    let mut bytes_recovered = 0u64;
    let mut entries = Vec::new();
    let mut interrupted = false;

    loop {
        if !running.load(Ordering::SeqCst) {
            interrupted = true;
            break;
        }

        let Some(obj) = carver.next() else {
            break;
        };
        pb.set_position(carver.position());

        let path = sink
            .persist(&source, &obj)
            .with_context(|| format!("failed to extract object at offset {}", obj.start_offset))?;
        tracing::debug!(
            format = obj.format.name(),
            offset = obj.start_offset,
            length = obj.length,
            "recovered object"
        );

        let slot = ImageFormat::ALL
            .iter()
            .position(|f| *f == obj.format)
            .unwrap_or(0);
        counts[slot] += 1;
        bytes_recovered += obj.length;

        if args.manifest {
            entries.push(ManifestEntry::new(path, &obj));
        }
    }

    pb.set_position(carver.position());
    pb.finish();

    if args.manifest {
        let manifest_path = report::write_manifest(&args.output, &entries)?;
        println!("Manifest: {}", manifest_path.display());
    }

    if interrupted {
        println!("\nInterrupted at offset {}", carver.position());
    }

    println!("\nDone in {:.1?}", start_time.elapsed());
    for (format, count) in ImageFormat::ALL.iter().zip(counts) {
        println!("  {:<5} {}", format.name(), count);
    }
    println!(
        "  {} files, {}",
        sink.files_written(),
        format_size(bytes_recovered, BINARY)
    );

    Ok(())
}
