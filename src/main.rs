use clap::Parser;
use std::path::PathBuf;
use std::process;

use incipit::batch::{first_piece_musicxml, RawRenderConfig};
use incipit::{run_batch, IncipitError, RawBatchConfig};

/// Generate random monophonic incipits as MusicXML (and optionally SVG/MEI/PNG)
#[derive(Parser)]
#[command(name = "incipit")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Number of scores to generate
    #[arg(short, long)]
    count: Option<u32>,

    /// Output directory
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Base seed (random when omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// YAML batch configuration; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write each score as JSON
    #[arg(long)]
    json: bool,

    /// Render SVG, MEI and PNG with Verovio
    #[arg(long)]
    render: bool,

    /// Path to the verovio executable (implies --render)
    #[arg(long)]
    verovio: Option<PathBuf>,

    /// Path to the SVG-to-PNG converter (implies --render)
    #[arg(long)]
    rasterizer: Option<PathBuf>,

    /// Print a single score's MusicXML to stdout instead of writing a batch
    #[arg(long)]
    stdout: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), IncipitError> {
    let mut raw = match &cli.config {
        Some(path) => RawBatchConfig::from_file(path)?,
        None => RawBatchConfig::default(),
    };

    // Flags override the config file
    if cli.count.is_some() {
        raw.count = cli.count;
    }
    if cli.out_dir.is_some() {
        raw.out_dir = cli.out_dir;
    }
    if cli.seed.is_some() {
        raw.seed = cli.seed;
    }
    if cli.json {
        raw.json = Some(true);
    }
    if cli.render || cli.verovio.is_some() || cli.rasterizer.is_some() {
        let render = raw.render.get_or_insert_with(RawRenderConfig::default);
        if cli.verovio.is_some() {
            render.verovio = cli.verovio;
        }
        if cli.rasterizer.is_some() {
            render.rasterizer = cli.rasterizer;
        }
    }

    let config = raw.resolve()?;

    // Same score as score_0001 of a batch with this seed
    if cli.stdout {
        println!("{}", first_piece_musicxml(config.seed)?);
        eprintln!("Seed: {}", config.seed);
        return Ok(());
    }

    let report = run_batch(&config)?;
    eprintln!(
        "Wrote {} scores to {} (seed {})",
        report.pieces.len(),
        report.out_dir.display(),
        report.base_seed
    );
    Ok(())
}
