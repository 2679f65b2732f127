use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use spotify_dashboard::sample::{self, Format};

/// Write a deterministic synthetic listening table and campaign table.
#[derive(Debug, Parser)]
#[command(name = "generate_sample", version)]
struct Args {
    /// Directory the two files are written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    let ext = args.format.extension();
    let listening_path = args.out_dir.join(format!("spotify.{ext}"));
    let campaign_path = args.out_dir.join(format!("marketing_campaigns.{ext}"));

    let listening = sample::listening_records(args.seed);
    sample::write_listening(&listening_path, &listening, args.format)?;
    log::info!("seed {} → {}", args.seed, listening_path.display());

    let campaigns = sample::campaign_records(args.seed);
    sample::write_campaigns(&campaign_path, &campaigns, args.format)?;

    println!(
        "Wrote {} listening rows to {} and {} campaign rows to {}",
        listening.len(),
        listening_path.display(),
        campaigns.len(),
        campaign_path.display()
    );
    Ok(())
}
