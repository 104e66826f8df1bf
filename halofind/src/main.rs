use halofind::{RunConfig, HaloRun, RegionStatus};
use halofind::{bench_sphere_query, bench_density};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    /// YAML run file
    #[arg(short, default_value = "runs/example.yaml")]
    file_name: PathBuf,

    /// Print query and density timings instead of running
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_run_from_yaml(args: &Args) -> Result<HaloRun> {
    let file = File::open(&args.file_name)
        .with_context(|| format!("failed to open run file {}", args.file_name.display()))?;
    let run_cfg = RunConfig::from_reader(BufReader::new(file))?;

    let base_dir = args
        .file_name
        .parent()
        .map(PathBuf::from)
        .unwrap_or_default();

    Ok(HaloRun::build_run(run_cfg, &base_dir)?)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.bench {
        bench_sphere_query();
        bench_density();
        return Ok(());
    }

    let run = load_run_from_yaml(&args)?;
    let catalogs = run.execute()?;

    for catalog in &catalogs {
        match &catalog.status {
            RegionStatus::Completed(stop) => {
                info!("region {}: {} halos ({:?})", catalog.index, catalog.halos.len(), stop)
            }
            RegionStatus::Failed(reason) => warn!("region {} failed: {}", catalog.index, reason),
        }
    }

    let total: usize = catalogs.iter().map(|c| c.halos.len()).sum();
    println!("found {} halos in {} regions", total, catalogs.len());

    Ok(())
}
