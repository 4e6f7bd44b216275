//! Test vector generator
//!
//! Generates the test vectors of one or all PHY blocks, or validates the
//! outputs of the native implementation against them.

use anyhow::{bail, Context, Result};
use clap::Parser;
use harness::{BlockRegistry, BlockSelection, HarnessConfig, RunMode};
use interfaces::{ReplayBindings, SystemUnderTest};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// 5G NR PHY test vector generator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "tvgen.toml")]
    config: PathBuf,

    /// Block to run, or "all"
    #[arg(short, long, default_value = "all")]
    block: String,

    /// Run mode (testvector, validation)
    #[arg(short, long, default_value = "testvector")]
    mode: String,

    /// Output root directory
    #[arg(long)]
    output_root: Option<PathBuf>,

    /// Ambient random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Directory with native outputs to validate
    #[arg(long)]
    replay_dir: Option<PathBuf>,

    /// List the registered blocks and exit
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = HarnessConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(output_root) = args.output_root {
        config.output_root = output_root;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(log_level) = args.log_level {
        config.log_level = log_level;
    }
    if let Some(replay_dir) = args.replay_dir {
        config.validation.replay_dir = Some(replay_dir);
    }
    config.check()?;

    // Initialize logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_line_number(true)
        .init();

    let registry = BlockRegistry::with_default_blocks()?;
    if args.list {
        for name in registry.names() {
            let descriptor = registry.get(name)?.descriptor();
            println!("{:<28} {}", name, descriptor.category);
        }
        return Ok(());
    }

    let mode: RunMode = args.mode.parse()?;
    let selection = BlockSelection::from_arg(&args.block);
    info!("tvgen {}: {} run of {} with seed {}", env!("CARGO_PKG_VERSION"), mode, args.block, config.seed);

    let mut replay = match mode {
        RunMode::Validation => {
            let Some(dir) = config.validation.replay_dir.clone() else {
                bail!("validation mode needs a replay directory (--replay-dir or [validation] replay_dir)");
            };
            Some(ReplayBindings::new(dir))
        }
        RunMode::TestVector => None,
    };
    let system = replay.as_mut().map(|r| r as &mut dyn SystemUnderTest);

    let reports = registry.run(&selection, mode, &config, system)?;

    let mut nof_failed = 0;
    for report in &reports {
        match &report.run_dir {
            Some(dir) => info!("{}: {} cases in {}", report.block, report.nof_cases(), dir.display()),
            None => info!("{}: {} cases, {} mismatches", report.block, report.nof_cases(), report.mismatches.len()),
        }
        if !report.passed() {
            nof_failed += 1;
            for mismatch in &report.mismatches {
                error!("{} test {} {}: {}", report.block, mismatch.test_id, mismatch.role, mismatch.reason);
            }
        }
    }

    if nof_failed > 0 {
        bail!("{} of {} blocks failed validation", nof_failed, reports.len());
    }
    Ok(())
}
