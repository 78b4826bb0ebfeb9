//! Run a simulation program from a YAML configuration.
//!
//! Usage: `run <program.yaml> [--cycles N] [--realtime] [--keys a,b.c]`

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info};

use procsim_runtime::{cancel_channel, Engine, ProgramRegistry, Snapshot};

#[derive(Parser, Debug)]
#[command(name = "run")]
#[command(about = "Execute a simulation program from a YAML configuration")]
struct Args {
    /// Path to the program configuration file
    config: PathBuf,

    /// Number of cycles to run (in realtime mode, 0 means unbounded)
    #[arg(long, default_value = "10")]
    cycles: u64,

    /// Pace cycles to wall clock instead of generating as fast as possible
    #[arg(long)]
    realtime: bool,

    /// Only print these snapshot keys (comma-separated); default is all
    #[arg(long, value_delimiter = ',')]
    keys: Vec<String>,

    /// Only print sampled cycles (need_sample = true)
    #[arg(long)]
    sampled_only: bool,
}

fn main() {
    procsim_tools::init_logging();

    let args = Args::parse();

    let registry = ProgramRegistry::builtin();
    let mut engine = match Engine::from_path(&args.config, registry) {
        Ok(engine) => engine,
        Err(e) => {
            error!("failed to load '{}': {}", args.config.display(), e);
            process::exit(1);
        }
    };

    let print = |snapshot: &Snapshot| {
        if args.sampled_only && !snapshot.need_sample {
            return;
        }
        let mut line = format!(
            "cycle={:06} t={} sim_time={:.3}",
            snapshot.cycle_count, snapshot.time_str, snapshot.sim_time
        );
        for (key, value) in &snapshot.values {
            if args.keys.is_empty() || args.keys.iter().any(|k| k == key.as_str()) {
                line.push_str(&format!(" {key}={value:.6}"));
            }
        }
        info!("{}", line);
    };

    let result = if args.realtime {
        let (handle, token) = cancel_channel();
        let mut handle = Some(handle);
        let budget = args.cycles;
        let mut produced = 0u64;
        engine.run_realtime(&token, |snapshot| {
            print(&snapshot);
            produced += 1;
            if budget > 0 && produced >= budget {
                if let Some(h) = handle.take() {
                    h.cancel();
                }
            }
        })
    } else {
        engine.run_generator(args.cycles).map(|snapshots| {
            for snapshot in &snapshots {
                print(snapshot);
            }
        })
    };

    if let Err(e) = result {
        error!("run failed: {}", e);
        process::exit(1);
    }
}
