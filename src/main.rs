use clap::Parser;
use rust_excitgen::{read_config, run, ConfigError};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Excitation generation benchmark: repeated spawning attempts from one
/// source state with adaptive case probabilities.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// YAML run configuration
    #[arg(short, long, default_value = "config.yml")]
    config: String,

    /// Override the random seed of the configuration
    #[arg(short, long)]
    seed: Option<u64>,

    /// Override the number of worker threads (0 for one per core)
    #[arg(short, long)]
    threads: Option<usize>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    if let Err(err) = try_main(&args) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn try_main(args: &Args) -> Result<(), ConfigError> {
    let mut config = read_config(&args.config)?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(nthread) = args.threads {
        config.nthread = nthread;
    }
    if config.nthread > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.nthread)
            .build_global()
            .map_err(|e| ConfigError::Invalid { field: "nthread", reason: e.to_string() })?;
    }
    info!(config = %args.config, seed = config.seed, nthread = rayon::current_num_threads(), "starting run");

    let summary = run(&config)?;
    let total = summary.total();

    println!("Excitation generation results");
    println!("-----------------------------");
    println!("Attempts:           {}", total.nattempt);
    println!("Rejection rate:     {:.4}", total.rejection_rate());
    println!("Row sum estimate:   {:.6} ± {:.6}", total.mean_contrib(), total.std_error());
    println!("Final case probabilities:");
    for (icase, p) in summary.final_probs.iter().enumerate() {
        println!("  case {icase:>3}: {p:.6}");
    }
    Ok(())
}
