use pokemon_battle_search::{run, CliOptions, SearchAlgorithm};
use std::env;
use std::path::PathBuf;

fn usage() -> ! {
    eprintln!(
        "Usage: cargo run --release -- --state state.json [--config policy.json] \
[--algorithm sequential-alpha-beta|matrix-game|greedy] [--depth N] [--seed SEED] [--sim-seed SEED]"
    );
    std::process::exit(1);
}

fn parse_args() -> anyhow::Result<CliOptions> {
    let mut state_path = None;
    let mut config_path = None;
    let mut algorithm = None;
    let mut max_depth = None;
    let mut seed = None;
    let mut sim_seed = 0u64;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--state" => {
                state_path = Some(args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--state requires a path (e.g. --state state.json)")
                })?);
            }
            "--config" => {
                config_path = Some(args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--config requires a path (e.g. --config policy.json)")
                })?);
            }
            "--algorithm" => {
                let val = args.next().ok_or_else(|| {
                    anyhow::anyhow!("--algorithm requires sequential-alpha-beta, matrix-game or greedy")
                })?;
                algorithm = Some(
                    val.to_ascii_lowercase()
                        .parse::<SearchAlgorithm>()
                        .map_err(anyhow::Error::msg)?,
                );
            }
            "--depth" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--depth requires a number"))?;
                max_depth = Some(val.parse()?);
            }
            "--seed" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--seed requires a number"))?;
                seed = Some(val.parse()?);
            }
            "--sim-seed" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--sim-seed requires a number"))?;
                sim_seed = val.parse()?;
            }
            "--help" | "-h" => usage(),
            other => return Err(anyhow::anyhow!("Unknown argument {other}")),
        }
    }

    let state_path = state_path.ok_or_else(|| anyhow::anyhow!("--state is required"))?;
    Ok(CliOptions {
        state_path,
        config_path,
        algorithm,
        max_depth,
        seed,
        sim_seed,
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pokemon_battle_search=info")),
        )
        .init();

    let opts = parse_args()?;
    run(opts)
}
