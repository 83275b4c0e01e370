use std::fs::File;
use std::io::{self, BufWriter};
use std::time::Instant;

use anyhow::{bail, Context};
use phonosim::RunConfig;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let Some(path) = std::env::args().nth(1) else {
        bail!("usage: phonosim <config.yaml>");
    };
    let cfg = RunConfig::from_file(&path)
        .with_context(|| format!("failed to load config from {path}"))?;
    init_tracing(&cfg);

    let start = Instant::now();
    let report = phonosim::run(&cfg)?;
    tracing::info!(
        records = report.records.len(),
        skipped = report.skipped.len(),
        total_bits = report.total_bits,
        elapsed_micros = start.elapsed().as_micros(),
        "run_complete"
    );

    let precision = cfg.output.precision;
    match &cfg.output.path {
        Some(out) => {
            let file = File::create(out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            report.write_tsv(BufWriter::new(file), precision)?;
        }
        None => report.write_tsv(io::stdout().lock(), precision)?,
    }
    Ok(())
}

fn init_tracing(cfg: &RunConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);
    if cfg.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}
