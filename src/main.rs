mod args;

use anyhow::{Context, Result};
use clap::Parser;

use args::Args;
use ensemble_quantile::config::QuantileConfig;
use ensemble_quantile::ensemble::Ensemble;
use ensemble_quantile::report::write_output;
use ensemble_quantile::resample::resample;

fn main() -> Result<()> {
    let args = Args::parse();

    let config = QuantileConfig::load(&args.config)
        .with_context(|| format!("invalid config file {}", args.config.display()))?;

    let mut ensemble = Ensemble::new();
    for pattern in &config.case_patterns {
        let matched = ensemble.load_from_glob(pattern)?;
        if matched == 0 {
            eprintln!("Warning: pattern '{}' matched no cases", pattern);
        }
    }
    ensemble.finalize(config.num_interp)?;
    println!(
        "Loaded {} cases, resampling onto {} points",
        ensemble.len(),
        config.num_interp
    );

    for output in &config.outputs {
        println!("Creating output file: {}", output.file.display());
        let matrix = resample(&ensemble, &output.requests)
            .with_context(|| format!("resampling for {} failed", output.file.display()))?;
        write_output(&output.file, output.format, &output.requests, &ensemble, &matrix)?;
    }
    Ok(())
}
