mod cli;
mod config;
mod logging;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use engine_logging::{engine_error, engine_info};
use mediaharvest_engine::Harvester;

use cli::{Args, RunPlan};

const EXIT_CONFIG: u8 = 2;

fn main() -> ExitCode {
    let args = Args::parse();
    logging::initialize(logging::level_for(args.verbose), args.log_file.as_deref());

    let file = match args.config.as_deref().map(config::load_file_config).transpose() {
        Ok(file) => file,
        Err(err) => {
            engine_error!("{}", err);
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    let plan = match args.into_plan(file.as_ref()) {
        Ok(plan) => plan,
        Err(err) => {
            engine_error!("{}", err);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    match run(plan) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            engine_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Harvests every planned target. `Ok(false)` when at least one target failed.
fn run(plan: RunPlan) -> anyhow::Result<bool> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let harvester = Harvester::with_http(plan.config).context("failed to set up http client")?;

    let results = runtime.block_on(harvester.harvest_all(&plan.targets));

    let mut failures = 0;
    for (target, result) in &results {
        match result {
            Ok(report) => engine_info!(
                "{}: saved {} of {} new items, next index {}",
                target,
                report.saved,
                report.yielded,
                report.next_index
            ),
            // already logged by harvest_all
            Err(_) => failures += 1,
        }
    }
    if failures > 0 {
        engine_error!("{} of {} targets failed", failures, results.len());
    }
    Ok(failures == 0)
}
