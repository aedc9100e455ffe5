// src/main.rs
use crate::config::AppConfig;
use crate::core::job::run_invocation;
use anyhow::Context;
use dotenvy::dotenv;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, info_span, Instrument};

mod config;
mod connectors;
mod core;
mod error;
mod logging;
mod types;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // 1. Load Configuration
    let config = AppConfig::new().context("failed to load configuration")?;
    let _log_guard = logging::init_logging(&config.logging);

    info!("========================================");
    info!("       FUTURES ENTRY BOT - v0.1.0");
    info!("========================================");
    info!("Exchange: {}", config.exchange.base_url);
    info!(
        "Target:   {} {} x{}",
        config.trading.side, config.trading.symbol, config.trading.leverage
    );
    info!("Every:    {}s", config.schedule.interval_secs);
    info!("========================================");

    if config.schedule.run_once {
        return tick(&config, 1).await;
    }

    // 2. Schedule. Each tick is awaited before the next one, so invocations
    // from this process never overlap.
    let mut ticker = interval(Duration::from_secs(config.schedule.interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut tick_no = 0u64;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Ctrl+C received, shutting down");
                break;
            }
            _ = ticker.tick() => {
                tick_no += 1;
                tokio::select! {
                    result = tick(&config, tick_no) => result?,
                    _ = &mut shutdown => {
                        info!("Ctrl+C received during invocation {}, shutting down", tick_no);
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Runs one invocation on its own task so a panic inside it is logged instead
/// of taking the scheduler down. Only fatal configuration errors are returned.
async fn tick(config: &AppConfig, tick_no: u64) -> anyhow::Result<()> {
    let job_config = config.clone();
    let span = info_span!("invocation", tick = tick_no);
    let handle = tokio::spawn(async move { run_invocation(&job_config).await }.instrument(span));

    match handle.await {
        Ok(Ok(outcome)) => {
            if let Some(step) = outcome.failed_step() {
                debug!(tick = tick_no, %step, "Invocation stopped early");
            }
            debug!(tick = tick_no, success = outcome.is_success(), "Invocation finished: {}", outcome);
            Ok(())
        }
        Ok(Err(fatal)) => {
            error!(tick = tick_no, "Fatal invocation error: {}", fatal);
            Err(fatal.into())
        }
        Err(join_err) => {
            error!(tick = tick_no, "Invocation aborted unexpectedly: {}", join_err);
            Ok(())
        }
    }
}
