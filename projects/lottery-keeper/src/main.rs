mod config;
mod console;
mod logging;

use alloy_primitives::{utils::format_ether, B256};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;
use wavs_lottery::{CommitRevealOracle, InMemoryPaymentRail, Keeper, Lottery, SystemClock};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = config::load()?;
    logging::init_tracing(&cfg);

    let secret = cfg
        .oracle_secret
        .unwrap_or_else(|| B256::from(rand::random::<[u8; 32]>()));
    let (oracle, fulfillments) =
        CommitRevealOracle::new(secret, Duration::from_millis(cfg.reveal_delay_ms));
    let payments = Arc::new(InMemoryPaymentRail::new());

    let lottery = Arc::new(Lottery::new(
        cfg.lottery.clone(),
        Arc::new(oracle),
        payments.clone(),
        Arc::new(SystemClock),
    )?);

    info!(
        entry_fee_eth = %format_ether(lottery.entry_fee()),
        interval_secs = lottery.interval(),
        request_timeout_secs = ?cfg.lottery.request_timeout_secs,
        upkeep_period_secs = cfg.upkeep_period_in_secs,
        console = cfg.console_enabled,
        "lottery started"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let keeper = Keeper::new(
        lottery.clone(),
        Duration::from_secs(cfg.upkeep_period_in_secs.max(1)),
    );
    let keeper_task = tokio::spawn(async move { keeper.run(shutdown_rx).await });

    let fulfiller = lottery.clone();
    let fulfill_task = tokio::spawn(async move { fulfiller.run_fulfillments(fulfillments).await });

    if cfg.console_enabled {
        tokio::select! {
            exit = console::run(lottery.clone(), payments) => {
                if exit? == console::ConsoleExit::InputClosed {
                    info!("console input closed, running until interrupted");
                    tokio::signal::ctrl_c().await?;
                    info!("interrupt received");
                }
            }
            _ = tokio::signal::ctrl_c() => info!("interrupt received"),
        }
    } else {
        tokio::signal::ctrl_c().await?;
        info!("interrupt received");
    }

    let _ = shutdown_tx.send(true);
    keeper_task.await?;
    fulfill_task.abort();

    info!(rounds = lottery.round_count().await, "lottery stopped");
    Ok(())
}
