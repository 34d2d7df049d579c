//! Line-oriented operator console on stdin.

use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::{
    utils::{format_ether, parse_ether},
    Address, U256,
};
use anyhow::{anyhow, bail, Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::warn;
use wavs_lottery::{InMemoryPaymentRail, Lottery};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Enter { player: Address, amount: U256 },
    Status,
    History,
    Balance(Address),
    Retry,
    Help,
    Quit,
}

const HELP: &str = "commands: enter <address> <eth> | status | history | balance <address> | retry | help | quit";

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let cmd = parts.next().ok_or_else(|| anyhow!("empty command"))?;

        let command = match cmd.to_lowercase().as_str() {
            "enter" => {
                let player = parts.next().ok_or_else(|| anyhow!("missing address"))?;
                let amount = parts.next().ok_or_else(|| anyhow!("missing amount"))?;
                Command::Enter {
                    player: Address::from_str(player)
                        .with_context(|| format!("invalid address: {}", player))?,
                    amount: parse_ether(amount)
                        .map_err(|e| anyhow!("invalid amount '{}': {}", amount, e))?,
                }
            }
            "status" => Command::Status,
            "history" => Command::History,
            "balance" => {
                let account = parts.next().ok_or_else(|| anyhow!("missing address"))?;
                Command::Balance(
                    Address::from_str(account)
                        .with_context(|| format!("invalid address: {}", account))?,
                )
            }
            "retry" => Command::Retry,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command '{}'", other),
        };

        if parts.next().is_some() {
            bail!("too many arguments for '{}'", cmd);
        }
        Ok(command)
    }
}

/// Why the console stopped reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    Quit,
    InputClosed,
}

/// Read commands from stdin until `quit` or end of input
pub async fn run(
    lottery: Arc<Lottery>,
    payments: Arc<InMemoryPaymentRail>,
) -> Result<ConsoleExit> {
    println!("{}", HELP);
    run_with(BufReader::new(tokio::io::stdin()), &lottery, &payments).await
}

async fn run_with<R>(
    reader: R,
    lottery: &Lottery,
    payments: &InMemoryPaymentRail,
) -> Result<ConsoleExit>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("error: {:#}", e);
                continue;
            }
        };

        if command == Command::Quit {
            return Ok(ConsoleExit::Quit);
        }

        if let Err(e) = execute(lottery, payments, command).await {
            warn!(error = %e, "console command failed");
            println!("error: {:#}", e);
        }
    }

    Ok(ConsoleExit::InputClosed)
}

async fn execute(
    lottery: &Lottery,
    payments: &InMemoryPaymentRail,
    command: Command,
) -> Result<()> {
    match command {
        Command::Enter { player, amount } => {
            lottery.enter(player, amount).await?;
            println!(
                "entered {} with {} ETH ({} players)",
                player,
                format_ether(amount),
                lottery.number_of_players().await
            );
        }
        Command::Status => {
            let snapshot = lottery.snapshot().await;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::History => {
            let history = lottery.past_lotteries().await;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        Command::Balance(account) => {
            println!("{} ETH", format_ether(payments.balance_of(&account)));
        }
        Command::Retry => {
            let winner = lottery.retry_payout().await?;
            println!("paid {}", winner);
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
    Ok(())
}
