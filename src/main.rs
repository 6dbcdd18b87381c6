//! Croupier table binary
//!
//! Runs a roulette table for one local player, reading chat commands from
//! stdin. In batched mode rounds close on a timer or on `$spin`.

use clap::{Parser, Subcommand};
use croupier::{
    commands::{self, Command, CommandError},
    config::{generate_sample_config, ConfigLoader, RouletteConfig, TableMode},
    errors::RouletteResult,
    games::{Bet, Player, RouletteEngine, RoundSettlement, Spin, Wheel},
    scheduler::RoundScheduler,
    storage::open_store,
};
use std::{path::PathBuf, sync::Arc};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};

/// Croupier roulette table CLI
#[derive(Parser)]
#[command(name = "croupier")]
#[command(about = "Multiplayer roulette table with persisted balances")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play at the table, reading commands from stdin
    Play {
        /// Player identifier used as the balance key
        #[arg(long, default_value = "local")]
        player_id: String,

        /// Display name
        #[arg(long, default_value = "player")]
        name: String,

        /// Override the configured table mode (batched or immediate)
        #[arg(short, long)]
        mode: Option<TableMode>,

        /// Seed the wheel for a reproducible session
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Write a sample configuration file
    InitConfig {
        /// Where to write the TOML file
        #[arg(default_value = "croupier.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> RouletteResult<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_path(path);
    }
    let mut config = loader.load()?;

    let default_filter = if cli.verbose {
        "debug".to_string()
    } else {
        config.monitoring.log_level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::InitConfig { path } => {
            generate_sample_config(&path.to_string_lossy())?;
            println!("Wrote sample configuration to {}", path.display());
            Ok(())
        }
        Commands::Play {
            player_id,
            name,
            mode,
            seed,
        } => {
            if let Some(mode) = mode {
                config.table.mode = mode;
            }
            play(config, Player::new(player_id, name, 0), seed).await
        }
    }
}

async fn play(config: RouletteConfig, player: Player, seed: Option<u64>) -> RouletteResult<()> {
    let store = open_store(&config.storage)?;
    let wheel: Arc<dyn Spin> = Arc::new(match seed {
        Some(seed) => Wheel::seeded(seed),
        None => Wheel::from_entropy(),
    });
    let engine = Arc::new(RouletteEngine::from_config(&config, store, wheel)?);

    tracing::info!(
        mode = ?config.table.mode,
        player_id = %player.id,
        "Table open"
    );
    println!("{}", commands::help_text(None));

    let scheduler = if config.table.mode == TableMode::Batched {
        engine.register_players([player.id.clone()])?;
        let (tx, mut rx) = mpsc::channel::<RoundSettlement>(16);
        let handle = RoundScheduler::spawn(engine.clone(), config.round_interval(), tx);
        let me = player.id.clone();
        tokio::spawn(async move {
            while let Some(settlement) = rx.recv().await {
                announce(&settlement, &me);
            }
        });
        println!(
            "The wheel spins every {} seconds.",
            config.table.round_interval_secs
        );
        Some(handle)
    } else {
        None
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match Command::parse(&line) {
            Ok(command) => handle_command(&engine, &player, command)?,
            Err(CommandError::Empty) => {}
            Err(e) => println!("{}", e),
        }
    }

    if let Some(handle) = scheduler {
        handle.shutdown().await;
    }
    Ok(())
}

fn handle_command(engine: &RouletteEngine, player: &Player, command: Command) -> RouletteResult<()> {
    let bet = match command {
        Command::Balance => {
            println!(
                "{}",
                commands::balance_message(&player.name, engine.balance_of(&player.id))
            );
            return Ok(());
        }
        Command::Help { command } => {
            println!("{}", commands::help_text(command.as_deref()));
            return Ok(());
        }
        Command::Spin => {
            if engine.mode() == TableMode::Immediate {
                println!("Every bet spins the wheel at this table.");
            } else {
                announce(&engine.close_round_and_settle()?, &player.id);
            }
            return Ok(());
        }
        Command::Number { number, amount } => Bet::on_number(player.clone(), number, amount),
        Command::Color { color, amount } => Bet::on_color(player.clone(), color, amount),
    };

    let placed = match engine.mode() {
        TableMode::Immediate => engine.place_bet_and_resolve(bet).map(|result| {
            for line in commands::immediate_messages(&result) {
                println!("{}", line);
            }
        }),
        TableMode::Batched => engine.place_bet(bet).map(|receipt| {
            println!(
                "Bet of {} coins accepted, balance {} coins.",
                receipt.stake, receipt.balance
            );
        }),
    };

    match placed {
        Ok(()) => Ok(()),
        Err(e) if e.is_caller_error() => {
            println!("{}", e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn announce(settlement: &RoundSettlement, player_id: &str) {
    match settlement.results.iter().find(|r| r.player.id == player_id) {
        Some(result) => {
            for line in commands::round_messages(settlement, result) {
                println!("{}", line);
            }
        }
        None => println!("{} {}", commands::SPIN_THE_WHEEL_MSG, settlement.outcome),
    }
}
