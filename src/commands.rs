//! Chat command grammar and user-facing messages.
//!
//! Commands look like `$color red 10`; the `$` prefix is optional.

use crate::games::types::{Coins, PlayerBetResult, RoundSettlement, SpinResult};

pub const COMMAND_PREFIX: char = '$';

pub const SPECIFY_COLOR_PARAMETERS_MSG: &str =
    "Please indicate both the color and the amount: $color [color] [amount]";
pub const SPECIFY_NUMBER_PARAMETERS_MSG: &str =
    "Please indicate both the number and the amount: $number [number] [amount]";
pub const SPIN_THE_WHEEL_MSG: &str = "Spinning the wheel...";
pub const SORRY_MSG: &str = "Sorry, you lost the bet.";

/// (name, usage, description) for every command the table understands
const COMMANDS: [(&str, &str, &str); 5] = [
    ("balance", "$balance", "Check your balance in the game."),
    ("number", "$number [number] [amount]", "Bet on a number in roulette."),
    ("color", "$color [red/black] [amount]", "Bet on a color in roulette."),
    ("spin", "$spin", "Close the current round and spin the wheel now."),
    ("help", "$help [balance/number/color/spin]", "Help for commands."),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Balance,
    Number { number: i64, amount: Coins },
    Color { color: String, amount: Coins },
    Spin,
    Help { command: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Type $help to see the available commands.")]
    Empty,

    #[error("Unknown command '{0}'. Type $help to see the available commands.")]
    Unknown(String),

    #[error("{}", SPECIFY_NUMBER_PARAMETERS_MSG)]
    MissingNumberParameters,

    #[error("{}", SPECIFY_COLOR_PARAMETERS_MSG)]
    MissingColorParameters,

    #[error("'{value}' is not valid value for '{parameter}' parameter, use value of int type")]
    BadArgument { value: String, parameter: String },
}

fn parse_int(value: &str, parameter: &str) -> Result<i64, CommandError> {
    value.parse().map_err(|_| CommandError::BadArgument {
        value: value.to_string(),
        parameter: parameter.to_string(),
    })
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut parts = line.split_whitespace();
        let name = parts
            .next()
            .map(|n| n.trim_start_matches(COMMAND_PREFIX).to_lowercase())
            .ok_or(CommandError::Empty)?;
        let args: Vec<&str> = parts.collect();

        match name.as_str() {
            "balance" => Ok(Command::Balance),
            "spin" => Ok(Command::Spin),
            "help" => Ok(Command::Help {
                command: args.first().map(|c| c.trim_start_matches(COMMAND_PREFIX).to_lowercase()),
            }),
            "number" => match args.as_slice() {
                [number, amount, ..] => Ok(Command::Number {
                    number: parse_int(number, "bet_number")?,
                    amount: parse_int(amount, "bet_amount")?,
                }),
                _ => Err(CommandError::MissingNumberParameters),
            },
            "color" => match args.as_slice() {
                [color, amount, ..] => Ok(Command::Color {
                    color: color.to_string(),
                    amount: parse_int(amount, "bet_amount")?,
                }),
                _ => Err(CommandError::MissingColorParameters),
            },
            "" => Err(CommandError::Empty),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

pub fn balance_message(name: &str, balance: Coins) -> String {
    format!("{}'s balance is {} coins.", name, balance)
}

pub fn spin_result_message(result: &SpinResult) -> String {
    format!("The result is {} {}", result.outcome.number, result.outcome.color)
}

pub fn prize_message(prize: Coins) -> String {
    if prize > 0 {
        format!("Congrats, you won {} coins!", prize)
    } else {
        SORRY_MSG.to_string()
    }
}

/// Lines announcing an immediate-mode bet
pub fn immediate_messages(result: &SpinResult) -> Vec<String> {
    vec![
        SPIN_THE_WHEEL_MSG.to_string(),
        spin_result_message(result),
        prize_message(result.prize),
    ]
}

/// Lines sent to one player's channel when a round closes
pub fn round_messages(settlement: &RoundSettlement, result: &PlayerBetResult) -> Vec<String> {
    vec![
        SPIN_THE_WHEEL_MSG.to_string(),
        settlement.outcome.to_string(),
        result.to_string(),
    ]
}

/// Command list, or the usage of a single command
pub fn help_text(command: Option<&str>) -> String {
    let listing = || {
        let mut text = String::from("List of available commands:\n");
        for (_, usage, description) in COMMANDS {
            text.push_str(&format!("  {:<36} {}\n", usage, description));
        }
        text
    };

    match command {
        None => listing(),
        Some(name) => match COMMANDS.iter().find(|(n, _, _)| *n == name) {
            Some((_, usage, description)) => {
                format!("Help for command `{}`:\n  {}\n  Usage: {}\n", name, description, usage)
            }
            None => format!("Command $help '{}' not found.\n{}", name, listing()),
        },
    }
}
