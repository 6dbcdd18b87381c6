pub mod types;
pub mod wheel;
pub mod payout;
pub mod validator;
pub mod engine;

pub use types::*;
pub use wheel::{color_of, FixedWheel, Spin, Wheel};
pub use payout::PayoutTable;
pub use validator::BetValidator;
pub use engine::RouletteEngine;
