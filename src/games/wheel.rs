use crate::errors::{RouletteError, RouletteResult};
use crate::games::types::{Color, SpinOutcome};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

/// Highest number on the wheel (single zero, 37 pockets)
pub const MAX_NUMBER: u8 = 36;

/// Red numbers on a roulette wheel.
const RED_NUMBERS: [u8; 18] = [1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36];

/// Source of spin outcomes
pub trait Spin: Send + Sync {
    /// Land the ball. Implementations must return a number in 0..=36.
    fn spin(&self) -> u8;
}

/// Map a wheel number to its pocket color.
pub fn color_of(number: u8) -> RouletteResult<Color> {
    match number {
        0 => Ok(Color::Green),
        n if n > MAX_NUMBER => Err(RouletteError::InvalidOutcome(n)),
        n if RED_NUMBERS.contains(&n) => Ok(Color::Red),
        _ => Ok(Color::Black),
    }
}

/// Resolve a raw spin into a number and color.
pub fn outcome_of(number: u8) -> RouletteResult<SpinOutcome> {
    Ok(SpinOutcome {
        number,
        color: color_of(number)?,
    })
}

/// Uniform wheel backed by a seedable RNG
pub struct Wheel {
    rng: Mutex<StdRng>,
}

impl Wheel {
    /// Wheel seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Wheel with a reproducible sequence of outcomes
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Reset the RNG to a new seed
    pub fn reseed(&self, seed: u64) {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        *rng = StdRng::seed_from_u64(seed);
    }
}

impl Default for Wheel {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl Spin for Wheel {
    fn spin(&self) -> u8 {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_range(0..=MAX_NUMBER)
    }
}

/// Replays a scripted list of outcomes, cycling when exhausted
pub struct FixedWheel {
    outcomes: Vec<u8>,
    cursor: AtomicUsize,
}

impl FixedWheel {
    pub fn new(outcomes: Vec<u8>) -> Self {
        assert!(!outcomes.is_empty(), "FixedWheel needs at least one outcome");
        Self {
            outcomes,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Always lands on the same number
    pub fn always(number: u8) -> Self {
        Self::new(vec![number])
    }
}

impl Spin for FixedWheel {
    fn spin(&self) -> u8 {
        let i = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.outcomes[i % self.outcomes.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_color_partition() {
        let mut red = 0;
        let mut black = 0;
        let mut green = 0;
        for n in 0..=MAX_NUMBER {
            match color_of(n).unwrap() {
                Color::Red => red += 1,
                Color::Black => black += 1,
                Color::Green => green += 1,
            }
        }
        assert_eq!((red, black, green), (18, 18, 1));
        assert_eq!(color_of(0).unwrap(), Color::Green);
    }

    #[test]
    fn test_known_pockets() {
        assert_eq!(color_of(1).unwrap(), Color::Red);
        assert_eq!(color_of(2).unwrap(), Color::Black);
        assert_eq!(color_of(17).unwrap(), Color::Black);
        assert_eq!(color_of(36).unwrap(), Color::Red);
    }

    #[test]
    fn test_out_of_range_outcome() {
        assert!(matches!(color_of(37), Err(RouletteError::InvalidOutcome(37))));
    }

    #[test]
    fn test_seeded_wheel_is_reproducible() {
        let a = Wheel::seeded(7);
        let b = Wheel::seeded(7);
        let first: Vec<u8> = (0..50).map(|_| a.spin()).collect();
        let second: Vec<u8> = (0..50).map(|_| b.spin()).collect();
        assert_eq!(first, second);

        a.reseed(7);
        let replay: Vec<u8> = (0..50).map(|_| a.spin()).collect();
        assert_eq!(first, replay);
    }

    #[test]
    fn test_wheel_covers_whole_range() {
        let wheel = Wheel::seeded(42);
        let seen: HashSet<u8> = (0..5_000).map(|_| wheel.spin()).collect();
        assert!(seen.iter().all(|n| *n <= MAX_NUMBER));
        assert_eq!(seen.len(), 37);
    }

    #[test]
    fn test_fixed_wheel_cycles() {
        let wheel = FixedWheel::new(vec![17, 5]);
        assert_eq!(wheel.spin(), 17);
        assert_eq!(wheel.spin(), 5);
        assert_eq!(wheel.spin(), 17);
    }
}
