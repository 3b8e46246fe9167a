use crate::error::{CoreError, CoreResult};
use crate::games::GameId;
use crate::rng::{RandomSource, uniform_int};

pub const MIN_TARGET: u32 = 2;
pub const MAX_TARGET: u32 = 98;

/// Win iff the d100 roll lands strictly above `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceParams {
    pub target: u32,
}

impl Default for DiceParams {
    fn default() -> Self {
        Self { target: 50 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiceRoll {
    pub roll: u32,
    pub target: u32,
}

impl DiceRoll {
    pub fn is_win(&self) -> bool {
        self.roll > self.target
    }

    pub fn payout(&self, stake: f64) -> f64 {
        if self.is_win() {
            stake * 99.0 / (100 - self.target) as f64
        } else {
            0.0
        }
    }
}

/// `99 / (100 - target)`: a 1% edge under the true odds.
pub fn win_multiplier(target: u32) -> f64 {
    99.0 / (100 - target) as f64
}

pub fn roll<R: RandomSource + ?Sized>(params: &DiceParams, rng: &mut R) -> CoreResult<DiceRoll> {
    if !(MIN_TARGET..=MAX_TARGET).contains(&params.target) {
        return Err(CoreError::params(
            GameId::Dice,
            format!(
                "target {} outside {}..={}",
                params.target, MIN_TARGET, MAX_TARGET
            ),
        ));
    }
    Ok(DiceRoll {
        roll: uniform_int(rng, 1, 100),
        target: params.target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedSource;

    #[test]
    fn boundary_roll_equal_to_target_loses() {
        // 0.495 * 100 = 49.5 -> index 49 -> roll 50
        let mut src = ScriptedSource::new(vec![0.495]);
        let roll = roll(&DiceParams { target: 50 }, &mut src).unwrap();
        assert_eq!(roll.roll, 50);
        assert!(!roll.is_win());
        assert_eq!(roll.payout(100.0), 0.0);
    }

    #[test]
    fn roll_above_target_pays_fair_formula() {
        let mut src = ScriptedSource::new(vec![0.5]);
        let roll = roll(&DiceParams { target: 50 }, &mut src).unwrap();
        assert_eq!(roll.roll, 51);
        assert_eq!(roll.payout(100.0), 198.0);
    }

    #[test]
    fn rejects_targets_outside_slider() {
        let mut src = ScriptedSource::new(vec![0.5]);
        for target in [0, 1, 99, 100] {
            assert!(roll(&DiceParams { target }, &mut src).is_err());
        }
    }

    #[test]
    fn multiplier_table() {
        assert_eq!(win_multiplier(50), 1.98);
        assert_eq!(win_multiplier(98), 49.5);
        assert_eq!(win_multiplier(2), 99.0 / 98.0);
    }
}
