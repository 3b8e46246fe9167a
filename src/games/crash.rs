//! Rocket crash: a heavy-tailed crash point and a multiplier that climbs
//! until it would reach it.

use crate::error::{CoreError, CoreResult};
use crate::games::GameId;
use crate::rng::RandomSource;

pub const INSTANT_CRASH_CHANCE: f64 = 0.05;
pub const DAMPING: f64 = 0.97;

/// Pre-chosen cash-out target used when a round is resolved in one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrashParams {
    pub cash_out: f64,
}

impl Default for CrashParams {
    fn default() -> Self {
        Self { cash_out: 2.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrashRun {
    pub crash_point: f64,
    pub cashed_out_at: Option<f64>,
}

impl CrashRun {
    pub fn payout(&self, stake: f64) -> f64 {
        self.cashed_out_at.map(|m| stake * m).unwrap_or(0.0)
    }
}

/// Never below 1.00; 5% of flights die on the pad.
pub fn draw_crash_point<R: RandomSource + ?Sized>(rng: &mut R) -> f64 {
    if rng.next_float() < INSTANT_CRASH_CHANCE {
        return 1.0;
    }
    let u = rng.next_float();
    (DAMPING / (1.0 - u)).max(1.0)
}

pub fn run<R: RandomSource + ?Sized>(params: &CrashParams, rng: &mut R) -> CoreResult<CrashRun> {
    if !params.cash_out.is_finite() || params.cash_out < 1.0 {
        return Err(CoreError::params(
            GameId::Crash,
            format!("cash-out {} must be at least 1.00x", params.cash_out),
        ));
    }
    let crash_point = draw_crash_point(rng);
    let cashed_out_at = (params.cash_out < crash_point).then_some(params.cash_out);
    Ok(CrashRun {
        crash_point,
        cashed_out_at,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlightState {
    Flying,
    Crashed,
    CashedOut(f64),
}

/// Step-by-step flight for callers that animate the climb and let the player
/// bail out at any point.
#[derive(Debug, Clone)]
pub struct CrashFlight {
    crash_point: f64,
    multiplier: f64,
    state: FlightState,
}

impl CrashFlight {
    pub fn launch<R: RandomSource + ?Sized>(rng: &mut R) -> Self {
        Self::with_crash_point(draw_crash_point(rng))
    }

    pub fn with_crash_point(crash_point: f64) -> Self {
        Self {
            crash_point,
            multiplier: 1.0,
            state: FlightState::Flying,
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn state(&self) -> FlightState {
        self.state
    }

    pub fn is_flying(&self) -> bool {
        self.state == FlightState::Flying
    }

    /// Advances one step; the flight crashes when the next value would reach
    /// the crash point, leaving the multiplier at its last safe value.
    pub fn step(&mut self) -> FlightState {
        if self.state != FlightState::Flying {
            return self.state;
        }
        let next = self.multiplier + 0.01 * (1.0 + self.multiplier / 10.0);
        if next >= self.crash_point {
            self.state = FlightState::Crashed;
        } else {
            self.multiplier = next;
        }
        self.state
    }

    pub fn cash_out(&mut self) -> Option<f64> {
        if self.state != FlightState::Flying {
            return None;
        }
        self.state = FlightState::CashedOut(self.multiplier);
        Some(self.multiplier)
    }

    /// The finished run, or `None` while still in the air.
    pub fn finish(&self) -> Option<CrashRun> {
        match self.state {
            FlightState::Flying => None,
            FlightState::Crashed => Some(CrashRun {
                crash_point: self.crash_point,
                cashed_out_at: None,
            }),
            FlightState::CashedOut(at) => Some(CrashRun {
                crash_point: self.crash_point,
                cashed_out_at: Some(at),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedSource;

    #[test]
    fn low_first_draw_crashes_on_the_pad() {
        let mut src = ScriptedSource::new(vec![0.01, 0.9]);
        assert_eq!(draw_crash_point(&mut src), 1.0);
        assert_eq!(src.consumed(), 1);
    }

    #[test]
    fn crash_point_follows_damped_inverse() {
        let mut src = ScriptedSource::new(vec![0.5, 0.5]);
        assert!((draw_crash_point(&mut src) - 1.94).abs() < 1e-12);
    }

    #[test]
    fn cash_out_below_crash_point_wins() {
        let mut src = ScriptedSource::new(vec![0.5, 0.5]);
        let run = run(&CrashParams { cash_out: 1.5 }, &mut src).unwrap();
        assert_eq!(run.cashed_out_at, Some(1.5));
        assert_eq!(run.payout(100.0), 150.0);
    }

    #[test]
    fn cash_out_at_or_above_crash_point_loses() {
        let mut src = ScriptedSource::new(vec![0.5, 0.5]);
        let run = run(&CrashParams { cash_out: 1.94 }, &mut src).unwrap();
        assert_eq!(run.payout(100.0), 0.0);
    }

    #[test]
    fn instant_crash_beats_any_target() {
        let mut src = ScriptedSource::new(vec![0.0]);
        let run = run(&CrashParams { cash_out: 1.0 }, &mut src).unwrap();
        assert_eq!(run.crash_point, 1.0);
        assert_eq!(run.payout(10.0), 0.0);
    }

    #[test]
    fn rejects_cash_out_under_one() {
        let mut src = ScriptedSource::new(vec![0.5]);
        assert!(run(&CrashParams { cash_out: 0.5 }, &mut src).is_err());
        assert!(run(&CrashParams { cash_out: f64::NAN }, &mut src).is_err());
    }

    #[test]
    fn flight_climbs_then_crashes() {
        let mut flight = CrashFlight::with_crash_point(1.05);
        let mut steps = 0;
        while flight.step() == FlightState::Flying {
            steps += 1;
            assert!(flight.multiplier() < 1.05);
        }
        assert!(steps > 0);
        assert_eq!(flight.state(), FlightState::Crashed);
        assert_eq!(flight.cash_out(), None);
        let run = flight.finish().unwrap();
        assert_eq!(run.payout(50.0), 0.0);
    }

    #[test]
    fn flight_cash_out_locks_multiplier() {
        let mut flight = CrashFlight::with_crash_point(10.0);
        flight.step();
        flight.step();
        let at = flight.cash_out().unwrap();
        assert!(at > 1.0);
        assert_eq!(flight.step(), FlightState::CashedOut(at));
        assert_eq!(flight.finish().unwrap().payout(10.0), 10.0 * at);
    }
}
