use crate::error::{CoreError, CoreResult};
use crate::games::GameId;
use crate::rng::{RandomSource, pick_index};

pub const STANDARD_SEGMENTS: [f64; 12] = [0.0, 2.0, 0.0, 5.0, 0.0, 1.5, 0.0, 10.0, 0.0, 1.2, 0.0, 25.0];

#[derive(Debug, Clone, PartialEq)]
pub struct WheelParams {
    segments: Vec<f64>,
}

impl WheelParams {
    pub fn new(segments: Vec<f64>) -> CoreResult<Self> {
        if segments.is_empty() {
            return Err(CoreError::params(GameId::Wheel, "wheel needs at least one segment"));
        }
        if let Some(bad) = segments.iter().find(|m| !m.is_finite() || **m < 0.0) {
            return Err(CoreError::params(
                GameId::Wheel,
                format!("segment multiplier {bad} must be finite and non-negative"),
            ));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[f64] {
        &self.segments
    }
}

impl Default for WheelParams {
    fn default() -> Self {
        Self {
            segments: STANDARD_SEGMENTS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelSpin {
    pub segment: usize,
    pub multiplier: f64,
}

pub fn spin<R: RandomSource + ?Sized>(params: &WheelParams, rng: &mut R) -> WheelSpin {
    let segment = pick_index(rng, params.segments.len());
    WheelSpin {
        segment,
        multiplier: params.segments[segment],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedSource;

    #[test]
    fn half_the_standard_wheel_is_blank() {
        let blanks = STANDARD_SEGMENTS.iter().filter(|m| **m == 0.0).count();
        assert_eq!(blanks, STANDARD_SEGMENTS.len() / 2);
    }

    #[test]
    fn spin_maps_draw_to_segment() {
        let params = WheelParams::default();
        let mut src = ScriptedSource::new(vec![3.5 / 12.0]);
        let spin = spin(&params, &mut src);
        assert_eq!(spin.segment, 3);
        assert_eq!(spin.multiplier, 5.0);
    }

    #[test]
    fn custom_tables_are_validated() {
        assert!(WheelParams::new(vec![]).is_err());
        assert!(WheelParams::new(vec![1.0, -2.0]).is_err());
        assert!(WheelParams::new(vec![0.0, 3.0]).is_ok());
    }
}
