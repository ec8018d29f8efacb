//! Per-zone regulation steps, free of timers.
//!
//! ```text
//!            start                 ambient == setpoint
//!  Idle ─────────────▶ Regulating ─────────────────────▶ Settling
//!   ▲                   ▲   │ tick: step toward setpoint     │
//!   │                   │   └────────┘                       │
//!   │                   └──── settle delay, next test temp ──┤
//!   └────────── zone off / test cycle exhausted ─────────────┘
//! ```
//!
//! [`crate::engine::RegulationEngine`] drives these functions from a Tokio
//! task; they are also usable on their own with a simulated clock.

use crate::error::ZoneError;
use crate::zone::{Mode, Zone};
use serde::Serialize;
use std::time::Duration;

pub const TICK_INTERVAL: Duration = Duration::from_millis(200);
pub const SETTLE_DELAY: Duration = Duration::from_millis(1000);
pub const STEP: f64 = 0.08;

/// Steps at or below this can be swallowed by rounding to one decimal.
pub const MIN_STEP: f64 = 0.05;

/// Timing and step size of the engine. Build one with
/// [`RegulationConfig::new`] or start from the default; the engine refuses a
/// config that fails [`RegulationConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct RegulationConfig {
    pub tick: Duration,
    pub settle: Duration,
    pub step: f64,
    /// Buffer size of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for RegulationConfig {
    fn default() -> Self {
        RegulationConfig {
            tick: TICK_INTERVAL,
            settle: SETTLE_DELAY,
            step: STEP,
            event_capacity: 1024,
        }
    }
}

impl RegulationConfig {
    pub fn new(tick: Duration, settle: Duration, step: f64) -> Result<RegulationConfig, ZoneError> {
        let config = RegulationConfig {
            tick,
            settle,
            step,
            ..RegulationConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// A zero tick has no interval to run on, and a step at or below
    /// [`MIN_STEP`] (or NaN) would land on the setpoint in a single tick.
    pub fn validate(&self) -> Result<(), ZoneError> {
        if self.tick.is_zero() {
            return Err(ZoneError::ZeroTick);
        }
        if !(self.step.is_finite() && self.step > MIN_STEP) {
            return Err(ZoneError::StepTooSmall {
                step: self.step,
                min: MIN_STEP,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegulationState {
    Idle,
    Regulating,
    Settling,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Zone missing or switched off; the process ends.
    Halted,
    /// Ambient moved one step; the new value.
    Moved(f64),
    /// Setpoint reached and the test cursor advanced.
    Comfort(Cycle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// A test temperature is waiting at the new cursor.
    Next,
    Finished,
}

pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// One step of `current` toward `target`, rounded to one decimal. The result
/// never passes `target`; when rounding would overshoot or stall it lands on
/// `target` exactly.
pub fn approach(current: f64, target: f64, step: f64) -> f64 {
    if current < target {
        let next = round_tenth((current + step).min(target));
        if next > current && next < target {
            next
        } else {
            target
        }
    } else if current > target {
        let next = round_tenth((current - step).max(target));
        if next < current && next > target {
            next
        } else {
            target
        }
    } else {
        current
    }
}

/// Runs one regulation tick against the freshly looked-up zone.
pub fn tick(zone: Option<&mut Zone>, step: f64) -> Tick {
    let Some(zone) = zone.filter(|z| z.is_on) else {
        return Tick::Halted;
    };

    if zone.ambient != zone.setpoint {
        zone.ambient = approach(zone.ambient, zone.setpoint, step);
        return Tick::Moved(zone.ambient);
    }

    let next = zone.test_index.map_or(0, |i| i + 1);
    zone.test_index = Some(next);
    if next < zone.test_temps.len() {
        Tick::Comfort(Cycle::Next)
    } else {
        Tick::Comfort(Cycle::Finished)
    }
}

/// Applies the test temperature under the cursor once the settle delay has
/// elapsed. Returns `None` (and leaves the zone alone) if the zone went away,
/// was switched off, or has no temperature at the cursor.
pub fn settle(zone: Option<&mut Zone>) -> Option<f64> {
    let zone = zone.filter(|z| z.is_on)?;
    let temp = *zone.test_temps.get(zone.test_index?)?;

    zone.ambient = temp;
    if temp < zone.setpoint {
        zone.mode = Mode::Heat;
    } else if temp > zone.setpoint {
        zone.mode = Mode::Cool;
    }
    Some(temp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::ZoneSeed;

    fn living_room() -> Zone {
        let mut z = Zone::from_seed(ZoneSeed {
            id: 1,
            name: "Living Room".to_string(),
            ambient: 20.0,
            setpoint: 22.0,
            mode: Mode::Heat,
            test_temps: vec![24.0, 18.0, 26.0],
        });
        z.is_on = true;
        z
    }

    /// Drives a zone through ticks and settles until the test cycle ends,
    /// counting elapsed milliseconds the way the engine would.
    fn run_to_end(zone: &mut Zone) -> (u64, Vec<f64>) {
        let mut now_ms = 0;
        let mut visited = Vec::new();
        loop {
            now_ms += TICK_INTERVAL.as_millis() as u64;
            match tick(Some(&mut *zone), STEP) {
                Tick::Halted => panic!("zone halted while on"),
                Tick::Moved(t) => {
                    assert!(t <= 26.0 && t >= 18.0, "out of range: {t}");
                }
                Tick::Comfort(Cycle::Finished) => return (now_ms, visited),
                Tick::Comfort(Cycle::Next) => {
                    now_ms += SETTLE_DELAY.as_millis() as u64;
                    visited.push(settle(Some(&mut *zone)).unwrap());
                }
            }
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(RegulationConfig::default().validate(), Ok(()));
        let config = RegulationConfig::new(Duration::from_millis(50), Duration::ZERO, 0.5).unwrap();
        assert_eq!(config.event_capacity, RegulationConfig::default().event_capacity);
    }

    #[test]
    fn zero_tick_is_rejected() {
        assert_eq!(
            RegulationConfig::new(Duration::ZERO, SETTLE_DELAY, STEP),
            Err(ZoneError::ZeroTick)
        );
    }

    #[test]
    fn small_negative_or_nan_steps_are_rejected() {
        for step in [0.01, MIN_STEP, 0.0, -0.08, f64::NAN, f64::INFINITY] {
            let result = RegulationConfig::new(TICK_INTERVAL, SETTLE_DELAY, step);
            assert!(
                matches!(result, Err(ZoneError::StepTooSmall { .. })),
                "step {step} accepted"
            );
        }
    }

    #[test]
    fn one_step_is_rounded_to_a_tenth() {
        assert_eq!(approach(20.0, 22.0, STEP), 20.1);
        assert_eq!(approach(24.0, 22.0, STEP), 23.9);
    }

    #[test]
    fn converges_exactly_without_overshoot() {
        let mut t = 20.0;
        let mut steps = 0;
        while t != 22.0 {
            let next = approach(t, 22.0, STEP);
            assert!(next > t && next <= 22.0);
            t = next;
            steps += 1;
            assert!(steps < 100);
        }
        assert_eq!(steps, 20);
        assert_eq!(approach(22.0, 22.0, STEP), 22.0);
    }

    #[test]
    fn off_grid_setpoint_still_converges() {
        let mut t = 21.0;
        for _ in 0..50 {
            t = approach(t, 21.95, STEP);
            assert!(t <= 21.95);
        }
        assert_eq!(t, 21.95);

        let mut t = 23.0;
        for _ in 0..50 {
            t = approach(t, 22.55, STEP);
            assert!(t >= 22.55);
        }
        assert_eq!(t, 22.55);
    }

    #[test]
    fn tick_halts_when_zone_is_off_or_missing() {
        let mut z = living_room();
        z.is_on = false;
        assert_eq!(tick(Some(&mut z), STEP), Tick::Halted);
        assert_eq!(z.ambient, 20.0);
        assert_eq!(tick(None, STEP), Tick::Halted);
    }

    #[test]
    fn comfort_advances_the_cursor() {
        let mut z = living_room();
        z.ambient = 22.0;
        assert_eq!(tick(Some(&mut z), STEP), Tick::Comfort(Cycle::Next));
        assert_eq!(z.test_index, Some(0));
    }

    #[test]
    fn settle_applies_test_temperature_and_mode() {
        let mut z = living_room();
        z.ambient = 22.0;
        tick(Some(&mut z), STEP);
        assert_eq!(settle(Some(&mut z)), Some(24.0));
        assert_eq!(z.ambient, 24.0);
        assert_eq!(z.mode, Mode::Cool);
    }

    #[test]
    fn settle_keeps_mode_when_test_temperature_equals_setpoint() {
        let mut z = living_room();
        z.test_temps = vec![22.0];
        z.mode = Mode::Cool;
        z.test_index = Some(0);
        assert_eq!(settle(Some(&mut z)), Some(22.0));
        assert_eq!(z.mode, Mode::Cool);
    }

    #[test]
    fn settle_is_discarded_for_an_off_zone() {
        let mut z = living_room();
        z.test_index = Some(0);
        z.is_on = false;
        assert_eq!(settle(Some(&mut z)), None);
        assert_eq!(z.ambient, 20.0);
    }

    #[test]
    fn full_cycle_visits_every_test_temperature() {
        let mut z = living_room();
        let (elapsed_ms, visited) = run_to_end(&mut z);
        assert_eq!(visited, vec![24.0, 18.0, 26.0]);
        assert_eq!(z.test_index, Some(3));
        assert_eq!(z.ambient, 22.0);
        // 20 + 20 + 40 + 40 moving ticks, 4 comfort ticks, 3 settle delays.
        assert_eq!(elapsed_ms, 124 * 200 + 3 * 1000);
    }

    #[test]
    fn empty_test_cycle_finishes_on_first_comfort() {
        let mut z = living_room();
        z.test_temps.clear();
        z.ambient = 22.0;
        assert_eq!(tick(Some(&mut z), STEP), Tick::Comfort(Cycle::Finished));
    }
}
