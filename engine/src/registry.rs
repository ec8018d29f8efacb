use crate::error::ZoneError;
use crate::zone::{Mode, Zone, ZoneId, ZoneSeed};
use std::collections::HashSet;
use tracing::{debug, warn};

/// The authoritative zone collection. Lookups by unknown id are no-ops that
/// report `false`/`None`; the registry never fails on them.
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    zones: Vec<Zone>,
}

impl ZoneRegistry {
    pub fn new() -> ZoneRegistry {
        ZoneRegistry { zones: Vec::new() }
    }

    /// Replaces the collection. On error the previous zones are kept.
    pub fn replace(&mut self, seeds: Vec<ZoneSeed>) -> Result<(), ZoneError> {
        validate(&seeds)?;
        self.install(seeds);
        Ok(())
    }

    /// Replaces the collection with seeds already known to be valid.
    pub(crate) fn install(&mut self, seeds: Vec<ZoneSeed>) {
        self.zones = seeds.into_iter().map(Zone::from_seed).collect();
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == id)
    }

    pub fn get_mut(&mut self, id: ZoneId) -> Option<&mut Zone> {
        self.zones.iter_mut().find(|z| z.id == id)
    }

    pub fn is_on(&self, id: ZoneId) -> bool {
        self.get(id).map_or(false, |z| z.is_on)
    }

    /// Flips `is_on` and restores the original temperature. Switching on also
    /// rewinds the test cycle. Returns the new `is_on`, or `None` for an
    /// unknown id. Starting and stopping regulation is the caller's job.
    pub fn toggle(&mut self, id: ZoneId) -> Option<bool> {
        let Some(zone) = self.get_mut(id) else {
            debug!(zone = id, "toggle: unknown zone");
            return None;
        };
        zone.is_on = !zone.is_on;
        if zone.is_on {
            zone.test_index = None;
        }
        zone.ambient = zone.original_ambient;
        Some(zone.is_on)
    }

    pub fn set_setpoint(&mut self, id: ZoneId, value: f64) -> bool {
        if !value.is_finite() {
            warn!(zone = id, value, "ignoring non-finite setpoint");
            return false;
        }
        match self.get_mut(id) {
            Some(zone) => {
                zone.setpoint = value;
                true
            }
            None => {
                debug!(zone = id, "set_setpoint: unknown zone");
                false
            }
        }
    }

    pub fn set_mode(&mut self, id: ZoneId, mode: Mode) -> bool {
        match self.get_mut(id) {
            Some(zone) => {
                zone.mode = mode;
                true
            }
            None => {
                debug!(zone = id, "set_mode: unknown zone");
                false
            }
        }
    }
}

fn validate(seeds: &[ZoneSeed]) -> Result<(), ZoneError> {
    let mut seen = HashSet::new();
    for seed in seeds {
        if !seen.insert(seed.id) {
            return Err(ZoneError::DuplicateId(seed.id));
        }
        if !seed.ambient.is_finite() {
            return Err(ZoneError::InvalidTemperature { id: seed.id, field: "ambient" });
        }
        if !seed.setpoint.is_finite() {
            return Err(ZoneError::InvalidTemperature { id: seed.id, field: "setpoint" });
        }
        if seed.test_temps.iter().any(|t| !t.is_finite()) {
            return Err(ZoneError::InvalidTemperature { id: seed.id, field: "test_temps" });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::default_zones;

    fn seeded() -> ZoneRegistry {
        let mut r = ZoneRegistry::new();
        r.replace(default_zones()).unwrap();
        r
    }

    #[test]
    fn replace_loads_default_zones() {
        let r = seeded();
        assert_eq!(r.zones().len(), 5);
        assert!(r.zones().iter().all(|z| !z.is_on && z.test_index.is_none()));
    }

    #[test]
    fn toggle_on_and_off() {
        let mut r = seeded();
        assert_eq!(r.toggle(1), Some(true));
        assert!(r.is_on(1));
        assert_eq!(r.toggle(1), Some(false));
        assert!(!r.is_on(1));
    }

    #[test]
    fn toggle_restores_original_ambient_and_rewinds_cycle() {
        let mut r = seeded();
        {
            let z = r.get_mut(1).unwrap();
            z.ambient = 25.3;
            z.test_index = Some(2);
        }
        r.toggle(1);
        let z = r.get(1).unwrap();
        assert_eq!(z.ambient, 20.0);
        assert_eq!(z.test_index, None);

        r.get_mut(1).unwrap().ambient = 21.7;
        r.toggle(1);
        assert_eq!(r.get(1).unwrap().ambient, 20.0);
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let mut r = seeded();
        assert_eq!(r.toggle(42), None);
        assert!(!r.set_setpoint(42, 25.0));
        assert!(!r.set_mode(42, Mode::Cool));
        assert!(r.zones().iter().all(|z| !z.is_on));
    }

    #[test]
    fn set_setpoint_updates_target_only() {
        let mut r = seeded();
        assert!(r.set_setpoint(2, 25.0));
        let z = r.get(2).unwrap();
        assert_eq!(z.setpoint, 25.0);
        assert_eq!(z.ambient, 20.0);
        assert!(!z.is_on);
    }

    #[test]
    fn non_finite_setpoint_is_rejected() {
        let mut r = seeded();
        assert!(!r.set_setpoint(2, f64::NAN));
        assert_eq!(r.get(2).unwrap().setpoint, 22.0);
    }

    #[test]
    fn set_mode_updates_mode() {
        let mut r = seeded();
        assert!(r.set_mode(3, Mode::Heat));
        assert_eq!(r.get(3).unwrap().mode, Mode::Heat);
    }

    #[test]
    fn duplicate_ids_keep_previous_zones() {
        let mut r = seeded();
        let mut seeds = default_zones();
        seeds[1].id = seeds[0].id;
        assert_eq!(r.replace(seeds), Err(ZoneError::DuplicateId(1)));
        assert_eq!(r.zones().len(), 5);
    }

    #[test]
    fn non_finite_seed_temperature_is_rejected() {
        let mut r = ZoneRegistry::new();
        let mut seeds = default_zones();
        seeds[2].test_temps.push(f64::INFINITY);
        assert_eq!(
            r.replace(seeds),
            Err(ZoneError::InvalidTemperature { id: 3, field: "test_temps" })
        );
        assert!(r.zones().is_empty());
    }
}
