use crate::engine::{RegulationEngine, RegulationEvent};
use crate::error::ZoneError;
use crate::registry::ZoneRegistry;
use crate::regulation::RegulationConfig;
use crate::schedule::default_zones;
use crate::zone::{self, Mode, Zone, ZoneId, ZoneSeed, ZoneStatus};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// Zone registry plus the engine regulating it. This is the whole API a
/// presentation layer needs. Cloning shares the same zones.
///
/// Every mutation taking an id is a no-op when no zone has that id; the
/// returned `bool` reports whether anything was found.
#[derive(Clone)]
pub struct ZoneStore {
    zones: Arc<Mutex<ZoneRegistry>>,
    engine: RegulationEngine,
}

impl ZoneStore {
    /// Starts with no zones. Fails on an invalid `config`.
    pub fn new(config: RegulationConfig) -> Result<ZoneStore, ZoneError> {
        let zones = Arc::new(Mutex::new(ZoneRegistry::new()));
        let engine = RegulationEngine::new(zones.clone(), config)?;
        Ok(ZoneStore { zones, engine })
    }

    /// Loads the built-in zones, discarding any running simulation.
    pub fn seed(&self) {
        let seeds = default_zones();
        let count = seeds.len();
        self.zones.lock().install(seeds);
        self.engine.stop_all();
        info!(zones = count, "zones seeded");
    }

    /// Like [`ZoneStore::seed`] with a caller-supplied list. A rejected list
    /// leaves the current zones and their regulation untouched.
    pub fn seed_with(&self, seeds: Vec<ZoneSeed>) -> Result<(), ZoneError> {
        let count = seeds.len();
        self.zones.lock().replace(seeds)?;
        self.engine.stop_all();
        info!(zones = count, "zones seeded");
        Ok(())
    }

    /// Switches a zone on or off. Either way the ambient temperature goes
    /// back to its original value; switching on restarts the test cycle.
    pub fn toggle(&self, id: ZoneId) -> bool {
        let Some(on) = self.zones.lock().toggle(id) else {
            return false;
        };
        if on {
            info!(zone = id, "zone switched on");
            self.engine.start(id);
        } else {
            self.engine.stop(id);
            info!(zone = id, "zone switched off");
        }
        true
    }

    /// Changes the target. A running process picks it up on its next tick;
    /// the test cycle is not rewound.
    pub fn set_setpoint(&self, id: ZoneId, value: f64) -> bool {
        self.zones.lock().set_setpoint(id, value)
    }

    pub fn set_mode(&self, id: ZoneId, mode: Mode) -> bool {
        self.zones.lock().set_mode(id, mode)
    }

    /// Toggles every zone not already in the requested state. Returns how
    /// many zones changed.
    pub fn switch_all(&self, on: bool) -> usize {
        let ids: Vec<ZoneId> = self
            .zones
            .lock()
            .zones()
            .iter()
            .filter(|z| z.is_on != on)
            .map(|z| z.id)
            .collect();
        for &id in &ids {
            self.toggle(id);
        }
        ids.len()
    }

    pub fn status(&self, zone: &Zone) -> ZoneStatus {
        zone::status(zone)
    }

    pub fn snapshot(&self) -> Vec<Zone> {
        self.zones.lock().zones().to_vec()
    }

    pub fn zone(&self, id: ZoneId) -> Option<Zone> {
        self.zones.lock().get(id).cloned()
    }

    pub fn engine(&self) -> &RegulationEngine {
        &self.engine
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegulationEvent> {
        self.engine.subscribe()
    }
}
