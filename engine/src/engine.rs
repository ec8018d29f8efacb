use crate::error::ZoneError;
use crate::registry::ZoneRegistry;
use crate::regulation::{self, Cycle, RegulationConfig, RegulationState, Tick};
use crate::zone::{Mode, ZoneId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Transitions published by the engine. Advisory: nothing in the engine
/// depends on anyone listening.
#[derive(Debug, Clone, PartialEq)]
pub enum RegulationEvent {
    Tick {
        id: ZoneId,
        ambient: f64,
    },
    ComfortReached {
        id: ZoneId,
        name: String,
        ambient: f64,
    },
    CycleRestarted {
        id: ZoneId,
        name: String,
        ambient: f64,
        setpoint: f64,
        mode: Mode,
    },
    CycleFinished {
        id: ZoneId,
        name: String,
    },
    Stopped {
        id: ZoneId,
    },
}

struct ActiveRegulation {
    generation: u64,
    phase: RegulationState,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct HandleTable {
    next_generation: u64,
    active: HashMap<ZoneId, ActiveRegulation>,
}

/// Runs one regulation task per switched-on zone.
///
/// A zone id is in the handle table exactly while its task is regulating or
/// settling. [`RegulationEngine::start`] and [`RegulationEngine::stop`] are
/// the only ways in or out from the outside; a task removes its own entry
/// when it finishes, matched by generation so a newer task's entry is never
/// touched.
#[derive(Clone)]
pub struct RegulationEngine {
    zones: Arc<Mutex<ZoneRegistry>>,
    config: Arc<RegulationConfig>,
    table: Arc<Mutex<HandleTable>>,
    events: broadcast::Sender<RegulationEvent>,
}

impl RegulationEngine {
    /// Fails if `config` does not pass [`RegulationConfig::validate`].
    pub fn new(
        zones: Arc<Mutex<ZoneRegistry>>,
        config: RegulationConfig,
    ) -> Result<RegulationEngine, ZoneError> {
        config.validate()?;
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Ok(RegulationEngine {
            zones,
            config: Arc::new(config),
            table: Arc::new(Mutex::new(HandleTable::default())),
            events,
        })
    }

    pub fn config(&self) -> &RegulationConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegulationEvent> {
        self.events.subscribe()
    }

    /// Starts regulating `id`, replacing any process already running for it.
    /// Returns `false` without doing anything if the zone is unknown or off.
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, id: ZoneId) -> bool {
        if !self.zones.lock().is_on(id) {
            debug!(zone = id, "start: zone unknown or off");
            return false;
        }

        let mut table = self.table.lock();
        if let Some(previous) = table.active.remove(&id) {
            previous.handle.abort();
            self.emit(RegulationEvent::Stopped { id });
        }
        table.next_generation += 1;
        let generation = table.next_generation;

        let first_tick = Instant::now() + self.config.tick;
        let engine = self.clone();
        let handle = tokio::spawn(async move { engine.run(id, generation, first_tick).await });
        table.active.insert(
            id,
            ActiveRegulation {
                generation,
                phase: RegulationState::Regulating,
                handle,
            },
        );
        debug!(zone = id, generation, "regulation started");
        true
    }

    /// Cancels the process for `id`, including a pending settle delay.
    /// Returns whether one was running.
    pub fn stop(&self, id: ZoneId) -> bool {
        let removed = self.table.lock().active.remove(&id);
        match removed {
            Some(active) => {
                active.handle.abort();
                self.emit(RegulationEvent::Stopped { id });
                debug!(zone = id, "regulation stopped");
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&self) -> usize {
        let drained: Vec<_> = self.table.lock().active.drain().collect();
        for (id, active) in &drained {
            active.handle.abort();
            self.emit(RegulationEvent::Stopped { id: *id });
        }
        drained.len()
    }

    pub fn phase(&self, id: ZoneId) -> RegulationState {
        self.table
            .lock()
            .active
            .get(&id)
            .map_or(RegulationState::Idle, |a| a.phase)
    }

    pub fn is_active(&self, id: ZoneId) -> bool {
        self.table.lock().active.contains_key(&id)
    }

    pub fn active_count(&self) -> usize {
        self.table.lock().active.len()
    }

    async fn run(self, id: ZoneId, generation: u64, first_tick: Instant) {
        let mut state = RegulationState::Regulating;
        let mut resume_at = first_tick;
        loop {
            let next = match state {
                RegulationState::Regulating => {
                    let mut ticker = time::interval_at(resume_at, self.config.tick);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    loop {
                        ticker.tick().await;
                        if let Some(next) = self.on_tick(id) {
                            break next;
                        }
                    }
                }
                RegulationState::Settling => {
                    time::sleep(self.config.settle).await;
                    resume_at = Instant::now() + self.config.tick;
                    self.on_settled(id)
                }
                RegulationState::Idle => break,
            };
            if next != RegulationState::Idle {
                self.set_phase(id, generation, next);
            }
            state = next;
        }
        self.release(id, generation);
    }

    /// `None` keeps the ticker running.
    fn on_tick(&self, id: ZoneId) -> Option<RegulationState> {
        let mut zones = self.zones.lock();
        match regulation::tick(zones.get_mut(id), self.config.step) {
            Tick::Halted => {
                debug!(zone = id, "zone off or gone, regulation halted");
                Some(RegulationState::Idle)
            }
            Tick::Moved(ambient) => {
                self.emit(RegulationEvent::Tick { id, ambient });
                None
            }
            Tick::Comfort(cycle) => {
                let Some(zone) = zones.get(id) else {
                    return Some(RegulationState::Idle);
                };
                info!(zone = id, name = %zone.name, ambient = zone.ambient, "comfort temperature reached");
                self.emit(RegulationEvent::ComfortReached {
                    id,
                    name: zone.name.clone(),
                    ambient: zone.ambient,
                });
                match cycle {
                    Cycle::Next => Some(RegulationState::Settling),
                    Cycle::Finished => {
                        info!(zone = id, name = %zone.name, "test cycle finished");
                        self.emit(RegulationEvent::CycleFinished {
                            id,
                            name: zone.name.clone(),
                        });
                        Some(RegulationState::Idle)
                    }
                }
            }
        }
    }

    fn on_settled(&self, id: ZoneId) -> RegulationState {
        let mut zones = self.zones.lock();
        if regulation::settle(zones.get_mut(id)).is_none() {
            debug!(zone = id, "settle step discarded");
            return RegulationState::Idle;
        }
        let Some(zone) = zones.get(id) else {
            return RegulationState::Idle;
        };
        info!(
            zone = id,
            name = %zone.name,
            ambient = zone.ambient,
            setpoint = zone.setpoint,
            mode = %zone.mode,
            "restarting test cycle"
        );
        self.emit(RegulationEvent::CycleRestarted {
            id,
            name: zone.name.clone(),
            ambient: zone.ambient,
            setpoint: zone.setpoint,
            mode: zone.mode,
        });
        RegulationState::Regulating
    }

    fn set_phase(&self, id: ZoneId, generation: u64, phase: RegulationState) {
        if let Some(active) = self.table.lock().active.get_mut(&id) {
            if active.generation == generation {
                active.phase = phase;
            }
        }
    }

    fn release(&self, id: ZoneId, generation: u64) {
        let mut table = self.table.lock();
        if table.active.get(&id).map_or(false, |a| a.generation == generation) {
            table.active.remove(&id);
            debug!(zone = id, generation, "regulation finished");
        }
    }

    fn emit(&self, event: RegulationEvent) {
        // Err only means nobody is subscribed.
        let _ = self.events.send(event);
    }
}
