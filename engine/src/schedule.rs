use crate::zone::{Mode, ZoneSeed};

// --- Temperature constants for the built-in zones ---
const HEAT_START: f64 = 20.0;
const COOL_START: f64 = 24.0;
const SETPOINT: f64 = 22.0;

// --- Test cycles ---
// Temperatures forced onto a zone after each comfort arrival, in order.
const LIVING_ROOM_TEST_TEMPS: &[f64] = &[24.0, 18.0, 26.0];
const BEDROOM_TEST_TEMPS: &[f64] = &[19.0, 23.0, 21.0];
const KITCHEN_TEST_TEMPS: &[f64] = &[26.0, 20.0, 18.0];

const DEFAULT_ZONES: &[(u32, &str, f64, Mode, &[f64])] = &[
    (1, "Living Room", HEAT_START, Mode::Heat, LIVING_ROOM_TEST_TEMPS),
    (2, "Bedroom", HEAT_START, Mode::Heat, BEDROOM_TEST_TEMPS),
    (3, "Kitchen", COOL_START, Mode::Cool, KITCHEN_TEST_TEMPS),
    (4, "Kitchen", COOL_START, Mode::Cool, KITCHEN_TEST_TEMPS),
    (5, "Kitchen Annex", COOL_START, Mode::Cool, KITCHEN_TEST_TEMPS),
];

/// The fixed zone list used by [`crate::ZoneStore::seed`].
pub fn default_zones() -> Vec<ZoneSeed> {
    DEFAULT_ZONES
        .iter()
        .map(|&(id, name, ambient, mode, test_temps)| ZoneSeed {
            id,
            name: name.to_string(),
            ambient,
            setpoint: SETPOINT,
            mode,
            test_temps: test_temps.to_vec(),
        })
        .collect()
}
