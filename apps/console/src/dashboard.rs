use chrono::{DateTime, Local};
use zone_engine::{status, RegulationEvent, Zone, ZoneStatus};

/// Status text shown next to a zone, e.g. `Heating to 22°`.
pub fn status_label(zone: &Zone) -> String {
    match status(zone) {
        ZoneStatus::Off => "Off".to_string(),
        ZoneStatus::Heating => format!("Heating to {}°", zone.setpoint),
        ZoneStatus::Cooling => format!("Cooling to {}°", zone.setpoint),
        ZoneStatus::Comfort => "Comfort".to_string(),
    }
}

pub fn zone_line(zone: &Zone) -> String {
    format!(
        "[{:>2}] {:<20} {:>5.1}° (target {:>4.1}°) {:<4} {:<3} {}",
        zone.id,
        zone.name,
        zone.ambient,
        zone.setpoint,
        zone.mode,
        if zone.is_on { "ON" } else { "OFF" },
        status_label(zone)
    )
}

pub fn render(zones: &[Zone], now: DateTime<Local>) -> String {
    let on = zones.iter().filter(|z| z.is_on).count();
    let mut out = format!(
        "===== {} ({} of {} zones on) =====",
        now.format("%a %b %_d %H:%M:%S %Y"),
        on,
        zones.len()
    );
    for zone in zones {
        out.push('\n');
        out.push_str(&zone_line(zone));
    }
    out
}

pub fn details(zone: &Zone) -> String {
    let cycle = match zone.test_index {
        None => "not started".to_string(),
        Some(i) if i >= zone.test_temps.len() => "finished".to_string(),
        Some(i) => format!("{} of {}", i + 1, zone.test_temps.len()),
    };
    format!(
        "{} (zone {}): {}° now, target {}°, mode {}, {}. Test cycle: {}.",
        zone.name,
        zone.id,
        zone.ambient,
        zone.setpoint,
        zone.mode,
        status(zone),
        cycle
    )
}

/// One-line description of a milestone event; ticks are not reported.
pub fn describe_event(event: &RegulationEvent) -> Option<String> {
    match event {
        RegulationEvent::Tick { .. } | RegulationEvent::Stopped { .. } => None,
        RegulationEvent::ComfortReached { name, ambient, .. } => {
            Some(format!("{} reached comfort at {}°", name, ambient))
        }
        RegulationEvent::CycleRestarted {
            name,
            ambient,
            setpoint,
            mode,
            ..
        } => Some(format!(
            "{} restarting cycle: {}° -> {}° ({})",
            name, ambient, setpoint, mode
        )),
        RegulationEvent::CycleFinished { name, .. } => {
            Some(format!("{}: test cycle finished", name))
        }
    }
}
