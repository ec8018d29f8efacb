use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::info;
use zone_engine::regulation::{SETTLE_DELAY, STEP, TICK_INTERVAL};
use zone_engine::{RegulationConfig, ZoneSeed};

pub const DEFAULT_CONFIG_PATH: &str = "zones.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub regulation: RegulationSection,
    /// Replaces the built-in zone list when present.
    pub zones: Option<Vec<ZoneSeed>>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RegulationSection {
    pub tick_ms: u64,
    pub settle_ms: u64,
    pub step: f64,
}

impl Default for RegulationSection {
    fn default() -> Self {
        RegulationSection {
            tick_ms: TICK_INTERVAL.as_millis() as u64,
            settle_ms: SETTLE_DELAY.as_millis() as u64,
            step: STEP,
        }
    }
}

impl RegulationSection {
    pub fn to_config(&self) -> Result<RegulationConfig> {
        RegulationConfig::new(
            Duration::from_millis(self.tick_ms),
            Duration::from_millis(self.settle_ms),
            self.step,
        )
        .context("invalid [regulation] settings")
    }
}

pub fn parse(text: &str) -> Result<ConsoleConfig> {
    toml::from_str(text).context("invalid zone config")
}

/// Reads `path`, or `zones.toml` in the working directory when no path is
/// given. Only the implicit default may be absent.
pub async fn load(path: Option<&Path>) -> Result<ConsoleConfig> {
    let path = match path {
        Some(p) => p,
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if !fs::try_exists(default).await.unwrap_or(false) {
                info!("no {}, using built-in zones", DEFAULT_CONFIG_PATH);
                return Ok(ConsoleConfig::default());
            }
            default
        }
    };
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let config = parse(&text).with_context(|| format!("parsing {}", path.display()))?;
    info!(
        path = %path.display(),
        zones = config.zones.as_ref().map_or(0, |z| z.len()),
        "config loaded"
    );
    Ok(config)
}
