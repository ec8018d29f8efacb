use crate::zone::ZoneId;
use thiserror::Error;

/// Rejected zone lists and regulation settings. Unknown ids on mutations are
/// not errors; those operations are no-ops.
#[derive(Debug, Error, PartialEq)]
pub enum ZoneError {
    #[error("zone id {0} is listed more than once")]
    DuplicateId(ZoneId),
    #[error("zone {id}: {field} must be a finite temperature")]
    InvalidTemperature { id: ZoneId, field: &'static str },
    #[error("tick interval must be non-zero")]
    ZeroTick,
    #[error("step must be greater than {min}, got {step}")]
    StepTooSmall { step: f64, min: f64 },
}
