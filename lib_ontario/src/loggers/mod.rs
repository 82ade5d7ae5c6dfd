/// Installs the global tracing subscriber with console and file layers.
pub mod telemetry;

pub use telemetry::{init, TelemetryError, TelemetryOptions};
