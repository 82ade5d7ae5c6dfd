// Declare the feature-gated modules to re-export
#[cfg(feature = "configs")]
pub mod configs;
#[cfg(feature = "loggers")]
pub mod loggers;
#[cfg(feature = "retrieve")]
pub mod retrieve;
#[cfg(feature = "sources")]
pub mod sources; // Requires the retrieve and utils features
#[cfg(feature = "utils")]
pub mod utils;

// Re-export everything
#[cfg(feature = "configs")]
pub use configs::settings::*;
#[cfg(feature = "loggers")]
pub use loggers::telemetry::*;
#[cfg(feature = "retrieve")]
pub use retrieve::client::*;
#[cfg(feature = "retrieve")]
pub use retrieve::error::*;
#[cfg(feature = "retrieve")]
pub use retrieve::http::*;
#[cfg(feature = "retrieve")]
pub use retrieve::pacing::*;
#[cfg(feature = "retrieve")]
pub use retrieve::retry::*;
#[cfg(feature = "sources")]
pub use sources::biodiversity::*;
#[cfg(feature = "sources")]
pub use sources::fire::*;
#[cfg(feature = "sources")]
pub use sources::protected_areas::*;
#[cfg(feature = "utils")]
pub use utils::geometry::*;
