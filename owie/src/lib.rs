mod charge;
pub use charge::{battery_icon, ChargeSpeed};

// Device HTTP client
//
mod client;
pub use client::{device_endpoint, Client, FetchError};

// Status payload, as sent by the device and after sanitizing
//
pub mod status;
pub use status::{LatestInfo, PayloadError, RawStatus, Uptime};

pub mod table;
pub use table::TableReadings;

/// Literal reported in place of an uptime when the device has never answered.
pub const OFFLINE_UPTIME: &str = "Offline";
