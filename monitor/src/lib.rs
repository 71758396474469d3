pub mod battery;
pub mod config;
pub mod connectivity;
pub mod entities;
pub mod hass;
pub mod session;
pub mod store;
pub mod util;
