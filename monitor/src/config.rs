use serde::Deserialize;
use std::{
	fs::File,
	net::IpAddr,
	path::{Path, PathBuf},
	time::Duration,
};

pub const DEFAULT_NAME: &str = "Onewheel Battery Owie";
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 10;
pub const MIN_SCAN_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_MAX_MISSED_PACKETS: u32 = 3;
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub owie: OwieConfig,
	pub mqtt: MqttConfig,

	#[serde(default = "default_state_file")]
	pub state_file: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OwieConfig {
	/// Address of the device on the local network.
	pub ip: IpAddr,

	#[serde(default = "default_name")]
	pub name: String,

	/// Seconds between polls.
	#[serde(default = "default_scan_interval")]
	pub scan_interval: u64,

	/// Polls the uptime may stall for before the device counts as
	/// disconnected.
	#[serde(default = "default_max_missed_packets")]
	pub max_missed_packets: u32,

	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
}

impl OwieConfig {
	pub fn scan_interval(&self) -> Duration {
		Duration::from_secs(self.scan_interval)
	}

	pub fn timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct MqttConfig {
	pub host: String,

	#[serde(default = "default_mqtt_port")]
	pub port: u16,

	#[serde(default = "default_client_id")]
	pub client_id: String,

	pub username: Option<String>,
	pub password: Option<String>,

	#[serde(default = "default_base_topic")]
	pub base_topic: String,

	#[serde(default = "default_discovery_prefix")]
	pub discovery_prefix: String,
}

fn default_state_file() -> PathBuf {
	PathBuf::from("owie-state.json")
}

fn default_name() -> String {
	DEFAULT_NAME.to_string()
}

fn default_scan_interval() -> u64 {
	DEFAULT_SCAN_INTERVAL_SECS
}

fn default_max_missed_packets() -> u32 {
	DEFAULT_MAX_MISSED_PACKETS
}

fn default_timeout_ms() -> u64 {
	DEFAULT_TIMEOUT_MS
}

fn default_mqtt_port() -> u16 {
	1883
}

fn default_client_id() -> String {
	"owie-monitor".to_string()
}

fn default_base_topic() -> String {
	"owie".to_string()
}

fn default_discovery_prefix() -> String {
	"homeassistant".to_string()
}

impl Config {
	/// Enforces bounds the deserializer can't express.
	///
	/// Too short a scan interval is raised to the minimum; values that make
	/// no sense at all are rejected.
	pub fn normalize(mut self) -> anyhow::Result<Self> {
		if self.owie.scan_interval < MIN_SCAN_INTERVAL_SECS {
			tracing::warn!(
				"scan_interval of {}s is below the minimum, using {MIN_SCAN_INTERVAL_SECS}s",
				self.owie.scan_interval
			);
			self.owie.scan_interval = MIN_SCAN_INTERVAL_SECS;
		}
		if self.owie.max_missed_packets == 0 {
			anyhow::bail!("owie.max_missed_packets must be >= 1");
		}
		if self.owie.timeout_ms == 0 {
			anyhow::bail!("owie.timeout_ms must be >= 1");
		}
		if self.owie.name.trim().is_empty() {
			anyhow::bail!("owie.name must not be empty");
		}
		if self.mqtt.host.trim().is_empty() {
			anyhow::bail!("mqtt.host must not be empty");
		}
		Ok(self)
	}
}

/// Reads a YAML or JSON configuration file, chosen by extension.
pub fn load_config<T: AsRef<Path>>(path: T) -> anyhow::Result<Config> {
	let path = path.as_ref();
	let config_file = File::open(path)?;
	let config: Config = match path.extension().and_then(|s| s.to_str()) {
		Some("yaml") | Some("yml") => serde_yaml::from_reader(config_file)?,
		Some("json") => serde_json::from_reader(config_file)?,
		None | Some(_) => anyhow::bail!("unknown config file extension: {}", path.display()),
	};
	config.normalize()
}
