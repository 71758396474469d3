use crate::{
	battery::BatteryLevel,
	connectivity::{Connectivity, ConnectivityTracker},
	entities::{self, EntityKind, EntityState},
	store::StateStore,
	util::timestamp_rfc3339,
};
use owie::{Client, FetchError, LatestInfo, RawStatus};
use time::OffsetDateTime;

/// Result of a single poll, for logging and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
	/// The cache was replaced with a fresh reading.
	Updated,
	/// The device didn't answer. The previous reading is kept.
	Unreachable,
	/// The device answered with an error status. The previous reading is kept.
	ServerError,
	/// The device answered with a payload that couldn't be used. The previous
	/// reading is kept.
	Malformed,
}

/// Entity states computed at the end of a poll cycle.
#[derive(Clone, Debug)]
pub struct Snapshot {
	pub connectivity: Connectivity,
	pub battery_level: u8,
	/// The battery level actually seen or restored; `None` while
	/// `battery_level` is only the fallback 0.
	pub held_battery_level: Option<u8>,
	pub battery: EntityState,
	pub charging: EntityState,
	pub connectivity_state: EntityState,
}

impl Snapshot {
	pub fn entities(&self) -> [(EntityKind, &EntityState); 3] {
		[
			(EntityKind::Battery, &self.battery),
			(EntityKind::Charging, &self.charging),
			(EntityKind::Connectivity, &self.connectivity_state),
		]
	}

	/// Records the battery level under `entity`, unless nothing has been
	/// seen or restored yet.
	pub fn persist<S: StateStore + ?Sized>(&self, store: &mut S, entity: &str) -> anyhow::Result<()> {
		match self.held_battery_level {
			Some(level) => store.record(entity, level),
			None => Ok(()),
		}
	}
}

/// Everything known about one device, carried from poll to poll.
#[derive(Debug)]
pub struct DeviceSession {
	name: String,
	latest: LatestInfo,
	connectivity: ConnectivityTracker,
	battery: BatteryLevel,
	last_poll: Option<String>,
}

impl DeviceSession {
	/// `restored` is the battery level persisted by a previous run.
	pub fn new(name: impl Into<String>, max_missed: u32, restored: Option<u8>) -> Self {
		Self {
			name: name.into(),
			latest: LatestInfo::default(),
			connectivity: ConnectivityTracker::new(max_missed),
			battery: BatteryLevel::new(restored),
			last_poll: None,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn latest(&self) -> &LatestInfo {
		&self.latest
	}

	/// Runs one full cycle: fetch, then derive every entity's state.
	pub async fn tick(&mut self, client: &Client) -> Snapshot {
		let outcome = self.apply(client.fetch().await);
		tracing::debug!("poll of '{}' finished: {outcome:?}", self.name);
		self.snapshot()
	}

	/// Replaces the cached reading if `result` holds a usable payload.
	pub fn apply(&mut self, result: Result<RawStatus, FetchError>) -> PollOutcome {
		let raw = match result {
			Ok(raw) => raw,
			Err(FetchError::Unreachable(error)) => {
				tracing::info!("unable to connect to Owie device '{}': {error}", self.name);
				return PollOutcome::Unreachable;
			}
			Err(FetchError::ServerError { status, body }) => {
				tracing::error!("updating Owie status for '{}' got {status}: {body}", self.name);
				return PollOutcome::ServerError;
			}
			Err(error @ FetchError::Decode(_)) => {
				tracing::error!("bad status payload from '{}': {error}", self.name);
				return PollOutcome::Malformed;
			}
		};

		match raw.sanitize() {
			Ok(info) => {
				tracing::trace!("Owie data for '{}': {info:?}", self.name);
				self.latest = info;
				self.last_poll = timestamp_rfc3339(OffsetDateTime::now_utc());
				PollOutcome::Updated
			}
			Err(error) => {
				tracing::error!("bad status payload from '{}': {error}", self.name);
				PollOutcome::Malformed
			}
		}
	}

	/// Advances the connectivity tracker and the battery state holder once,
	/// then derives the entity states from the cached reading.
	pub fn snapshot(&mut self) -> Snapshot {
		let connectivity = self.connectivity.observe(&self.latest.uptime);
		let battery_level = self.battery.current_value(self.latest.overridden_soc);

		Snapshot {
			connectivity,
			battery_level,
			held_battery_level: self.battery.held(),
			battery: entities::battery_state(battery_level, &self.latest),
			charging: entities::charging_state(&self.latest, connectivity),
			connectivity_state: entities::connectivity_state(
				&self.latest,
				connectivity,
				self.last_poll.as_deref(),
			),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::MemoryStore;

	fn raw(uptime: &str, soc: &str, amps: &str) -> RawStatus {
		serde_json::from_value(serde_json::json!({
			"TOTAL_VOLTAGE": "58.0v",
			"CURRENT_AMPS": amps,
			"OVERRIDDEN_SOC": soc,
			"UPTIME": uptime,
		}))
		.unwrap()
	}

	fn server_error() -> Result<RawStatus, FetchError> {
		Err(FetchError::ServerError {
			status: 400,
			body: "bad".into(),
		})
	}

	#[test]
	fn test_before_first_poll() {
		let mut session = DeviceSession::new("Owie", 3, None);
		let snapshot = session.snapshot();
		assert_eq!(snapshot.connectivity, Connectivity::NeverConnected);
		assert_eq!(snapshot.battery_level, 0);
		assert_eq!(snapshot.charging.state, "OFF");
		assert_eq!(snapshot.connectivity_state.state, "OFF");
	}

	#[test]
	fn test_restored_level_until_first_reading() {
		let mut session = DeviceSession::new("Owie", 3, Some(42));
		assert_eq!(session.snapshot().battery_level, 42);

		assert_eq!(session.apply(Ok(raw("00:00:10", "67%", "0 Amps"))), PollOutcome::Updated);
		let snapshot = session.snapshot();
		assert_eq!(snapshot.battery_level, 67);
		assert_eq!(snapshot.battery.state, "67");
		assert!(snapshot.connectivity.is_connected());
	}

	#[test]
	fn test_failed_poll_keeps_cache() {
		let mut session = DeviceSession::new("Owie", 3, None);
		session.apply(Ok(raw("00:00:10", "80%", "-1.5 Amps")));
		let before = session.latest().clone();

		assert_eq!(session.apply(server_error()), PollOutcome::ServerError);
		assert_eq!(session.latest(), &before);

		let mut bad = raw("00:00:11", "80%", "-1.5 Amps");
		bad.total_voltage = "??".into();
		assert_eq!(session.apply(Ok(bad)), PollOutcome::Malformed);
		assert_eq!(session.latest(), &before);
	}

	#[test]
	fn test_stalled_device_stops_charging() {
		let mut session = DeviceSession::new("Owie", 2, None);
		session.apply(Ok(raw("00:00:10", "80%", "-1.5 Amps")));
		let snapshot = session.snapshot();
		assert_eq!(snapshot.charging.state, "ON");
		assert_eq!(snapshot.charging.attributes["Charge Speed"], "Pint Charger");

		// Device stops answering; the cached uptime no longer advances.
		session.apply(server_error());
		let snapshot = session.snapshot();
		assert_eq!(snapshot.connectivity, Connectivity::StaleTolerated);
		assert_eq!(snapshot.charging.state, "ON");

		session.apply(server_error());
		let snapshot = session.snapshot();
		assert_eq!(snapshot.connectivity, Connectivity::Disconnected);
		assert_eq!(snapshot.charging.state, "OFF");
		assert_eq!(snapshot.connectivity_state.state, "OFF");
		// The battery level is still shown while disconnected.
		assert_eq!(snapshot.battery_level, 80);

		session.apply(Ok(raw("00:00:40", "79%", "-1.5 Amps")));
		let snapshot = session.snapshot();
		assert_eq!(snapshot.connectivity, Connectivity::Connected);
		assert_eq!(snapshot.battery_level, 79);
	}

	#[test]
	fn test_unknown_soc_keeps_last_level() {
		let mut session = DeviceSession::new("Owie", 3, None);
		session.apply(Ok(raw("1", "55%", "0 Amps")));
		assert_eq!(session.snapshot().battery_level, 55);

		session.apply(Ok(raw("2", "-1%", "0 Amps")));
		assert_eq!(session.snapshot().battery_level, 55);
	}

	#[test]
	fn test_snapshot_entities_order() {
		let mut session = DeviceSession::new("Owie", 3, None);
		let snapshot = session.snapshot();
		let kinds: Vec<_> = snapshot.entities().iter().map(|(kind, _)| *kind).collect();
		assert_eq!(kinds, EntityKind::ALL);
	}

	#[test]
	fn test_fallback_level_is_not_persisted() {
		let mut store = MemoryStore::default();
		let mut session = DeviceSession::new("Owie", 3, None);

		let snapshot = session.snapshot();
		assert_eq!(snapshot.battery_level, 0);
		assert_eq!(snapshot.held_battery_level, None);
		snapshot.persist(&mut store, "owie_battery").unwrap();
		assert_eq!(store.last_known("owie_battery"), None);

		session.apply(Ok(raw("1", "0%", "0 Amps")));
		let snapshot = session.snapshot();
		assert_eq!(snapshot.held_battery_level, Some(0));
		snapshot.persist(&mut store, "owie_battery").unwrap();
		assert_eq!(store.last_known("owie_battery"), Some(0));
	}

	#[test]
	fn test_restored_level_is_persisted_again() {
		let mut store = MemoryStore::default();
		let snapshot = DeviceSession::new("Owie", 3, Some(42)).snapshot();
		snapshot.persist(&mut store, "owie_battery").unwrap();
		assert_eq!(store.last_known("owie_battery"), Some(42));
	}
}
