use owie::RawStatus;
use owie_monitor::{
	entities::EntityKind,
	hass::Topics,
	session::DeviceSession,
	store::{JsonFileStore, StateStore},
};

fn reading(uptime: &str, soc: &str) -> RawStatus {
	serde_json::from_value(serde_json::json!({
		"TOTAL_VOLTAGE": "58.0v",
		"CURRENT_AMPS": "0.00 Amps",
		"OVERRIDDEN_SOC": soc,
		"UPTIME": uptime,
	}))
	.unwrap()
}

#[test]
fn test_battery_level_survives_restart() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("owie-state.json");
	let topics = Topics::new("owie", "homeassistant", "Onewheel Battery Owie");
	let battery_id = topics.unique_id(EntityKind::Battery);

	// First run: one live reading, persisted.
	{
		let mut store = JsonFileStore::open(&path).unwrap();
		let mut session = DeviceSession::new("Onewheel Battery Owie", 3, store.last_known(&battery_id));
		session.apply(Ok(reading("00:00:10", "67%")));
		session.snapshot().persist(&mut store, &battery_id).unwrap();
	}

	// Second run: the device has not answered yet.
	let store = JsonFileStore::open(&path).unwrap();
	assert_eq!(store.last_known(&battery_id), Some(67));

	let mut session = DeviceSession::new("Onewheel Battery Owie", 3, store.last_known(&battery_id));
	let snapshot = session.snapshot();
	assert_eq!(snapshot.battery_level, 67);
	assert_eq!(snapshot.battery.state, "67");
	assert!(!snapshot.connectivity.is_connected());

	// Once live, the device's value takes over and the restore is gone.
	session.apply(Ok(reading("00:00:05", "90%")));
	assert_eq!(session.snapshot().battery_level, 90);
	session.apply(Ok(reading("00:00:15", "-1%")));
	assert_eq!(session.snapshot().battery_level, 90);
}

#[test]
fn test_first_run_without_readings_leaves_no_history() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("owie-state.json");
	let topics = Topics::new("owie", "homeassistant", "Owie");
	let battery_id = topics.unique_id(EntityKind::Battery);

	{
		let mut store = JsonFileStore::open(&path).unwrap();
		let mut session = DeviceSession::new("Owie", 3, None);
		session.snapshot().persist(&mut store, &battery_id).unwrap();
	}

	let store = JsonFileStore::open(&path).unwrap();
	assert_eq!(store.last_known(&battery_id), None);
}
