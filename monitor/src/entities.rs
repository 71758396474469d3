use crate::{
	connectivity::Connectivity,
	hass::{PAYLOAD_OFF, PAYLOAD_ON},
};
use owie::{battery_icon, ChargeSpeed, LatestInfo};
use serde::Serialize;
use serde_json::{Map, Value};

pub const ATTR_OVERRIDDEN_SOC: &str = "Battery Level";
pub const ATTR_BMS_SOC: &str = "BMS Battery Level";
pub const ATTR_TOTAL_VOLTAGE: &str = "Total Voltage";
pub const ATTR_USED_CHARGE: &str = "Used Charge";
pub const ATTR_REGENERATED_CHARGE: &str = "Regenerated Charge";
pub const ATTR_CELL_VOLTAGE: &str = "Cell Voltage";
pub const ATTR_BATTERY_TEMP: &str = "Battery Temp";
pub const ATTR_CHARGE_SPEED: &str = "Charge Speed";
pub const ATTR_CURRENT_AMPS: &str = "Current Amps";
pub const ATTR_UPTIME: &str = "Uptime";
pub const ATTR_LAST_POLL: &str = "Last Poll";
pub const ATTR_ICON: &str = "icon";

/// The entities exposed for every device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
	Battery,
	Charging,
	Connectivity,
}

impl EntityKind {
	pub const ALL: [EntityKind; 3] = [
		EntityKind::Battery,
		EntityKind::Charging,
		EntityKind::Connectivity,
	];

	pub fn object_id(&self) -> &'static str {
		match self {
			EntityKind::Battery => "battery",
			EntityKind::Charging => "charging",
			EntityKind::Connectivity => "connectivity",
		}
	}

	pub fn component(&self) -> &'static str {
		match self {
			EntityKind::Battery => "sensor",
			EntityKind::Charging | EntityKind::Connectivity => "binary_sensor",
		}
	}

	pub fn device_class(&self) -> &'static str {
		match self {
			EntityKind::Battery => "battery",
			EntityKind::Charging => "battery_charging",
			EntityKind::Connectivity => "connectivity",
		}
	}

	pub fn default_icon(&self) -> &'static str {
		match self {
			EntityKind::Battery => "mdi:battery",
			EntityKind::Charging => ChargeSpeed::NotCharging.icon(),
			EntityKind::Connectivity => "mdi:lan-connect",
		}
	}

	pub fn entity_name(&self, device_name: &str) -> String {
		match self {
			EntityKind::Battery => device_name.to_string(),
			EntityKind::Charging => format!("{device_name} Charging"),
			EntityKind::Connectivity => format!("{device_name} Connectivity"),
		}
	}
}

/// What an entity currently shows: its state, icon and attributes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntityState {
	pub state: String,
	pub icon: &'static str,
	pub attributes: Map<String, Value>,
}

impl EntityState {
	/// Attributes with the icon folded in, as published alongside the state.
	pub fn attributes_payload(&self) -> serde_json::Result<Vec<u8>> {
		let mut attributes = self.attributes.clone();
		attributes.insert(ATTR_ICON.into(), self.icon.into());
		serde_json::to_vec(&attributes)
	}
}

fn binary_state(on: bool) -> String {
	let payload = if on { PAYLOAD_ON } else { PAYLOAD_OFF };
	payload.to_string()
}

/// Battery gauge. `level` is the value resolved by the battery state holder.
pub fn battery_state(level: u8, info: &LatestInfo) -> EntityState {
	let mut attributes = Map::new();
	attributes.insert(ATTR_OVERRIDDEN_SOC.into(), level.into());
	attributes.insert(ATTR_TOTAL_VOLTAGE.into(), info.total_voltage.into());

	if let Some(bms_soc) = info.bms_soc {
		attributes.insert(ATTR_BMS_SOC.into(), bms_soc.into());
	}
	if let Some(used) = info.used_charge_mah {
		attributes.insert(ATTR_USED_CHARGE.into(), used.into());
	}
	if let Some(regenerated) = info.regenerated_charge_mah {
		attributes.insert(ATTR_REGENERATED_CHARGE.into(), regenerated.into());
	}
	if let Some(cells) = &info.cell_voltages {
		attributes.insert(ATTR_CELL_VOLTAGE.into(), table_value(cells.iter()));
	}
	if let Some(temperatures) = &info.temperatures {
		attributes.insert(ATTR_BATTERY_TEMP.into(), table_value(temperatures.iter()));
	}

	EntityState {
		state: level.to_string(),
		icon: battery_icon(level.into()),
		attributes,
	}
}

/// Charging binary sensor. A disconnected device is never shown as charging,
/// whatever current it last reported.
pub fn charging_state(info: &LatestInfo, connectivity: Connectivity) -> EntityState {
	let amps = if connectivity.is_connected() {
		info.current_amps
	} else {
		0.0
	};
	let speed = ChargeSpeed::from_amps(amps);

	let mut attributes = Map::new();
	attributes.insert(ATTR_CHARGE_SPEED.into(), speed.label().into());
	attributes.insert(ATTR_CURRENT_AMPS.into(), amps.into());

	EntityState {
		state: binary_state(amps < 0.0),
		icon: speed.icon(),
		attributes,
	}
}

pub fn connectivity_state(
	info: &LatestInfo,
	connectivity: Connectivity,
	last_poll: Option<&str>,
) -> EntityState {
	let mut attributes = Map::new();
	attributes.insert(ATTR_UPTIME.into(), info.uptime.as_str().into());
	if let Some(last_poll) = last_poll {
		attributes.insert(ATTR_LAST_POLL.into(), last_poll.into());
	}

	let connected = connectivity.is_connected();
	EntityState {
		state: binary_state(connected),
		icon: if connected {
			"mdi:lan-connect"
		} else {
			"mdi:lan-disconnect"
		},
		attributes,
	}
}

// Relies on serde_json's preserve_order so "Cell 10" stays after "Cell 9".
fn table_value<'a>(readings: impl Iterator<Item = (&'a str, &'a str)>) -> Value {
	Value::Object(
		readings
			.map(|(key, value)| (key.to_string(), Value::from(value)))
			.collect(),
	)
}
