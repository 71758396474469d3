use crate::{TableReadings, OFFLINE_UPTIME};
use serde::{Deserialize, Serialize};
use std::{fmt, num::ParseFloatError};
use thiserror::Error;

/// Unit suffixes the firmware appends to numeric values, in the order they
/// are removed.
pub const UNIT_SUFFIXES: [&str; 4] = ["v", " Amps", "%", " mAh"];

/// Status payload served by the device's `/autoupdate` endpoint.
///
/// Every value arrives as a display string, units and all.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RawStatus {
	/// Pack voltage, e.g. `"58.12v"`.
	#[serde(rename = "TOTAL_VOLTAGE")]
	pub total_voltage: String,
	/// Pack current, e.g. `"-1.20 Amps"`. Negative while charging.
	#[serde(rename = "CURRENT_AMPS")]
	pub current_amps: String,
	/// State of charge as computed by the device, e.g. `"87%"`.
	#[serde(rename = "OVERRIDDEN_SOC")]
	pub overridden_soc: String,
	/// Time since the device booted.
	#[serde(rename = "UPTIME")]
	pub uptime: String,
	/// State of charge as reported by the BMS itself.
	#[serde(rename = "BMS_SOC", default)]
	pub bms_soc: Option<String>,
	#[serde(rename = "USED_CHARGE_MAH", default)]
	pub used_charge_mah: Option<String>,
	#[serde(rename = "REGENERATED_CHARGE_MAH", default)]
	pub regenerated_charge_mah: Option<String>,
	#[serde(rename = "CELL_VOLTAGE_TABLE", default)]
	pub cell_voltage_table: Option<String>,
	#[serde(rename = "TEMPERATURE_TABLE", default)]
	pub temperature_table: Option<String>,
}

/// Removes the firmware's unit suffixes from both ends of `value`.
///
/// Each suffix is removed at most once per end, so a sanitized value passes
/// through unchanged.
pub fn strip_units(value: &str) -> &str {
	UNIT_SUFFIXES
		.iter()
		.fold(value.trim(), |value, unit| {
			let value = value.strip_prefix(unit).unwrap_or(value);
			value.strip_suffix(unit).unwrap_or(value)
		})
		.trim()
}

/// A numeric field that is not a number once its units are removed.
#[derive(Debug, Error)]
#[error("field {field} has non-numeric value '{value}': {source}")]
pub struct PayloadError {
	field: &'static str,
	value: String,
	source: ParseFloatError,
}

fn number(field: &'static str, raw: &str) -> Result<f64, PayloadError> {
	let value = strip_units(raw);
	value.parse().map_err(|source| PayloadError {
		field,
		value: value.to_string(),
		source,
	})
}

/// Negative percentages mean "unknown"; anything above 100 is clamped.
fn percent(field: &'static str, raw: &str) -> Result<Option<u8>, PayloadError> {
	let value = number(field, raw)?;
	if value.is_nan() || value < 0.0 {
		Ok(None)
	} else {
		Ok(Some(value.round().min(100.0) as u8))
	}
}

impl RawStatus {
	/// Strips units from the numeric fields and parses the embedded tables.
	///
	/// A numeric field that does not parse fails the whole payload; a
	/// partially populated [`LatestInfo`] is never produced.
	pub fn sanitize(&self) -> Result<LatestInfo, PayloadError> {
		Ok(LatestInfo {
			total_voltage: number("TOTAL_VOLTAGE", &self.total_voltage)?,
			current_amps: number("CURRENT_AMPS", &self.current_amps)?,
			overridden_soc: percent("OVERRIDDEN_SOC", &self.overridden_soc)?,
			bms_soc: self
				.bms_soc
				.as_deref()
				.map(|raw| percent("BMS_SOC", raw))
				.transpose()?
				.flatten(),
			used_charge_mah: self
				.used_charge_mah
				.as_deref()
				.map(|raw| number("USED_CHARGE_MAH", raw))
				.transpose()?,
			regenerated_charge_mah: self
				.regenerated_charge_mah
				.as_deref()
				.map(|raw| number("REGENERATED_CHARGE_MAH", raw))
				.transpose()?,
			uptime: Uptime::from(self.uptime.trim()),
			cell_voltages: self
				.cell_voltage_table
				.as_deref()
				.map(TableReadings::cell_voltages),
			temperatures: self
				.temperature_table
				.as_deref()
				.map(TableReadings::temperatures),
		})
	}
}

/// The device's uptime counter, or the offline sentinel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Uptime {
	#[default]
	Offline,
	Reported(String),
}

impl Uptime {
	pub fn as_str(&self) -> &str {
		match self {
			Uptime::Offline => OFFLINE_UPTIME,
			Uptime::Reported(value) => value,
		}
	}

	pub fn is_offline(&self) -> bool {
		matches!(self, Uptime::Offline)
	}
}

impl From<&str> for Uptime {
	fn from(value: &str) -> Self {
		if value == OFFLINE_UPTIME {
			Uptime::Offline
		} else {
			Uptime::Reported(value.to_string())
		}
	}
}

impl fmt::Display for Uptime {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Serialize for Uptime {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

/// The most recent sanitized reading from the device.
///
/// Replaced wholesale after every successful poll.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LatestInfo {
	/// Pack voltage in Volts.
	pub total_voltage: f64,
	/// Pack current in Amps. Negative while charging.
	pub current_amps: f64,
	/// State of charge in percent, `None` when the device doesn't know.
	pub overridden_soc: Option<u8>,
	pub bms_soc: Option<u8>,
	/// Charge used since boot in milliamp hours.
	pub used_charge_mah: Option<f64>,
	/// Charge regenerated since boot in milliamp hours.
	pub regenerated_charge_mah: Option<f64>,
	pub uptime: Uptime,
	pub cell_voltages: Option<TableReadings>,
	pub temperatures: Option<TableReadings>,
}

impl Default for LatestInfo {
	fn default() -> Self {
		Self {
			total_voltage: 0.0,
			current_amps: 0.0,
			overridden_soc: None,
			bms_soc: None,
			used_charge_mah: None,
			regenerated_charge_mah: None,
			uptime: Uptime::Offline,
			cell_voltages: None,
			temperatures: None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const PAYLOAD: &str = r#"{
		"TOTAL_VOLTAGE": "58.12v",
		"CURRENT_AMPS": "-3.2 Amps",
		"BMS_SOC": "85%",
		"OVERRIDDEN_SOC": "87%",
		"USED_CHARGE_MAH": "120 mAh",
		"REGENERATED_CHARGE_MAH": "30 mAh",
		"UPTIME": "00:12:34",
		"CELL_VOLTAGE_TABLE": "<tr><td>3.91</td><td>3.92</td></tr>",
		"TEMPERATURE_TABLE": "<tr><td>21</td><td>22</td><td>23</td><td>24</td><td>25</td></tr>"
	}"#;

	fn sanitized_payload() -> RawStatus {
		RawStatus {
			total_voltage: "58.12".into(),
			current_amps: "-3.2".into(),
			overridden_soc: "87".into(),
			uptime: "00:12:34".into(),
			bms_soc: Some("85".into()),
			used_charge_mah: Some("120".into()),
			regenerated_charge_mah: Some("30".into()),
			cell_voltage_table: Some("<tr><td>3.91</td><td>3.92</td></tr>".into()),
			temperature_table: Some(
				"<tr><td>21</td><td>22</td><td>23</td><td>24</td><td>25</td></tr>".into(),
			),
		}
	}

	#[test]
	fn test_strip_units() {
		assert_eq!(strip_units("87%"), "87");
		assert_eq!(strip_units("-3.2 Amps"), "-3.2");
		assert_eq!(strip_units("58.12v"), "58.12");
		assert_eq!(strip_units("120 mAh"), "120");
	}

	#[test]
	fn test_strip_units_is_idempotent() {
		for value in ["87", "-3.2", "58.12", "120", "0"] {
			assert_eq!(strip_units(value), value);
			assert_eq!(strip_units(strip_units(value)), value);
		}
	}

	#[test]
	fn test_sanitize() {
		let raw: RawStatus = serde_json::from_str(PAYLOAD).unwrap();
		let info = raw.sanitize().unwrap();

		assert_eq!(info.total_voltage, 58.12);
		assert_eq!(info.current_amps, -3.2);
		assert_eq!(info.overridden_soc, Some(87));
		assert_eq!(info.bms_soc, Some(85));
		assert_eq!(info.used_charge_mah, Some(120.0));
		assert_eq!(info.regenerated_charge_mah, Some(30.0));
		assert_eq!(info.uptime, Uptime::Reported("00:12:34".into()));
		assert_eq!(info.cell_voltages.as_ref().map(|t| t.len()), Some(2));
		assert_eq!(
			info.temperatures.as_ref().and_then(|t| t.get("Temp 5")),
			Some("25")
		);
	}

	#[test]
	fn test_sanitize_is_deterministic_and_idempotent() {
		let raw: RawStatus = serde_json::from_str(PAYLOAD).unwrap();
		assert_eq!(raw.sanitize().unwrap(), raw.sanitize().unwrap());
		assert_eq!(
			raw.sanitize().unwrap(),
			sanitized_payload().sanitize().unwrap()
		);
	}

	#[test]
	fn test_optional_fields_may_be_absent() {
		let raw: RawStatus = serde_json::from_str(
			r#"{"TOTAL_VOLTAGE":"50.0v","CURRENT_AMPS":"0.00 Amps","OVERRIDDEN_SOC":"40%","UPTIME":"00:00:05"}"#,
		)
		.unwrap();
		let info = raw.sanitize().unwrap();
		assert_eq!(info.bms_soc, None);
		assert_eq!(info.cell_voltages, None);
		assert_eq!(info.temperatures, None);
	}

	#[test]
	fn test_missing_required_field_fails_decode() {
		let result: Result<RawStatus, _> =
			serde_json::from_str(r#"{"TOTAL_VOLTAGE":"50.0v","CURRENT_AMPS":"0 Amps"}"#);
		assert!(result.is_err());
	}

	#[test]
	fn test_garbage_number_fails_whole_payload() {
		let mut raw = sanitized_payload();
		raw.current_amps = "lots".into();
		let error = raw.sanitize().unwrap_err();
		assert!(error.to_string().contains("CURRENT_AMPS"));
	}

	#[test]
	fn test_percent_bounds() {
		let mut raw = sanitized_payload();
		raw.overridden_soc = "-1%".into();
		assert_eq!(raw.sanitize().unwrap().overridden_soc, None);

		raw.overridden_soc = "0%".into();
		assert_eq!(raw.sanitize().unwrap().overridden_soc, Some(0));

		raw.overridden_soc = "104%".into();
		assert_eq!(raw.sanitize().unwrap().overridden_soc, Some(100));
	}

	#[test]
	fn test_default_is_offline() {
		let info = LatestInfo::default();
		assert!(info.uptime.is_offline());
		assert_eq!(info.overridden_soc, None);
		assert_eq!(info.uptime.to_string(), "Offline");
	}
}
