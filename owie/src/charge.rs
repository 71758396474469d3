use serde::Serialize;
use std::fmt;

/// Charger class inferred from the pack current.
///
/// Bands are half-open: a current sitting exactly on a boundary belongs to
/// the faster charger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ChargeSpeed {
	NotCharging,
	Balance,
	PintCharger,
	XrOrPintUltracharger,
	XrHypercharger,
	UnknownCharger,
}

impl ChargeSpeed {
	pub fn from_amps(amps: f64) -> Self {
		if amps >= 0.0 {
			ChargeSpeed::NotCharging
		} else if amps > -1.0 {
			ChargeSpeed::Balance
		} else if amps > -2.0 {
			ChargeSpeed::PintCharger
		} else if amps > -4.0 {
			ChargeSpeed::XrOrPintUltracharger
		} else if amps > -6.0 {
			ChargeSpeed::XrHypercharger
		} else {
			ChargeSpeed::UnknownCharger
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			ChargeSpeed::NotCharging => "Not Charging",
			ChargeSpeed::Balance => "Balance Charging",
			ChargeSpeed::PintCharger => "Pint Charger",
			ChargeSpeed::XrOrPintUltracharger => "XR / Pint Ultracharger",
			ChargeSpeed::XrHypercharger => "XR Hypercharger",
			ChargeSpeed::UnknownCharger => "Unknown Charger",
		}
	}

	pub fn icon(&self) -> &'static str {
		match self {
			ChargeSpeed::NotCharging => "mdi:power-plug-off-outline",
			ChargeSpeed::Balance => "mdi:scale-balance",
			ChargeSpeed::PintCharger => "mdi:speedometer-slow",
			ChargeSpeed::XrOrPintUltracharger => "mdi:speedometer-medium",
			ChargeSpeed::XrHypercharger => "mdi:speedometer",
			ChargeSpeed::UnknownCharger => "mdi:flash-alert-outline",
		}
	}
}

impl fmt::Display for ChargeSpeed {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// Battery icon for a state of charge, stepped every 10%.
pub fn battery_icon(percent: f64) -> &'static str {
	if percent >= 95.0 {
		"mdi:battery"
	} else if percent >= 90.0 {
		"mdi:battery-90"
	} else if percent >= 80.0 {
		"mdi:battery-80"
	} else if percent >= 70.0 {
		"mdi:battery-70"
	} else if percent >= 60.0 {
		"mdi:battery-60"
	} else if percent >= 50.0 {
		"mdi:battery-50"
	} else if percent >= 40.0 {
		"mdi:battery-40"
	} else if percent >= 30.0 {
		"mdi:battery-30"
	} else if percent >= 20.0 {
		"mdi:battery-20"
	} else if percent >= 10.0 {
		"mdi:battery-10"
	} else if percent >= 0.0 {
		"mdi:battery-outline"
	} else {
		"mdi:battery-unknown"
	}
}
