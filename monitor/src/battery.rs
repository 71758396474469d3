/// Holds the battery level shown to consumers, so it never regresses to
/// "unknown" once a value has been seen or restored.
#[derive(Debug, Default)]
pub struct BatteryLevel {
	/// Last value handed out, restored or live.
	held: Option<u8>,
	/// Value persisted by a previous run, waiting to be adopted.
	pending_restore: Option<u8>,
	live_seen: bool,
}

impl BatteryLevel {
	pub fn new(restored: Option<u8>) -> Self {
		Self {
			held: None,
			pending_restore: restored,
			live_seen: false,
		}
	}

	/// Resolves the level to report, given the device's current reading.
	///
	/// A restored value is adopted on the first read if no live value has
	/// been seen, and then discarded. Afterwards live values win, an unknown
	/// reading keeps the held value, and with no history at all the level is
	/// 0.
	pub fn current_value(&mut self, live: Option<u8>) -> u8 {
		if !self.live_seen {
			if let Some(restored) = self.pending_restore.take() {
				tracing::debug!("adopting restored battery level {restored}%");
				self.held = Some(restored);
				return restored;
			}
		}

		match (live, self.held) {
			(Some(value), _) => {
				self.live_seen = true;
				self.held = Some(value);
				value
			}
			(None, Some(held)) => held,
			(None, None) => 0,
		}
	}

	/// The last value reported, if any.
	pub fn held(&self) -> Option<u8> {
		self.held
	}
}
