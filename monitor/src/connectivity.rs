use owie::Uptime;

/// Whether the device is considered reachable, derived from its uptime
/// counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connectivity {
	/// No uptime has been reported yet.
	NeverConnected,
	/// The uptime counter advanced on the latest poll.
	Connected,
	/// The uptime counter stalled, but for fewer polls than tolerated.
	StaleTolerated,
	/// The counter stalled for too long, or the device went offline after
	/// having been connected.
	Disconnected,
}

impl Connectivity {
	pub fn is_connected(&self) -> bool {
		matches!(self, Connectivity::Connected | Connectivity::StaleTolerated)
	}
}

/// Tracks the device's uptime across polls and debounces stalls.
///
/// `missed_count` stays within `0..=max_missed`.
#[derive(Debug)]
pub struct ConnectivityTracker {
	previous_uptime: Option<String>,
	missed_count: u32,
	max_missed: u32,
	state: Connectivity,
}

impl ConnectivityTracker {
	pub fn new(max_missed: u32) -> Self {
		Self {
			previous_uptime: None,
			missed_count: 0,
			max_missed: max_missed.max(1),
			state: Connectivity::NeverConnected,
		}
	}

	/// Feeds the uptime from the latest cached reading. Call once per poll.
	pub fn observe(&mut self, uptime: &Uptime) -> Connectivity {
		self.state = match uptime {
			Uptime::Offline => {
				self.missed_count = 0;
				self.previous_uptime = None;
				match self.state {
					Connectivity::NeverConnected => Connectivity::NeverConnected,
					_ => Connectivity::Disconnected,
				}
			}
			Uptime::Reported(value) if self.previous_uptime.as_deref() != Some(value.as_str()) => {
				self.missed_count = 0;
				self.previous_uptime = Some(value.clone());
				Connectivity::Connected
			}
			Uptime::Reported(value) => {
				self.missed_count = (self.missed_count + 1).min(self.max_missed);
				if self.missed_count < self.max_missed {
					tracing::debug!(
						"uptime stalled at '{value}', missed {}/{}",
						self.missed_count,
						self.max_missed
					);
					Connectivity::StaleTolerated
				} else {
					if self.state != Connectivity::Disconnected {
						tracing::info!("uptime stalled at '{value}' for {} polls, marking device disconnected", self.missed_count);
					}
					Connectivity::Disconnected
				}
			}
		};
		self.state
	}

	pub fn state(&self) -> Connectivity {
		self.state
	}

	pub fn is_connected(&self) -> bool {
		self.state.is_connected()
	}

	pub fn missed_count(&self) -> u32 {
		self.missed_count
	}
}
