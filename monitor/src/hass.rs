//! Home Assistant MQTT discovery documents and topic layout.

use crate::{entities::EntityKind, session::Snapshot, util::slugify};
use serde::Serialize;

pub const PAYLOAD_ON: &str = "ON";
pub const PAYLOAD_OFF: &str = "OFF";
pub const PAYLOAD_AVAILABLE: &str = "online";
pub const PAYLOAD_NOT_AVAILABLE: &str = "offline";

/// Topic layout for one device.
#[derive(Clone, Debug)]
pub struct Topics {
	base_topic: String,
	discovery_prefix: String,
	slug: String,
}

impl Topics {
	pub fn new(base_topic: &str, discovery_prefix: &str, device_name: &str) -> Self {
		Self {
			base_topic: base_topic.trim_end_matches('/').to_string(),
			discovery_prefix: discovery_prefix.trim_end_matches('/').to_string(),
			slug: slugify(device_name),
		}
	}

	pub fn slug(&self) -> &str {
		&self.slug
	}

	/// Stable identifier of an entity, also the key its state is persisted
	/// under.
	pub fn unique_id(&self, kind: EntityKind) -> String {
		format!("{}_{}", self.slug, kind.object_id())
	}

	pub fn state_topic(&self, kind: EntityKind) -> String {
		format!("{}/{}/{}/state", self.base_topic, self.slug, kind.object_id())
	}

	pub fn attributes_topic(&self, kind: EntityKind) -> String {
		format!(
			"{}/{}/{}/attributes",
			self.base_topic,
			self.slug,
			kind.object_id()
		)
	}

	pub fn availability_topic(&self) -> String {
		format!("{}/{}/availability", self.base_topic, self.slug)
	}

	pub fn config_topic(&self, kind: EntityKind) -> String {
		format!(
			"{}/{}/{}/config",
			self.discovery_prefix,
			kind.component(),
			self.unique_id(kind)
		)
	}
}

#[derive(Debug, Serialize)]
pub struct Device<'a> {
	identifiers: [&'a str; 1],
	manufacturer: &'a str,
	model: &'a str,
	name: &'a str,
}

/// Discovery document for a single entity.
#[derive(Debug, Serialize)]
pub struct DiscoveryConfig<'a> {
	name: String,
	unique_id: String,
	object_id: String,
	device: Device<'a>,
	state_topic: String,
	json_attributes_topic: String,
	availability_topic: String,
	icon: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	device_class: Option<&'static str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	state_class: Option<&'static str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	unit_of_measurement: Option<&'static str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	payload_on: Option<&'static str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	payload_off: Option<&'static str>,
}

impl<'a> DiscoveryConfig<'a> {
	pub fn new(topics: &'a Topics, device_name: &'a str, kind: EntityKind) -> Self {
		let binary = kind.component() == "binary_sensor";
		let (state_class, unit_of_measurement) = match kind {
			EntityKind::Battery => (Some("measurement"), Some("%")),
			_ => (None, None),
		};

		Self {
			name: kind.entity_name(device_name),
			unique_id: topics.unique_id(kind),
			object_id: topics.unique_id(kind),
			device: Device {
				identifiers: [topics.slug()],
				manufacturer: "Owie",
				model: "Onewheel BMS",
				name: device_name,
			},
			state_topic: topics.state_topic(kind),
			json_attributes_topic: topics.attributes_topic(kind),
			availability_topic: topics.availability_topic(),
			icon: kind.default_icon(),
			device_class: Some(kind.device_class()),
			state_class,
			unit_of_measurement,
			payload_on: binary.then_some(PAYLOAD_ON),
			payload_off: binary.then_some(PAYLOAD_OFF),
		}
	}

	/// Discovery documents for every entity of the device, keyed by the
	/// topic they are published to.
	pub fn all(topics: &Topics, device_name: &str) -> serde_json::Result<Vec<(String, Vec<u8>)>> {
		EntityKind::ALL
			.iter()
			.map(|&kind| -> serde_json::Result<(String, Vec<u8>)> {
				let document = serde_json::to_vec(&DiscoveryConfig::new(topics, device_name, kind))?;
				Ok((topics.config_topic(kind), document))
			})
			.collect()
	}
}

/// State and attribute messages for every entity in `snapshot`.
pub fn state_messages(
	topics: &Topics,
	snapshot: &Snapshot,
) -> serde_json::Result<Vec<(String, Vec<u8>)>> {
	let mut messages = Vec::with_capacity(snapshot.entities().len() * 2);
	for (kind, entity) in snapshot.entities() {
		messages.push((topics.state_topic(kind), entity.state.clone().into_bytes()));
		messages.push((topics.attributes_topic(kind), entity.attributes_payload()?));
	}
	Ok(messages)
}
