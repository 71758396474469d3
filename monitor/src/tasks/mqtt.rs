use owie_monitor::{
	config::MqttConfig,
	hass::{Topics, PAYLOAD_AVAILABLE, PAYLOAD_NOT_AVAILABLE},
};
use rumqttc::{AsyncClient, Event, EventLoop, Incoming, LastWill, MqttOptions, QoS};
use std::time::Duration;
use tokio::sync::watch;

/// Requests the client may queue while the broker is unreachable.
const REQUEST_CHANNEL_CAPACITY: usize = 64;

pub fn create_client(config: &MqttConfig, topics: &Topics) -> (AsyncClient, EventLoop) {
	let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
	options.set_keep_alive(Duration::from_secs(30));
	options.set_last_will(LastWill::new(
		topics.availability_topic(),
		PAYLOAD_NOT_AVAILABLE,
		QoS::AtLeastOnce,
		true,
	));
	if let (Some(username), Some(password)) = (&config.username, &config.password) {
		options.set_credentials(username, password);
	}

	AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY)
}

/// Publishes retained, without waiting on the event loop. A full request
/// queue drops the message; the next poll publishes fresh state anyway.
pub fn publish_all(client: &AsyncClient, messages: Vec<(String, Vec<u8>)>) {
	for (topic, payload) in messages {
		if let Err(error) = client.try_publish(&topic, QoS::AtLeastOnce, true, payload) {
			tracing::warn!("dropping message for '{topic}': {error:?}");
		}
	}
}

/// Drives the MQTT event loop until shutdown.
///
/// Discovery documents and availability are (re)published on every
/// connection, so a restarted broker or Home Assistant picks them up.
pub async fn start_task(
	client: AsyncClient,
	mut event_loop: EventLoop,
	topics: Topics,
	discovery: Vec<(String, Vec<u8>)>,
	mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
	let mut should_shutdown = false;

	loop {
		tokio::select! {
			event = event_loop.poll() => {
				match event {
					Ok(Event::Incoming(Incoming::ConnAck(_))) => {
						tracing::info!("connected to mqtt broker, publishing discovery documents");
						publish_all(&client, discovery.clone());
						publish_all(
							&client,
							vec![(topics.availability_topic(), PAYLOAD_AVAILABLE.into())],
						);
					}
					Ok(event) => {
						tracing::trace!("mqtt event: {event:?}");
					}
					Err(error) => {
						if should_shutdown {
							break;
						}
						tracing::error!("mqtt error: {error:?}");
						tokio::time::sleep(Duration::from_secs(1)).await;
					}
				}
			}
			_ = shutdown.changed(), if !should_shutdown => {
				tracing::info!("shutting down mqtt task");
				publish_all(
					&client,
					vec![(topics.availability_topic(), PAYLOAD_NOT_AVAILABLE.into())],
				);
				// Awaiting room in a full request queue would block forever,
				// since only this task drains it.
				if let Err(error) = client.try_disconnect() {
					tracing::warn!("request queue full, dropping connection: {error:?}");
					break;
				}
				should_shutdown = true;
			}
		}
	}
	Ok(())
}
