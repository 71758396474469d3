mod tasks;

use clap::Parser;
use owie::{device_endpoint, Client};
use owie_monitor::{
	config::load_config,
	entities::EntityKind,
	hass::{state_messages, DiscoveryConfig, Topics},
	session::DeviceSession,
	store::{JsonFileStore, StateStore},
};
use std::path::PathBuf;
use tokio::{
	sync::watch,
	time::{interval, MissedTickBehavior},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
pub struct Arguments {
	#[clap(env = "OWIE_CONFIG_PATH")]
	config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();

	let arguments = Arguments::parse();
	let (shutdown_tx, shutdown_rx) = watch::channel(false);

	// Read the configuration file
	let config = load_config(arguments.config)?;
	let owie = &config.owie;

	let topics = Topics::new(
		&config.mqtt.base_topic,
		&config.mqtt.discovery_prefix,
		&owie.name,
	);
	let battery_id = topics.unique_id(EntityKind::Battery);

	// Restore what the previous run knew about the battery.
	let mut store = JsonFileStore::open(&config.state_file)?;
	let mut session = DeviceSession::new(
		owie.name.as_str(),
		owie.max_missed_packets,
		store.last_known(&battery_id),
	);

	let client = Client::new(device_endpoint(owie.ip)?, owie.timeout())?;
	tracing::info!(
		"polling '{}' at {} every {}s",
		owie.name,
		client.endpoint(),
		owie.scan_interval
	);

	// Spawn a task to drive the MQTT connection
	//
	let discovery = DiscoveryConfig::all(&topics, &owie.name)?;
	let (mqtt_client, event_loop) = tasks::mqtt::create_client(&config.mqtt, &topics);
	let mqtt_task = tokio::spawn(tasks::mqtt::start_task(
		mqtt_client.clone(),
		event_loop,
		topics.clone(),
		discovery,
		shutdown_rx,
	));

	let mut ticker = interval(owie.scan_interval());
	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

	loop {
		tokio::select! {
			_ = ticker.tick() => {
				let snapshot = session.tick(&client).await;
				tasks::mqtt::publish_all(&mqtt_client, state_messages(&topics, &snapshot)?);

				if let Err(error) = snapshot.persist(&mut store, &battery_id) {
					tracing::error!("failed to persist battery level: {error:?}");
				}
			}
			_ = tokio::signal::ctrl_c() => {
				tracing::debug!("received ctrl-c, closing");
				shutdown_tx.send(true)?;
				break
			},
		}
	}

	mqtt_task.await??;

	Ok(())
}
