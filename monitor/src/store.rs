//! Persistence of entity state across restarts.
//!
//! Only the battery level survives a restart; the other entities are
//! derived from live readings.

use std::{
	collections::BTreeMap,
	fs,
	path::{Path, PathBuf},
};

/// Last-known values, keyed by entity unique id.
pub trait StateStore {
	/// The value persisted for `entity` by a previous run, if any.
	fn last_known(&self, entity: &str) -> Option<u8>;

	/// Persists the current value of `entity`.
	fn record(&mut self, entity: &str, value: u8) -> anyhow::Result<()>;
}

/// Stores values as a pretty-printed JSON object on disk.
#[derive(Debug)]
pub struct JsonFileStore {
	path: PathBuf,
	values: BTreeMap<String, u8>,
}

impl JsonFileStore {
	/// Opens the store at `path`. A missing file is an empty store.
	pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
		let path = path.as_ref().to_path_buf();
		let values = if path.exists() {
			let contents = fs::read_to_string(&path)?;
			let values: BTreeMap<String, u8> = serde_json::from_str(&contents)?;
			tracing::debug!("loaded {} persisted values from {}", values.len(), path.display());
			values
		} else {
			tracing::info!("no state file at {}, starting without history", path.display());
			BTreeMap::new()
		};

		Ok(Self { path, values })
	}

	fn save(&self) -> anyhow::Result<()> {
		let contents = serde_json::to_string_pretty(&self.values)?;
		fs::write(&self.path, contents)?;
		Ok(())
	}
}

impl StateStore for JsonFileStore {
	fn last_known(&self, entity: &str) -> Option<u8> {
		self.values.get(entity).copied()
	}

	fn record(&mut self, entity: &str, value: u8) -> anyhow::Result<()> {
		if self.values.get(entity) == Some(&value) {
			return Ok(());
		}
		self.values.insert(entity.to_string(), value);
		self.save()?;
		tracing::trace!("persisted {entity} = {value}");
		Ok(())
	}
}

#[derive(Debug, Default)]
pub struct MemoryStore {
	values: BTreeMap<String, u8>,
}

impl StateStore for MemoryStore {
	fn last_known(&self, entity: &str) -> Option<u8> {
		self.values.get(entity).copied()
	}

	fn record(&mut self, entity: &str, value: u8) -> anyhow::Result<()> {
		self.values.insert(entity.to_string(), value);
		Ok(())
	}
}
