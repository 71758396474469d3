use regex::Regex;
use serde::{ser::SerializeMap, Serialize, Serializer};
use std::sync::OnceLock;

/// Number of cells reported in the cell voltage table.
pub const CELL_COUNT: usize = 15;

/// Number of probes reported in the temperature table.
pub const TEMPERATURE_COUNT: usize = 5;

/// Ordered key/value readings extracted from one of the device's embedded
/// HTML tables.
///
/// Keys keep the order of the table cells, so "Cell 10" follows "Cell 9"
/// rather than "Cell 1".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableReadings(Vec<(String, String)>);

impl TableReadings {
	/// Parses the cell voltage table into `Cell 1` ..= `Cell 15`.
	pub fn cell_voltages(markup: &str) -> Self {
		Self::parse(markup, "Cell", CELL_COUNT)
	}

	/// Parses the temperature table into `Temp 1` ..= `Temp 5`.
	pub fn temperatures(markup: &str) -> Self {
		Self::parse(markup, "Temp", TEMPERATURE_COUNT)
	}

	/// Zips the values of the first non-empty table row against the keys
	/// `"{prefix} 1"` ..= `"{prefix} {count}"`.
	///
	/// Surplus values are dropped. When the row is short the trailing keys
	/// are simply absent.
	pub fn parse(markup: &str, prefix: &str, count: usize) -> Self {
		let values = first_row_values(markup);
		let readings = (1..=count)
			.map(|index| format!("{prefix} {index}"))
			.zip(values)
			.collect();
		Self(readings)
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.0
			.iter()
			.find(|(k, _)| k == key)
			.map(|(_, value)| value.as_str())
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}

impl Serialize for TableReadings {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(self.0.len()))?;
		for (key, value) in &self.0 {
			map.serialize_entry(key, value)?;
		}
		map.end()
	}
}

fn row_re() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").expect("row pattern is valid"))
}

fn cell_re() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| {
		Regex::new(r"(?is)<t[dh][^>]*>(.*?)</t[dh]>").expect("cell pattern is valid")
	})
}

fn tag_re() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

/// Text of every cell in a row, trimmed, with nested markup removed.
fn row_values(row: &str) -> Vec<String> {
	cell_re()
		.captures_iter(row)
		.filter_map(|captures| captures.get(1))
		.map(|cell| tag_re().replace_all(cell.as_str(), "").trim().to_string())
		.collect()
}

fn first_row_values(markup: &str) -> Vec<String> {
	let mut rows = row_re()
		.captures_iter(markup)
		.filter_map(|captures| captures.get(1))
		.map(|row| row_values(row.as_str()))
		.peekable();

	// The firmware has sent bare cells without a surrounding row.
	if rows.peek().is_none() {
		return row_values(markup);
	}

	rows.find(|values| values.iter().any(|value| !value.is_empty()))
		.unwrap_or_default()
}
