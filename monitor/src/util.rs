use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Lowercase identifier safe for MQTT topics and entity ids.
///
/// Runs of anything other than ASCII letters and digits collapse into a
/// single underscore.
pub fn slugify(name: &str) -> String {
	let mut slug = String::with_capacity(name.len());
	for c in name.chars() {
		if c.is_ascii_alphanumeric() {
			slug.push(c.to_ascii_lowercase());
		} else if !slug.is_empty() && !slug.ends_with('_') {
			slug.push('_');
		}
	}
	while slug.ends_with('_') {
		slug.pop();
	}
	slug
}

#[inline]
pub fn timestamp_rfc3339(dt: OffsetDateTime) -> Option<String> {
	dt.format(&Rfc3339).ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_slugify() {
		assert_eq!(slugify("Onewheel Battery Owie"), "onewheel_battery_owie");
		assert_eq!(slugify("  XR #2 -- garage "), "xr_2_garage");
		assert_eq!(slugify("owie"), "owie");
	}

	#[test]
	fn test_timestamp() {
		let dt = OffsetDateTime::from_unix_timestamp(0).unwrap();
		assert_eq!(timestamp_rfc3339(dt).as_deref(), Some("1970-01-01T00:00:00Z"));
	}
}
