use crate::RawStatus;
use bytes::{Buf, Bytes};
use reqwest::{
	header::{HeaderMap, HeaderValue, ACCEPT},
	ClientBuilder, IntoUrl,
};
use std::{net::IpAddr, time::Duration};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
	/// The device did not answer within the timeout, or refused the
	/// connection. Usually it is switched off.
	#[error("device unreachable: {0}")]
	Unreachable(#[source] reqwest::Error),

	/// The device answered with a non-success status.
	#[error("device responded with status {status}: {body}")]
	ServerError { status: u16, body: String },

	/// The device answered, but not with a usable status payload.
	#[error("could not decode status payload: {0}")]
	Decode(#[from] serde_json::Error),
}

/// Returns the status endpoint for the device at `ip`.
pub fn device_endpoint(ip: IpAddr) -> Result<Url, url::ParseError> {
	match ip {
		IpAddr::V4(ip) => Url::parse(&format!("http://{ip}/autoupdate")),
		IpAddr::V6(ip) => Url::parse(&format!("http://[{ip}]/autoupdate")),
	}
}

#[derive(Debug)]
pub struct Client {
	client: reqwest::Client,
	endpoint: Url,
}

impl Client {
	/// Creates a new client for a device status endpoint.
	///
	/// # Arguments
	/// * `endpoint` - The URL of the device's `/autoupdate` endpoint.
	/// * `timeout` - Upper bound on a whole request, body included.
	///
	/// # Errors
	/// Returns an error if the URL is invalid, or the HTTP client cannot be
	/// constructed.
	///
	pub fn new(endpoint: impl IntoUrl, timeout: Duration) -> Result<Self, reqwest::Error> {
		let endpoint = endpoint.into_url()?;

		let mut default_headers = HeaderMap::new();
		default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

		// Build the HTTP client. This will be reused for every poll.
		//
		let client = ClientBuilder::new()
			.default_headers(default_headers)
			.timeout(timeout)
			.build()?;

		Ok(Self { client, endpoint })
	}

	/// Requests the device's current status once. There are no retries;
	/// the next scheduled poll is the retry.
	pub async fn fetch(&self) -> Result<RawStatus, FetchError> {
		let response = self
			.client
			.get(self.endpoint.clone())
			.send()
			.await
			.map_err(FetchError::Unreachable)?;

		let status = response.status();
		if !status.is_success() {
			tracing::debug!("{} responded with {status}", self.endpoint);
			let body = response.text().await.unwrap_or_default();
			return Err(FetchError::ServerError {
				status: status.as_u16(),
				body,
			});
		}

		let body = response.bytes().await.map_err(FetchError::Unreachable)?;
		tracing::trace!("received {} bytes from {}", body.len(), self.endpoint);
		Ok(parse_json_payload(body)?)
	}

	/// Returns the URL of the device's status endpoint.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}
}

fn parse_json_payload<T: serde::de::DeserializeOwned>(body: Bytes) -> serde_json::Result<T> {
	serde_json::from_reader(body.reader())
}
