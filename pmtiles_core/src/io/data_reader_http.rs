//! This module provides functionality for reading byte ranges from HTTP(S) endpoints.
//!
//! # Overview
//!
//! `DataReaderHttp` issues `Range` requests with `reqwest` and reports the strong ETag of every
//! response. Weak ETags (`W/"..."`) identify content only loosely and are ignored.
//!
//! When a caller expects a specific ETag and the server answers with another one, or answers
//! `416 Range Not Satisfiable`, the archive has changed: the read fails with
//! [`DataReaderError::EtagMismatch`] and the reader switches into "must reload" mode, sending
//! `Cache-Control: no-cache` from then on so intermediate caches cannot serve stale ranges.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pmtiles_core::{io::{DataReaderHttp, DataReaderTrait}, ByteRange};
//! use anyhow::Result;
//! use reqwest::Url;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let url = Url::parse("https://example.com/world.pmtiles")?;
//!     let reader = DataReaderHttp::from_url(url)?;
//!
//!     let response = reader.read_range(&ByteRange::new(0, 127), None).await?;
//!     println!("read {} bytes, etag {:?}", response.blob.len(), response.etag);
//!
//!     Ok(())
//! }
//! ```

use super::{DataReaderError, DataReaderTrait, RangeResponse};
use crate::{Blob, ByteRange};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use reqwest::{
	Client, Response, StatusCode, Url,
	header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE, ETAG, EXPIRES, HeaderMap, HeaderName, HeaderValue, RANGE},
};
use std::{
	collections::HashMap,
	sync::{
		LazyLock,
		atomic::{AtomicBool, Ordering},
	},
	time::Duration,
};
use tokio::time::sleep;

const DEFAULT_MAX_RETRIES: u32 = 3;

/// A struct that provides reading capabilities from an HTTP(S) endpoint.
#[derive(Debug)]
pub struct DataReaderHttp {
	client: Client,
	headers: HeaderMap,
	max_retries: u32,
	must_reload: AtomicBool,
	name: String,
	url: Url,
}

impl DataReaderHttp {
	/// Creates a `DataReaderHttp` from a URL.
	///
	/// # Errors
	/// Fails for schemes other than `http` and `https`.
	pub fn from_url(url: Url) -> Result<DataReaderHttp> {
		match url.scheme() {
			"http" | "https" => (),
			other => bail!("unsupported URL scheme '{other}' in '{url}', expected 'http' or 'https'"),
		}

		let client = Client::builder().tcp_keepalive(Duration::from_secs(600)).build()?;

		Ok(DataReaderHttp {
			client,
			headers: HeaderMap::new(),
			max_retries: DEFAULT_MAX_RETRIES,
			must_reload: AtomicBool::new(false),
			name: url.to_string(),
			url,
		})
	}

	/// Adds custom headers sent with every request.
	pub fn with_headers(mut self, headers: &HashMap<String, String>) -> Result<Self> {
		for (key, value) in headers {
			let name = HeaderName::try_from(key.as_str()).with_context(|| format!("invalid header name '{key}'"))?;
			let value = HeaderValue::try_from(value.as_str()).with_context(|| format!("invalid value for header '{key}'"))?;
			self.headers.insert(name, value);
		}
		Ok(self)
	}

	/// Sets how often a request is retried after connection errors or timeouts.
	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = max_retries;
		self
	}

	/// Returns `true` once the reader has seen the resource change.
	pub fn must_reload(&self) -> bool {
		self.must_reload.load(Ordering::Relaxed)
	}

	async fn send(&self, range: &ByteRange) -> Result<Response> {
		for attempt in 0..=self.max_retries {
			if attempt > 0 {
				let backoff = Duration::from_secs(1 << (attempt - 1));
				log::warn!(
					"retry attempt {attempt}/{} reading {range} from '{}', waiting {backoff:?}",
					self.max_retries,
					self.url
				);
				sleep(backoff).await;
			}

			let mut request = self.client.get(self.url.clone()).headers(self.headers.clone());
			request = request.header(RANGE, range.to_string());
			if self.must_reload() {
				request = request.header(CACHE_CONTROL, "no-cache");
			}

			match request.send().await {
				Ok(response) => return Ok(response),
				Err(e) if is_retryable_error(&e) && attempt < self.max_retries => {
					log::warn!("retryable error: {e}");
				}
				Err(e) => return Err(e.into()),
			}
		}

		bail!("request failed after {} retries", self.max_retries)
	}
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
	err.is_connect() || err.is_timeout()
}

fn header_string(response: &Response, name: HeaderName) -> Option<String> {
	response
		.headers()
		.get(name)
		.and_then(|value| value.to_str().ok())
		.map(str::to_string)
}

/// Drops weak ETags, which must not be used to compare byte ranges.
pub fn normalize_etag(etag: Option<String>) -> Option<String> {
	etag.filter(|etag| !etag.starts_with("W/"))
}

/// Parses the total resource size from an unsatisfied range response (`bytes */<size>`).
pub fn parse_unsatisfied_content_range(content_range: &str) -> Result<u64> {
	static RE_UNSATISFIED: LazyLock<Regex> = LazyLock::new(|| {
		RegexBuilder::new(r"^bytes \*/(\d+)$")
			.case_insensitive(true)
			.build()
			.expect("valid regex")
	});

	let caps = RE_UNSATISFIED
		.captures(content_range)
		.ok_or_else(|| anyhow!("missing content-length on 416 response: Content-Range is '{content_range}'"))?;
	Ok(caps[1].parse()?)
}

#[async_trait]
impl DataReaderTrait for DataReaderHttp {
	async fn read_range(&self, range: &ByteRange, expected_etag: Option<&str>) -> Result<RangeResponse> {
		let mut response = self
			.send(range)
			.await
			.with_context(|| format!("reading {range} from '{}'", self.url))?;

		if range.offset == 0 && response.status() == StatusCode::RANGE_NOT_SATISFIABLE {
			// the first request asked for more bytes than the resource has
			let content_range = header_string(&response, CONTENT_RANGE).unwrap_or_default();
			let size = parse_unsatisfied_content_range(&content_range)?;
			log::trace!("'{}' has only {size} bytes, requesting again", self.url);
			if size == 0 {
				return Ok(RangeResponse::new(Blob::new_empty()));
			}
			response = self.send(&ByteRange::new(0, size)).await?;
		}

		let etag = normalize_etag(header_string(&response, ETAG));
		let status = response.status();

		if status == StatusCode::RANGE_NOT_SATISFIABLE {
			self.must_reload.store(true, Ordering::Relaxed);
			return Err(DataReaderError::EtagMismatch {
				expected: expected_etag.map(str::to_string),
				actual: etag,
			}
			.into());
		}
		if let Err(err) = DataReaderError::check_etag(expected_etag, etag.as_deref()) {
			self.must_reload.store(true, Ordering::Relaxed);
			return Err(err.into());
		}

		if status.as_u16() >= 300 {
			return Err(DataReaderError::Status(status.as_u16()).into());
		}

		if status == StatusCode::OK {
			let content_length: Option<u64> = header_string(&response, CONTENT_LENGTH).and_then(|v| v.parse().ok());
			if content_length.is_none_or(|length| length > range.length) {
				return Err(DataReaderError::NoByteServing.into());
			}
		}

		let cache_control = header_string(&response, CACHE_CONTROL);
		let expires = header_string(&response, EXPIRES);
		let bytes = response
			.bytes()
			.await
			.with_context(|| format!("reading body of {range} from '{}'", self.url))?;

		Ok(RangeResponse {
			blob: Blob::from(&*bytes),
			etag,
			cache_control,
			expires,
		})
	}

	fn get_name(&self) -> &str {
		&self.name
	}
}
