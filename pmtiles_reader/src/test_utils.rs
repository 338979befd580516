//! Archive fixtures and an instrumented byte source for unit tests.

use crate::{EntryV3, HeaderV3, MAX_SPEC_VERSION, PMTilesCompression, PMTilesType, zxy_to_tile_id};
use anyhow::Result;
use async_trait::async_trait;
use byteorder::{LE, WriteBytesExt};
use parking_lot::Mutex;
use pmtiles_core::{
	Blob, ByteRange,
	compression::{compress_brotli, compress_gzip},
	io::{DataReaderError, DataReaderTrait, RangeResponse},
};
use serde_json::Value;
use std::{
	io::Write,
	sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

pub fn write_varint(bytes: &mut Vec<u8>, mut value: u64) {
	while value >= 0x80 {
		bytes.push((value as u8 & 0x7F) | 0x80);
		value >>= 7;
	}
	bytes.push(value as u8);
}

/// Encodes entries in directory layout. Offsets directly following the previous entry are written
/// as 0.
pub fn serialize_entries(entries: &[EntryV3]) -> Blob {
	let mut bytes = Vec::new();
	write_varint(&mut bytes, entries.len() as u64);

	let mut last_id = 0;
	for entry in entries {
		write_varint(&mut bytes, entry.tile_id - last_id);
		last_id = entry.tile_id;
	}
	for entry in entries {
		write_varint(&mut bytes, u64::from(entry.run_length));
	}
	for entry in entries {
		write_varint(&mut bytes, entry.range.length);
	}
	for (i, entry) in entries.iter().enumerate() {
		if i > 0 && entry.range.offset == entries[i - 1].range.end() {
			write_varint(&mut bytes, 0);
		} else {
			write_varint(&mut bytes, entry.range.offset + 1);
		}
	}
	Blob::from(bytes)
}

pub fn serialize_header(header: &HeaderV3) -> Blob {
	let mut bytes: Vec<u8> = Vec::with_capacity(HeaderV3::LENGTH as usize);
	bytes.write_all(b"PMTiles").unwrap();
	bytes.write_u8(header.spec_version).unwrap();
	for range in [header.root_dir, header.metadata, header.leaf_dirs, header.tile_data] {
		bytes.write_u64::<LE>(range.offset).unwrap();
		bytes.write_u64::<LE>(range.length).unwrap();
	}
	bytes.write_u64::<LE>(header.addressed_tiles_count).unwrap();
	bytes.write_u64::<LE>(header.tile_entries_count).unwrap();
	bytes.write_u64::<LE>(header.tile_contents_count).unwrap();
	bytes.write_u8(u8::from(header.clustered)).unwrap();
	bytes.write_u8(header.internal_compression as u8).unwrap();
	bytes.write_u8(header.tile_compression as u8).unwrap();
	bytes.write_u8(header.tile_type as u8).unwrap();
	bytes.write_u8(header.min_zoom).unwrap();
	bytes.write_u8(header.max_zoom).unwrap();
	bytes.write_i32::<LE>(header.min_lon_e7).unwrap();
	bytes.write_i32::<LE>(header.min_lat_e7).unwrap();
	bytes.write_i32::<LE>(header.max_lon_e7).unwrap();
	bytes.write_i32::<LE>(header.max_lat_e7).unwrap();
	bytes.write_u8(header.center_zoom).unwrap();
	bytes.write_i32::<LE>(header.center_lon_e7).unwrap();
	bytes.write_i32::<LE>(header.center_lat_e7).unwrap();
	assert_eq!(bytes.len() as u64, HeaderV3::LENGTH);
	Blob::from(bytes)
}

/// A header covering Berlin, zoom 2 to 10, without any sections.
pub fn example_header() -> HeaderV3 {
	HeaderV3 {
		spec_version: MAX_SPEC_VERSION,
		root_dir: ByteRange::empty(),
		metadata: ByteRange::empty(),
		leaf_dirs: ByteRange::empty(),
		tile_data: ByteRange::empty(),
		addressed_tiles_count: 0,
		tile_entries_count: 0,
		tile_contents_count: 0,
		clustered: true,
		internal_compression: PMTilesCompression::None,
		tile_compression: PMTilesCompression::None,
		tile_type: PMTilesType::MVT,
		min_zoom: 2,
		max_zoom: 10,
		min_lon_e7: 130000000,
		min_lat_e7: 523000000,
		max_lon_e7: 138000000,
		max_lat_e7: 527000000,
		center_zoom: 3,
		center_lon_e7: 134000000,
		center_lat_e7: 525000000,
		etag: None,
	}
}

fn compress(blob: Blob, compression: PMTilesCompression) -> Blob {
	match compression {
		PMTilesCompression::Gzip => compress_gzip(&blob).unwrap(),
		PMTilesCompression::Brotli => compress_brotli(&blob).unwrap(),
		_ => blob,
	}
}

/// Assembles complete archives: header, padding, root directory, metadata, leaf directories and
/// tile data, in this order.
#[derive(Default)]
pub struct ArchiveBuilder {
	tiles: Vec<(u8, u64, Vec<u8>)>,
	leaf_size: Option<usize>,
	padding: usize,
	zoom_range: Option<(u8, u8)>,
	internal_compression: Option<PMTilesCompression>,
	tile_compression: Option<PMTilesCompression>,
	tile_type: Option<PMTilesType>,
	metadata: Option<Value>,
	bounds_e7: Option<[i32; 4]>,
	raw_directories: Option<(Vec<u8>, Vec<u8>)>,
}

impl ArchiveBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_tile(mut self, z: u8, x: u32, y: u32, data: &[u8]) -> Self {
		let tile_id = zxy_to_tile_id(z, x, y).unwrap();
		self.tiles.push((z, tile_id, data.to_vec()));
		self
	}

	/// Moves the tile entries into leaf directories of `size` entries each.
	pub fn leaf_size(mut self, size: usize) -> Self {
		self.leaf_size = Some(size);
		self
	}

	/// Inserts `padding` bytes between header and root directory.
	pub fn root_after_padding(mut self, padding: usize) -> Self {
		self.padding = padding;
		self
	}

	pub fn zoom_range(mut self, min: u8, max: u8) -> Self {
		self.zoom_range = Some((min, max));
		self
	}

	pub fn internal_compression(mut self, compression: PMTilesCompression) -> Self {
		self.internal_compression = Some(compression);
		self
	}

	pub fn tile_compression(mut self, compression: PMTilesCompression) -> Self {
		self.tile_compression = Some(compression);
		self
	}

	pub fn tile_type(mut self, tile_type: PMTilesType) -> Self {
		self.tile_type = Some(tile_type);
		self
	}

	pub fn metadata(mut self, metadata: Value) -> Self {
		self.metadata = Some(metadata);
		self
	}

	pub fn bounds_e7(mut self, bounds: [i32; 4]) -> Self {
		self.bounds_e7 = Some(bounds);
		self
	}

	/// Replaces the encoded root and leaf directory sections, which are stored uncompressed.
	pub fn raw_directories(mut self, root: Vec<u8>, leaves: Vec<u8>) -> Self {
		self.raw_directories = Some((root, leaves));
		self
	}

	pub fn build(mut self) -> Blob {
		self.tiles.sort_by_key(|(_, tile_id, _)| *tile_id);

		let internal_compression = self.internal_compression.unwrap_or(PMTilesCompression::None);
		let tile_compression = self.tile_compression.unwrap_or(PMTilesCompression::None);

		let mut tile_data = Vec::new();
		let mut entries = Vec::new();
		for (_, tile_id, data) in &self.tiles {
			let blob = compress(Blob::from(data.as_slice()), tile_compression);
			entries.push(EntryV3::new(
				*tile_id,
				ByteRange::new(tile_data.len() as u64, blob.len()),
				1,
			));
			tile_data.extend_from_slice(blob.as_slice());
		}

		let (root, leaves) = if let Some((root, leaves)) = self.raw_directories.take() {
			(root, leaves)
		} else if let Some(size) = self.leaf_size {
			let mut leaves = Vec::new();
			let mut pointers = Vec::new();
			for chunk in entries.chunks(size) {
				let leaf = compress(serialize_entries(chunk), internal_compression);
				pointers.push(EntryV3::new(
					chunk[0].tile_id,
					ByteRange::new(leaves.len() as u64, leaf.len()),
					0,
				));
				leaves.extend_from_slice(leaf.as_slice());
			}
			let root = compress(serialize_entries(&pointers), internal_compression);
			(root.into_vec(), leaves)
		} else {
			let root = compress(serialize_entries(&entries), internal_compression);
			(root.into_vec(), Vec::new())
		};

		let metadata = match &self.metadata {
			Some(value) => compress(Blob::from(serde_json::to_vec(value).unwrap()), internal_compression).into_vec(),
			None => Vec::new(),
		};

		let (min_zoom, max_zoom) = self.zoom_range.unwrap_or_else(|| {
			let zooms = self.tiles.iter().map(|(z, _, _)| *z);
			(zooms.clone().min().unwrap_or(0), zooms.max().unwrap_or(0))
		});

		let mut header = example_header();
		let mut offset = HeaderV3::LENGTH + self.padding as u64;
		let mut section = |length: usize| {
			let range = ByteRange::new(offset, length as u64);
			offset += length as u64;
			range
		};
		header.root_dir = section(root.len());
		header.metadata = section(metadata.len());
		header.leaf_dirs = section(leaves.len());
		header.tile_data = section(tile_data.len());
		header.addressed_tiles_count = self.tiles.len() as u64;
		header.tile_entries_count = self.tiles.len() as u64;
		header.tile_contents_count = self.tiles.len() as u64;
		header.internal_compression = internal_compression;
		header.tile_compression = tile_compression;
		header.tile_type = self.tile_type.unwrap_or(PMTilesType::MVT);
		header.min_zoom = min_zoom;
		header.max_zoom = max_zoom;
		if let Some([min_lon, min_lat, max_lon, max_lat]) = self.bounds_e7 {
			header.min_lon_e7 = min_lon;
			header.min_lat_e7 = min_lat;
			header.max_lon_e7 = max_lon;
			header.max_lat_e7 = max_lat;
		}

		let mut bytes = serialize_header(&header).into_vec();
		bytes.resize(bytes.len() + self.padding, 0);
		for part in [root, metadata, leaves, tile_data] {
			bytes.extend_from_slice(&part);
		}
		Blob::from(bytes)
	}
}

/// An in-memory byte source named "mock" that counts reads and can change its ETag.
#[derive(Debug)]
pub struct MockReader {
	blob: Mutex<Blob>,
	etag: Mutex<Option<String>>,
	rotating_etag: bool,
	cache_control: Option<String>,
	expires: Option<String>,
	yield_on_read: AtomicBool,
	calls: AtomicUsize,
	calls_with_etag: AtomicUsize,
}

impl MockReader {
	pub fn new(blob: Blob) -> Self {
		Self {
			blob: Mutex::new(blob),
			etag: Mutex::new(None),
			rotating_etag: false,
			cache_control: None,
			expires: None,
			yield_on_read: AtomicBool::new(false),
			calls: AtomicUsize::new(0),
			calls_with_etag: AtomicUsize::new(0),
		}
	}

	pub fn with_etag(self, etag: &str) -> Self {
		self.set_etag(Some(etag));
		self
	}

	/// Every read reports a new ETag: `"1"`, `"2"`, ...
	pub fn with_rotating_etag(mut self) -> Self {
		self.rotating_etag = true;
		self
	}

	pub fn with_cache_headers(mut self, cache_control: &str, expires: &str) -> Self {
		self.cache_control = Some(cache_control.to_string());
		self.expires = Some(expires.to_string());
		self
	}

	pub fn set_etag(&self, etag: Option<&str>) {
		*self.etag.lock() = etag.map(str::to_string);
	}

	/// Replaces the served archive, as if the file had been rewritten.
	pub fn set_archive(&self, blob: Blob, etag: Option<&str>) {
		*self.blob.lock() = blob;
		self.set_etag(etag);
	}

	/// Makes every read yield to the runtime once, so concurrent requests overlap.
	pub fn yield_on_read(&self, enabled: bool) {
		self.yield_on_read.store(enabled, Ordering::SeqCst);
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	/// Number of reads that passed an expected ETag.
	pub fn calls_with_etag(&self) -> usize {
		self.calls_with_etag.load(Ordering::SeqCst)
	}

	pub fn reset_calls(&self) {
		self.calls.store(0, Ordering::SeqCst);
		self.calls_with_etag.store(0, Ordering::SeqCst);
	}
}

#[async_trait]
impl DataReaderTrait for MockReader {
	async fn read_range(&self, range: &ByteRange, expected_etag: Option<&str>) -> Result<RangeResponse> {
		let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
		if expected_etag.is_some() {
			self.calls_with_etag.fetch_add(1, Ordering::SeqCst);
		}
		if self.yield_on_read.load(Ordering::SeqCst) {
			tokio::task::yield_now().await;
		}

		let etag = if self.rotating_etag {
			Some(format!("\"{call}\""))
		} else {
			self.etag.lock().clone()
		};
		DataReaderError::check_etag(expected_etag, etag.as_deref())?;

		Ok(RangeResponse {
			blob: self.blob.lock().read_range_truncated(range),
			etag,
			cache_control: self.cache_control.clone(),
			expires: self.expires.clone(),
		})
	}

	fn get_name(&self) -> &str {
		"mock"
	}
}

#[test]
fn archive_builder_layout() {
	let archive = ArchiveBuilder::new()
		.add_tile(3, 1, 2, b"abc")
		.add_tile(2, 0, 0, b"de")
		.root_after_padding(10)
		.build();
	let header = HeaderV3::deserialize(&archive, None).unwrap();
	assert_eq!(header.root_dir.offset, HeaderV3::LENGTH + 10);
	assert_eq!((header.min_zoom, header.max_zoom), (2, 3));
	assert_eq!(header.tile_data.end(), archive.len());
	assert_eq!(header.metadata.length, 0);
}
