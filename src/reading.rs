// Ogg decoder and encoder written in Rust
//
// Copyright (c) 2017 est31 <MTest31@outlook.com>
// and contributors. All rights reserved.
// Redistribution or use only under the terms
// specified in the LICENSE file attached to this
// source distribution.

/*!
Reading logic

Pages are parsed straight out of a fully materialized byte buffer,
the returned `Page` borrows its segment table and body from it.
*/

use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use crate::crc::{checksum, CHECKSUM_OFFS};
use crate::error::{OggError, Result};

/// The four bytes every page starts with.
pub const CAPTURE_PATTERN :&[u8; 4] = b"OggS";
/// Size of the fixed part of the page header, including the segment count.
pub const HEADER_SIZE :usize = 27;

/// Header type flag: the first packet is continued from the page before.
pub const PAGE_CONTINUED :u8 = 0x01;
/// Header type flag: first page of the logical bitstream.
pub const PAGE_FIRST :u8 = 0x02;
/// Header type flag: last page of the logical bitstream.
pub const PAGE_LAST :u8 = 0x04;

/// A run of consecutive segments inside one page belonging to the same packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacketRun<'a> {
	/// The bytes of the run
	pub data :&'a [u8],
	/// `true` if the run ends with a segment of length < 255,
	/// `false` if the packet is continued in the next page
	pub complete :bool,
}

/// One physical Ogg page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<'a> {
	/// Header type flags, see `PAGE_CONTINUED`, `PAGE_FIRST` and `PAGE_LAST`
	pub flags :u8,
	/// Absolute granule position. The codec defines further meaning,
	/// -1 means that no packet ends on this page.
	pub absgp :i64,
	/// Serial number, identifies the logical bitstream
	pub serial :u32,
	/// Page counter
	pub sequence_num :u32,
	/// Checksum as stored in the page header
	pub checksum :u32,
	/// Lacing values, 1 to 255 of them
	pub segment_table :&'a [u8],
	/// The page's body
	pub body :&'a [u8],
	/// The packet runs of the body, in order.
	///
	/// If the page starts with a continued packet, the first
	/// run is the tail (or another middle part) of that packet.
	pub packets :Vec<PacketRun<'a>>,
}

impl<'a> Page<'a> {
	pub fn starts_with_continued(&self) -> bool {
		self.flags & PAGE_CONTINUED != 0
	}
	pub fn first_page(&self) -> bool {
		self.flags & PAGE_FIRST != 0
	}
	pub fn last_page(&self) -> bool {
		self.flags & PAGE_LAST != 0
	}
	/// Returns `true` if the last packet run continues in the next page.
	pub fn ends_with_continued(&self) -> bool {
		self.segment_table.last().map_or(false, |&v| v == 255)
	}
	/// Serialized size of the page.
	pub fn size(&self) -> usize {
		HEADER_SIZE + self.segment_table.len() + self.body.len()
	}

	/// Serializes the page, stamping a freshly calculated checksum.
	///
	/// The segment table must not hold more than 255 lacing values.
	pub fn serialize(&self) -> Vec<u8> {
		debug_assert!(self.segment_table.len() <= 255,
			"{} lacing values don't fit into a page", self.segment_table.len());
		let mut out = Vec::with_capacity(self.size());
		out.extend_from_slice(CAPTURE_PATTERN);
		out.push(0);
		out.push(self.flags);
		out.extend_from_slice(&self.absgp.to_le_bytes());
		out.extend_from_slice(&self.serial.to_le_bytes());
		out.extend_from_slice(&self.sequence_num.to_le_bytes());
		out.extend_from_slice(&[0; 4]);
		out.push(self.segment_table.len() as u8);
		out.extend_from_slice(self.segment_table);
		out.extend_from_slice(self.body);
		crate::crc::stamp(&mut out);
		out
	}
}

/// Splits a page body into packet runs according to its segment table.
fn packet_runs<'a>(segment_table :&[u8], body :&'a [u8]) -> Vec<PacketRun<'a>> {
	let mut runs = Vec::new();
	let mut cur_packet_offs = 0;
	let mut cur_packet_siz = 0;
	for &val in segment_table {
		cur_packet_siz += val as usize;
		if val < 255 {
			runs.push(PacketRun {
				data : &body[cur_packet_offs .. cur_packet_offs + cur_packet_siz],
				complete : true,
			});
			cur_packet_offs += cur_packet_siz;
			cur_packet_siz = 0;
		}
	}
	if segment_table.last() == Some(&255) {
		runs.push(PacketRun {
			data : &body[cur_packet_offs .. cur_packet_offs + cur_packet_siz],
			complete : false,
		});
	}
	runs
}

/// Parses the page starting at `offs` inside `buf`.
///
/// Returns the page and the number of bytes it occupies.
/// The checksum is only verified if `validate_crc` is set.
pub fn read_page(buf :&[u8], offs :usize, validate_crc :bool) -> Result<(Page<'_>, usize)> {
	let data = buf.get(offs ..).unwrap_or(&[]);
	if data.len() < HEADER_SIZE + 1 {
		return Err(OggError::TooShort);
	}
	if &data[0 .. 4] != CAPTURE_PATTERN {
		return Err(OggError::BadCapturePattern);
	}
	let stream_structure_version = data[4];
	if stream_structure_version != 0 {
		return Err(OggError::UnsupportedVersion(stream_structure_version));
	}
	let page_segments = data[26] as usize;
	if page_segments == 0 {
		return Err(OggError::EmptySegmentTable);
	}
	let segments_end = HEADER_SIZE + page_segments;
	let segment_table = data.get(HEADER_SIZE .. segments_end)
		.ok_or(OggError::Truncated)?;
	let page_siz :usize = segment_table.iter().map(|&v| v as usize).sum();
	let body = data.get(segments_end .. segments_end + page_siz)
		.ok_or(OggError::Truncated)?;
	let page_len = segments_end + page_siz;

	let stored = LittleEndian::read_u32(&data[CHECKSUM_OFFS .. CHECKSUM_OFFS + 4]);
	if validate_crc {
		let calculated = checksum(&data[.. page_len]);
		if stored != calculated {
			return Err(OggError::ChecksumMismatch { stored, calculated, page_len });
		}
	}

	let page = Page {
		flags : data[5],
		absgp : LittleEndian::read_i64(&data[6 .. 14]),
		serial : LittleEndian::read_u32(&data[14 .. 18]),
		sequence_num : LittleEndian::read_u32(&data[18 .. 22]),
		checksum : stored,
		segment_table,
		body,
		packets : packet_runs(segment_table, body),
	};
	Ok((page, page_len))
}

/// Finds the granule position of the last page.
///
/// Pages are walked from the start without checksum validation until
/// a page with the end of stream flag shows up. Files lacking such a
/// page yield the granule position of the last page that could be parsed.
pub fn find_last_granule(buf :&[u8]) -> i64 {
	let mut offs = 0;
	let mut last_absgp = None;
	while offs < buf.len() {
		match read_page(buf, offs, false) {
			Ok((page, len)) => {
				if page.last_page() {
					return page.absgp;
				}
				last_absgp = Some(page.absgp);
				offs += len;
			},
			Err(err) => {
				debug!("granule scan stopped at offset {}: {}", offs, err);
				break;
			},
		}
	}
	debug!("no end of stream page found, using last parsed granule position");
	last_absgp.unwrap_or(0)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn header(flags :u8, segments :&[u8]) -> Vec<u8> {
		let mut pg = CAPTURE_PATTERN.to_vec();
		pg.extend_from_slice(&[0, flags]);
		pg.extend_from_slice(&[0; 20]);
		pg.push(segments.len() as u8);
		pg.extend_from_slice(segments);
		pg
	}

	#[test]
	fn test_header_errors() {
		match read_page(&header(0, &[]), 0, false) {
			Err(OggError::TooShort) => (),
			other => panic!("unexpected result {:?}", other),
		}
		let mut pg = header(0, &[]);
		pg.push(0);
		match read_page(&pg, 0, false) {
			Err(OggError::EmptySegmentTable) => (),
			other => panic!("unexpected result {:?}", other),
		}
		let mut pg = header(0, &[10]);
		pg.extend_from_slice(&[0; 9]);
		match read_page(&pg, 0, false) {
			Err(OggError::Truncated) => (),
			other => panic!("unexpected result {:?}", other),
		}
		let mut pg = header(0, &[0]);
		pg[4] = 1;
		match read_page(&pg, 0, false) {
			Err(OggError::UnsupportedVersion(1)) => (),
			other => panic!("unexpected result {:?}", other),
		}
		match read_page(&pg, 1, false) {
			Err(OggError::TooShort) => (),
			other => panic!("unexpected result {:?}", other),
		}
		// Offsets past the end
		assert!(read_page(&pg, 1000, false).is_err());
	}

	#[test]
	fn test_checksum_validation() {
		let mut pg = header(PAGE_FIRST, &[3]);
		pg.extend_from_slice(&[1, 2, 3]);
		match read_page(&pg, 0, true) {
			Err(OggError::ChecksumMismatch { stored : 0, page_len : 31, .. }) => (),
			other => panic!("unexpected result {:?}", other),
		}
		crate::crc::stamp(&mut pg);
		let (page, len) = read_page(&pg, 0, true).unwrap();
		assert_eq!(len, pg.len());
		assert!(page.first_page());
		assert_eq!(page.body, &[1u8, 2, 3][..]);
		assert_eq!(page.serialize(), pg);
	}

	#[test]
	fn test_skip_bad_page() {
		let mut bad = header(0, &[2]);
		bad.extend_from_slice(&[8, 9]);
		let mut good = header(PAGE_LAST, &[1]);
		good.push(5);
		crate::crc::stamp(&mut good);
		let mut buf = bad;
		buf.extend_from_slice(&good);

		let skip = match read_page(&buf, 0, true) {
			Err(OggError::ChecksumMismatch { page_len, .. }) => page_len,
			other => panic!("unexpected result {:?}", other),
		};
		assert_eq!(skip, 30);
		let (page, len) = read_page(&buf, skip, true).unwrap();
		assert!(page.last_page());
		assert_eq!(page.body, &[5u8][..]);
		assert_eq!(skip + len, buf.len());
	}

	#[test]
	#[cfg(debug_assertions)]
	#[should_panic]
	fn test_serialize_oversized_segment_table() {
		let lacing = [1u8; 256];
		let body = [0u8; 256];
		let page = Page {
			flags : 0,
			absgp : 0,
			serial : 0,
			sequence_num : 0,
			checksum : 0,
			segment_table : &lacing,
			body : &body,
			packets : Vec::new(),
		};
		page.serialize();
	}

	#[test]
	fn test_packet_runs() {
		let body = vec![7u8; 255 + 10 + 0 + 255];
		let runs = packet_runs(&[255, 10, 0, 255], &body);
		assert_eq!(runs.len(), 3);
		assert_eq!(runs[0].data.len(), 265);
		assert!(runs[0].complete);
		assert_eq!(runs[1].data.len(), 0);
		assert!(runs[1].complete);
		assert_eq!(runs[2].data.len(), 255);
		assert!(!runs[2].complete);

		let mut pg = header(PAGE_CONTINUED, &[255, 10, 0, 255]);
		pg.extend_from_slice(&body);
		let (page, _) = read_page(&pg, 0, false).unwrap();
		assert!(page.starts_with_continued());
		assert!(page.ends_with_continued());
		assert_eq!(page.packets, runs);
	}
}
