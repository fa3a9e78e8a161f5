// Ogg decoder and encoder written in Rust
//
// Copyright (c) 2017 est31 <MTest31@outlook.com>
// and contributors. All rights reserved.
// Redistribution or use only under the terms
// specified in the LICENSE file attached to this
// source distribution.

/*!
Vorbis header handling

A Vorbis logical bitstream starts with three header packets:
identification, comment and setup, in this order. This module locates
them, and rebuilds a stream around a replaced comment header.
*/

use std::borrow::Cow;
use byteorder::{ByteOrder, LittleEndian};
use log::{debug, warn};
use crate::error::{OggError, Result};
use crate::reading::{find_last_granule, read_page, Page, PAGE_FIRST};
use crate::writing::{build_multi_page_packet, build_page, renumber_audio_pages,
	segments_needed, MAX_SEGMENTS};

/// The six bytes following the packet type of every header packet.
pub const VORBIS_MAGIC :&[u8; 6] = b"vorbis";
/// Packet type byte plus `VORBIS_MAGIC`.
pub const COMMON_HEADER_SIZE :usize = 7;
/// Number of pages looked at before giving up on finding the headers.
pub const MAX_HEADER_PAGES :usize = 50;

/// Type of a Vorbis header packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderType {
	Identification = 1,
	Comment = 3,
	Setup = 5,
}

/// Classifies a packet by its common header.
///
/// Returns `None` for audio packets and anything else that
/// doesn't start with a packet type of 1, 3 or 5 followed by "vorbis".
pub fn header_type(packet :&[u8]) -> Option<HeaderType> {
	if packet.len() < COMMON_HEADER_SIZE || &packet[1 .. COMMON_HEADER_SIZE] != VORBIS_MAGIC {
		return None;
	}
	match packet[0] {
		1 => Some(HeaderType::Identification),
		3 => Some(HeaderType::Comment),
		5 => Some(HeaderType::Setup),
		_ => None,
	}
}

pub fn is_identification_header(packet :&[u8]) -> bool {
	header_type(packet) == Some(HeaderType::Identification)
}

pub fn is_comment_header(packet :&[u8]) -> bool {
	header_type(packet) == Some(HeaderType::Comment)
}

pub fn is_setup_header(packet :&[u8]) -> bool {
	header_type(packet) == Some(HeaderType::Setup)
}

/// Extracts the comment payload out of a comment header packet.
///
/// Returns `Ok(None)` if the packet isn't a comment header at all, and
/// an error if it is one but doesn't end with a framing byte of 1.
/// The payload excludes both the common header and the framing byte.
pub fn comment_payload(packet :&[u8]) -> Result<Option<&[u8]>> {
	if !is_comment_header(packet) {
		return Ok(None);
	}
	match packet.last().copied() {
		Some(1) if packet.len() > COMMON_HEADER_SIZE =>
			Ok(Some(&packet[COMMON_HEADER_SIZE .. packet.len() - 1])),
		Some(framing) => Err(OggError::MalformedCommentFraming(framing)),
		None => Ok(None),
	}
}

/// Builds a comment header packet around a comment payload.
pub fn comment_packet(payload :&[u8]) -> Vec<u8> {
	let mut pck = Vec::with_capacity(COMMON_HEADER_SIZE + payload.len() + 1);
	pck.push(HeaderType::Comment as u8);
	pck.extend_from_slice(VORBIS_MAGIC);
	pck.extend_from_slice(payload);
	// Framing bit
	pck.push(1);
	pck
}

/// Fields of the identification header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IdentHeader {
	pub channels :u8,
	pub sample_rate :u32,
	pub bitrate_max :i32,
	pub bitrate_nominal :i32,
	pub bitrate_min :i32,
}

impl IdentHeader {
	/// Size of an identification header packet
	pub const SIZE :usize = 30;

	/// Decodes the audio parameters of an identification header packet.
	///
	/// Packets that are too short or announce a vorbis version other
	/// than 0 decode to all zeros.
	pub fn parse(packet :&[u8]) -> IdentHeader {
		if packet.len() < IdentHeader::SIZE {
			return IdentHeader::default();
		}
		let ident = &packet[COMMON_HEADER_SIZE ..];
		if LittleEndian::read_u32(&ident[0 .. 4]) != 0 {
			return IdentHeader::default();
		}
		IdentHeader {
			channels : ident[4],
			sample_rate : LittleEndian::read_u32(&ident[5 .. 9]),
			bitrate_max : LittleEndian::read_i32(&ident[9 .. 13]),
			bitrate_nominal : LittleEndian::read_i32(&ident[13 .. 17]),
			bitrate_min : LittleEndian::read_i32(&ident[17 .. 21]),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScanState {
	AwaitingFirstPage,
	/// Index of the next expected packet: 0 identification, 1 comment, 2 setup
	AwaitingHeaderPacket(u8),
	StreamingAudio,
	Failed,
}

/// How far `scan_headers` has to get.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScanGoal {
	/// Identification and comment slot
	Comment,
	/// All three header packets
	AllHeaders,
}

/**
Reassembles the header packets of a stream, page by page.

Pages are fed in order through `push_page`. Packets spanning
multiple pages are glued together in an accumulation buffer.
*/
pub(crate) struct HeaderScanner {
	state :ScanState,
	goal :ScanGoal,
	/// Start of a packet that continues in the next page
	pending :Option<Vec<u8>>,
	pages_scanned :usize,
	pub serial :u32,
	pub ident :Option<Vec<u8>>,
	/// The comment header packet, if the comment slot held one
	pub comment :Option<Vec<u8>>,
	pub setup :Option<Vec<u8>>,
	/// Offset of the first page after the setup header
	pub audio_offs :usize,
}

impl HeaderScanner {
	pub fn new(goal :ScanGoal) -> Self {
		HeaderScanner {
			state : ScanState::AwaitingFirstPage,
			goal,
			pending : None,
			pages_scanned : 0,
			serial : 0,
			ident : None,
			comment : None,
			setup : None,
			audio_offs : 0,
		}
	}

	pub fn is_done(&self) -> bool {
		match (self.goal, self.state) {
			(_, ScanState::StreamingAudio) => true,
			(ScanGoal::Comment, ScanState::AwaitingHeaderPacket(idx)) => idx >= 2,
			_ => false,
		}
	}

	/// Processes the next page. `page_end` is the offset right after it.
	pub fn push_page(&mut self, page :&Page, page_end :usize) -> Result<()> {
		let res = self.push_page_inner(page, page_end);
		if res.is_err() {
			self.state = ScanState::Failed;
		}
		res
	}

	fn push_page_inner(&mut self, page :&Page, page_end :usize) -> Result<()> {
		match self.state {
			ScanState::Failed => return Err(OggError::HeaderNotFound),
			ScanState::StreamingAudio => return Ok(()),
			ScanState::AwaitingFirstPage => {
				if !page.first_page() {
					return Err(OggError::MissingBeginOfStream);
				}
				// The segment table is never empty, so neither is this
				let first_ok = page.packets.first()
					.map_or(false, |run| is_identification_header(run.data));
				if !first_ok {
					return Err(OggError::NotVorbisStream);
				}
				self.serial = page.serial;
				self.state = ScanState::AwaitingHeaderPacket(0);
			},
			ScanState::AwaitingHeaderPacket(_) => (),
		}
		self.pages_scanned += 1;

		let mut runs = page.packets.iter();
		if page.starts_with_continued() {
			match self.pending.take() {
				Some(mut pending) => {
					if let Some(run) = runs.next() {
						pending.extend_from_slice(run.data);
						if run.complete {
							self.accept_packet(Cow::Owned(pending), page_end)?;
						} else {
							self.pending = Some(pending);
						}
					}
				},
				None => {
					// Nothing to continue, drop the orphaned data
					debug!("page {} continues a packet that never started", page.sequence_num);
					runs.next();
				},
			}
		} else if self.pending.take().is_some() {
			debug!("page {} abandons an unfinished packet", page.sequence_num);
		}

		for run in runs {
			if run.complete {
				self.accept_packet(Cow::Borrowed(run.data), page_end)?;
			} else {
				self.pending = Some(run.data.to_vec());
			}
		}
		Ok(())
	}

	/// Handles a fully reassembled packet.
	fn accept_packet(&mut self, packet :Cow<[u8]>, page_end :usize) -> Result<()> {
		match self.state {
			ScanState::AwaitingHeaderPacket(0) => {
				if !is_identification_header(&packet) {
					return Err(OggError::NotVorbisStream);
				}
				self.ident = Some(packet.into_owned());
				self.state = ScanState::AwaitingHeaderPacket(1);
			},
			ScanState::AwaitingHeaderPacket(1) => {
				if comment_payload(&packet)?.is_some() {
					debug!("comment header of {} bytes found", packet.len());
					self.comment = Some(packet.into_owned());
				} else {
					debug!("second packet is not a comment header");
				}
				self.state = ScanState::AwaitingHeaderPacket(2);
			},
			ScanState::AwaitingHeaderPacket(_) => {
				if !is_setup_header(&packet) {
					return Err(OggError::HeaderNotFound);
				}
				debug!("setup header of {} bytes found", packet.len());
				self.setup = Some(packet.into_owned());
				self.audio_offs = page_end;
				self.state = ScanState::StreamingAudio;
			},
			ScanState::StreamingAudio => {
				warn!("audio packet shares a page with the setup header");
			},
			ScanState::AwaitingFirstPage | ScanState::Failed => {
				return Err(OggError::HeaderNotFound);
			},
		}
		Ok(())
	}
}

/// Walks the pages of `data` until the header packets of `goal` are located.
///
/// A failure to parse the first page is returned as is. Later pages that
/// fail to parse end the scan, as does running out of data. Scanning more
/// than `MAX_HEADER_PAGES` pages without reaching the goal is an error.
pub(crate) fn scan_headers(data :&[u8], validate_crc :bool, goal :ScanGoal)
		-> Result<HeaderScanner> {
	let mut scanner = HeaderScanner::new(goal);
	let mut offs = 0;
	while !scanner.is_done() {
		if scanner.pages_scanned > 0 && offs >= data.len() {
			break;
		}
		if scanner.pages_scanned >= MAX_HEADER_PAGES {
			debug!("gave up looking for headers after {} pages", MAX_HEADER_PAGES);
			return Err(OggError::HeaderNotFound);
		}
		let (page, len) = match read_page(data, offs, validate_crc) {
			Ok(res) => res,
			Err(err) if scanner.pages_scanned == 0 => return Err(err),
			Err(err) => {
				debug!("header scan stopped at offset {}: {}", offs, err);
				break;
			},
		};
		offs += len;
		scanner.push_page(&page, offs)?;
	}
	Ok(scanner)
}

/// Reads the audio parameters out of the identification header.
pub fn read_first_packet_metadata(data :&[u8]) -> Result<IdentHeader> {
	let (page, _) = read_page(data, 0, false)?;
	if !page.first_page() {
		return Err(OggError::MissingBeginOfStream);
	}
	match page.packets.first() {
		Some(run) if is_identification_header(run.data) => Ok(IdentHeader::parse(run.data)),
		_ => Err(OggError::NotVorbisStream),
	}
}

/// Extracts the raw Vorbis comment payload of the stream.
///
/// Returns `Ok(None)` if the stream ends before a comment header shows up,
/// or if the second packet isn't a comment header.
pub fn read_comment_payload(data :&[u8]) -> Result<Option<Vec<u8>>> {
	let scanner = scan_headers(data, false, ScanGoal::Comment)?;
	match scanner.comment {
		Some(pck) => Ok(comment_payload(&pck)?.map(|p| p.to_vec())),
		None => Ok(None),
	}
}

/// Total number of samples of the stream, from the last granule position.
pub fn total_sample_count(data :&[u8]) -> u64 {
	find_last_granule(data).max(0) as u64
}

/// Appends the pages for a header packet, fragmenting it if needed.
///
/// Returns the sequence number for the page after.
fn push_header_packet(out :&mut Vec<u8>, packet :&[u8], serial :u32,
		sequence_num :u32) -> Result<u32> {
	if segments_needed(packet.len()) <= MAX_SEGMENTS {
		out.extend_from_slice(&build_page(&[packet], 0, 0, serial, sequence_num)?);
		return Ok(sequence_num.wrapping_add(1));
	}
	let (pages, next) = build_multi_page_packet(packet, 0, 0, serial, sequence_num)?;
	for pg in pages {
		out.extend_from_slice(&pg);
	}
	Ok(next)
}

/// Rebuilds a stream with a new comment payload.
///
/// Identification and setup headers are kept verbatim, the comment header
/// is rebuilt around `comment_payload`. The audio pages are copied with
/// their sequence numbers continuing after the last header page.
/// Fails without producing anything if the headers can't be located.
pub fn render(original :&[u8], comment_payload :&[u8]) -> Result<Vec<u8>> {
	let scanner = scan_headers(original, false, ScanGoal::AllHeaders)?;
	let (ident, setup) = match (scanner.ident, scanner.setup) {
		(Some(ident), Some(setup)) => (ident, setup),
		_ => return Err(OggError::HeaderNotFound),
	};
	let serial = scanner.serial;
	let comment = comment_packet(comment_payload);

	let mut out = Vec::with_capacity(original.len() + comment.len());
	out.extend_from_slice(&build_page(&[&ident[..]], PAGE_FIRST, 0, serial, 0)?);

	let next_sequence;
	if segments_needed(comment.len()) + segments_needed(setup.len()) <= MAX_SEGMENTS {
		out.extend_from_slice(&build_page(&[&comment[..], &setup[..]], 0, 0, serial, 1)?);
		next_sequence = 2;
	} else {
		debug!("comment header of {} bytes doesn't share a page with the setup header",
			comment.len());
		let seq = push_header_packet(&mut out, &comment, serial, 1)?;
		next_sequence = push_header_packet(&mut out, &setup, serial, seq)?;
	}

	if scanner.audio_offs < original.len() {
		out.extend_from_slice(&renumber_audio_pages(&original[scanner.audio_offs ..],
			serial, next_sequence));
	}
	Ok(out)
}
