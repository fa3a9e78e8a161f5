// Ogg decoder and encoder written in Rust
//
// Copyright (c) 2016-2017 est31 <MTest31@outlook.com>
// and contributors. All rights reserved.
// Redistribution or use only under the terms
// specified in the LICENSE file attached to this
// source distribution.

/*!
Writing logic

Pages are laid out into freshly allocated buffers. Packets that don't
fit into the 255 lacing values of a single page have to go through
`build_multi_page_packet`.
*/

use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use crate::crc::{stamp, CHECKSUM_OFFS};
use crate::error::{OggError, Result};
use crate::reading::{read_page, CAPTURE_PATTERN, HEADER_SIZE,
	PAGE_CONTINUED, PAGE_FIRST, PAGE_LAST};

/// Maximum number of lacing values of a page.
pub const MAX_SEGMENTS :usize = 255;
/// Payload of a page filled up with 255 segments of 255 bytes each.
pub const MAX_PAGE_BODY :usize = MAX_SEGMENTS * 255;

/// Number of lacing values a packet of `len` bytes occupies.
///
/// Packets with a length divisible by 255 (including the empty
/// packet) need a trailing zero length segment to mark their end.
pub fn segments_needed(len :usize) -> usize {
	len / 255 + 1
}

/// Appends the lacing values of a packet of `len` bytes.
fn push_lacing(lacing :&mut Vec<u8>, len :usize) {
	lacing.extend(std::iter::repeat(255).take(len / 255));
	lacing.push((len % 255) as u8);
}

/// Assembles a page out of a lacing table and body chunks.
fn assemble_page(flags :u8, absgp :i64, serial :u32, sequence_num :u32,
		lacing :&[u8], chunks :&[&[u8]]) -> Vec<u8> {
	let body_len :usize = chunks.iter().map(|c| c.len()).sum();
	let mut pg = Vec::with_capacity(HEADER_SIZE + lacing.len() + body_len);

	macro_rules! write_le {
		($sink:expr, $number:expr) => {
			$sink.extend_from_slice(&$number.to_le_bytes()[..])
		}
	}

	// Capture pattern.
	pg.extend_from_slice(CAPTURE_PATTERN);
	// Ogg format version, always zero.
	pg.push(0);
	pg.push(flags);
	write_le!(pg, absgp);
	write_le!(pg, serial);
	write_le!(pg, sequence_num);
	// checksum, calculated later on
	write_le!(pg, 0_u32);
	pg.push(lacing.len() as u8);
	pg.extend_from_slice(lacing);
	for chunk in chunks {
		pg.extend_from_slice(chunk);
	}

	stamp(&mut pg);
	pg
}

/// Lays out a page containing all of `packets`, each of them ending on it.
///
/// Fails with `SegmentOverflow` if the packets need more than 255
/// lacing values together.
pub fn build_page(packets :&[&[u8]], flags :u8, absgp :i64, serial :u32,
		sequence_num :u32) -> Result<Vec<u8>> {
	let needed :usize = packets.iter().map(|p| segments_needed(p.len())).sum();
	if needed > MAX_SEGMENTS {
		return Err(OggError::SegmentOverflow(needed));
	}
	let mut lacing = Vec::with_capacity(needed);
	for pck in packets {
		push_lacing(&mut lacing, pck.len());
	}
	Ok(assemble_page(flags, absgp, serial, sequence_num, &lacing, packets))
}

/// Fragments a single packet over as many pages as needed.
///
/// Every page but the last one is filled with 255 segments of 255 bytes,
/// ending with a 255 lacing value to signal the continuation. Pages after
/// the first carry the continuation flag, and only the page the packet
/// ends on gets `absgp`, the others get -1.
/// The begin of stream flag is only kept on the first page, the end of
/// stream flag only on the last one.
///
/// Returns the pages and the sequence number following the last of them.
pub fn build_multi_page_packet(packet :&[u8], flags :u8, absgp :i64, serial :u32,
		start_sequence :u32) -> Result<(Vec<Vec<u8>>, u32)> {
	let mut pages = Vec::new();
	let mut sequence_num = start_sequence;
	let mut rest = packet;
	let mut first = true;
	loop {
		let mut pg_flags = flags & !(PAGE_CONTINUED | PAGE_LAST);
		if !first {
			pg_flags = (pg_flags & !PAGE_FIRST) | PAGE_CONTINUED;
		}
		if segments_needed(rest.len()) <= MAX_SEGMENTS {
			pg_flags |= flags & PAGE_LAST;
			let mut lacing = Vec::with_capacity(segments_needed(rest.len()));
			push_lacing(&mut lacing, rest.len());
			pages.push(assemble_page(pg_flags, absgp, serial, sequence_num,
				&lacing, &[rest]));
			sequence_num = sequence_num.wrapping_add(1);
			break;
		}
		let (this_page, next) = rest.split_at(MAX_PAGE_BODY);
		pages.push(assemble_page(pg_flags, -1, serial, sequence_num,
			&[255; MAX_SEGMENTS], &[this_page]));
		sequence_num = sequence_num.wrapping_add(1);
		rest = next;
		first = false;
	}
	debug!("packet of {} bytes fragmented into {} pages", packet.len(), pages.len());
	Ok((pages, sequence_num))
}

/// Rewrites serial and sequence numbers of a run of pages.
///
/// Sequence numbers count up from `start_sequence`, checksums are
/// recomputed. Flags, granule positions and bodies are copied unchanged.
/// If trailing data doesn't parse as a page, it is copied verbatim.
pub fn renumber_audio_pages(pages :&[u8], serial :u32, start_sequence :u32) -> Vec<u8> {
	let mut out = Vec::with_capacity(pages.len());
	let mut offs = 0;
	let mut sequence_num = start_sequence;
	while offs < pages.len() {
		let len = match read_page(pages, offs, false) {
			Ok((_, len)) => len,
			Err(err) => {
				debug!("copying {} trailing bytes verbatim: {}", pages.len() - offs, err);
				out.extend_from_slice(&pages[offs ..]);
				break;
			},
		};
		let start = out.len();
		out.extend_from_slice(&pages[offs .. offs + len]);
		let pg = &mut out[start ..];
		LittleEndian::write_u32(&mut pg[14 .. 18], serial);
		LittleEndian::write_u32(&mut pg[18 .. 22], sequence_num);
		pg[CHECKSUM_OFFS .. CHECKSUM_OFFS + 4].copy_from_slice(&[0; 4]);
		stamp(pg);
		sequence_num = sequence_num.wrapping_add(1);
		offs += len;
	}
	debug!("renumbered {} pages starting at sequence number {}",
		sequence_num.wrapping_sub(start_sequence), start_sequence);
	out
}
