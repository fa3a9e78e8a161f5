// Ogg decoder and encoder written in Rust
//
// Copyright (c) 2016 est31 <MTest31@outlook.com>
// and contributors. All rights reserved.
// Redistribution or use only under the terms
// specified in the LICENSE file attached to this
// source distribution.

#![forbid(unsafe_code)]

/*!
Ogg Vorbis comment reader and rewriter

Reads the tag and audio properties out of an Ogg Vorbis file held in
memory, and renders the file again with a replaced comment header.
Identification and setup headers as well as all audio pages are carried
over unchanged, apart from their page sequence numbers.

The most interesting structure in this crate is `OggVorbisFile`.
The page level building blocks live in the `reading` and `writing`
modules, the Vorbis header handling in `vorbis`.
*/


mod crc;
pub mod error;
pub mod reading;
pub mod writing;
pub mod vorbis;
pub mod comment;
pub mod file;

pub use crc::checksum;
pub use error::{OggError, Result};
pub use reading::{find_last_granule, read_page, PacketRun, Page};
pub use writing::{build_multi_page_packet, build_page, renumber_audio_pages,
	segments_needed};
pub use vorbis::{read_comment_payload, read_first_packet_metadata, render,
	total_sample_count, IdentHeader};
pub use comment::VorbisComment;
pub use file::{AudioProperties, OggVorbisFile, ReadOptions};
