// Ogg decoder and encoder written in Rust
//
// Copyright (c) 2017 est31 <MTest31@outlook.com>
// and contributors. All rights reserved.
// Redistribution or use only under the terms
// specified in the LICENSE file attached to this
// source distribution.

use std::io;
use thiserror::Error;

/// Error that can be raised when reading or rewriting an Ogg Vorbis stream.
#[derive(Debug, Error)]
pub enum OggError {
	/// Fewer bytes remain than a page header with
	/// a one entry segment table needs.
	#[error("Not enough data left for an Ogg page header")]
	TooShort,
	/// The page header announces zero segments.
	#[error("Ogg page has an empty segment table")]
	EmptySegmentTable,
	/// The segment table or page body runs past the end of the input.
	#[error("Ogg page extends past the end of the data")]
	Truncated,
	/// The capture pattern was not found where a page was expected.
	#[error("No Ogg capture pattern found")]
	BadCapturePattern,
	/// Invalid stream structure version, with the given one attached.
	#[error("Unsupported Ogg stream structure version {0}")]
	UnsupportedVersion(u8),
	/// Mismatch of the hash value with (stored, calculated) value.
	///
	/// `page_len` is the size of the offending page, so
	/// callers can skip over it and continue with the next one.
	#[error("CRC32 hash mismatch: stored 0x{stored:08x}, calculated 0x{calculated:08x}")]
	ChecksumMismatch { stored :u32, calculated :u32, page_len :usize },
	/// The first page doesn't carry the begin of stream flag.
	#[error("First page must have the begin of stream flag set")]
	MissingBeginOfStream,
	/// The first packet isn't a Vorbis identification header.
	#[error("Not a Vorbis stream (expected identification header)")]
	NotVorbisStream,
	/// A comment header was found, but its framing byte isn't 1.
	#[error("Invalid comment header framing bit (expected 1, got {0})")]
	MalformedCommentFraming(u8),
	/// The header packets couldn't be located within the scan limit.
	#[error("Vorbis identification/comment header not found")]
	HeaderNotFound,
	/// More segments were requested for a single page than allowed.
	#[error("{0} segments don't fit into a single Ogg page")]
	SegmentOverflow(usize),
	/// The Vorbis comment payload couldn't be decoded.
	#[error("Malformed Vorbis comment: {0}")]
	MalformedComment(&'static str),
	/// Saving needs the path the file was read from.
	#[error("No source path available, the file was not read from disk")]
	NoSourcePath,
	/// I/O error occured.
	#[error("I/O error: {0}")]
	Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, OggError>;
