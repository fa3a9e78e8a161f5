// Ogg decoder and encoder written in Rust
//
// Copyright (c) 2017 est31 <MTest31@outlook.com>
// and contributors. All rights reserved.
// Redistribution or use only under the terms
// specified in the LICENSE file attached to this
// source distribution.

/*!
Vorbis comment payload

The payload consists of a vendor string and a list of `NAME=value`
fields, every string prefixed by its length as u32 little endian.
Field names are compared case insensitively.
*/

use std::io::Cursor;
use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;
use crate::error::{OggError, Result};

/// Vendor string of comments created from scratch.
pub const DEFAULT_VENDOR :&str = "oggvorbis-meta";

pub const TITLE :&str = "TITLE";
pub const ARTIST :&str = "ARTIST";
pub const ALBUM :&str = "ALBUM";
pub const DATE :&str = "DATE";
pub const GENRE :&str = "GENRE";
pub const TRACK_NUMBER :&str = "TRACKNUMBER";
pub const COMMENT :&str = "COMMENT";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VorbisComment {
	vendor :String,
	fields :Vec<(String, String)>,
}

impl Default for VorbisComment {
	fn default() -> Self {
		VorbisComment::new(DEFAULT_VENDOR)
	}
}

fn read_string<'a>(rdr :&mut Cursor<&'a [u8]>, what :&'static str) -> Result<&'a [u8]> {
	let len = rdr.read_u32::<LittleEndian>()
		.map_err(|_| OggError::MalformedComment(what))? as usize;
	let data :&'a [u8] = *rdr.get_ref();
	let start = rdr.position() as usize;
	let s = start.checked_add(len)
		.and_then(|end| data.get(start .. end))
		.ok_or(OggError::MalformedComment(what))?;
	rdr.set_position((start + len) as u64);
	Ok(s)
}

fn push_string(out :&mut Vec<u8>, s :&[u8]) {
	out.extend_from_slice(&(s.len() as u32).to_le_bytes());
	out.extend_from_slice(s);
}

impl VorbisComment {
	pub fn new(vendor :impl Into<String>) -> Self {
		VorbisComment {
			vendor : vendor.into(),
			fields : Vec::new(),
		}
	}

	/// Decodes a comment payload, without common header and framing byte.
	pub fn parse(payload :&[u8]) -> Result<Self> {
		let mut rdr = Cursor::new(payload);
		let vendor = String::from_utf8_lossy(read_string(&mut rdr, "truncated vendor string")?)
			.into_owned();
		let count = rdr.read_u32::<LittleEndian>()
			.map_err(|_| OggError::MalformedComment("truncated field count"))?;
		let mut fields = Vec::new();
		for _ in 0 .. count {
			let field = read_string(&mut rdr, "truncated field")?;
			let field = String::from_utf8_lossy(field);
			match field.split_once('=') {
				Some((name, value)) => fields.push((name.to_owned(), value.to_owned())),
				None => debug!("skipping comment field without separator: {:?}", field),
			}
		}
		Ok(VorbisComment { vendor, fields })
	}

	/// Encodes the payload, without common header and framing byte.
	pub fn render(&self) -> Vec<u8> {
		let mut out = Vec::new();
		push_string(&mut out, self.vendor.as_bytes());
		out.extend_from_slice(&(self.fields.len() as u32).to_le_bytes());
		for (name, value) in &self.fields {
			let mut field = Vec::with_capacity(name.len() + 1 + value.len());
			field.extend_from_slice(name.as_bytes());
			field.push(b'=');
			field.extend_from_slice(value.as_bytes());
			push_string(&mut out, &field);
		}
		out
	}

	pub fn vendor(&self) -> &str {
		&self.vendor
	}

	pub fn fields(&self) -> &[(String, String)] {
		&self.fields
	}

	/// Returns the first value of the field `name`.
	pub fn get(&self, name :&str) -> Option<&str> {
		self.fields.iter()
			.find(|(n, _)| n.eq_ignore_ascii_case(name))
			.map(|(_, v)| v.as_str())
	}

	/// Returns all values of the field `name`, in order.
	pub fn get_all<'a>(&'a self, name :&'a str) -> impl Iterator<Item = &'a str> + 'a {
		self.fields.iter()
			.filter(move |(n, _)| n.eq_ignore_ascii_case(name))
			.map(|(_, v)| v.as_str())
	}

	/// Appends a value, keeping existing values of the same field.
	pub fn add(&mut self, name :&str, value :&str) {
		self.fields.push((name.to_ascii_uppercase(), value.to_owned()));
	}

	pub fn remove(&mut self, name :&str) {
		self.fields.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
	}

	/// Replaces all values of the field `name`, or removes them for `None`.
	///
	/// A replaced field keeps the position of its first occurence.
	pub fn set(&mut self, name :&str, value :Option<&str>) {
		let pos = self.fields.iter().position(|(n, _)| n.eq_ignore_ascii_case(name));
		self.remove(name);
		if let Some(value) = value {
			let entry = (name.to_ascii_uppercase(), value.to_owned());
			match pos {
				Some(pos) => self.fields.insert(pos, entry),
				None => self.fields.push(entry),
			}
		}
	}

	pub fn title(&self) -> Option<&str> {
		self.get(TITLE)
	}
	pub fn set_title(&mut self, v :Option<&str>) {
		self.set(TITLE, v)
	}
	pub fn artist(&self) -> Option<&str> {
		self.get(ARTIST)
	}
	pub fn set_artist(&mut self, v :Option<&str>) {
		self.set(ARTIST, v)
	}
	pub fn album(&self) -> Option<&str> {
		self.get(ALBUM)
	}
	pub fn set_album(&mut self, v :Option<&str>) {
		self.set(ALBUM, v)
	}
	/// The `DATE` field
	pub fn year(&self) -> Option<&str> {
		self.get(DATE)
	}
	pub fn set_year(&mut self, v :Option<&str>) {
		self.set(DATE, v)
	}
	pub fn genre(&self) -> Option<&str> {
		self.get(GENRE)
	}
	pub fn set_genre(&mut self, v :Option<&str>) {
		self.set(GENRE, v)
	}
	pub fn comment(&self) -> Option<&str> {
		self.get(COMMENT)
	}
	pub fn set_comment(&mut self, v :Option<&str>) {
		self.set(COMMENT, v)
	}

	/// The track number, also accepting the `3/12` notation.
	pub fn track(&self) -> Option<u32> {
		let v = self.get(TRACK_NUMBER)?;
		v.split('/').next()?.trim().parse().ok()
	}
	pub fn set_track(&mut self, v :Option<u32>) {
		let v = v.map(|n| n.to_string());
		self.set(TRACK_NUMBER, v.as_deref())
	}
}
