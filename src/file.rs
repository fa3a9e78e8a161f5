// Ogg decoder and encoder written in Rust
//
// Copyright (c) 2017 est31 <MTest31@outlook.com>
// and contributors. All rights reserved.
// Redistribution or use only under the terms
// specified in the LICENSE file attached to this
// source distribution.

/*!
Ogg Vorbis files

`OggVorbisFile` holds the tag and audio properties read out of a file.
Saving rewrites the original bytes with the current tag, replacing the
target atomically.
*/

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use log::debug;
use crate::comment::VorbisComment;
use crate::error::{OggError, Result};
use crate::vorbis::{self, comment_payload, scan_headers, total_sample_count, IdentHeader,
	ScanGoal};

/// Options for reading a file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadOptions {
	/// Verify the checksum of every page looked at while
	/// searching the headers. Off by default.
	pub validate_crc :bool,
}

/// Audio properties of a Vorbis stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AudioProperties {
	pub duration :Duration,
	pub sample_rate :u32,
	pub channels :u8,
	/// Nominal bitrate in kbit/s, 0 if unknown
	pub bitrate :u32,
	pub codec :Option<&'static str>,
}

impl AudioProperties {
	pub fn from_vorbis(total_samples :u64, ident :&IdentHeader) -> Self {
		let duration = if ident.sample_rate == 0 {
			Duration::ZERO
		} else {
			let rate = ident.sample_rate as u64;
			let nanos = (total_samples % rate) * 1_000_000_000 / rate;
			Duration::new(total_samples / rate, nanos as u32)
		};
		AudioProperties {
			duration,
			sample_rate : ident.sample_rate,
			channels : ident.channels,
			bitrate : if ident.bitrate_nominal > 0 { ident.bitrate_nominal as u32 / 1000 } else { 0 },
			codec : Some("Vorbis"),
		}
	}

	pub fn is_valid(&self) -> bool {
		self.sample_rate > 0 && self.channels > 0
	}
}

/// An Ogg Vorbis file with its comment and audio properties.
#[derive(Clone, Debug)]
pub struct OggVorbisFile {
	comment :Option<VorbisComment>,
	properties :AudioProperties,
	source_path :Option<PathBuf>,
}

impl OggVorbisFile {
	/// Reads the file contents out of `data`.
	///
	/// A stream ending before its comment header is read successfully,
	/// with no comment set.
	pub fn read(data :&[u8], opts :ReadOptions) -> Result<Self> {
		let scanner = scan_headers(data, opts.validate_crc, ScanGoal::Comment)?;
		let ident = match scanner.ident {
			Some(ref ident) => IdentHeader::parse(ident),
			None => return Err(OggError::NotVorbisStream),
		};
		let comment = match scanner.comment {
			Some(ref pck) => match comment_payload(pck)? {
				Some(payload) => Some(VorbisComment::parse(payload)?),
				None => None,
			},
			None => None,
		};
		let total_samples = total_sample_count(data);
		Ok(OggVorbisFile {
			comment,
			properties : AudioProperties::from_vorbis(total_samples, &ident),
			source_path : None,
		})
	}

	/// Reads the file at `path`, remembering the path for `save`.
	pub fn read_from_file<P :AsRef<Path>>(path :P, opts :ReadOptions) -> Result<Self> {
		let path = path.as_ref();
		let data = fs::read(path)?;
		let mut file = OggVorbisFile::read(&data, opts)?;
		file.source_path = Some(path.to_owned());
		Ok(file)
	}

	/// The path the file was read from, if any.
	pub fn source_path(&self) -> Option<&Path> {
		self.source_path.as_deref()
	}

	pub fn properties(&self) -> &AudioProperties {
		&self.properties
	}

	pub fn comment(&self) -> Option<&VorbisComment> {
		self.comment.as_ref()
	}

	/// Returns the comment, creating an empty one if there is none.
	pub fn comment_mut(&mut self) -> &mut VorbisComment {
		self.comment.get_or_insert_with(VorbisComment::default)
	}

	pub fn set_comment(&mut self, comment :Option<VorbisComment>) {
		self.comment = comment;
	}

	pub fn title(&self) -> Option<&str> {
		self.comment.as_ref()?.title()
	}
	pub fn set_title(&mut self, v :Option<&str>) {
		self.comment_mut().set_title(v)
	}
	pub fn artist(&self) -> Option<&str> {
		self.comment.as_ref()?.artist()
	}
	pub fn set_artist(&mut self, v :Option<&str>) {
		self.comment_mut().set_artist(v)
	}
	pub fn album(&self) -> Option<&str> {
		self.comment.as_ref()?.album()
	}
	pub fn set_album(&mut self, v :Option<&str>) {
		self.comment_mut().set_album(v)
	}
	pub fn year(&self) -> Option<&str> {
		self.comment.as_ref()?.year()
	}
	pub fn set_year(&mut self, v :Option<&str>) {
		self.comment_mut().set_year(v)
	}
	pub fn genre(&self) -> Option<&str> {
		self.comment.as_ref()?.genre()
	}
	pub fn set_genre(&mut self, v :Option<&str>) {
		self.comment_mut().set_genre(v)
	}
	pub fn track(&self) -> Option<u32> {
		self.comment.as_ref()?.track()
	}
	pub fn set_track(&mut self, v :Option<u32>) {
		self.comment_mut().set_track(v)
	}

	/// Renders `original` with the comment header replaced by the current comment.
	///
	/// A file without comment gets an empty one.
	pub fn render(&self, original :&[u8]) -> Result<Vec<u8>> {
		let payload = match self.comment {
			Some(ref c) => c.render(),
			None => VorbisComment::default().render(),
		};
		vorbis::render(original, &payload)
	}

	/// Renders `original` with the current comment and atomically writes it to `path`.
	///
	/// Nothing is written if rendering fails.
	pub fn save_to_file<P :AsRef<Path>>(&self, path :P, original :&[u8]) -> Result<()> {
		let rendered = self.render(original)?;
		write_atomic(path.as_ref(), &rendered)
	}

	/// Re-reads the source file and saves the result to `path`.
	pub fn save_as<P :AsRef<Path>>(&self, path :P) -> Result<()> {
		let source = self.source_path.as_ref().ok_or(OggError::NoSourcePath)?;
		let original = fs::read(source)?;
		self.save_to_file(path, &original)
	}

	/// Saves back to the file this was read from.
	pub fn save(&self) -> Result<()> {
		let source = self.source_path.as_ref().ok_or(OggError::NoSourcePath)?;
		self.save_as(source)
	}
}

/// Writes `data` into a temporary file next to `path`, then moves it over `path`.
fn write_atomic(path :&Path, data :&[u8]) -> Result<()> {
	let dir = match path.parent() {
		Some(dir) if !dir.as_os_str().is_empty() => dir,
		_ => Path::new("."),
	};
	let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
	tmp.write_all(data)?;
	tmp.as_file().sync_all()?;
	tmp.persist(path).map_err(|err| err.error)?;
	debug!("wrote {} bytes to {}", data.len(), path.display());
	Ok(())
}

/// Asynchronous file access, through tokio.
#[cfg(feature = "async")]
mod async_api {
	use super::*;

	use std::io;

	/// Runs `write_atomic` on the blocking thread pool.
	async fn write_atomic_async(path :&Path, data :Vec<u8>) -> Result<()> {
		let path = path.to_owned();
		tokio::task::spawn_blocking(move || write_atomic(&path, &data))
			.await
			.map_err(|err| io::Error::new(io::ErrorKind::Other, err))?
	}

	impl OggVorbisFile {
		/// Reads the file at `path`, remembering the path for saving.
		pub async fn read_from_file_async<P :AsRef<Path>>(path :P, opts :ReadOptions)
				-> Result<Self> {
			let path = path.as_ref();
			let data = tokio::fs::read(path).await?;
			let mut file = OggVorbisFile::read(&data, opts)?;
			file.source_path = Some(path.to_owned());
			Ok(file)
		}

		/// Renders `original` with the current comment and atomically writes it to `path`.
		pub async fn save_to_file_async<P :AsRef<Path>>(&self, path :P, original :&[u8])
				-> Result<()> {
			let rendered = self.render(original)?;
			write_atomic_async(path.as_ref(), rendered).await
		}

		/// Re-reads the source file and saves the result to `path`.
		pub async fn save_as_async<P :AsRef<Path>>(&self, path :P) -> Result<()> {
			let source = self.source_path.as_ref().ok_or(OggError::NoSourcePath)?;
			let original = tokio::fs::read(source).await?;
			self.save_to_file_async(path, &original).await
		}

		/// Saves back to the file this was read from.
		pub async fn save_async(&self) -> Result<()> {
			let source = self.source_path.as_ref().ok_or(OggError::NoSourcePath)?;
			self.save_as_async(source).await
		}
	}
}
