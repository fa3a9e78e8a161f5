// Ogg decoder and encoder written in Rust
//
// Copyright (c) 2018 est31 <MTest31@outlook.com>
// and contributors. All rights reserved.
// Redistribution or use only under the terms
// specified in the LICENSE file attached to this
// source distribution.

//! Usage: retag <file> [NAME=value ...]
//!
//! Replaces the given fields and saves the file in place.
//! An empty value removes the field.

use std::env;
use oggvorbis_meta::{OggVorbisFile, ReadOptions, Result};

fn main() {
	match run() {
		Ok(_) =>(),
		Err(err) => println!("Error: {}", err),
	}
}

fn run() -> Result<()> {
	let mut args = env::args().skip(1);
	let file_path = match args.next() {
		Some(p) => p,
		None => {
			println!("No arg found. Please specify a file to retag.");
			return Ok(());
		},
	};
	println!("Opening file: {}", file_path);
	let mut f = OggVorbisFile::read_from_file(&file_path, ReadOptions::default())?;

	for arg in args {
		let (name, value) = match arg.split_once('=') {
			Some(field) => field,
			None => {
				println!("Ignoring argument without '=': {}", arg);
				continue;
			},
		};
		let value = if value.is_empty() { None } else { Some(value) };
		f.comment_mut().set(name, value);
		println!("{} -> {}", name.to_ascii_uppercase(), value.unwrap_or("<removed>"));
	}
	f.save()?;
	println!("Saved {}", file_path);
	Ok(())
}
