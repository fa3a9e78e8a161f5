// Ogg decoder and encoder written in Rust
//
// Copyright (c) 2018 est31 <MTest31@outlook.com>
// and contributors. All rights reserved.
// Redistribution or use only under the terms
// specified in the LICENSE file attached to this
// source distribution.

use std::env;
use std::fs;
use oggvorbis_meta::{read_page, OggVorbisFile, ReadOptions, Result};

fn main() {
	match run() {
		Ok(_) =>(),
		Err(err) => println!("Error: {}", err),
	}
}

fn dump_pages(data :&[u8]) {
	let mut offs = 0;
	while offs < data.len() {
		match read_page(data, offs, true) {
			Ok((pg, len)) => {
				println!("Page: serial 0x{:08x}, seq {: >6}, flags 0x{:02x}, absgp {: >12}, {: >3} segments, {: >6} bytes, {} packet runs",
					pg.serial, pg.sequence_num, pg.flags, pg.absgp,
					pg.segment_table.len(), len, pg.packets.len());
				offs += len;
			},
			Err(e) => {
				println!("Encountered Error at offset {}: {}", offs, e);
				break;
			},
		}
	}
}

fn run() -> Result<()> {
	let file_path = match env::args().nth(1) {
		Some(p) => p,
		None => {
			println!("No arg found. Please specify a file to open.");
			return Ok(());
		},
	};
	let show_pages = env::args().any(|a| a == "--pages");
	println!("Opening file: {}", file_path);
	let data = fs::read(&file_path)?;
	let f = OggVorbisFile::read(&data, ReadOptions::default())?;

	let props = f.properties();
	println!("{} {} Hz, {} channels, {} kbit/s, {:.3} s",
		props.codec.unwrap_or("unknown"), props.sample_rate, props.channels,
		props.bitrate, props.duration.as_secs_f64());
	match f.comment() {
		Some(c) => {
			println!("Vendor: {}", c.vendor());
			for (name, value) in c.fields() {
				println!("\t{}={}", name, value);
			}
		},
		None => println!("No comment header"),
	}
	if show_pages {
		dump_pages(&data);
	}
	Ok(())
}
