// Ogg decoder and encoder written in Rust
//
// Copyright (c) 2017 est31 <MTest31@outlook.com>
// and contributors. All rights reserved.
// Redistribution or use only under the terms
// specified in the LICENSE file attached to this
// source distribution.

use std::fs;
use oggvorbis_meta::{build_page, OggError, OggVorbisFile, ReadOptions, VorbisComment};
use oggvorbis_meta::reading::{PAGE_FIRST, PAGE_LAST};
use oggvorbis_meta::vorbis::comment_packet;

const SERIAL :u32 = 0x5b90a374;

fn sample_file(title :&str) -> Vec<u8> {
	let mut ident = b"\x01vorbis\x00\x00\x00\x00\x01".to_vec();
	ident.extend_from_slice(&48000u32.to_le_bytes());
	ident.extend_from_slice(&[0; 4]);
	ident.extend_from_slice(&96000i32.to_le_bytes());
	ident.extend_from_slice(&[0; 4]);
	ident.extend_from_slice(&[0xb8, 0x01]);

	let mut comment = VorbisComment::default();
	comment.set_title(Some(title));
	let comment = comment_packet(&comment.render());
	let setup = b"\x05vorbis some codebooks".to_vec();

	let mut data = build_page(&[&ident[..]], PAGE_FIRST, 0, SERIAL, 0).unwrap();
	data.extend_from_slice(&build_page(&[&comment[..], &setup[..]], 0, 0, SERIAL, 1).unwrap());
	data.extend_from_slice(&build_page(&[&[0x11u8; 300][..]], 0, 24000, SERIAL, 2).unwrap());
	data.extend_from_slice(&build_page(&[&[0x22u8; 40][..]], PAGE_LAST, 96000, SERIAL, 3)
		.unwrap());
	data
}

#[test]
fn test_read_from_file() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("song.ogg");
	fs::write(&path, sample_file("Original")).unwrap();

	let f = OggVorbisFile::read_from_file(&path, ReadOptions::default()).unwrap();
	assert_eq!(f.source_path(), Some(path.as_path()));
	assert_eq!(f.title(), Some("Original"));
	assert_eq!(f.properties().sample_rate, 48000);
	assert_eq!(f.properties().channels, 1);
	assert_eq!(f.properties().bitrate, 96);
	assert_eq!(f.properties().duration.as_secs(), 2);
	assert_eq!(f.properties().codec, Some("Vorbis"));
}

#[test]
fn test_save_in_place() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("song.ogg");
	let original = sample_file("Original");
	fs::write(&path, &original).unwrap();

	let mut f = OggVorbisFile::read_from_file(&path, ReadOptions::default()).unwrap();
	f.set_title(Some("Changed"));
	f.set_genre(Some("Ambient"));
	f.save().unwrap();

	let f2 = OggVorbisFile::read_from_file(&path, ReadOptions { validate_crc : true }).unwrap();
	assert_eq!(f2.title(), Some("Changed"));
	assert_eq!(f2.genre(), Some("Ambient"));
	assert_eq!(f2.properties(), f.properties());
	// The audio pages keep their place at the end
	let saved = fs::read(&path).unwrap();
	assert!(saved.ends_with(&[0x22; 40]));
	// No temporary files left behind
	assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_save_to_other_file() {
	let dir = tempfile::tempdir().unwrap();
	let src = dir.path().join("in.ogg");
	let dst = dir.path().join("out.ogg");
	let original = sample_file("Original");
	fs::write(&src, &original).unwrap();

	let mut f = OggVorbisFile::read_from_file(&src, ReadOptions::default()).unwrap();
	f.set_artist(Some("Someone"));
	f.save_as(&dst).unwrap();
	assert_eq!(fs::read(&src).unwrap(), original);

	let out = OggVorbisFile::read_from_file(&dst, ReadOptions::default()).unwrap();
	assert_eq!(out.artist(), Some("Someone"));
	assert_eq!(out.title(), Some("Original"));

	let f = OggVorbisFile::read(&original, ReadOptions::default()).unwrap();
	assert!(f.source_path().is_none());
	f.save_to_file(&dst, &original).unwrap();
	assert_eq!(fs::read(&dst).unwrap(), f.render(&original).unwrap());
}

#[test]
fn test_failed_render_keeps_file() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("song.ogg");
	fs::write(&path, b"not an ogg file at all, just some text").unwrap();

	let f = OggVorbisFile::read(&sample_file("x"), ReadOptions::default()).unwrap();
	match f.save_to_file(&path, b"not an ogg file at all, just some text") {
		Err(OggError::BadCapturePattern) => (),
		other => panic!("unexpected result {:?}", other),
	}
	assert_eq!(fs::read(&path).unwrap(), b"not an ogg file at all, just some text");
	assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_missing_file() {
	let dir = tempfile::tempdir().unwrap();
	match OggVorbisFile::read_from_file(dir.path().join("nope.ogg"), ReadOptions::default()) {
		Err(OggError::Io(_)) => (),
		other => panic!("unexpected result {:?}", other),
	}
}
