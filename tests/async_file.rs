// Ogg decoder and encoder written in Rust
//
// Copyright (c) 2016 est31 <MTest31@outlook.com>
// and contributors. All rights reserved.
// Redistribution or use only under the terms
// specified in the LICENSE file attached to this
// source distribution.

#![cfg(feature = "async")]

use oggvorbis_meta::{build_page, OggError, OggVorbisFile, ReadOptions, VorbisComment};
use oggvorbis_meta::reading::{PAGE_FIRST, PAGE_LAST};
use oggvorbis_meta::vorbis::comment_packet;

fn sample_file(artist :&str) -> Vec<u8> {
	let mut ident = b"\x01vorbis\x00\x00\x00\x00\x02".to_vec();
	ident.extend_from_slice(&44100u32.to_le_bytes());
	ident.extend_from_slice(&[0; 12]);
	ident.extend_from_slice(&[0xb8, 0x01]);
	let mut comment = VorbisComment::new("test vendor");
	comment.set_artist(Some(artist));
	let comment = comment_packet(&comment.render());

	let mut data = build_page(&[&ident[..]], PAGE_FIRST, 0, 7, 0).unwrap();
	data.extend_from_slice(&build_page(&[&comment[..], &b"\x05vorbis"[..]], 0, 0, 7, 1)
		.unwrap());
	data.extend_from_slice(&build_page(&[&[9u8; 500][..]], PAGE_LAST, 441000, 7, 2).unwrap());
	data
}

#[tokio::test]
async fn test_async_roundtrip() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("a.ogg");
	tokio::fs::write(&path, sample_file("A")).await.unwrap();

	let mut f = OggVorbisFile::read_from_file_async(&path, ReadOptions::default()).await.unwrap();
	assert_eq!(f.artist(), Some("A"));
	assert_eq!(f.comment().unwrap().vendor(), "test vendor");
	assert_eq!(f.properties().duration.as_secs(), 10);
	assert_eq!(f.properties().bitrate, 0);

	f.set_artist(Some("B"));
	f.set_year(Some("1999"));
	f.save_async().await.unwrap();

	let f2 = OggVorbisFile::read_from_file_async(&path, ReadOptions { validate_crc : true })
		.await.unwrap();
	assert_eq!(f2.artist(), Some("B"));
	assert_eq!(f2.year(), Some("1999"));
	let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
	let mut count = 0;
	while entries.next_entry().await.unwrap().is_some() {
		count += 1;
	}
	assert_eq!(count, 1);
}

#[tokio::test]
async fn test_async_save_to_file() {
	let dir = tempfile::tempdir().unwrap();
	let dst = dir.path().join("out.ogg");
	let original = sample_file("A");
	let mut f = OggVorbisFile::read(&original, ReadOptions::default()).unwrap();
	f.set_title(Some("Async"));
	f.save_to_file_async(&dst, &original).await.unwrap();
	let out = OggVorbisFile::read_from_file_async(&dst, ReadOptions::default()).await.unwrap();
	assert_eq!(out.title(), Some("Async"));
	assert_eq!(out.artist(), Some("A"));

	match f.save_async().await {
		Err(OggError::NoSourcePath) => (),
		other => panic!("unexpected result {:?}", other),
	}
	match f.save_to_file_async(&dst, b"garbage").await {
		Err(OggError::TooShort) => (),
		other => panic!("unexpected result {:?}", other),
	}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_async_concurrent_saves() {
	let dir = tempfile::tempdir().unwrap();
	let dst = dir.path().join("shared.ogg");
	let original = sample_file("A");
	for round in 0 .. 10 {
		let mut tasks = Vec::new();
		for i in 0 .. 4 {
			let mut f = OggVorbisFile::read(&original, ReadOptions::default()).unwrap();
			let title = format!("round {} writer {}", round, i);
			f.set_title(Some(title.as_str()));
			let original = original.clone();
			let dst = dst.clone();
			tasks.push(tokio::spawn(async move {
				f.save_to_file_async(&dst, &original).await
			}));
		}
		for task in tasks {
			task.await.unwrap().unwrap();
		}
		// One of the writers wins, the file is never torn
		let out = OggVorbisFile::read_from_file_async(&dst, ReadOptions { validate_crc : true })
			.await.unwrap();
		assert!(out.title().unwrap().starts_with(&format!("round {} writer ", round)));
		assert_eq!(out.artist(), Some("A"));
	}
	let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
	let mut count = 0;
	while entries.next_entry().await.unwrap().is_some() {
		count += 1;
	}
	assert_eq!(count, 1);
}
