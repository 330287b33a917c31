// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Side-channel capture integration tests.
//!
//! Capture runs on its own thread and shares the log writer with the
//! control loop, so these tests check that records from both producers
//! stay whole and ordered.

mod common;

use std::sync::Arc;
use std::thread;

use common::temp_workspace;
use pyrolog::io::constants::stream;
use pyrolog::io::{decompress_side_payload, ReadSource};
use pyrolog::protocol::encode;
use pyrolog::{LogReader, LogWriter, SideChannelCapture, SideChannelConfig, StreamFilter};

fn side_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 253) as u8).collect()
}

#[test]
fn test_capture_alongside_control_loop() {
    let (dir, _guard) = temp_workspace("side");
    let path = dir.join("session.log");
    let writer = Arc::new(LogWriter::create(&path).unwrap());

    let data = side_data(200_000);
    let config = SideChannelConfig {
        chunk_size: 4096,
        compression_level: 1,
    };
    let capture = SideChannelCapture::spawn(
        Arc::clone(&writer),
        ReadSource::new(std::io::Cursor::new(data.clone()), 10_000),
        &config,
    )
    .unwrap();

    let control = {
        let writer = Arc::clone(&writer);
        thread::spawn(move || {
            for i in 0..500u32 {
                let frame = encode(0x06, &i.to_be_bytes());
                writer.write(stream::INBOUND, &frame).unwrap();
            }
        })
    };

    control.join().unwrap();
    let stats = capture.join().unwrap();
    writer.finish().unwrap();

    assert_eq!(stats.raw_bytes, data.len() as u64);
    // 20 reads of 10000 bytes, each split into 3 records.
    assert_eq!(stats.records, 60);

    // Every record in the file parses, offsets never decrease.
    let mut reader = LogReader::open(&path).unwrap();
    let mut last = None;
    let mut inbound = Vec::new();
    let mut restored = Vec::new();
    for record in reader.records(StreamFilter::All) {
        let record = record.unwrap();
        if let Some(prev) = last {
            assert!(record.offset >= prev);
        }
        last = Some(record.offset);
        match record.stream_id {
            stream::INBOUND => inbound.push(record.payload),
            stream::SIDE_CHANNEL => {
                restored.extend(decompress_side_payload(&record.payload).unwrap())
            }
            other => panic!("unexpected stream {other}"),
        }
    }

    assert_eq!(restored, data);
    assert_eq!(inbound.len(), 500);
    for (i, payload) in inbound.iter().enumerate() {
        assert_eq!(payload, &encode(0x06, &(i as u32).to_be_bytes()));
    }
    assert_eq!(writer.record_count(), 560);
}

#[test]
fn test_channel_source_stops_on_hangup() {
    let buf = common::SharedBuf::default();
    let writer = Arc::new(LogWriter::from_writer(buf.clone()).unwrap());
    let (tx, rx) = crossbeam_channel::unbounded::<Vec<u8>>();

    let capture =
        SideChannelCapture::spawn(Arc::clone(&writer), rx, &SideChannelConfig::default()).unwrap();
    tx.send(b"camera frame 1".to_vec()).unwrap();
    tx.send(b"camera frame 2".to_vec()).unwrap();
    drop(tx);

    let stats = capture.join().unwrap();
    assert_eq!(stats.records, 2);

    let bytes = buf.bytes();
    let mut reader = LogReader::from_reader(bytes.as_slice()).unwrap();
    let first = reader.read(Some(stream::SIDE_CHANNEL)).unwrap();
    assert_eq!(
        decompress_side_payload(&first.payload).unwrap(),
        b"camera frame 1"
    );
}
