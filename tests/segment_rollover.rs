use std::fs;
use std::path::Path;

use diskqueue::{Error, FileQueue, QueueConfig};
use tempfile::tempdir;

fn segment_lens(base: &Path) -> Vec<u64> {
    let mut lens = Vec::new();
    for entry in fs::read_dir(base).expect("read dir") {
        let entry = entry.expect("entry");
        let name = entry.file_name().into_string().expect("name");
        if name.ends_with(".log") {
            lens.push(entry.metadata().expect("metadata").len());
        }
    }
    lens
}

#[test]
fn rollover_keeps_segments_within_limit() {
    let dir = tempdir().expect("tempdir");
    let base = dir.path().join("orders");
    let mut config = QueueConfig::new(&base);
    config.max_segment_size = 10;
    let queue = FileQueue::open(config).expect("queue open");

    // 2+4 bytes fit the first segment; 6+4 more would overflow it, so the
    // second push rotates.
    queue.push(b"ab").expect("push ab");
    queue.push(b"cdefgh").expect("push cdefgh");

    let lens = segment_lens(&base);
    assert_eq!(lens.len(), 2);
    assert!(lens.iter().all(|&len| len <= 10));

    let first = queue.poll().expect("poll ab").expect("ab");
    assert_eq!(first.payload, b"ab");
    queue.commit(&first.token).expect("commit ab");

    let second = queue.poll().expect("poll cdefgh").expect("cdefgh");
    assert_eq!(second.payload, b"cdefgh");
    queue.commit(&second.token).expect("commit cdefgh");

    assert!(queue.poll().expect("poll drained").is_none());
}

#[test]
fn oversized_record_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let mut config = QueueConfig::new(dir.path().join("orders"));
    config.max_segment_size = 10;
    let queue = FileQueue::open(config).expect("queue open");

    let err = queue.push(&[0u8; 11]).expect_err("push oversized");
    assert!(matches!(err, Error::RecordTooLarge { len: 11, max: 10 }));
    assert!(queue.poll().expect("poll").is_none());
}

#[test]
fn many_records_cross_many_segments_in_order() {
    let dir = tempdir().expect("tempdir");
    let base = dir.path().join("orders");
    let mut config = QueueConfig::new(&base);
    config.max_segment_size = 64;
    let queue = FileQueue::open(config).expect("queue open");

    let payloads: Vec<Vec<u8>> = (0..40u8).map(|i| vec![i; (i % 13) as usize]).collect();
    for payload in &payloads {
        queue.push(payload).expect("push");
    }
    assert!(segment_lens(&base).len() > 1);

    for payload in &payloads {
        let record = queue.poll().expect("poll").expect("record");
        assert_eq!(&record.payload, payload);
        queue.commit(&record.token).expect("commit");
    }
    assert!(queue.poll().expect("poll drained").is_none());
}
