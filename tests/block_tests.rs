//! Tests for sealed blocks
//!
//! These tests verify:
//! - Point lookup round trip and not-found handling
//! - Sparse index: lookups decode only the candidate chunk
//! - Bloom filter short-circuits lookups without a file read
//! - Full scan order, exhaustion and handle ownership
//! - Lifecycle: write-completion, export descriptor, clear

mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use bytes::BytesMut;
use tracewal::codec::encode_object;
use tracewal::{
    BlockBuilder, BlockId, BlockMeta, BloomFilter, CompleteBlock, Record, ReplayBlock,
    SealedBlock, TraceWalError,
};

use common::{flip_byte, objects, payload, temp_config, temp_wal, trace_id, CountingFs};

// =============================================================================
// Helper Functions
// =============================================================================

/// Hand-build the two-chunk block {"a", "m"}, one object per chunk, with a
/// filter over `filter_ids`.
fn two_chunk_block(dir: &Path, filter_ids: &[&str], block_fs: Arc<CountingFs>) -> SealedBlock {
    let meta = BlockMeta::new(BlockId::random(), "tenant-a");

    let mut first = BytesMut::new();
    encode_object(&mut first, b"a", b"payload-a");
    let mut second = BytesMut::new();
    encode_object(&mut second, b"m", b"payload-m");

    let mut file = first.to_vec();
    file.extend_from_slice(&second);
    fs::write(
        tracewal::block::block_filename(dir, &meta.block_id, &meta.tenant_id),
        &file,
    )
    .unwrap();

    let records = vec![
        Record::new("m", first.len() as u64, second.len() as u64),
        Record::new("a", 0, first.len() as u64),
    ];

    let mut filter = BloomFilter::new(filter_ids.len(), 0.01);
    for id in filter_ids {
        filter.add(id.as_bytes());
    }

    SealedBlock::with_fs(meta, filter, dir, records, block_fs)
}

// =============================================================================
// Point Lookup Tests
// =============================================================================

#[test]
fn test_find_round_trip() {
    let (_temp, wal) = temp_wal(10, CountingFs::new());
    let block = wal.seal("tenant-a", objects(250)).unwrap();

    for i in 0..250 {
        assert_eq!(block.find(&trace_id(i)).unwrap(), Some(payload(i)), "id {}", i);
    }
}

#[test]
fn test_find_absent_ids() {
    let (_temp, wal) = temp_wal(10, CountingFs::new());
    let block = wal.seal("tenant-a", objects(100)).unwrap();

    assert_eq!(block.find(b"trace99999").unwrap(), None);
    assert_eq!(block.find(b"trace00010x").unwrap(), None);
    assert_eq!(block.find(b"").unwrap(), None);
    assert_eq!(block.find(b"zzz").unwrap(), None);
}

#[test]
fn test_find_with_unsorted_input() {
    let (_temp, wal) = temp_wal(4, CountingFs::new());
    let mut input = objects(40);
    input.reverse();
    input.swap(3, 17);

    let block = wal.seal("tenant-a", input).unwrap();

    let ids: Vec<&[u8]> = block.index().records().iter().map(|r| r.id.as_slice()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
    assert_eq!(block.index().len(), 10);

    for i in 0..40 {
        assert_eq!(block.find(&trace_id(i)).unwrap(), Some(payload(i)));
    }
}

#[test]
fn test_find_decodes_only_candidate_chunk() {
    let (_temp, wal) = temp_wal(5, CountingFs::new());
    let block = wal.seal("tenant-a", objects(50)).unwrap();
    let records = block.index().records().to_vec();
    assert_eq!(records.len(), 10);

    // Break the first object's checksum in every chunk except chunk 3
    let path = block.full_filename();
    for (k, record) in records.iter().enumerate() {
        if k != 3 {
            flip_byte(&path, record.start + 8);
        }
    }

    for i in 15..20 {
        assert_eq!(block.find(&trace_id(i)).unwrap(), Some(payload(i)));
    }

    // A decode error in the candidate chunk is surfaced, not "not found"
    assert!(matches!(
        block.find(&trace_id(0)),
        Err(TraceWalError::Corruption(_))
    ));
}

#[test]
fn test_find_duplicate_ids_returns_first_written() {
    let (_temp, config) = temp_config(2);
    let mut builder = BlockBuilder::new(&config.data_dir, "tenant-a", &config);
    builder.add(b"a", b"first");
    builder.add(b"b", b"only-b");
    builder.add(b"a", b"second");
    let block = builder.finish().unwrap();

    assert_eq!(block.find(b"a").unwrap(), Some(b"first".to_vec()));
    assert_eq!(block.find(b"b").unwrap(), Some(b"only-b".to_vec()));
}

// =============================================================================
// Two-Chunk Scenario
// =============================================================================

#[test]
fn test_scenario_exact_match() {
    let temp = tempfile::TempDir::new().unwrap();
    let fs = CountingFs::new();
    let block = two_chunk_block(temp.path(), &["a", "m"], fs.clone());

    assert_eq!(block.find(b"a").unwrap(), Some(b"payload-a".to_vec()));
    assert_eq!(block.find(b"m").unwrap(), Some(b"payload-m".to_vec()));
    assert_eq!(fs.opens(), 1);
}

#[test]
fn test_scenario_filter_rejects_without_read() {
    let temp = tempfile::TempDir::new().unwrap();
    let fs = CountingFs::new();
    let block = two_chunk_block(temp.path(), &["a", "m"], fs.clone());

    assert!(!block.bloom_filter().test(b"z"));
    assert_eq!(block.find(b"z").unwrap(), None);
    assert_eq!(fs.opens(), 0);
}

#[test]
fn test_scenario_past_end_of_index() {
    let temp = tempfile::TempDir::new().unwrap();
    let fs = CountingFs::new();
    // "z" passes the filter but is greater than every indexed id
    let block = two_chunk_block(temp.path(), &["a", "m", "z"], fs.clone());

    assert_eq!(block.find(b"z").unwrap(), None);
    assert_eq!(fs.opens(), 0);
}

#[test]
fn test_scenario_between_chunks() {
    let temp = tempfile::TempDir::new().unwrap();
    let fs = CountingFs::new();
    // "g" passes the filter, lower-bounds to "m"'s chunk, and is not in it
    let block = two_chunk_block(temp.path(), &["a", "m", "g"], fs.clone());

    assert_eq!(block.index().lower_bound(b"g").unwrap().id, b"m");
    assert_eq!(block.find(b"g").unwrap(), None);
    assert_eq!(fs.opens(), 1);
}

// =============================================================================
// Scan Tests
// =============================================================================

#[test]
fn test_iter_yields_every_object_in_order() {
    let (_temp, wal) = temp_wal(7, CountingFs::new());
    let block = wal.seal("tenant-a", objects(100)).unwrap();

    let scanned: Vec<_> = block.iter().unwrap().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(scanned, objects(100));
}

#[test]
fn test_iter_exhausts_once_and_releases_handle() {
    let (_temp, wal) = temp_wal(3, CountingFs::new());
    let block = wal.seal("tenant-a", objects(5)).unwrap();

    let mut iter = block.iter().unwrap();
    assert!(iter.is_open());
    assert_eq!(iter.by_ref().count(), 5);
    assert!(!iter.is_open());
    assert!(iter.next().is_none());
}

#[test]
fn test_iter_is_independent_of_lookup_handle() {
    let fs = CountingFs::new();
    let (_temp, wal) = temp_wal(3, fs.clone());
    let block = wal.seal("tenant-a", objects(9)).unwrap();

    let mut first = block.iter().unwrap();
    assert_eq!(block.find(&trace_id(4)).unwrap(), Some(payload(4)));
    let second = block.iter().unwrap();

    assert_eq!(fs.opens(), 3);
    assert_eq!(second.count(), 9);
    assert_eq!(first.next().unwrap().unwrap(), (trace_id(0), payload(0)));
}

#[test]
fn test_iter_outlives_block() {
    let (_temp, wal) = temp_wal(3, CountingFs::new());
    let block = wal.seal("tenant-a", objects(6)).unwrap();

    let iter = block.iter().unwrap();
    drop(block);

    assert_eq!(iter.count(), 6);
}

#[test]
fn test_iter_surfaces_corruption() {
    let (_temp, wal) = temp_wal(2, CountingFs::new());
    let block = wal.seal("tenant-a", objects(6)).unwrap();
    let third_chunk = block.index().records()[2].clone();
    flip_byte(&block.full_filename(), third_chunk.start + 8);

    let results: Vec<_> = block.iter().unwrap().collect();
    assert_eq!(results.len(), 5);
    assert!(results[..4].iter().all(|r| r.is_ok()));
    assert!(matches!(results[4], Err(TraceWalError::Corruption(_))));
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_time_written() {
    let (_temp, wal) = temp_wal(10, CountingFs::new());
    let block = wal.seal("tenant-a", objects(3)).unwrap();

    assert_eq!(block.time_written(), SystemTime::UNIX_EPOCH);

    let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    block.block_wrote_successfully(t);
    assert_eq!(block.time_written(), t);
}

#[test]
fn test_write_info() {
    let (_temp, wal) = temp_wal(4, CountingFs::new());
    let block = wal.seal("tenant-a", objects(10)).unwrap();

    let info = block.write_info();
    assert_eq!(info.block_id, block.meta().block_id);
    assert_eq!(info.tenant_id, "tenant-a");
    assert_eq!(info.records, block.index().records());
    assert_eq!(info.records.len(), 3);
    assert_eq!(
        info.path,
        wal.blocks_dir().join(format!("{}:tenant-a", block.meta().block_id))
    );
    assert!(info.path.exists());
}

#[test]
fn test_meta_summary() {
    let (_temp, wal) = temp_wal(4, CountingFs::new());
    let block = wal.seal("tenant-a", objects(10)).unwrap();
    let meta = block.meta();

    assert_eq!(meta.tenant_id, "tenant-a");
    assert_eq!(meta.min_id, trace_id(0));
    assert_eq!(meta.max_id, trace_id(9));
    assert_eq!(meta.total_objects, 10);
    assert!(meta.start_time <= meta.end_time);

    let decoded = BlockMeta::from_bytes(&meta.to_bytes().unwrap()).unwrap();
    assert_eq!(&decoded, meta);
}

#[test]
fn test_clear_removes_file_and_handle() {
    let fs = CountingFs::new();
    let (_temp, wal) = temp_wal(4, fs.clone());
    let block = wal.seal("tenant-a", objects(10)).unwrap();
    let path = block.full_filename();

    // Open the cached handle first
    assert!(block.find(&trace_id(1)).unwrap().is_some());

    block.clear().unwrap();
    assert!(!path.exists());
    assert!(std::fs::File::open(&path).is_err());
    assert_eq!(fs.removes(), 1);
}

#[test]
fn test_operations_after_clear_fail() {
    let fs = CountingFs::new();
    let (_temp, wal) = temp_wal(4, fs.clone());
    let block = wal.seal("tenant-a", objects(10)).unwrap();
    block.clear().unwrap();

    assert!(matches!(block.clear(), Err(TraceWalError::BlockCleared(_))));
    assert!(matches!(block.find(&trace_id(1)), Err(TraceWalError::BlockCleared(_))));
    assert!(matches!(block.iter(), Err(TraceWalError::BlockCleared(_))));
    assert_eq!(fs.removes(), 1);
}

#[test]
fn test_seal_empty_block_fails() {
    let (_temp, config) = temp_config(4);
    let builder = BlockBuilder::new(&config.data_dir, "tenant-a", &config);
    assert!(builder.is_empty());
    assert!(matches!(builder.finish(), Err(TraceWalError::Storage(_))));
}

#[test]
fn test_builder_with_block_id() {
    let (_temp, config) = temp_config(4);
    let id: BlockId = "01234567-89ab-4cde-8f01-23456789abcd".parse().unwrap();

    let mut builder = BlockBuilder::new(&config.data_dir, "tenant-b", &config).with_block_id(id);
    builder.add(b"x", b"1");
    let block = builder.finish().unwrap();

    assert_eq!(block.meta().block_id, id);
    assert!(config
        .data_dir
        .join("01234567-89ab-4cde-8f01-23456789abcd:tenant-b")
        .exists());
}

// =============================================================================
// Capability Views
// =============================================================================

fn replay_all(block: &dyn ReplayBlock) -> usize {
    block.iter().unwrap().count()
}

#[test]
fn test_sealed_block_as_trait_objects() {
    let (_temp, wal) = temp_wal(4, CountingFs::new());
    let block: Box<dyn CompleteBlock> = Box::new(wal.seal("tenant-a", objects(12)).unwrap());

    assert_eq!(block.find(&trace_id(7)).unwrap(), Some(payload(7)));
    assert_eq!(block.tenant_id(), "tenant-a");
    assert_eq!(block.meta().total_objects, 12);
    assert!(block.bloom_filter().test(&trace_id(7)));
    assert_eq!(block.write_info().records.len(), 3);

    let t = SystemTime::now();
    block.block_wrote_successfully(t);
    assert_eq!(block.time_written(), t);

    let sealed = wal.seal("tenant-b", objects(3)).unwrap();
    assert_eq!(replay_all(&sealed), 3);

    block.clear().unwrap();
}
