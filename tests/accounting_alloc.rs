use metricsdump::accounting::{size_class, AccountingAllocator, MemoryAccounting};
use metricsdump::snapshot::write_snapshot;
use metricsdump::walker::walk;
use std::alloc::System;
use std::hint::black_box;

static ACCT: MemoryAccounting = MemoryAccounting::new();

#[global_allocator]
static A: AccountingAllocator = AccountingAllocator::new(System, &ACCT);

#[test]
fn global_allocator_feeds_registry() {
    let before = ACCT.read();

    let plain: Vec<u8> = black_box(Vec::with_capacity(100));
    let zeroed = black_box(vec![0u8; 3000]);
    let mut grown: Vec<u64> = black_box(Vec::with_capacity(1));
    grown.reserve_exact(512);
    drop(plain);
    drop(zeroed);
    drop(grown);

    let after = ACCT.read();
    // Other test threads allocate too, so only lower bounds hold.
    assert!(after.malloc >= before.malloc + 2);
    assert!(after.calloc >= before.calloc + 1);
    assert!(after.realloc >= before.realloc + 1);
    assert!(after.free >= before.free + 3);
    assert!(after.blk_size[size_class(3000)] >= before.blk_size[size_class(3000)] + 1);
}

#[test]
fn snapshot_reports_live_allocator_counts() {
    let _keep = black_box(vec![1u32; 16]);
    let mut out = Vec::with_capacity(8192);
    write_snapshot(&mut out, "alloc-test", Some(&ACCT), walk(None)).unwrap();
    let text = String::from_utf8(out).unwrap();
    let malloc: u64 = text
        .lines()
        .find_map(|l| l.strip_prefix("memory.total.malloc "))
        .unwrap()
        .parse()
        .unwrap();
    assert!(malloc > 0);
}
