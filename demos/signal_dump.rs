//! Runs a toy pipeline and dumps its counters on SIGUSR2.
//!
//! ```text
//! cargo run --example signal_dump
//! kill -USR2 <pid>
//! ```

use metricsdump::accounting::{AccountingAllocator, MemoryAccounting};
use metricsdump::builder::GraphBuilder;
use metricsdump::ops::OpKind;
use metricsdump::signal::install;
use metricsdump::{DumpConfig, ProcessContext};
use std::alloc::System;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

static ACCT: MemoryAccounting = MemoryAccounting::new();

#[global_allocator]
static ALLOC: AccountingAllocator = AccountingAllocator::new(System, &ACCT);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut b = GraphBuilder::new(0);
    let top = b.unit("demo-server")?;
    let cache = b.unit("demo-cache")?;
    let disk = b.unit("demo-posix")?;
    let units = [b.shared(top), b.shared(cache), b.shared(disk)];
    let ctx = Arc::new(ProcessContext::from_args().with_accounting(&ACCT));
    ctx.activate(Arc::new(b.build()));

    let (_monitor, _forwarder) = install(Arc::clone(&ctx), DumpConfig::from_env())?;
    tracing::info!(pid = std::process::id(), "send SIGUSR2 to dump metrics");

    let mut tick: u64 = 0;
    loop {
        for (depth, unit) in units.iter().flatten().enumerate() {
            let op = if tick % 4 == 0 { OpKind::Write } else { OpKind::Read };
            let timer = unit.counters(op).begin();
            let scratch = vec![0u8; 64 << depth];
            std::hint::black_box(&scratch);
            timer.finish(tick % 97 == 0 && depth == 2);
        }
        tick += 1;
        std::thread::sleep(Duration::from_millis(10));
    }
}
