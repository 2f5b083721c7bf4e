//! Snapshot module: one full dump, written front to back.

use crate::accounting::MemoryAccounting;
use crate::format::{write_accounting, write_unit_op, LineBuf};
use crate::ops::OpKind;
use crate::unit::Unit;
use std::io::{self, Write};

/// Write one snapshot to `out`.
///
/// Order: the descriptor line, the accounting block when `accounting` is
/// given, then every op of every unit in walk order. Writes are sequential
/// appends; the first failing write aborts the rest and its error is
/// returned, leaving whatever was already written in place.
///
/// Shared state is only read: each counter is loaded once, without locks.
pub fn write_snapshot<'u, W, I>(
    out: &mut W,
    descriptor: &str,
    accounting: Option<&MemoryAccounting>,
    units: I,
) -> io::Result<()>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = &'u Unit>,
{
    out.write_all(descriptor.as_bytes())?;
    out.write_all(b"\n")?;

    let mut line = LineBuf::new();
    if let Some(accounting) = accounting {
        write_accounting(out, &mut line, &accounting.read())?;
    }

    for unit in units {
        for &op in OpKind::ALL {
            write_unit_op(out, &mut line, unit, op)?;
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::walker::walk;

    #[test]
    fn header_only_for_empty_walk() {
        let mut out = Vec::new();
        write_snapshot(&mut out, "glusterfsd -s localhost", None, walk(None)).unwrap();
        assert_eq!(out, b"glusterfsd -s localhost\n");
    }

    #[test]
    fn units_then_ops_in_order() {
        let mut b = GraphBuilder::new(2);
        let first = b.unit("first").unwrap();
        let second = b.unit("second").unwrap();
        let first = b.shared(first).unwrap();
        let second = b.shared(second).unwrap();
        let graph = b.build();

        second.counters(OpKind::Stat).record_call();
        first.counters(OpKind::Write).record_call();
        first.counters(OpKind::Stat).record_call();

        let mut out = Vec::new();
        write_snapshot(&mut out, "cmd", None, walk(Some(&graph))).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "cmd\nfirst.2.STAT.count 1\nfirst.2.WRITE.count 1\nsecond.2.STAT.count 1\n"
        );
    }
}
