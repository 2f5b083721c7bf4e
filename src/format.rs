//! Line formatting for snapshots.
//!
//! Every line is rendered into a fixed-size stack buffer and handed to the
//! sink with a single `write_all`, so formatting never allocates and each
//! line reaches the sink whole or not at all.

use crate::accounting::AccountingReading;
use crate::counters::CounterReading;
use crate::ops::OpKind;
use crate::unit::Unit;
use std::fmt::{self, Write as _};
use std::io::{self, Write};

/// Capacity of the per-line stack buffer.
pub const LINE_BUF_LEN: usize = 1024;

/// Unit names longer than this many bytes are truncated in snapshot keys.
///
/// Together with the fixed key suffixes and the widest `f64` rendering this
/// keeps every line inside [`LINE_BUF_LEN`].
pub const MAX_NAME_LEN: usize = 256;

/// A fixed-capacity line buffer implementing [`fmt::Write`].
pub struct LineBuf {
    buf: [u8; LINE_BUF_LEN],
    len: usize,
}

impl LineBuf {
    /// An empty buffer.
    pub const fn new() -> Self {
        Self {
            buf: [0; LINE_BUF_LEN],
            len: 0,
        }
    }

    /// Bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Forget the current contents.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Format one line and write it to `out`.
    pub fn emit<W: Write + ?Sized>(&mut self, out: &mut W, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.clear();
        self.write_fmt(args).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "snapshot line exceeds line buffer")
        })?;
        out.write_all(self.as_bytes())
    }
}

impl Default for LineBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Write for LineBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len + s.len();
        if end > LINE_BUF_LEN {
            return Err(fmt::Error);
        }
        self.buf[self.len..end].copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}

/// `name` cut to at most [`MAX_NAME_LEN`] bytes on a char boundary.
pub fn key_name(name: &str) -> &str {
    if name.len() <= MAX_NAME_LEN {
        return name;
    }
    let mut end = MAX_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// Write the lines for one (unit, op) pair from an already-taken reading.
///
/// `.count` appears iff invocations > 0, `.fail_count` iff failures > 0,
/// `.latency` iff the mean is non-zero. An idle pair writes nothing.
pub fn write_op_lines<W: Write + ?Sized>(
    out: &mut W,
    line: &mut LineBuf,
    unit_name: &str,
    graph_id: u32,
    op: OpKind,
    reading: &CounterReading,
) -> io::Result<()> {
    let name = key_name(unit_name);
    let op_name = op.name();
    if reading.invocations != 0 {
        line.emit(
            out,
            format_args!("{}.{}.{}.count {}\n", name, graph_id, op_name, reading.invocations),
        )?;
    }
    if reading.failures != 0 {
        line.emit(
            out,
            format_args!("{}.{}.{}.fail_count {}\n", name, graph_id, op_name, reading.failures),
        )?;
    }
    if reading.mean_latency != 0.0 {
        line.emit(
            out,
            format_args!("{}.{}.{}.latency {:.6}\n", name, graph_id, op_name, reading.mean_latency),
        )?;
    }
    Ok(())
}

/// Read `unit`'s counters for `op` once and write its lines.
pub fn write_unit_op<W: Write + ?Sized>(
    out: &mut W,
    line: &mut LineBuf,
    unit: &Unit,
    op: OpKind,
) -> io::Result<()> {
    let reading = unit.read(op);
    if reading.is_idle() {
        return Ok(());
    }
    write_op_lines(out, line, unit.name(), unit.graph_id().unwrap_or(0), op, &reading)
}

/// Write the memory-accounting block. Every line is unconditional.
pub fn write_accounting<W: Write + ?Sized>(
    out: &mut W,
    line: &mut LineBuf,
    reading: &AccountingReading,
) -> io::Result<()> {
    line.emit(out, format_args!("memory.total.calloc {}\n", reading.calloc))?;
    line.emit(out, format_args!("memory.total.malloc {}\n", reading.malloc))?;
    line.emit(out, format_args!("memory.total.realloc {}\n", reading.realloc))?;
    line.emit(out, format_args!("memory.total.free {}\n", reading.free))?;
    line.emit(out, format_args!("memory.total.in-use {}\n", reading.in_use()))?;
    for (index, count) in reading.blk_size.iter().enumerate() {
        line.emit(out, format_args!("memory.total.blk_size[{}] {}\n", index, count))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(reading: CounterReading) -> String {
        let mut out = Vec::new();
        let mut line = LineBuf::new();
        write_op_lines(&mut out, &mut line, "quick-read", 3, OpKind::Read, &reading).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn count_and_latency_without_failures() {
        let text = render(CounterReading {
            invocations: 42,
            failures: 0,
            mean_latency: 1.5,
        });
        assert_eq!(
            text,
            "quick-read.3.READ.count 42\nquick-read.3.READ.latency 1.500000\n"
        );
    }

    #[test]
    fn idle_pair_writes_nothing() {
        assert_eq!(render(CounterReading::default()), "");
    }

    #[test]
    fn failures_alone_still_emit_fail_count() {
        let text = render(CounterReading {
            invocations: 0,
            failures: 2,
            mean_latency: 0.0,
        });
        assert_eq!(text, "quick-read.3.READ.fail_count 2\n");
    }

    #[test]
    fn latency_is_fixed_point_never_scientific() {
        let text = render(CounterReading {
            invocations: 1,
            failures: 0,
            mean_latency: 1.0e20,
        });
        assert!(text.ends_with(".latency 100000000000000000000.000000\n"), "{}", text);
        let text = render(CounterReading {
            invocations: 1,
            failures: 0,
            mean_latency: 1.0e-7,
        });
        assert!(text.ends_with(".latency 0.000000\n"), "{}", text);
    }

    #[test]
    fn widest_line_fits_the_buffer() {
        let name = "x".repeat(MAX_NAME_LEN * 4);
        let mut out = Vec::new();
        let mut line = LineBuf::new();
        let reading = CounterReading {
            invocations: u64::MAX,
            failures: u64::MAX,
            mean_latency: -f64::MAX,
        };
        write_op_lines(&mut out, &mut line, &name, u32::MAX, OpKind::Getactivelk, &reading).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().all(|l| l.starts_with(&"x".repeat(MAX_NAME_LEN))));
        assert!(text.lines().all(|l| !l.starts_with(&"x".repeat(MAX_NAME_LEN + 1))));
    }

    #[test]
    fn key_name_respects_char_boundaries() {
        let name = "é".repeat(MAX_NAME_LEN); // two bytes each
        let cut = key_name(&name);
        assert!(cut.len() <= MAX_NAME_LEN);
        assert_eq!(cut.chars().count(), MAX_NAME_LEN / 2);
        assert_eq!(key_name("short"), "short");
    }

    #[test]
    fn overflowing_line_is_an_error_not_a_partial_write() {
        let mut out = Vec::new();
        let mut line = LineBuf::new();
        let long = "y".repeat(LINE_BUF_LEN);
        let err = line.emit(&mut out, format_args!("{}\n", long)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(out.is_empty());
    }

    #[test]
    fn accounting_block_layout() {
        let mut reading = AccountingReading {
            calloc: 5,
            malloc: 7,
            realloc: 2,
            free: 4,
            ..Default::default()
        };
        reading.blk_size[3] = 9;
        let mut out = Vec::new();
        write_accounting(&mut out, &mut LineBuf::new(), &reading).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 5 + crate::accounting::NUM_SIZE_CLASSES);
        assert_eq!(lines[0], "memory.total.calloc 5");
        assert_eq!(lines[1], "memory.total.malloc 7");
        assert_eq!(lines[2], "memory.total.realloc 2");
        assert_eq!(lines[3], "memory.total.free 4");
        assert_eq!(lines[4], "memory.total.in-use 8");
        assert_eq!(lines[5], "memory.total.blk_size[0] 0");
        assert_eq!(lines[8], "memory.total.blk_size[3] 9");
    }
}
