//! Process-wide memory accounting.
//!
//! [`MemoryAccounting`] is a registry of atomic counters updated by every
//! allocation. Install [`AccountingAllocator`] as the `#[global_allocator]` to
//! feed it; hand the same `&'static` registry to the
//! [`ProcessContext`](crate::context::ProcessContext) so dumps can read it.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of allocation size classes in the histogram.
pub const NUM_SIZE_CLASSES: usize = 16;

/// Size class for an allocation of `size` bytes.
///
/// Class `i` holds sizes in `(2^(i-1), 2^i]`; sizes 0 and 1 fall in class 0
/// and the last class absorbs everything larger.
#[inline]
pub const fn size_class(size: usize) -> usize {
    let bits = (usize::BITS - size.saturating_sub(1).leading_zeros()) as usize;
    if bits < NUM_SIZE_CLASSES {
        bits
    } else {
        NUM_SIZE_CLASSES - 1
    }
}

/// Global allocation counters.
#[derive(Debug)]
pub struct MemoryAccounting {
    calloc: AtomicU64,
    malloc: AtomicU64,
    realloc: AtomicU64,
    free: AtomicU64,
    blk_size: [AtomicU64; NUM_SIZE_CLASSES],
}

/// Values read from [`MemoryAccounting`], one load per counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccountingReading {
    /// Zeroed allocations.
    pub calloc: u64,
    /// Non-zeroed allocations.
    pub malloc: u64,
    /// Reallocations.
    pub realloc: u64,
    /// Frees.
    pub free: u64,
    /// Allocation counts per size class.
    pub blk_size: [u64; NUM_SIZE_CLASSES],
}

impl AccountingReading {
    /// Live allocations: `(calloc + malloc) - free`, wrapping.
    ///
    /// Frees racing ahead of the allocations they match (or counted before the
    /// registry was installed) make this wrap to a huge value instead of
    /// going negative.
    pub fn in_use(&self) -> u64 {
        self.calloc.wrapping_add(self.malloc).wrapping_sub(self.free)
    }
}

impl MemoryAccounting {
    /// Create a zeroed registry; usable in a `static`.
    pub const fn new() -> Self {
        Self {
            calloc: AtomicU64::new(0),
            malloc: AtomicU64::new(0),
            realloc: AtomicU64::new(0),
            free: AtomicU64::new(0),
            blk_size: [const { AtomicU64::new(0) }; NUM_SIZE_CLASSES],
        }
    }

    /// Count a zeroed allocation of `size` bytes.
    #[inline]
    pub fn record_calloc(&self, size: usize) {
        self.calloc.fetch_add(1, Ordering::Relaxed);
        self.blk_size[size_class(size)].fetch_add(1, Ordering::Relaxed);
    }

    /// Count a non-zeroed allocation of `size` bytes.
    #[inline]
    pub fn record_malloc(&self, size: usize) {
        self.malloc.fetch_add(1, Ordering::Relaxed);
        self.blk_size[size_class(size)].fetch_add(1, Ordering::Relaxed);
    }

    /// Count a reallocation.
    #[inline]
    pub fn record_realloc(&self) {
        self.realloc.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a free.
    #[inline]
    pub fn record_free(&self) {
        self.free.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter once. Not a consistent cut.
    pub fn read(&self) -> AccountingReading {
        let mut blk_size = [0u64; NUM_SIZE_CLASSES];
        for (out, counter) in blk_size.iter_mut().zip(&self.blk_size) {
            *out = counter.load(Ordering::Relaxed);
        }
        AccountingReading {
            calloc: self.calloc.load(Ordering::Relaxed),
            malloc: self.malloc.load(Ordering::Relaxed),
            realloc: self.realloc.load(Ordering::Relaxed),
            free: self.free.load(Ordering::Relaxed),
            blk_size,
        }
    }
}

impl Default for MemoryAccounting {
    fn default() -> Self {
        Self::new()
    }
}

/// Global allocator wrapper that counts into a [`MemoryAccounting`].
///
/// ```ignore
/// static ACCT: MemoryAccounting = MemoryAccounting::new();
/// #[global_allocator]
/// static ALLOC: AccountingAllocator = AccountingAllocator::new(System, &ACCT);
/// ```
///
/// Counting is a handful of relaxed atomic adds: no locks, no allocation.
#[derive(Debug)]
pub struct AccountingAllocator<A = System> {
    inner: A,
    accounting: &'static MemoryAccounting,
}

impl<A> AccountingAllocator<A> {
    /// Wrap `inner`, counting into `accounting`.
    pub const fn new(inner: A, accounting: &'static MemoryAccounting) -> Self {
        Self { inner, accounting }
    }

    /// The registry this allocator counts into.
    pub fn accounting(&self) -> &'static MemoryAccounting {
        self.accounting
    }
}

unsafe impl<A: GlobalAlloc> GlobalAlloc for AccountingAllocator<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.inner.alloc(layout) };
        if !ptr.is_null() {
            self.accounting.record_malloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.inner.alloc_zeroed(layout) };
        if !ptr.is_null() {
            self.accounting.record_calloc(layout.size());
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { self.inner.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            self.accounting.record_realloc();
        }
        new_ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { self.inner.dealloc(ptr, layout) };
        self.accounting.record_free();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_class_boundaries() {
        assert_eq!(size_class(0), 0);
        assert_eq!(size_class(1), 0);
        assert_eq!(size_class(2), 1);
        assert_eq!(size_class(3), 2);
        assert_eq!(size_class(4), 2);
        assert_eq!(size_class(5), 3);
        assert_eq!(size_class(1 << 14), 14);
        assert_eq!(size_class((1 << 14) + 1), 15);
        assert_eq!(size_class(usize::MAX), NUM_SIZE_CLASSES - 1);
    }

    #[test]
    fn registry_counts() {
        let acct = MemoryAccounting::new();
        acct.record_malloc(16);
        acct.record_calloc(16);
        acct.record_calloc(4096);
        acct.record_realloc();
        acct.record_free();
        let r = acct.read();
        assert_eq!((r.calloc, r.malloc, r.realloc, r.free), (2, 1, 1, 1));
        assert_eq!(r.blk_size[size_class(16)], 2);
        assert_eq!(r.blk_size[size_class(4096)], 1);
        assert_eq!(r.in_use(), 2);
    }

    #[test]
    fn in_use_wraps_when_frees_exceed_allocations() {
        let r = AccountingReading {
            malloc: 1,
            free: 3,
            ..Default::default()
        };
        assert_eq!(r.in_use(), u64::MAX - 1);
    }

    #[test]
    fn allocator_forwards_and_counts() {
        static ACCT: MemoryAccounting = MemoryAccounting::new();
        let alloc = AccountingAllocator::new(System, &ACCT);
        let layout = Layout::from_size_align(64, 8).unwrap();
        unsafe {
            let p = alloc.alloc_zeroed(layout);
            assert!(!p.is_null());
            assert_eq!(*p, 0);
            let p = alloc.realloc(p, layout, 128);
            assert!(!p.is_null());
            alloc.dealloc(p, Layout::from_size_align(128, 8).unwrap());
        }
        let r = alloc.accounting().read();
        assert_eq!((r.calloc, r.malloc, r.realloc, r.free), (1, 0, 1, 1));
        assert_eq!(r.blk_size[size_class(64)], 1);
    }
}
