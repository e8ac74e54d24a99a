use std::ops::Range;

use crate::codec::{Address, Quantity};

/// Address window of a single Modbus request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Address,
    pub count: Quantity,
}

impl Span {
    pub fn new(start: Address, count: Quantity) -> Self {
        Self { start, count }
    }

    /// One past the last address, which may be `0x10000`.
    pub fn end(&self) -> u32 {
        u32::from(self.start) + u32::from(self.count)
    }

    pub fn contains(&self, address: u32) -> bool {
        u32::from(self.start) <= address && address < self.end()
    }
}

/// Entries of a binding that lie completely inside a request window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    /// Index into the request buffer where the first touched entry starts.
    pub offset: usize,
    /// Index of the first touched entry.
    pub from: usize,
    /// Number of touched entries, never zero.
    pub count: usize,
}

impl Overlap {
    /// One past the last touched entry.
    pub fn to(&self) -> usize {
        self.from + self.count
    }

    pub fn entries(&self) -> Range<usize> {
        self.from..self.to()
    }
}

/// Intersect a binding of `count` entries of `size` units at `first` with the
/// request window `[start, start + length)`.
///
/// Entries cut by either edge of the window are left out, so a multi-word
/// value is never transferred partially. `None` means no entry applies.
pub fn intersect(
    first: Address,
    count: usize,
    size: Quantity,
    start: Address,
    length: Quantity,
) -> Option<Overlap> {
    if count == 0 || size == 0 || length == 0 {
        return None;
    }
    let first = u64::from(first);
    let size = u64::from(size);
    let start = u64::from(start);
    let stop = start + u64::from(length);
    let end = first + count as u64 * size;

    if end <= start || first >= stop {
        return None;
    }

    // First entry starting inside the window
    let from = if first >= start {
        0
    } else {
        (start - first).div_ceil(size)
    };
    let begin = first + from * size;
    if begin >= stop {
        return None;
    }

    let fitting = (stop - begin) / size;
    let remaining = count as u64 - from.min(count as u64);
    let touched = fitting.min(remaining);
    if touched == 0 {
        return None;
    }

    Some(Overlap {
        offset: (begin - start) as usize,
        from: from as usize,
        count: touched as usize,
    })
}

/// Whether an edge of the request window falls inside one of the entries.
///
/// Such an entry is left out by [`intersect`], while a plain copy of the
/// window would move only some of its units.
pub fn cuts(first: Address, count: usize, size: Quantity, start: Address, length: Quantity) -> bool {
    if count == 0 || size == 0 || length == 0 {
        return false;
    }
    let first = u64::from(first);
    let size = u64::from(size);
    let end = first + count as u64 * size;
    let inside = |edge: u64| first < edge && edge < end && (edge - first) % size != 0;

    let start = u64::from(start);
    inside(start) || inside(start + u64::from(length))
}
