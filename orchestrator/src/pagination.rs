// Page planning for aged-execution listings

/// Number of `chunk_size` pages needed to cover `total` items.
///
/// `chunk_size` must be positive; configuration validation rejects zero before
/// any planning happens.
pub fn pages(total: u64, chunk_size: u64) -> u64 {
  debug_assert!(chunk_size > 0, "chunk_size must be positive");
  total.div_ceil(chunk_size)
}

/// Half-open `[start, end)` window of a page, used in progress logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
  pub start: u64,
  pub end: u64,
}

impl PageRange {
  pub fn new(page: u64, chunk_size: u64, len: usize) -> Self {
    let start = page * chunk_size;
    Self {
      start,
      end: start + len as u64,
    }
  }
}
