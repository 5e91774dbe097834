//! Cursor-based pagination utilities for list endpoints.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Default page size when `count` is not specified.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Maximum allowed page size.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Response header carrying the cursor of the next page.
pub const NEXT_CURSOR_HEADER: &str = "x-next-cursor";

/// Common pagination parameters accepted by list endpoints.
#[derive(Debug, Clone, Default)]
pub struct PaginationParams {
    /// Opaque cursor from a previous response (base64-encoded offset).
    pub cursor: Option<String>,
    /// Number of items per page (default 100, max 1000).
    pub count: Option<u32>,
}

impl PaginationParams {
    /// Resolve effective page size, clamped to [1, MAX_PAGE_SIZE].
    pub fn effective_count(&self) -> u32 {
        self.count
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Decode the cursor to a numeric offset. Absent means 0; a cursor that
    /// does not decode is `None`.
    pub fn decode_offset(&self) -> Option<u64> {
        match self.cursor.as_deref() {
            None => Some(0),
            Some(c) => decode_cursor(c),
        }
    }

    /// Slice one page out of `items`, returning it with the next cursor.
    pub fn page<T>(&self, items: Vec<T>) -> Option<(Vec<T>, Option<String>)> {
        let offset = self.decode_offset()?;
        let size = self.effective_count();
        let page: Vec<T> = items
            .into_iter()
            .skip(offset as usize)
            .take(size as usize)
            .collect();
        let cursor = next_cursor(offset, page.len(), size);
        Some((page, cursor))
    }
}

/// Encode a numeric offset into an opaque cursor string (base64).
pub fn encode_cursor(offset: u64) -> String {
    URL_SAFE_NO_PAD.encode(offset.to_string())
}

/// Decode a cursor string back to a numeric offset.
pub fn decode_cursor(cursor: &str) -> Option<u64> {
    let bytes = URL_SAFE_NO_PAD.decode(cursor).ok()?;
    std::str::from_utf8(&bytes).ok()?.parse::<u64>().ok()
}

/// Compute the next-page cursor given the current offset and the number of
/// items returned. Returns `None` when fewer items than `count` were returned
/// (meaning we've reached the end).
pub fn next_cursor(current_offset: u64, returned: usize, page_size: u32) -> Option<String> {
    if (returned as u32) < page_size {
        None
    } else {
        Some(encode_cursor(current_offset + returned as u64))
    }
}
