//! Cursor pagination
//!
//! Keyset pagination over `(timestamp, id)` ordering keys. A page request is
//! turned into a [`PageWindow`] the store can execute directly, and the
//! fetched rows are turned back into a [`Page`] with `next`/`previous`
//! tokens. Tokens encode positions, not offsets, so pages stay stable when
//! rows are inserted or removed elsewhere in the set.

mod cursor;

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use cursor::{Cursor, CursorCodec, CursorError};

/// Fixed number of rows per page
pub const PAGE_SIZE: usize = 10;

/// Ordering key of a row. Ties on `timestamp` are broken by `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "i")]
    pub id: i64,
}

/// Rows that can be placed in a keyset ordering
pub trait Positioned {
    fn position(&self) -> Position;
}

/// Direction of the `(timestamp, id)` ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "a")]
    Ascending,
    #[serde(rename = "d")]
    Descending,
}

impl SortOrder {
    /// Read an `ordering` parameter such as `timestamp` or `-timestamp`.
    ///
    /// Anything other than `field` or `-field` falls back to descending.
    pub fn from_param(param: Option<&str>, field: &str) -> Self {
        match param.map(str::trim) {
            Some(value) if value == field => SortOrder::Ascending,
            _ => SortOrder::Descending,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    /// Compare two positions as they appear in this ordering
    pub fn compare(self, a: &Position, b: &Position) -> Ordering {
        match self {
            SortOrder::Ascending => a.cmp(b),
            SortOrder::Descending => b.cmp(a),
        }
    }

    /// Whether `candidate` comes strictly after `anchor` in this ordering
    pub fn is_beyond(self, candidate: &Position, anchor: &Position) -> bool {
        self.compare(candidate, anchor) == Ordering::Greater
    }
}

/// What the store has to fetch for one page.
///
/// Rows must be returned sorted by `scan`, strictly beyond `after` (when
/// set), at most `limit` of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Ordering requested by the client
    pub order: SortOrder,
    /// Ordering the store scans in; reversed when walking backwards
    pub scan: SortOrder,
    pub after: Option<Position>,
    pub limit: usize,
    reverse: bool,
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    pub previous: Option<String>,
}

impl<T> Page<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next: self.next,
            previous: self.previous,
        }
    }
}

/// Builds page windows and pages for a fixed page size
#[derive(Debug, Clone)]
pub struct Paginator {
    codec: CursorCodec,
    page_size: usize,
}

impl Paginator {
    pub fn new(codec: CursorCodec, page_size: usize) -> Self {
        Self {
            codec,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Decode the request cursor into a fetch window.
    ///
    /// One extra row is requested to learn whether another page exists.
    pub fn window(&self, order: SortOrder, token: Option<&str>) -> Result<PageWindow, CursorError> {
        let cursor = token.map(|t| self.codec.decode(t)).transpose()?;

        if let Some(cursor) = &cursor {
            if cursor.order != order {
                return Err(CursorError::OrderMismatch {
                    issued: cursor.order,
                    requested: order,
                });
            }
        }

        let reverse = cursor.map_or(false, |c| c.reverse);
        Ok(PageWindow {
            order,
            scan: if reverse { order.reversed() } else { order },
            after: cursor.map(|c| c.position),
            limit: self.page_size + 1,
            reverse,
        })
    }

    /// Slice fetched rows into a page and issue its cursors
    pub fn finish<T: Positioned>(&self, window: &PageWindow, mut rows: Vec<T>) -> Page<T> {
        let has_more = rows.len() > self.page_size;
        rows.truncate(self.page_size);

        let (has_next, has_previous) = if window.reverse {
            rows.reverse();
            (window.after.is_some(), has_more)
        } else {
            (has_more, window.after.is_some())
        };

        let next = if has_next {
            rows.last()
                .map(|row| row.position())
                .or(window.after)
                .map(|position| self.token(position, window.order, false))
        } else {
            None
        };

        let previous = if has_previous {
            rows.first()
                .map(|row| row.position())
                .or(window.after)
                .map(|position| self.token(position, window.order, true))
        } else {
            None
        };

        Page {
            items: rows,
            next,
            previous,
        }
    }

    fn token(&self, position: Position, order: SortOrder, reverse: bool) -> String {
        self.codec.encode(&Cursor {
            position,
            order,
            reverse,
        })
    }
}
