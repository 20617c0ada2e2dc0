/// Hard ceiling on the number of items a single page may return.
pub const MAX_LIMIT: i32 = 1000;

/// Page size used when the caller supplies no usable limit.
pub const DEFAULT_LIMIT: i32 = 20;

/// Traversal direction relative to the collection's ascending key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

impl Direction {
    /// Parse a wire token. Unknown tokens count as absent; pagination
    /// input is advisory and must never fail a request.
    pub fn parse(raw: &str) -> Option<Direction> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "NEXT" => Some(Direction::Next),
            "PREV" => Some(Direction::Prev),
            _ => None,
        }
    }
}

/// Normalized pagination input, built once per request from raw untrusted
/// values and read-only afterwards.
#[derive(Debug, Clone)]
pub struct PageRequest {
    cursor: String,
    limit: i32,
    direction: Option<Direction>,
}

impl PageRequest {
    /// Normalize raw client input. Total over all inputs: a limit above
    /// [`MAX_LIMIT`] clamps down, a non-positive limit falls back to
    /// [`DEFAULT_LIMIT`], an absent cursor becomes the empty string, the
    /// direction is stored verbatim.
    pub fn new(cursor: Option<String>, limit: i32, direction: Option<Direction>) -> PageRequest {
        let limit = if limit > MAX_LIMIT {
            MAX_LIMIT
        } else if limit > 0 {
            limit
        } else {
            DEFAULT_LIMIT
        };
        PageRequest {
            cursor: cursor.unwrap_or_default(),
            limit,
            direction,
        }
    }

    /// Opaque position token. Empty means start of sequence for forward
    /// traversal, end of sequence for backward.
    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    pub fn limit(&self) -> i32 {
        self.limit
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// True exactly for an explicit [`Direction::Next`].
    pub fn is_forward(&self) -> bool {
        self.direction == Some(Direction::Next)
    }

    /// Fetch size for the storage layer: one row beyond `limit`, so the
    /// pager can detect a further page without a count query. Never
    /// exposed on the wire.
    pub fn query_limit(&self) -> i32 {
        self.limit + 1
    }
}

/// One window over an ordered collection, plus the metadata a client
/// needs to request the neighbouring windows.
#[derive(Debug, Clone)]
pub struct Page<T> {
    items: Vec<T>,
    has_next: bool,
    has_previous: bool,
    start_cursor: String,
    end_cursor: String,
}

impl<T> Page<T> {
    /// Trim and annotate an over-fetched result set.
    ///
    /// `rows` must already be filtered by the request cursor and sorted
    /// consistently with the request direction (ascending for forward
    /// fetches, descending for backward); `cursor_of` maps a row to its
    /// ordering token. An extra row beyond `limit` marks a further page on
    /// the fetch side. The opposite boundary flag uses the cursor
    /// heuristic: a non-empty input cursor implies content on the side the
    /// caller came from. Backward windows are reversed so `items` always
    /// comes out in ascending presentation order. Never fails, whatever
    /// shape `rows` has.
    pub fn paginate<F>(request: &PageRequest, mut rows: Vec<T>, cursor_of: F) -> Page<T>
    where
        F: Fn(&T) -> String,
    {
        let limit = request.limit() as usize;
        let from_cursor = !request.cursor().is_empty();

        let mut has_next = false;
        let mut has_previous = false;
        if request.is_forward() {
            has_previous = from_cursor;
            if rows.len() > limit {
                rows.truncate(limit);
                has_next = true;
            }
        } else {
            has_next = from_cursor;
            if rows.len() > limit {
                rows.truncate(limit);
                has_previous = true;
            }
            rows.reverse();
        }

        let start_cursor = rows.first().map(&cursor_of).unwrap_or_default();
        let end_cursor = rows.last().map(&cursor_of).unwrap_or_default();

        Page {
            items: rows,
            has_next,
            has_previous,
            start_cursor,
            end_cursor,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn has_previous(&self) -> bool {
        self.has_previous
    }

    /// Ordering token of the first item; empty for an empty page.
    pub fn start_cursor(&self) -> &str {
        &self.start_cursor
    }

    /// Ordering token of the last item; empty for an empty page.
    pub fn end_cursor(&self) -> &str {
        &self.end_cursor
    }

    /// Convert the items while keeping the paging metadata intact.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            has_next: self.has_next,
            has_previous: self.has_previous,
            start_cursor: self.start_cursor,
            end_cursor: self.end_cursor,
        }
    }

    /// Fallible variant of [`Page::map`] for conversions that do lookups.
    pub fn try_map<U, E, F>(self, f: F) -> Result<Page<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        Ok(Page {
            items: self
                .items
                .into_iter()
                .map(f)
                .collect::<Result<Vec<U>, E>>()?,
            has_next: self.has_next,
            has_previous: self.has_previous,
            start_cursor: self.start_cursor,
            end_cursor: self.end_cursor,
        })
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}
