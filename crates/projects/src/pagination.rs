//! Cursor pagination for every list endpoint.
//!
//! Cursors are opaque: they are received from the backend, handed to the
//! caller, and echoed back verbatim as `after`/`before` on the next request.
//! Nothing in the workspace parses or constructs one.
//!
//! An absent cursor is always `None` and is omitted from serialised output; an
//! empty string is never a valid cursor and is normalised to `None` on the way
//! in, whether it comes from the caller or from the backend.

use serde::{Deserialize, Serialize};

/// An opaque pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Wraps a raw cursor, returning `None` for the empty string.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Returns the cursor exactly as the backend issued it.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------

/// The forward/backward cursors reported by one backend response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCursors {
    /// Cursor to pass as `after` for the next page.
    pub after: Option<Cursor>,
    /// Cursor to pass as `before` for the previous page.
    pub before: Option<Cursor>,
}

impl RawCursors {
    /// Builds cursors from raw strings, treating empty strings as absent.
    pub fn from_raw(after: Option<&str>, before: Option<&str>) -> Self {
        Self {
            after: after.and_then(Cursor::new),
            before: before.and_then(Cursor::new),
        }
    }

    /// No cursors in either direction.
    pub fn none() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------

/// Page position and size for one list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Requested page size. Clamped by the reader before it reaches a backend.
    pub per_page: u32,
    /// Forward cursor from a previous page's `nextCursor`.
    pub after: Option<Cursor>,
    /// Backward cursor from a previous page's `prevCursor`.
    pub before: Option<Cursor>,
}

impl PageRequest {
    /// A first page of the given size.
    pub fn first(per_page: u32) -> Self {
        Self {
            per_page,
            after: None,
            before: None,
        }
    }

    /// Builds a request from caller-supplied values. Empty cursor strings are
    /// dropped rather than forwarded.
    pub fn from_parts(per_page: u32, after: Option<String>, before: Option<String>) -> Self {
        Self {
            per_page,
            after: after.and_then(Cursor::new),
            before: before.and_then(Cursor::new),
        }
    }

    /// Returns a copy whose page size does not exceed `max`.
    ///
    /// Oversized requests are clamped silently; a zero size becomes `max`.
    #[must_use]
    pub fn clamped(&self, max: u32) -> Self {
        let per_page = match self.per_page {
            0 => max,
            n => n.min(max),
        };
        Self {
            per_page,
            ..self.clone()
        }
    }

    /// Returns a copy positioned after `cursor`, keeping the page size.
    #[must_use]
    pub fn after(&self, cursor: Cursor) -> Self {
        Self {
            per_page: self.per_page,
            after: Some(cursor),
            before: None,
        }
    }
}

// ---------------------------------------------------------------------------

/// Page information attached to every list result.
///
/// `has_next_page` is true iff a forward cursor is present and
/// `has_previous_page` iff a backward cursor is present; the cursors themselves
/// are omitted from the output when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Cursor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_cursor: Option<Cursor>,
}

impl PageInfo {
    /// Builds page info from the cursors of one backend response.
    pub fn from_cursors(cursors: &RawCursors) -> Self {
        Self {
            has_next_page: cursors.after.is_some(),
            has_previous_page: cursors.before.is_some(),
            next_cursor: cursors.after.clone(),
            prev_cursor: cursors.before.clone(),
        }
    }
}

/// A list result: the page's entries plus where to go next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, cursors: &RawCursors) -> Self {
        Self {
            items,
            page_info: PageInfo::from_cursors(cursors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_cursors_yield_no_pages_and_omit_cursor_fields() {
        let info = PageInfo::from_cursors(&RawCursors::from_raw(Some(""), Some("")));

        assert!(!info.has_next_page);
        assert!(!info.has_previous_page);
        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            json!({"hasNextPage": false, "hasPreviousPage": false})
        );
    }

    #[test]
    fn present_cursors_are_echoed_verbatim() {
        let info = PageInfo::from_cursors(&RawCursors::from_raw(Some("Y3Vyc29yOjUw"), None));

        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            json!({"hasNextPage": true, "hasPreviousPage": false, "nextCursor": "Y3Vyc29yOjUw"})
        );
    }

    #[test]
    fn oversized_page_requests_are_clamped() {
        assert_eq!(PageRequest::first(500).clamped(50).per_page, 50);
        assert_eq!(PageRequest::first(20).clamped(50).per_page, 20);
        assert_eq!(PageRequest::first(0).clamped(50).per_page, 50);
    }

    #[test]
    fn empty_request_cursors_are_dropped() {
        let page = PageRequest::from_parts(10, Some(String::new()), Some("abc".into()));

        assert_eq!(page.after, None);
        assert_eq!(page.before.as_ref().map(Cursor::as_str), Some("abc"));
    }

    #[test]
    fn page_serializes_with_camel_case_page_info() {
        let page = Page::new(vec![1, 2], &RawCursors::none());

        assert_eq!(
            serde_json::to_value(&page).unwrap(),
            json!({"items": [1, 2], "pageInfo": {"hasNextPage": false, "hasPreviousPage": false}})
        );
    }
}
