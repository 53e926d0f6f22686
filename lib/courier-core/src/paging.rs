//! Pagination conventions and per-listing paging state.
//!
//! Listing endpoints disagree on how they tell a client where the next page
//! starts, so the convention is configuration data on each descriptor:
//!
//! | Convention | Where the marker comes from |
//! |------------|-----------------------------|
//! | [`PagingConvention::MarkerField`] | a top-level field, e.g. `"next_marker"` |
//! | [`PagingConvention::NextLink`] | the `marker` query parameter of a `rel="next"` link |
//! | [`PagingConvention::LastElementId`] | the id of the last element of the page |

use std::collections::BTreeSet;

use bytes::Bytes;
use serde_json::Value;

use crate::decoder::{json_kind, parse_body, select};
use crate::{Error, Result};

/// How an endpoint announces the next page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum PagingConvention {
    /// Single page; never follows up.
    #[default]
    None,
    /// Explicit top-level field holding the next marker.
    MarkerField {
        /// Field name, e.g. `next_marker`.
        field: String,
    },
    /// A links array (`[{"rel": "next", "href": "...?marker=m"}]`) or a plain
    /// `next` URL field.
    NextLink {
        /// Field holding the links array or the next URL.
        links_field: String,
    },
    /// The identifier of the last element of the page.
    LastElementId {
        /// Field of each element holding its id.
        id_field: String,
    },
}

/// Pagination settings of a listing descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pagination {
    convention: PagingConvention,
    marker_param: String,
    limit_param: String,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(PagingConvention::None)
    }
}

impl Pagination {
    /// Pagination with the given convention and the usual `marker`/`limit`
    /// query parameter names.
    #[must_use]
    pub fn new(convention: PagingConvention) -> Self {
        Self {
            convention,
            marker_param: "marker".to_string(),
            limit_param: "limit".to_string(),
        }
    }

    /// Marker in an explicit top-level field.
    #[must_use]
    pub fn marker_field(field: impl Into<String>) -> Self {
        Self::new(PagingConvention::MarkerField {
            field: field.into(),
        })
    }

    /// Marker in a `rel="next"` link or a `next` URL.
    #[must_use]
    pub fn next_link(links_field: impl Into<String>) -> Self {
        Self::new(PagingConvention::NextLink {
            links_field: links_field.into(),
        })
    }

    /// Marker is the id of the last element.
    #[must_use]
    pub fn last_element_id(id_field: impl Into<String>) -> Self {
        Self::new(PagingConvention::LastElementId {
            id_field: id_field.into(),
        })
    }

    /// Override the query parameter carrying the marker.
    #[must_use]
    pub fn marker_param(mut self, name: impl Into<String>) -> Self {
        self.marker_param = name.into();
        self
    }

    /// Override the query parameter carrying the page size.
    #[must_use]
    pub fn limit_param(mut self, name: impl Into<String>) -> Self {
        self.limit_param = name.into();
        self
    }

    /// The convention.
    #[must_use]
    pub const fn convention(&self) -> &PagingConvention {
        &self.convention
    }

    /// Query parameter carrying the marker.
    #[must_use]
    pub fn marker_query_param(&self) -> &str {
        &self.marker_param
    }

    /// Query parameter carrying the page size.
    #[must_use]
    pub fn limit_query_param(&self) -> &str {
        &self.limit_param
    }

    /// Returns `true` if follow-up pages may exist.
    #[must_use]
    pub const fn is_paged(&self) -> bool {
        !matches!(self.convention, PagingConvention::None)
    }

    /// Decode one page: the elements under `selector` and the marker of the
    /// next page, if any.
    ///
    /// # Errors
    ///
    /// Same as [`decode`](crate::decode) with a sequence shape.
    pub fn decode_page(
        &self,
        body: &Bytes,
        selector: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Page> {
        let value = parse_body(body)?;
        let explicit = match &self.convention {
            PagingConvention::MarkerField { field } => marker_from_field(&value, field),
            PagingConvention::NextLink { links_field } => {
                marker_from_links(&value, links_field, &self.marker_param)
            }
            PagingConvention::None | PagingConvention::LastElementId { .. } => None,
        };

        let items = match select(value, selector)? {
            Value::Array(items) => items,
            other => {
                return Err(Error::malformed_response(
                    selector.unwrap_or("."),
                    format!("expected an array, found {}", json_kind(&other)),
                ));
            }
        };

        let next_marker = match &self.convention {
            PagingConvention::LastElementId { id_field } => {
                marker_from_last_element(&items, id_field, limit)
            }
            _ => explicit,
        };

        Ok(Page { items, next_marker })
    }
}

/// One decoded page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Elements of this page.
    pub items: Vec<Value>,
    /// Marker of the following page; `None` ends the listing.
    pub next_marker: Option<String>,
}

/// Continuation state threaded through the page fetches of one listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PagingState {
    marker: Option<String>,
    limit: Option<u32>,
    exhausted: bool,
    seen: BTreeSet<String>,
}

impl PagingState {
    /// State before the first page.
    #[must_use]
    pub const fn new(limit: Option<u32>) -> Self {
        Self {
            marker: None,
            limit,
            exhausted: false,
            seen: BTreeSet::new(),
        }
    }

    /// Marker to send with the next request.
    #[must_use]
    pub fn marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    /// Page size bound.
    #[must_use]
    pub const fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Returns `true` once no further request may be issued.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Record the marker returned by the page just fetched.
    ///
    /// A missing marker ends the listing, and so does any marker already
    /// returned earlier in this listing: following it would loop.
    pub fn advance(&mut self, next_marker: Option<String>) {
        match next_marker {
            Some(next) if self.seen.insert(next.clone()) => {
                self.marker = Some(next);
            }
            _ => {
                self.marker = None;
                self.exhausted = true;
            }
        }
    }

    /// Stop issuing requests.
    pub fn finish(&mut self) {
        self.marker = None;
        self.exhausted = true;
    }
}

fn marker_from_field(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(scalar_to_marker)
}

fn marker_from_links(value: &Value, links_field: &str, marker_param: &str) -> Option<String> {
    let href = match value.get(links_field)? {
        Value::String(href) => href.as_str(),
        Value::Array(links) => links
            .iter()
            .find(|link| link.get("rel").and_then(Value::as_str) == Some("next"))?
            .get("href")?
            .as_str()?,
        _ => return None,
    };
    marker_from_href(href, marker_param)
}

fn marker_from_href(href: &str, marker_param: &str) -> Option<String> {
    // Relative links ("/v2/images?marker=m") are resolved against a dummy base.
    let base = url::Url::parse("http://localhost/").ok()?;
    let url = base.join(href).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == marker_param)
        .map(|(_, value)| value.into_owned())
        .filter(|marker| !marker.is_empty())
}

fn marker_from_last_element(items: &[Value], id_field: &str, limit: Option<u32>) -> Option<String> {
    let last = items.last()?;
    if let Some(limit) = limit {
        if items.len() < usize::try_from(limit).unwrap_or(usize::MAX) {
            return None;
        }
    }
    last.get(id_field).and_then(scalar_to_marker)
}

fn scalar_to_marker(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
