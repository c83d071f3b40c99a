//! Domain services over `ApiClient`.
//!
//! Each service binds one or more endpoints to typed inputs and outputs and
//! wraps `ApiError` in its own error type carrying the failing identifier.
//! None of them retry.

mod auth;
mod card_sets;
mod cards;
mod collection;

pub use auth::{AuthError, AuthService};
pub use card_sets::{CardSetsError, CardSetsService};
pub use cards::{CardsError, CardsService};
pub use collection::{CollectionError, CollectionService};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except RFC 3986 unreserved characters is escaped.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Escape `value` for use as a single URL path segment.
pub(crate) fn path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}
