//! Inline versus upload decision for remote payloads.

use serde::{Deserialize, Serialize};

/// Where a serialized payload goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Embedded in the request as a `data:` URL.
    Inline,
    /// Uploaded to storage and referenced by URL.
    Upload,
}

/// A payload is inlined iff it is strictly smaller than the threshold.
///
/// A threshold of zero uploads everything, including empty payloads.
pub fn route(payload_len: usize, inline_threshold: usize) -> Route {
    if payload_len < inline_threshold {
        Route::Inline
    } else {
        Route::Upload
    }
}

/// Inline threshold in bytes. Defaults to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingPolicy {
    pub inline_threshold: usize,
}

impl RoutingPolicy {
    pub const fn new(inline_threshold: usize) -> Self {
        RoutingPolicy { inline_threshold }
    }

    pub fn route(&self, payload_len: usize) -> Route {
        route(payload_len, self.inline_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(route(3, 4), Route::Inline);
        assert_eq!(route(4, 4), Route::Upload);
        assert_eq!(route(0, 0), Route::Upload);
        assert_eq!(RoutingPolicy::default().route(1), Route::Upload);
        assert_eq!(RoutingPolicy::new(4 * 1024 * 1024).route(5 * 1024 * 1024), Route::Upload);
    }
}
