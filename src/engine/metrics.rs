//! Resolve metrics.
//!
//! Counters collected while one `resolve` call runs. They are cheap enough to
//! collect on every call and are handed back to the caller inside
//! [`crate::Answer`], where the CLI's verbose report prints them.
//!
//! - `categories_tried` counts every pattern attempt, including the ones made
//!   by nested `<srai>`/`<sr>` scans.
//! - `max_depth` is the deepest redirect level reached (0 = no redirect).

use std::time::Duration;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolveMetrics {
    /// Total elapsed time for the resolve call.
    pub total: Duration,
    /// Pattern attempts across the top-level scan and all redirects.
    pub categories_tried: usize,
    /// Pattern matches whose that-context check failed.
    pub that_rejections: usize,
    /// Number of `<srai>`/`<sr>` redirects evaluated.
    pub redirects: usize,
    /// Deepest redirect nesting reached.
    pub max_depth: usize,
    /// Whether the redirect depth guard fired.
    pub redirect_limit_hit: bool,
}
