//! Matching and evaluation engine.
//!
//! This module is the synchronous core of the interpreter. Everything here
//! runs to completion inside one call: there is no suspension point between
//! receiving an utterance and producing the answer text. Waiting for rule
//! sources to finish loading is handled one level up, in `api.rs`.
//!
//! ## How the parts work together
//!
//! ```text
//! input ── Resolver::resolve                       (resolver.rs)
//!            │  reset top-level captures
//!            v
//!          scan categories in KnowledgeBase order
//!            │  PatternSpec::render (bot/get refs, live)
//!            │  Matcher::captures            (matcher.rs)
//!            │  that-check against previous answer
//!            v
//!          first hit ── find_response_text       (evaluator.rs)
//!                         │  resolve_nodes (recursive)
//!                         │   ├─ set/get/think   -> ConversationState
//!                         │   ├─ random          -> session RNG
//!                         │   └─ srai/sr ──────────┐
//!                         │                        │ re-enter scan (depth + 1)
//!                         v                        │
//!                       answer text  <─────────────┘
//! ```
//!
//! ## Responsibilities by module
//!
//! - `normalize.rs`: whitespace/case/punctuation normalization shared by the
//!   matcher, the markup compiler and the resolver.
//! - `matcher.rs`: turns a pattern string into an anchored regex and extracts
//!   wildcard captures.
//! - `resolver.rs`: the category scan, that-context gating and the redirect
//!   depth guard.
//! - `evaluator.rs`: the template walk (one method per tag family).
//! - `metrics.rs`: counters and timings for one resolve call.
//!
//! ## Debugging
//!
//! Scan and redirect traces are emitted with `tracing::debug!` under the
//! `aimlite::engine` target; run with `RUST_LOG=aimlite::engine=debug`.

#[path = "engine/evaluator.rs"]
mod evaluator;
#[path = "engine/matcher.rs"]
mod matcher;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/normalize.rs"]
pub(crate) mod normalize;
#[path = "engine/resolver.rs"]
mod resolver;

#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;

pub use matcher::{Matcher, match_pattern};
pub(crate) use matcher::compile_or_warn;
pub use metrics::ResolveMetrics;
pub(crate) use resolver::Resolver;
