//! Category scan.
//!
//! A resolve call is a depth-first search over the knowledge base: categories
//! are tried strictly in load/document order and the first one whose pattern
//! *and* that-context match wins. There is no scoring and no longest-match
//! preference between categories.
//!
//! ```text
//! resolve(input)
//!   └─ scan(input, depth 0)
//!        for category in kb:
//!          pattern match? ── no ──> next
//!          that match?    ── no ──> next
//!          evaluate template ─┬─ <srai>/<sr> ─> scan(.., depth + 1)
//!                             └─ text
//!        return first hit (or None)
//! ```
//!
//! Redirects share this scan, so a knowledge base can loop (`A -> srai B ->
//! srai A`). The depth guard turns such loops into a `RedirectionLimit`
//! outcome for the current request instead of unbounded recursion.

use super::matcher::{Matcher, match_pattern};
use super::metrics::ResolveMetrics;
use super::normalize::clean_output;
use crate::{BotProfile, ConversationState, KnowledgeBase, Options, Outcome, PatternSpec};
use rand::rngs::StdRng;
use std::time::Instant;
use tracing::{debug, warn};

/// Result of one top-level resolve.
#[derive(Debug, Clone)]
pub(crate) struct Resolution {
    pub answer: Option<String>,
    /// Captures of the winning top-level match (input casing).
    pub captures: Vec<String>,
    /// Index of the winning category in the knowledge base.
    pub matched: Option<usize>,
    pub outcome: Outcome,
    pub metrics: ResolveMetrics,
}

/// A category that passed both the pattern and the that-context check.
#[derive(Debug)]
pub(super) struct Hit {
    pub index: usize,
    pub captures: Vec<String>,
    pub text: Option<String>,
}

/// Per-category evaluation scope: the captures of the match being evaluated
/// and how many of them `<set>`-of-wildcard has consumed so far.
///
/// `<star/>` and `<sr/>` do not read the frame; they read the request-wide
/// [`ConversationState::last_wildcard`], which nested matches also update.
#[derive(Debug)]
pub(super) struct Frame {
    captures: Vec<String>,
    next_capture: usize,
    pub depth: usize,
}

impl Frame {
    fn new(captures: Vec<String>, depth: usize) -> Self {
        Frame { captures, next_capture: 0, depth }
    }

    /// Next capture not yet consumed by a `<set>`, in declaration order.
    pub fn take_capture(&mut self) -> String {
        let value = self.captures.get(self.next_capture).cloned().unwrap_or_default();
        self.next_capture += 1;
        value
    }
}

/// Runs one resolve request against borrowed engine state.
///
/// Usage: build with [`Resolver::new`] for each request and call
/// [`Resolver::resolve`]; the resolver is consumed by the call.
pub(crate) struct Resolver<'a> {
    kb: &'a KnowledgeBase,
    pub(super) profile: &'a BotProfile,
    pub(super) state: &'a mut ConversationState,
    pub(super) rng: &'a mut StdRng,
    options: &'a Options,
    pub(super) metrics: ResolveMetrics,
    /// Set once the redirect guard fires; every pending scan then unwinds.
    aborted: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(
        kb: &'a KnowledgeBase,
        profile: &'a BotProfile,
        state: &'a mut ConversationState,
        rng: &'a mut StdRng,
        options: &'a Options,
    ) -> Self {
        Resolver { kb, profile, state, rng, options, metrics: ResolveMetrics::default(), aborted: false }
    }

    /// Find the answer for `input`, updating the conversation state.
    pub fn resolve(mut self, input: &str) -> Resolution {
        let started = Instant::now();
        self.state.clear_wildcard_captures();

        let hit = self.scan(input, 0);
        let (answer, captures, matched, outcome) = match hit {
            _ if self.aborted => {
                warn!(
                    target: "aimlite::engine",
                    input,
                    limit = self.options.max_redirect_depth,
                    "redirect depth limit reached, dropping answer"
                );
                (None, Vec::new(), None, Outcome::RedirectionLimit)
            }
            None => (None, Vec::new(), None, Outcome::NoMatch),
            Some(hit) => match hit.text.map(|t| clean_output(&t)).filter(|t| !t.is_empty()) {
                Some(text) => {
                    self.state.set_previous_answer(text.clone());
                    (Some(text), hit.captures, Some(hit.index), Outcome::Matched)
                }
                None => (None, hit.captures, Some(hit.index), Outcome::Empty),
            },
        };

        self.metrics.total = started.elapsed();
        debug!(target: "aimlite::engine", input, ?outcome, metrics = ?self.metrics, "resolve finished");

        Resolution { answer, captures, matched, outcome, metrics: self.metrics }
    }

    /// Try every category in order and evaluate the first full match.
    pub(super) fn scan(&mut self, input: &str, depth: usize) -> Option<Hit> {
        if self.aborted {
            return None;
        }
        if depth > self.options.max_redirect_depth {
            self.aborted = true;
            self.metrics.redirect_limit_hit = true;
            return None;
        }
        self.metrics.max_depth = self.metrics.max_depth.max(depth);

        let kb = self.kb;
        for (index, category) in kb.iter().enumerate() {
            self.metrics.categories_tried += 1;

            let Some(captures) = self.pattern_captures(&category.pattern, input) else {
                continue;
            };

            if let Some(that) = &category.that {
                if self.pattern_captures(that, self.state.previous_answer()).is_none() {
                    self.metrics.that_rejections += 1;
                    continue;
                }
            }

            debug!(target: "aimlite::engine", depth, index, pattern = %category.pattern, ?captures, "category matched");

            if depth == 0 {
                self.state.set_wildcard_captures(captures.clone());
            } else {
                self.state.note_wildcards(&captures);
            }

            let mut frame = Frame::new(captures.clone(), depth);
            let text = self.find_response_text(&category.template, &mut frame);
            return Some(Hit { index, captures, text });
        }

        None
    }

    /// `<srai>`/`<sr>`: re-enter the scan one level deeper.
    ///
    /// The previous answer is only updated by the top-level call, so nested
    /// scans see the same that-context as the outer one.
    pub(super) fn redirect(&mut self, input: &str, depth: usize) -> String {
        self.metrics.redirects += 1;
        debug!(target: "aimlite::engine", depth = depth + 1, input, "redirect");

        match self.scan(input, depth + 1) {
            Some(hit) => hit.text.map(|t| clean_output(&t)).unwrap_or_default(),
            None => String::new(),
        }
    }

    fn pattern_captures(&self, pattern: &PatternSpec, input: &str) -> Option<Vec<String>> {
        if pattern.is_dynamic() {
            return match_pattern(input, &pattern.render(self.profile, self.state));
        }
        pattern.cached_matcher().and_then(|m: &Matcher| m.captures(input))
    }
}
