use crate::engine::{ResolveMetrics, Resolver};
use crate::source::{Generation, ReadinessGate, parse_source};
use crate::{BotProfile, Category, ConversationState, Error, KnowledgeBase, Result, SessionSnapshot, SourceId};
use parking_lot::{RwLock, RwLockReadGuard};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// How long a resolve waits for rule sources that are still loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound between two readiness checks.
    pub delay: Duration,
    /// Number of re-checks before the request fails with `LoadTimeout`.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy { delay: Duration::from_secs(1), max_retries: 10 }
    }
}

/// Options that affect resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Maximum `<srai>`/`<sr>` nesting before a request is abandoned.
    pub max_redirect_depth: usize,
    pub retry: RetryPolicy,
    /// Seed for `<random>`. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Options { max_redirect_depth: 32, retry: RetryPolicy::default(), seed: None }
    }
}

/// How a resolve request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A category matched and produced text.
    Matched,
    /// A category matched but its template produced no text.
    Empty,
    /// No category matched (pattern and that-context).
    NoMatch,
    /// Redirects nested deeper than `Options::max_redirect_depth`.
    RedirectionLimit,
    /// Rule sources did not finish loading within the retry policy.
    LoadTimeout,
}

/// The category that won a resolve request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSummary {
    /// Position in the knowledge base.
    pub index: usize,
    pub source: SourceId,
    pub pattern: String,
    pub that: Option<String>,
    /// Wildcard captures with the casing of the input.
    pub captures: Vec<String>,
}

/// Result of [`Session::resolve`].
#[derive(Debug, Clone)]
pub struct Answer {
    pub answer: Option<String>,
    /// Captures of the winning match, upper-cased.
    pub wildcard_captures: Vec<String>,
    /// The input as given by the caller.
    pub input: String,
    pub outcome: Outcome,
    pub matched: Option<MatchSummary>,
    pub metrics: ResolveMetrics,
}

impl Answer {
    fn unanswered(input: &str, outcome: Outcome) -> Self {
        Answer {
            answer: None,
            wildcard_captures: Vec::new(),
            input: input.to_string(),
            outcome,
            matched: None,
            metrics: ResolveMetrics::default(),
        }
    }
}

/// A loaded bot: profile plus knowledge base, shared by any number of
/// sessions.
///
/// # Example
/// ```
/// use aimlite::{Bot, BotProfile, Session};
/// use std::sync::Arc;
///
/// let bot = Arc::new(Bot::new(BotProfile::new([("name", "Ada")])));
/// bot.load_str(r#"<aiml><category><pattern>WHAT IS YOUR NAME</pattern>
///     <template>My name is <bot name="name"/>.</template></category></aiml>"#)
///     .unwrap();
///
/// let mut session = Session::new(bot);
/// let answer = session.resolve_now("What is your name?").unwrap();
/// assert_eq!(answer.answer.as_deref(), Some("My name is Ada."));
/// ```
#[derive(Debug)]
pub struct Bot {
    profile: BotProfile,
    kb: RwLock<KnowledgeBase>,
    gate: ReadinessGate,
}

impl Bot {
    pub fn new(profile: BotProfile) -> Self {
        Bot { profile, kb: RwLock::new(KnowledgeBase::empty()), gate: ReadinessGate::new() }
    }

    pub fn profile(&self) -> &BotProfile {
        &self.profile
    }

    /// Parse one document and append its categories. Returns how many
    /// categories were added.
    pub fn load_str(&self, text: &str) -> Result<usize> {
        let generation = self.gate.request(1);
        self.commit(generation, parse_source(text)).unwrap_or(Ok(0))
    }

    /// Read and append documents in the given order.
    ///
    /// All documents are registered on the readiness gate up front, so a
    /// resolve issued while this runs waits for the whole batch. The first
    /// unreadable or malformed document stops the batch; documents before it
    /// stay loaded. A [`reload`](Self::reload) while the batch is running
    /// drops the rest of it.
    pub async fn load_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<usize> {
        let generation = self.gate.request(paths.len());
        self.load_requested(generation, paths).await
    }

    /// Load documents on a background task.
    ///
    /// The documents are registered on the readiness gate before this
    /// returns, so a resolve issued right after waits for them even if the
    /// task has not started yet. Must be called inside a tokio runtime.
    pub fn spawn_load(self: &Arc<Self>, paths: Vec<PathBuf>) -> JoinHandle<Result<usize>> {
        let generation = self.gate.request(paths.len());
        let bot = Arc::clone(self);
        tokio::spawn(async move { bot.load_requested(generation, &paths).await })
    }

    async fn load_requested<P: AsRef<Path>>(&self, generation: Generation, paths: &[P]) -> Result<usize> {
        let mut total = 0;
        for (idx, path) in paths.iter().enumerate() {
            let path = path.as_ref();
            let parsed = match tokio::fs::read_to_string(path).await {
                Ok(text) => parse_source(&text),
                Err(source) => Err(Error::Read { path: path.to_path_buf(), source }),
            };
            let Some(result) = self.commit(generation, parsed) else {
                info!(target: "aimlite::source", path = %path.display(), "bot reloaded, dropping stale rule sources");
                return Ok(total);
            };

            match result {
                Ok(count) => {
                    info!(target: "aimlite::source", path = %path.display(), categories = count, "rule source loaded");
                    total += count;
                }
                Err(err) => {
                    self.gate.abandon(generation, paths.len() - idx - 1);
                    return Err(err);
                }
            }
        }
        Ok(total)
    }

    /// Append one parsed document and settle it on the gate.
    ///
    /// Returns `None` without touching the knowledge base when the bot was
    /// reloaded after the document was requested. The write lock is held
    /// across the generation check so a concurrent `reload` cannot slip in
    /// between the check and the append.
    fn commit(&self, generation: Generation, parsed: Result<Vec<Category>>) -> Option<Result<usize>> {
        let mut kb = self.kb.write();
        if self.gate.generation() != generation {
            return None;
        }
        let result = parsed.map(|categories| {
            let count = categories.len();
            kb.append_source(categories);
            count
        });
        self.gate.settle(generation, result.is_ok());
        Some(result)
    }

    /// Drop every category and reset the readiness gate so new sources can
    /// be loaded without rebuilding the bot. Loads still in flight are
    /// discarded.
    pub fn reload(&self) {
        let mut kb = self.kb.write();
        kb.clear();
        self.gate.reset();
        drop(kb);
        info!(target: "aimlite::source", "knowledge base cleared");
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// `(documents requested, documents loaded)`.
    pub fn load_progress(&self) -> (usize, usize) {
        self.gate.progress()
    }

    pub fn category_count(&self) -> usize {
        self.kb.read().len()
    }

    pub fn knowledge(&self) -> RwLockReadGuard<'_, KnowledgeBase> {
        self.kb.read()
    }
}

/// One conversation against a shared [`Bot`].
#[derive(Debug)]
pub struct Session {
    bot: Arc<Bot>,
    state: ConversationState,
    options: Options,
    rng: StdRng,
}

impl Session {
    pub fn new(bot: Arc<Bot>) -> Self {
        Self::with_options(bot, Options::default())
    }

    pub fn with_options(bot: Arc<Bot>, options: Options) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Session { bot, state: ConversationState::new(), options, rng }
    }

    pub fn bot(&self) -> &Arc<Bot> {
        &self.bot
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Answer `input`, waiting for rule sources that are still loading.
    ///
    /// Never fails: a load timeout is reported as [`Outcome::LoadTimeout`]
    /// with no answer, and leaves the session untouched.
    pub async fn resolve(&mut self, input: &str) -> Answer {
        if let Err(err) = self.bot.gate.wait_ready(&self.options.retry).await {
            let (requested, loaded) = self.bot.load_progress();
            warn!(target: "aimlite::source", input, requested, loaded, error = %err, "giving up on request");
            return Answer::unanswered(input, Outcome::LoadTimeout);
        }
        self.resolve_loaded(input)
    }

    /// Answer `input` right away; `Error::NotReady` while sources are loading.
    pub fn resolve_now(&mut self, input: &str) -> Result<Answer> {
        if !self.bot.is_ready() {
            return Err(Error::NotReady);
        }
        Ok(self.resolve_loaded(input))
    }

    fn resolve_loaded(&mut self, input: &str) -> Answer {
        let kb = self.bot.kb.read();
        let resolution =
            Resolver::new(&kb, &self.bot.profile, &mut self.state, &mut self.rng, &self.options).resolve(input);

        let matched = resolution.matched.and_then(|index| kb.get(index).map(|c| (index, c))).map(|(index, c)| {
            MatchSummary {
                index,
                source: c.source,
                pattern: c.pattern.to_string(),
                that: c.that.as_ref().map(ToString::to_string),
                captures: resolution.captures.clone(),
            }
        });

        Answer {
            answer: resolution.answer,
            wildcard_captures: resolution.captures.iter().map(|c| c.to_uppercase()).collect(),
            input: input.to_string(),
            outcome: resolution.outcome,
            matched,
            metrics: resolution.metrics,
        }
    }

    // --- State pass-through ---------------------------------------------------

    pub fn update_state(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.state.set(name, value);
    }

    pub fn get_state(&self, name: &str) -> Option<&str> {
        self.state.get(name)
    }

    pub fn remove_state(&mut self, name: &str) {
        self.state.remove(name);
    }

    /// Copy of every stored variable.
    pub fn save_state(&self) -> HashMap<String, String> {
        self.state.variables().clone()
    }

    pub fn save_previous_answer(&self) -> String {
        self.state.previous_answer().to_string()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(&self.state)
    }

    /// Replace the conversation state with a saved one.
    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        self.state = snapshot.into_state();
    }

    /// Write the current state as a JSON snapshot.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.snapshot().write_to(path)
    }

    /// Restore from a JSON snapshot written by [`Session::save_to`].
    pub fn restore_from(&mut self, path: &Path) -> Result<()> {
        self.restore(SessionSnapshot::read_from(path)?);
        Ok(())
    }
}
