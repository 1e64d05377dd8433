extern crate self as aimlite;

use once_cell::sync::OnceCell;

#[macro_use]
mod macros;
mod api;
mod config;
mod engine;
mod error;
mod source;
mod state;
mod template;

pub use api::{Answer, Bot, MatchSummary, Options, Outcome, RetryPolicy, Session};
pub use config::{DEFAULT_CONFIG_FILE, EngineConfig, Settings};
pub use engine::{Matcher, ResolveMetrics, match_pattern};
pub use error::{Error, Result};
pub use source::{compile_document, markup, parse_source};
pub use state::{BotProfile, ConversationState, SessionSnapshot};
pub use template::{Branch, CaseTransform, Condition, TemplateNode};

// --- Patterns ---------------------------------------------------------------

/// One piece of a `<pattern>` or `<that>` element.
///
/// Patterns are mostly literal text, but may embed `<bot name=".."/>` and
/// `<get name=".."/>` which are looked up (and upper-cased) every time the
/// category is tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternPart {
    Text(String),
    Bot(String),
    Get(String),
}

/// A pattern as declared in a rule source, before references are resolved.
#[derive(Debug, Default)]
pub struct PatternSpec {
    parts: Vec<PatternPart>,
    /// Compiled matcher, only populated for patterns without references.
    compiled: OnceCell<Option<Matcher>>,
}

impl PatternSpec {
    pub fn new(parts: Vec<PatternPart>) -> Self {
        PatternSpec { parts, compiled: OnceCell::new() }
    }

    /// Shorthand for a pattern made of literal text only.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::new(vec![PatternPart::Text(text.into())])
    }

    pub fn parts(&self) -> &[PatternPart] {
        &self.parts
    }

    /// True when the pattern text depends on bot attributes or variables.
    pub fn is_dynamic(&self) -> bool {
        self.parts.iter().any(|p| !matches!(p, PatternPart::Text(_)))
    }

    /// Render the pattern to plain text against the current profile and state.
    ///
    /// Parts are joined with a space; the matcher collapses whitespace, so
    /// `MY NAME IS <bot name="name"/>` and `MY NAME IS<bot name="name"/>`
    /// compile to the same matcher.
    pub fn render(&self, profile: &BotProfile, state: &ConversationState) -> String {
        self.parts
            .iter()
            .map(|part| match part {
                PatternPart::Text(t) => t.clone(),
                PatternPart::Bot(name) => profile.get(name).unwrap_or_default().to_uppercase(),
                PatternPart::Get(name) => state.get(name).unwrap_or_default().to_uppercase(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Cached matcher for static patterns; `None` for dynamic ones and for
    /// patterns that fail to compile (logged once, on first use).
    pub(crate) fn cached_matcher(&self) -> Option<&Matcher> {
        if self.is_dynamic() {
            return None;
        }
        self.compiled.get_or_init(|| engine::compile_or_warn(&self.render_static())).as_ref()
    }

    fn render_static(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                PatternPart::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Clone for PatternSpec {
    fn clone(&self) -> Self {
        PatternSpec::new(self.parts.clone())
    }
}

impl std::fmt::Display for PatternSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for part in &self.parts {
            match part {
                PatternPart::Text(t) => f.write_str(t)?,
                PatternPart::Bot(name) => write!(f, "<bot name=\"{name}\"/>")?,
                PatternPart::Get(name) => write!(f, "<get name=\"{name}\"/>")?,
            }
        }
        Ok(())
    }
}

// --- Categories --------------------------------------------------------------

/// Index of the rule source (document) a category was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub usize);

/// One compiled rule: `pattern`, optional `that` context and the
/// unevaluated `template` children.
#[derive(Debug, Clone)]
pub struct Category {
    pub pattern: PatternSpec,
    /// Absent means "matches any previous answer".
    pub that: Option<PatternSpec>,
    pub template: Vec<TemplateNode>,
    pub source: SourceId,
}

impl Category {
    pub fn new(pattern: PatternSpec, that: Option<PatternSpec>, template: Vec<TemplateNode>) -> Self {
        Category { pattern, that, template, source: SourceId(0) }
    }
}

// --- KnowledgeBase: ordered container for categories -------------------------

/// All loaded categories, in load order then document order.
///
/// Matching is first-match, so this order is the only tie-break between
/// overlapping patterns.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    categories: Vec<Category>,
    sources: usize,
}

impl KnowledgeBase {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Number of documents appended so far.
    pub fn source_count(&self) -> usize {
        self.sources
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Category> {
        self.categories.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Category> {
        self.categories.get(index)
    }

    /// Append the categories of one document, tagging them with a fresh
    /// `SourceId`.
    pub fn append_source(&mut self, categories: Vec<Category>) -> SourceId {
        let id = SourceId(self.sources);
        self.sources += 1;
        self.categories.extend(categories.into_iter().map(|mut c| {
            c.source = id;
            c
        }));
        id
    }

    pub fn clear(&mut self) {
        self.categories.clear();
        self.sources = 0;
    }
}

impl<'a> IntoIterator for &'a KnowledgeBase {
    type Item = &'a Category;
    type IntoIter = std::slice::Iter<'a, Category>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
