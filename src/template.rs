//! Template tree.
//!
//! A category's `<template>` is compiled into a tree of [`TemplateNode`]s
//! once, when the rule source is loaded. The evaluator walks it read-only;
//! the only mutation during evaluation happens in the conversation state.

/// One node of a response template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateNode {
    /// Literal text, raw line breaks already collapsed.
    Text(String),
    /// `<get name=".."/>`
    Get { name: String },
    /// `<set name="..">value</set>`
    Set { name: String, children: Vec<TemplateNode> },
    /// `<bot name=".."/>`
    Bot { name: String },
    /// `<star/>`: last wildcard capture of the current match.
    Star,
    /// `<sr/>`: shorthand for `<srai><star/></srai>`.
    Sr,
    /// `<srai>..</srai>`: redirect to the category matching the resolved children.
    Srai(Vec<TemplateNode>),
    /// `<random>`: one alternative (usually `<li>`) is picked per evaluation.
    Random(Vec<TemplateNode>),
    Condition(Condition),
    Case { transform: CaseTransform, children: Vec<TemplateNode> },
    /// `<br/>`
    Br,
    /// `<think>`: evaluated for side effects only.
    Think(Vec<TemplateNode>),
    /// `<li>` outside of `<condition>`/`<random>`.
    Li(Vec<TemplateNode>),
    /// Transparent wrapper (`<template>` nested in a template).
    Container(Vec<TemplateNode>),
    /// Any tag the interpreter does not know. Echoed back as markup.
    Markup { tag: String, attributes: Vec<(String, String)>, children: Vec<TemplateNode> },
}

impl TemplateNode {
    pub fn text(text: impl Into<String>) -> Self {
        TemplateNode::Text(text.into())
    }

    /// Literal `*` or `_` used as the value of a `<set>`.
    pub(crate) fn is_wildcard_marker(&self) -> bool {
        matches!(self, TemplateNode::Text(t) if matches!(t.trim(), "*" | "_"))
    }

    pub(crate) fn is_blank_text(&self) -> bool {
        matches!(self, TemplateNode::Text(t) if t.trim().is_empty())
    }
}

/// The three `<condition>` shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// No attributes on `<condition>`; each `<li>` carries its own name/value.
    List(Vec<Branch>),
    /// `<condition name=".." value="..">` wrapping its content directly.
    Inline { name: String, value: String, children: Vec<TemplateNode> },
    /// `<condition name="..">` with `<li value="..">` branches.
    SingleVariable { name: String, branches: Vec<Branch> },
}

/// An `<li>` of a `<condition>`. A branch without `value` is the default.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Branch {
    pub name: Option<String>,
    pub value: Option<String>,
    pub children: Vec<TemplateNode>,
}

impl Branch {
    pub fn is_default(&self) -> bool {
        self.value.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseTransform {
    Uppercase,
    Lowercase,
    /// Capitalize the first letter of every word.
    Formal,
    /// Capitalize the first letter of the text.
    Sentence,
}

impl CaseTransform {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "uppercase" => Some(Self::Uppercase),
            "lowercase" => Some(Self::Lowercase),
            "formal" => Some(Self::Formal),
            "sentence" => Some(Self::Sentence),
            _ => None,
        }
    }

    pub fn apply(self, text: &str) -> String {
        match self {
            Self::Uppercase => text.to_uppercase(),
            Self::Lowercase => text.to_lowercase(),
            Self::Formal => text.split(' ').map(capitalize).collect::<Vec<_>>().join(" "),
            Self::Sentence => capitalize(text),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
