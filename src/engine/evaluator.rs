//! Template evaluation.
//!
//! Two entry points mirror the two ways a fragment of template is consumed:
//!
//! - [`Resolver::find_response_text`] decides whether a fragment produces an
//!   answer at all. Blank text is skipped and `<template>` wrappers are
//!   descended into; the first decisive child triggers resolution of the
//!   whole sibling list. A fragment that resolves to nothing is `None`.
//! - [`Resolver::resolve_nodes`] concatenates the output of a node list left
//!   to right, applying side effects in the same order. A `<set>` executed by
//!   one node is visible to a `<get>` in a later sibling.
//!
//! Every nested resolution is trimmed before it is joined with its siblings,
//! so indentation inside the rule source never leaks into answers.

use super::normalize::clean_output;
use super::resolver::{Frame, Resolver};
use crate::{Branch, Condition, TemplateNode};
use rand::Rng;
use tracing::debug;

impl Resolver<'_> {
    /// Resolve a category's template (or a `<random>`/`<condition>` branch
    /// treated as one).
    pub(super) fn find_response_text(&mut self, nodes: &[TemplateNode], frame: &mut Frame) -> Option<String> {
        for node in nodes {
            match node {
                TemplateNode::Container(children) if nodes.len() == 1 => {
                    return self.find_response_text(children, frame);
                }
                _ if node.is_blank_text() => continue,
                _ => {
                    let text = self.resolve_nodes(nodes, frame);
                    return (!text.is_empty()).then_some(text);
                }
            }
        }
        None
    }

    pub(super) fn resolve_nodes(&mut self, nodes: &[TemplateNode], frame: &mut Frame) -> String {
        let mut text = String::new();
        for node in nodes {
            let piece = self.resolve_node(node, frame);
            text.push_str(&piece);
        }
        clean_output(&text)
    }

    fn resolve_node(&mut self, node: &TemplateNode, frame: &mut Frame) -> String {
        match node {
            TemplateNode::Text(text) => text.clone(),
            TemplateNode::Bot { name } => self.profile.get(name).unwrap_or_default().to_string(),
            TemplateNode::Get { name } => self.state.get(name).unwrap_or_default().to_string(),
            TemplateNode::Set { name, children } => {
                let value = self.resolve_set_value(name, children, frame);
                self.state.set(name.clone(), value.clone());
                value
            }
            TemplateNode::Star => self.state.last_wildcard().to_string(),
            TemplateNode::Case { transform, children } => transform.apply(&self.resolve_nodes(children, frame)),
            TemplateNode::Br => "\n".to_string(),
            TemplateNode::Think(children) => {
                self.resolve_nodes(children, frame);
                String::new()
            }
            TemplateNode::Sr => {
                let input = self.state.last_wildcard().to_string();
                if input.is_empty() {
                    return String::new();
                }
                self.redirect(&input, frame.depth)
            }
            TemplateNode::Srai(children) => {
                let input = self.resolve_nodes(children, frame);
                self.redirect(&input, frame.depth)
            }
            TemplateNode::Random(choices) => self.resolve_random(choices, frame),
            TemplateNode::Condition(condition) => self.resolve_condition(condition, frame),
            TemplateNode::Li(children) | TemplateNode::Container(children) => self.resolve_nodes(children, frame),
            TemplateNode::Markup { tag, attributes, children } => {
                let inner = self.resolve_nodes(children, frame);
                render_markup(tag, attributes, &inner)
            }
        }
    }

    /// Value stored by `<set>`.
    ///
    /// `<set name="x"><star/></set>` and `<set name="x">*</set>` take the
    /// next capture not yet consumed by an earlier `<set>` of the same
    /// template, so `<set name="a"><star/></set><set name="b"><star/></set>`
    /// stores the first and second wildcard respectively.
    fn resolve_set_value(&mut self, name: &str, children: &[TemplateNode], frame: &mut Frame) -> String {
        match children.first() {
            None => {
                debug!(target: "aimlite::engine", name, "<set> without value, storing empty string");
                String::new()
            }
            Some(TemplateNode::Star) => frame.take_capture(),
            Some(first) if first.is_wildcard_marker() => frame.take_capture(),
            Some(_) => self.resolve_nodes(children, frame),
        }
    }

    fn resolve_random(&mut self, choices: &[TemplateNode], frame: &mut Frame) -> String {
        if choices.is_empty() {
            return String::new();
        }
        let pick = self.rng.random_range(0..choices.len());
        let fragment = match &choices[pick] {
            TemplateNode::Li(children) => children.as_slice(),
            other => std::slice::from_ref(other),
        };
        self.find_response_text(fragment, frame).unwrap_or_default()
    }

    fn resolve_condition(&mut self, condition: &Condition, frame: &mut Frame) -> String {
        match condition {
            Condition::List(branches) => {
                let chosen = branches.iter().find(|b| match (&b.name, &b.value) {
                    (_, None) => true,
                    (Some(name), Some(value)) => self.state.get(name) == Some(value.as_str()),
                    (None, Some(_)) => false,
                });
                match chosen {
                    Some(branch) => self.find_response_text(&branch.children, frame).unwrap_or_default(),
                    None => String::new(),
                }
            }
            Condition::Inline { name, value, children } => {
                if self.state.get(name) == Some(value.as_str()) {
                    self.resolve_nodes(children, frame)
                } else {
                    String::new()
                }
            }
            Condition::SingleVariable { name, branches } => {
                let current = self.state.get(name);
                let chosen: Option<&Branch> =
                    branches.iter().find(|b| b.value.as_deref().is_none_or(|value| current == Some(value)));
                match chosen {
                    Some(branch) => self.resolve_nodes(&branch.children, frame),
                    None => String::new(),
                }
            }
        }
    }
}

/// Echo an unknown tag back as markup: `<img src="GIF"/>`.
fn render_markup(tag: &str, attributes: &[(String, String)], inner: &str) -> String {
    let mut out = format!("<{tag}");
    for (key, value) in attributes {
        out.push_str(&format!(" {key}=\"{}\"", quick_xml::escape::escape(value.as_str())));
    }
    if inner.is_empty() {
        out.push_str("/>");
    } else {
        out.push_str(&format!(">{inner}</{tag}>"));
    }
    out
}
