//! Markup tree → categories.
//!
//! ```text
//! <aiml>
//!   <topic name="..">          (any non-category wrapper is descended into)
//!     <category>
//!       <pattern>..</pattern>  -> PatternSpec (text, <bot/>, <get/>)
//!       <that>..</that>        -> Option<PatternSpec>
//!       <template>..</template>-> Vec<TemplateNode>
//!     </category>
//! ```
//!
//! Compilation never fails on a single bad category: a category without a
//! `<pattern>` is skipped with a warning, and unknown template tags are kept
//! as [`TemplateNode::Markup`] so they can be echoed back.

use super::markup::{Element, Node};
use crate::engine::normalize::collapse_line_breaks;
use crate::{Branch, CaseTransform, Category, Condition, PatternPart, PatternSpec, TemplateNode};
use tracing::warn;

/// Collect every category of a parsed document, in document order.
pub fn compile_document(document: &Element) -> Vec<Category> {
    let mut categories = Vec::new();
    collect_categories(document, &mut categories);
    categories
}

fn collect_categories(element: &Element, out: &mut Vec<Category>) {
    for child in element.elements() {
        if child.is("category") {
            if let Some(category) = compile_category(child) {
                out.push(category);
            }
        } else {
            collect_categories(child, out);
        }
    }
}

fn compile_category(element: &Element) -> Option<Category> {
    let Some(pattern) = element.child("pattern") else {
        warn!(target: "aimlite::source", "skipping <category> without <pattern>");
        return None;
    };
    let that = element.child("that").map(compile_pattern);
    let template = element.child("template").map(|t| compile_nodes(&t.children)).unwrap_or_default();

    Some(Category::new(compile_pattern(pattern), that, template))
}

fn compile_pattern(element: &Element) -> PatternSpec {
    let parts = element
        .children
        .iter()
        .map(|node| match node {
            Node::Text(text) => PatternPart::Text(text.clone()),
            Node::Element(e) if e.is("bot") => PatternPart::Bot(name_attr(e)),
            Node::Element(e) if e.is("get") => PatternPart::Get(name_attr(e)),
            Node::Element(e) => PatternPart::Text(e.text()),
        })
        .collect();
    PatternSpec::new(parts)
}

pub(crate) fn compile_nodes(nodes: &[Node]) -> Vec<TemplateNode> {
    nodes.iter().map(compile_node).collect()
}

fn compile_node(node: &Node) -> TemplateNode {
    match node {
        Node::Text(text) => TemplateNode::Text(collapse_line_breaks(text)),
        Node::Element(element) => compile_element(element),
    }
}

fn compile_element(element: &Element) -> TemplateNode {
    let tag = element.name.to_ascii_lowercase();
    let children = || compile_nodes(&element.children);

    match tag.as_str() {
        "bot" => TemplateNode::Bot { name: name_attr(element) },
        "get" => TemplateNode::Get { name: name_attr(element) },
        "set" => TemplateNode::Set { name: name_attr(element), children: children() },
        "star" => TemplateNode::Star,
        "sr" => TemplateNode::Sr,
        "srai" => TemplateNode::Srai(children()),
        "random" => TemplateNode::Random(element.elements().map(compile_element).collect()),
        "condition" => TemplateNode::Condition(compile_condition(element)),
        "br" => TemplateNode::Br,
        "think" => TemplateNode::Think(children()),
        "li" => TemplateNode::Li(children()),
        "template" => TemplateNode::Container(children()),
        _ => match CaseTransform::from_tag(&tag) {
            Some(transform) => TemplateNode::Case { transform, children: children() },
            None => TemplateNode::Markup {
                tag: element.name.clone(),
                attributes: element.attributes.clone(),
                children: children(),
            },
        },
    }
}

/// The condition shape is picked from the attributes on `<condition>` itself.
fn compile_condition(element: &Element) -> Condition {
    match (element.attr("name"), element.attr("value")) {
        (Some(name), Some(value)) => Condition::Inline {
            name: name.to_string(),
            value: value.to_string(),
            children: compile_nodes(&element.children),
        },
        (Some(name), None) => Condition::SingleVariable { name: name.to_string(), branches: compile_branches(element) },
        _ => Condition::List(compile_branches(element)),
    }
}

fn compile_branches(element: &Element) -> Vec<Branch> {
    element
        .elements()
        .filter(|li| li.is("li"))
        .map(|li| Branch {
            name: li.attr("name").map(str::to_string),
            value: li.attr("value").map(str::to_string),
            children: compile_nodes(&li.children),
        })
        .collect()
}

fn name_attr(element: &Element) -> String {
    element.attr("name").unwrap_or_default().to_string()
}
