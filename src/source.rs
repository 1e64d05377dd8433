//! Rule sources: markup parsing, category compilation and the readiness gate
//! used while documents are still loading.

#[path = "source/compile.rs"]
mod compile;
#[path = "source/gate.rs"]
mod gate;
#[path = "source/markup.rs"]
pub mod markup;

pub use compile::compile_document;
pub(crate) use gate::{Generation, ReadinessGate};

use crate::{Category, Result};

/// Parse one rule-source document into its categories, in document order.
pub fn parse_source(text: &str) -> Result<Vec<Category>> {
    Ok(compile_document(&markup::parse(text)?))
}
