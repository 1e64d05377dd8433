//! Error types for loading rule sources and managing sessions.
//!
//! Resolution itself never fails: "no match", redirect loops and load
//! timeouts are reported through [`crate::Outcome`]. The variants here cover
//! the host-level failures the caller has to act on.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read rule source '{path}': {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("Malformed rule source: {0}")]
    Markup(#[from] quick_xml::Error),

    #[error("Malformed rule source: unexpected closing tag </{found}>")]
    UnbalancedTag { found: String },

    #[error("Invalid configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Failed to access session snapshot '{path}': {reason}")]
    Snapshot { path: PathBuf, reason: String },

    #[error("Rule sources are still loading")]
    NotReady,

    #[error("Rule sources did not finish loading after {attempts} attempts")]
    LoadTimeout { attempts: u32 },
}

impl Error {
    /// Stable identifier for the error kind, used by the CLI report.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "READ_ERROR",
            Self::Markup(_) | Self::UnbalancedTag { .. } => "MARKUP_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Snapshot { .. } => "SNAPSHOT_ERROR",
            Self::NotReady => "NOT_READY",
            Self::LoadTimeout { .. } => "LOAD_TIMEOUT",
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
