//! Output surface for command results
//!
//! Every command prints either the human text lines or exactly one pretty
//! JSON document on stdout. Progress and warnings go to stderr so JSON
//! output stays machine-parseable.

use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }

    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Render a result document as pretty JSON
pub fn render_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Print one pretty JSON document to stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", render_json(value)?);
    Ok(())
}
