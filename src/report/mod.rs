//! Overview reports of the test bars in a data file

pub mod html;

use std::path::PathBuf;

use miette::Diagnostic;
use rust_embed::Embed;
use thiserror::Error;

use crate::io::{FormatSpecError, StoreError};

pub use html::{build_table, write_html_table, AttributeTable};

/// Templates and static assets compiled into the binary
#[derive(Embed)]
#[folder = "templates/"]
pub struct EmbeddedTemplates;

#[derive(Debug, Error, Diagnostic)]
pub enum ReportError {
    #[error("Got {formats} formats for {attrs} attributes")]
    #[diagnostic(
        code(cyclic::report::format_count),
        help("Give one format per attribute, or none at all")
    )]
    FormatCount { attrs: usize, formats: usize },

    #[error("Embedded template '{0}' not found")]
    #[diagnostic(code(cyclic::report::missing_template))]
    MissingTemplate(String),

    #[error("Template error: {0}")]
    #[diagnostic(code(cyclic::report::template))]
    Template(#[from] tera::Error),

    #[error("Failed to write {path}")]
    #[diagnostic(code(cyclic::report::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Format(#[from] FormatSpecError),
}
