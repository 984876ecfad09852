//! Error types for malformed constraint documents

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::parser::DocumentFormat;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// A structurally invalid constraint document
///
/// This is the only hard error of the planner. Geometric problems are
/// reported as a failure outcome instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedInputError {
    #[error("{format} error: {message}")]
    Syntax {
        format: DocumentFormat,
        message: String,
        span: Option<Span>,
    },

    #[error("invalid plot: {reason}")]
    InvalidPlot { reason: String },

    #[error("invalid element {index} ('{kind}'): {reason}")]
    InvalidElement {
        index: usize,
        kind: String,
        reason: String,
    },

    #[error("duplicate element id '{id}'")]
    DuplicateId { id: String },
}

impl MalformedInputError {
    pub fn syntax(format: DocumentFormat, message: impl Into<String>, span: Option<Span>) -> Self {
        Self::Syntax {
            format,
            message: message.into(),
            span,
        }
    }

    pub fn invalid_plot(reason: impl Into<String>) -> Self {
        Self::InvalidPlot {
            reason: reason.into(),
        }
    }

    pub fn invalid_element(index: usize, kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidElement {
            index,
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    pub fn duplicate_id(id: impl Into<String>) -> Self {
        Self::DuplicateId { id: id.into() }
    }

    /// Format the error with source context using ariadne
    ///
    /// Errors without a source location fall back to their plain message.
    pub fn format(&self, source: &str, filename: &str) -> String {
        let (format, message, span) = match self {
            MalformedInputError::Syntax {
                format,
                message,
                span: Some(span),
            } => (format, message, span.clone()),
            other => return format!("error: {}\n", other),
        };

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_message(format!("invalid {} document", format))
            .with_label(
                Label::new((filename, span))
                    .with_message(message)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => format!("error: {}\n", self),
        }
    }
}
