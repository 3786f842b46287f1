use std::error::Error as StdError;

use geoextent_core::error::ExtentError;
use thiserror::Error;
use yansi::{Condition, Paint};

use super::InputElement;

/// The maximum number of characters of an element shown in error messages
const MAX_SNIPPET_LEN: usize = 100;

/// An error that happened while computing an extent
#[derive(Error, Debug)]
pub enum InputError {
    #[error("{0}")]
    Element(String),

    #[error(transparent)]
    Extent(ExtentError),
}

/// Convert an [`ExtentError`] into an [`InputError`] that points to the
/// offending element
pub trait IntoInputError {
    fn into_input_error(self, elements: &[InputElement]) -> InputError;
}

/// Returns the first line of the element, shortened if necessary
fn snippet(xml: &str) -> String {
    let first_line = xml.lines().next().unwrap_or_default().trim_end();
    let mut result = first_line.chars().take(MAX_SNIPPET_LEN).collect::<String>();
    if result.len() < xml.trim_end().len() {
        result.push_str(" …");
    }
    result
}

/// Joins the messages of an error and all its sources
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut result = err.to_string();
    let mut source = err.source();
    while let Some(s) = source {
        result.push_str(": ");
        result.push_str(&s.to_string());
        source = s.source();
    }
    result
}

impl IntoInputError for ExtentError {
    fn into_input_error(self, elements: &[InputElement]) -> InputError {
        let (index, source) = match &self {
            ExtentError::Element { index, source } => (*index, source),
            ExtentError::EmptyInput => return InputError::Extent(self),
        };
        let Some(element) = elements.get(index) else {
            return InputError::Extent(self);
        };

        let location = format!("{}:{}", element.file.display(), element.line);
        InputError::Element(
            format!(
                "Unable to process element #{} at {}\n\n{}\n{}{}",
                index + 1,
                location.bold(),
                snippet(&element.xml),
                "╰── ".red(),
                error_chain(source).red().bold()
            )
            .whenever(Condition::from(|| {
                Condition::stderr_is_tty() && Condition::clicolor() && Condition::no_color()
            }))
            .to_string(),
        )
    }
}
