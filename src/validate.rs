//! Post-condition checks of the minification pipeline.

use crate::error::{self, Error};
use crate::template::TemplatePart;

/// Trait for validating the pipeline's per-template post-conditions.
pub trait Validation {
	/// Check the placeholder produced by the strategy, before minification.
	fn check_placeholder(&self, placeholder: &str) -> Result<(), Error>;

	/// Check the result of splitting the minified text against the original parts.
	fn check_split(&self, parts: &[TemplatePart], split: &[String]) -> Result<(), Error>;
}

/// The default validation.
///
/// Requires a non-empty placeholder and an exactly matching part count.
#[derive(Debug)]
pub struct DefaultValidation;

impl Validation for DefaultValidation {
	fn check_placeholder(&self, placeholder: &str) -> Result<(), Error> {
		if placeholder.is_empty() {
			return Err(error::InvalidPlaceholder {
				placeholder: placeholder.to_owned(),
			}
			.into());
		}
		Ok(())
	}

	fn check_split(&self, parts: &[TemplatePart], split: &[String]) -> Result<(), Error> {
		if parts.len() != split.len() {
			return Err(error::PartCountMismatch {
				expected: parts.len(),
				actual: split.len(),
			}
			.into());
		}
		Ok(())
	}
}

/// Which validation the pipeline runs.
#[derive(Clone, Copy, Default)]
pub enum Validate<'a> {
	/// Run [`DefaultValidation`].
	#[default]
	Enabled,

	/// Run no validation.
	///
	/// A broken strategy then corrupts output silently. The pipeline itself
	/// stays safe: overwrites are paired positionally and stop at the
	/// shorter of the part list and the split result.
	Disabled,

	/// Run a custom validation.
	Custom(&'a dyn Validation),
}

impl std::fmt::Debug for Validate<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Enabled => f.write_str("Enabled"),
			Self::Disabled => f.write_str("Disabled"),
			Self::Custom(_) => f.write_str("Custom(..)"),
		}
	}
}

impl Validate<'_> {
	/// Get the validation to run, if any.
	pub fn as_validation(&self) -> Option<&dyn Validation> {
		match self {
			Self::Enabled => Some(&DefaultValidation),
			Self::Disabled => None,
			Self::Custom(validation) => Some(*validation),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use assert2::{check, let_assert};

	fn part(text: &str) -> TemplatePart {
		TemplatePart {
			text: text.to_owned(),
			start: 0,
			end: text.len(),
		}
	}

	#[test]
	fn test_placeholder_must_be_non_empty() {
		check!(let Ok(()) = DefaultValidation.check_placeholder("@TEMPLATE_EXPRESSION();"));
		let_assert!(Err(Error::InvalidPlaceholder(_)) = DefaultValidation.check_placeholder(""));
	}

	#[test]
	fn test_split_must_preserve_part_count() {
		let parts = [part("<b>"), part("</b>")];
		check!(let Ok(()) = DefaultValidation.check_split(&parts, &["<b>".into(), "</b>".into()]));

		let_assert!(Err(Error::PartCountMismatch(e)) = DefaultValidation.check_split(&parts, &["<b></b>".into()]));
		check!(e.expected == 2);
		check!(e.actual == 1);
	}

	#[test]
	fn test_validate_selector() {
		check!(let Some(_) = Validate::Enabled.as_validation());
		check!(let None = Validate::Disabled.as_validation());
		check!(let Some(_) = Validate::Custom(&DefaultValidation).as_validation());
	}
}
