//! Module containing error details.

/// An error that can occur while minifying tagged template literals.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub enum Error {
	/// The source text contains a template literal without a closing backtick.
	UnterminatedTemplate(UnterminatedTemplate),

	/// The source text contains a template expression without a closing brace.
	UnterminatedExpression(UnterminatedExpression),

	/// A custom locator failed to produce a template list.
	LocatorFailed(LocatorFailed),

	/// The strategy produced an invalid placeholder.
	InvalidPlaceholder(InvalidPlaceholder),

	/// Splitting the minified text produced the wrong number of parts.
	PartCountMismatch(PartCountMismatch),

	/// The minification engine reported one or more errors.
	Minification(Minification),

	/// An edit with an invalid range was handed to the rewrite buffer.
	InvalidEdit(InvalidEdit),

	/// An edit overlaps an edit already recorded in the rewrite buffer.
	OverlappingEdit(OverlappingEdit),
}

impl From<UnterminatedTemplate> for Error {
	fn from(other: UnterminatedTemplate) -> Self {
		Self::UnterminatedTemplate(other)
	}
}

impl From<UnterminatedExpression> for Error {
	fn from(other: UnterminatedExpression) -> Self {
		Self::UnterminatedExpression(other)
	}
}

impl From<LocatorFailed> for Error {
	fn from(other: LocatorFailed) -> Self {
		Self::LocatorFailed(other)
	}
}

impl From<InvalidPlaceholder> for Error {
	fn from(other: InvalidPlaceholder) -> Self {
		Self::InvalidPlaceholder(other)
	}
}

impl From<PartCountMismatch> for Error {
	fn from(other: PartCountMismatch) -> Self {
		Self::PartCountMismatch(other)
	}
}

impl From<Minification> for Error {
	fn from(other: Minification) -> Self {
		Self::Minification(other)
	}
}

impl From<InvalidEdit> for Error {
	fn from(other: InvalidEdit) -> Self {
		Self::InvalidEdit(other)
	}
}

impl From<OverlappingEdit> for Error {
	fn from(other: OverlappingEdit) -> Self {
		Self::OverlappingEdit(other)
	}
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::UnterminatedTemplate(e) => e.fmt(f),
			Self::UnterminatedExpression(e) => e.fmt(f),
			Self::LocatorFailed(e) => e.fmt(f),
			Self::InvalidPlaceholder(e) => e.fmt(f),
			Self::PartCountMismatch(e) => e.fmt(f),
			Self::Minification(e) => e.fmt(f),
			Self::InvalidEdit(e) => e.fmt(f),
			Self::OverlappingEdit(e) => e.fmt(f),
		}
	}
}

/// The source text contains a template literal without a closing backtick.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct UnterminatedTemplate {
	/// The byte offset within the input where the error occurs.
	///
	/// This points to the opening backtick of the template literal.
	pub position: usize,
}

impl std::error::Error for UnterminatedTemplate {}

impl std::fmt::Display for UnterminatedTemplate {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Unterminated template literal")
	}
}

/// The source text contains a template expression without a closing brace.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct UnterminatedExpression {
	/// The byte offset within the input where the error occurs.
	///
	/// This points to the `${` that opens the expression.
	pub position: usize,
}

impl std::error::Error for UnterminatedExpression {}

impl std::fmt::Display for UnterminatedExpression {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Unterminated template expression")
	}
}

/// A custom locator failed to produce a template list.
///
/// The bundled locator reports [`UnterminatedTemplate`] or [`UnterminatedExpression`] instead.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct LocatorFailed {
	/// A message describing the failure.
	pub message: String,
}

impl std::error::Error for LocatorFailed {}

impl std::fmt::Display for LocatorFailed {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Locator failed: {}", self.message)
	}
}

/// The strategy produced an invalid placeholder.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct InvalidPlaceholder {
	/// The offending placeholder.
	pub placeholder: String,
}

impl std::error::Error for InvalidPlaceholder {}

impl std::fmt::Display for InvalidPlaceholder {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Strategy must produce a non-empty placeholder string")
	}
}

/// Splitting the minified text produced the wrong number of parts.
///
/// This means the minifier mangled the placeholder in a way the
/// CSS option adjustment did not anticipate.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct PartCountMismatch {
	/// The number of parts in the original template.
	pub expected: usize,

	/// The number of parts produced by the split.
	pub actual: usize,
}

impl std::error::Error for PartCountMismatch {}

impl std::fmt::Display for PartCountMismatch {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(
			f,
			"Splitting the minified text must produce as many parts as the template: expected {}, got {}",
			self.expected, self.actual,
		)
	}
}

/// The minification engine reported one or more errors.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct Minification {
	/// All messages reported by the engine.
	pub errors: Vec<String>,
}

impl std::error::Error for Minification {}

impl std::fmt::Display for Minification {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "{}", self.errors.join("\n\n"))
	}
}

/// An edit with an invalid range was handed to the rewrite buffer.
///
/// The range is empty, out of bounds or not aligned to character boundaries.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct InvalidEdit {
	/// The start offset of the rejected edit.
	pub start: usize,

	/// The end offset of the rejected edit.
	pub end: usize,

	/// The length of the text the buffer was constructed from.
	pub len: usize,
}

impl std::error::Error for InvalidEdit {}

impl std::fmt::Display for InvalidEdit {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Invalid edit range {}..{} for text of length {}", self.start, self.end, self.len)
	}
}

/// An edit overlaps an edit already recorded in the rewrite buffer.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct OverlappingEdit {
	/// The start offset of the rejected edit.
	pub start: usize,

	/// The end offset of the rejected edit.
	pub end: usize,

	/// The start offset of the previously recorded edit.
	pub prev_start: usize,

	/// The end offset of the previously recorded edit.
	pub prev_end: usize,
}

impl std::error::Error for OverlappingEdit {}

impl std::fmt::Display for OverlappingEdit {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(
			f,
			"Overlapping edits: {}..{} overlaps {}..{}",
			self.start, self.end, self.prev_start, self.prev_end,
		)
	}
}

impl Error {
	/// Get the range in the source text that contains the error.
	///
	/// Only available for errors that point into the source text.
	pub fn source_range(&self) -> Option<std::ops::Range<usize>> {
		let (start, len) = match &self {
			Self::UnterminatedTemplate(e) => (e.position, 1),
			Self::UnterminatedExpression(e) => (e.position, 2),
			Self::OverlappingEdit(e) => (e.start, e.end - e.start),
			_ => return None,
		};
		Some(std::ops::Range {
			start,
			end: start + len,
		})
	}

	/// Get the line of source that contains the error.
	///
	/// Returns [`None`] for errors that do not point into the source text.
	///
	/// # Panics
	/// May panic if the source text is not the original source that contains the error.
	pub fn source_line<'a>(&self, source: &'a str) -> Option<&'a str> {
		let position = self.source_range()?.start;
		let start = line_start(source, position);
		let end = line_end(source, position);
		Some(&source[start..end])
	}

	/// Write source highlighting for the error location.
	///
	/// The highlighting ends with a newline.
	/// Nothing is written for errors that do not point into the source text.
	///
	/// Note: this function doesn't print anything if the source line exceeds 60 characters in width.
	/// For more control over this behaviour, consider using [`Self::source_range()`] and [`Self::source_line()`] instead.
	pub fn write_source_highlighting(&self, f: &mut impl std::fmt::Write, source: &str) -> std::fmt::Result {
		use unicode_width::UnicodeWidthStr;

		let range = match self.source_range() {
			Some(range) => range,
			None => return Ok(()),
		};
		let line = match self.source_line(source) {
			Some(line) => line,
			None => return Ok(()),
		};
		if line.width() > 60 {
			return Ok(());
		}
		let line_offset = line_start(source, range.start);
		let range = range.start - line_offset..(range.end - line_offset).min(line.len());
		write!(f, "  {}\n  ", line)?;
		write_underline(f, line, range)?;
		writeln!(f)
	}

	/// Get source highlighting for the error location as a string.
	///
	/// The highlighting ends with a newline.
	/// The string is empty for errors that do not point into the source text.
	pub fn source_highlighting(&self, source: &str) -> String {
		let mut output = String::new();
		self.write_source_highlighting(&mut output, source).unwrap();
		output
	}
}

fn line_start(source: &str, position: usize) -> usize {
	match source.as_bytes()[..position].iter().rposition(|&c| c == b'\n' || c == b'\r') {
		Some(line_end) => line_end + 1,
		None => 0,
	}
}

fn line_end(source: &str, position: usize) -> usize {
	match source.as_bytes()[position..].iter().position(|&c| c == b'\n' || c == b'\r') {
		Some(line_end) => position + line_end,
		None => source.len(),
	}
}

fn write_underline(f: &mut impl std::fmt::Write, line: &str, range: std::ops::Range<usize>) -> std::fmt::Result {
	use unicode_width::UnicodeWidthStr;
	let spaces = line[..range.start].width();
	let carets = line[range].width();
	write!(f, "{}", " ".repeat(spaces))?;
	write!(f, "{}", "^".repeat(carets))?;
	Ok(())
}
