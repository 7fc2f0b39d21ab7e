//! The rewrite buffer: ordered disjoint range edits over the original text.

use crate::error::{self, Error};

/// An ordered mutable view over one source text.
///
/// The buffer keeps the original text untouched and accumulates range
/// replacements. Replacement ranges never overlap; the invariant is enforced
/// when an edit is recorded, not left to caller discipline. The final text
/// is materialized in one pass by [`render()`][Self::render].
///
/// Each pipeline invocation owns its buffer; nothing is shared process-wide.
#[derive(Debug)]
pub struct RewriteBuffer<'a> {
	source: &'a str,
	edits: Vec<Edit>,
}

/// One recorded range replacement.
#[derive(Debug, Clone)]
struct Edit {
	start: usize,
	end: usize,
	replacement: String,
}

impl<'a> RewriteBuffer<'a> {
	/// Create a buffer over the original text.
	pub fn new(source: &'a str) -> Self {
		Self {
			source,
			edits: Vec::new(),
		}
	}

	/// Get the original text.
	#[inline]
	pub fn source(&self) -> &'a str {
		self.source
	}

	/// Replace an exact range of the original text.
	///
	/// The range must be non-empty, in bounds, on character boundaries, and
	/// must not overlap any previously recorded edit. Edits may be recorded
	/// in any order.
	pub fn overwrite(&mut self, start: usize, end: usize, replacement: String) -> Result<(), Error> {
		if start >= end
			|| end > self.source.len()
			|| !self.source.is_char_boundary(start)
			|| !self.source.is_char_boundary(end)
		{
			return Err(error::InvalidEdit {
				start,
				end,
				len: self.source.len(),
			}
			.into());
		}
		let index = self.edits.partition_point(|edit| edit.start < start);
		if let Some(next) = self.edits.get(index) {
			if end > next.start {
				return Err(error::OverlappingEdit {
					start,
					end,
					prev_start: next.start,
					prev_end: next.end,
				}
				.into());
			}
		}
		if index > 0 {
			let prev = &self.edits[index - 1];
			if prev.end > start {
				return Err(error::OverlappingEdit {
					start,
					end,
					prev_start: prev.start,
					prev_end: prev.end,
				}
				.into());
			}
		}
		self.edits.insert(
			index,
			Edit {
				start,
				end,
				replacement,
			},
		);
		Ok(())
	}

	/// Materialize the final text.
	pub fn render(&self) -> String {
		let mut output = String::with_capacity(self.source.len());
		let mut finger = 0;
		for edit in &self.edits {
			output.push_str(&self.source[finger..edit.start]);
			output.push_str(&edit.replacement);
			finger = edit.end;
		}
		output.push_str(&self.source[finger..]);
		output
	}

	/// Generate a v3 source map relating rendered positions back to the original text.
	///
	/// The map's file is `{file_name}.map` and its single source is `{file_name}`.
	/// A token is emitted at the start of every unchanged run, after every
	/// line break inside one, and at the start of every replacement.
	#[cfg(feature = "sourcemap")]
	#[cfg_attr(feature = "doc-cfg", doc(cfg(feature = "sourcemap")))]
	pub fn generate_map(&self, file_name: &str) -> sourcemap::SourceMap {
		let map_name = format!("{file_name}.map");
		let mut builder = sourcemap::SourceMapBuilder::new(Some(&map_name));
		let mut out = Position::default();
		let mut src = Position::default();
		let mut finger = 0;
		for edit in &self.edits {
			self.map_unchanged(&mut builder, &mut out, &mut src, finger..edit.start, file_name);
			if !edit.replacement.is_empty() {
				builder.add(out.line, out.column, src.line, src.column, Some(file_name), None, false);
			}
			advance(&edit.replacement, &mut out);
			advance(&self.source[edit.start..edit.end], &mut src);
			finger = edit.end;
		}
		self.map_unchanged(&mut builder, &mut out, &mut src, finger..self.source.len(), file_name);
		builder.into_sourcemap()
	}

	/// Emit tokens for an unchanged run of the original text.
	#[cfg(feature = "sourcemap")]
	fn map_unchanged(
		&self,
		builder: &mut sourcemap::SourceMapBuilder,
		out: &mut Position,
		src: &mut Position,
		range: std::ops::Range<usize>,
		file_name: &str,
	) {
		let run = &self.source[range];
		if run.is_empty() {
			return;
		}
		builder.add(out.line, out.column, src.line, src.column, Some(file_name), None, false);
		let mut consumed = 0;
		for segment in run.split_inclusive('\n') {
			consumed += segment.len();
			advance(segment, out);
			advance(segment, src);
			if segment.ends_with('\n') && consumed < run.len() {
				builder.add(out.line, out.column, src.line, src.column, Some(file_name), None, false);
			}
		}
	}
}

/// A zero-based line and column position.
#[cfg(feature = "sourcemap")]
#[derive(Debug, Clone, Copy, Default)]
struct Position {
	line: u32,
	column: u32,
}

/// Advance a position over a stretch of text.
#[cfg(feature = "sourcemap")]
fn advance(text: &str, position: &mut Position) {
	for c in text.chars() {
		if c == '\n' {
			position.line += 1;
			position.column = 0;
		} else {
			position.column += 1;
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use assert2::{assert, check, let_assert};

	#[test]
	fn test_render_without_edits() {
		let buffer = RewriteBuffer::new("hello");
		check!(buffer.render() == "hello");
	}

	#[test]
	fn test_overwrite_and_render() {
		let mut buffer = RewriteBuffer::new("one two three");
		check!(let Ok(()) = buffer.overwrite(4, 7, "2".into()));
		check!(let Ok(()) = buffer.overwrite(8, 13, "3".into()));
		check!(buffer.render() == "one 2 3");
	}

	#[test]
	fn test_edits_may_arrive_out_of_order() {
		let mut buffer = RewriteBuffer::new("one two three");
		check!(let Ok(()) = buffer.overwrite(8, 13, "3".into()));
		check!(let Ok(()) = buffer.overwrite(0, 3, "1".into()));
		check!(buffer.render() == "1 two 3");
	}

	#[test]
	fn test_replacement_may_be_empty() {
		let mut buffer = RewriteBuffer::new("one two");
		check!(let Ok(()) = buffer.overwrite(3, 7, String::new()));
		check!(buffer.render() == "one");
	}

	#[test]
	fn test_invalid_ranges_are_rejected() {
		let mut buffer = RewriteBuffer::new("h❤llo");
		let_assert!(Err(Error::InvalidEdit(e)) = buffer.overwrite(2, 2, "x".into()));
		check!(e.start == 2);
		check!(let Err(Error::InvalidEdit(_)) = buffer.overwrite(3, 2, "x".into()));
		check!(let Err(Error::InvalidEdit(_)) = buffer.overwrite(0, 100, "x".into()));
		// Offset 2 is inside the heart's UTF-8 sequence.
		check!(let Err(Error::InvalidEdit(_)) = buffer.overwrite(1, 2, "x".into()));
	}

	#[test]
	fn test_overlapping_edits_are_rejected() {
		let mut buffer = RewriteBuffer::new("0123456789");
		check!(let Ok(()) = buffer.overwrite(2, 5, "x".into()));
		let_assert!(Err(Error::OverlappingEdit(e)) = buffer.overwrite(4, 6, "y".into()));
		check!(e.prev_start == 2);
		check!(e.prev_end == 5);
		check!(let Err(Error::OverlappingEdit(_)) = buffer.overwrite(0, 3, "y".into()));
		check!(let Err(Error::OverlappingEdit(_)) = buffer.overwrite(2, 5, "y".into()));
		// Touching ranges do not overlap.
		check!(let Ok(()) = buffer.overwrite(0, 2, "y".into()));
		check!(let Ok(()) = buffer.overwrite(5, 6, "z".into()));
	}

	#[cfg(feature = "sourcemap")]
	#[test]
	fn test_generate_map() {
		let mut buffer = RewriteBuffer::new("aa bb\ncc dd\n");
		check!(let Ok(()) = buffer.overwrite(6, 11, "c d".into()));
		let map = buffer.generate_map("test.js");
		check!(map.get_file() == Some("test.js.map"));
		assert!(map.get_token_count() > 0);

		// Positions before the first edit map to themselves.
		let_assert!(Some(token) = map.lookup_token(0, 0));
		check!(token.get_src_line() == 0);
		check!(token.get_src_col() == 0);
		check!(token.get_source() == Some("test.js"));

		// The replacement maps back to the start of the replaced range.
		let_assert!(Some(token) = map.lookup_token(1, 0));
		check!(token.get_src_line() == 1);
		check!(token.get_src_col() == 0);
	}
}
