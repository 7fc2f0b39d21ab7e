//! Locating template literals in source text.

use memchr::{memchr, memchr3, memmem};

use crate::error::{self, Error};
use crate::template::{Template, TemplatePart};

/// Trait for types that can locate template literals in source text.
///
/// The pipeline treats the returned byte offsets as authoritative and never recomputes them.
/// Implementations must return templates whose part ranges are disjoint,
/// ordered by start offset.
pub trait Locator {
	/// Locate all template literals in the source.
	fn locate(&self, source: &str) -> Result<Vec<Template>, Error>;
}

/// The bundled locator for JavaScript and TypeScript like source.
///
/// This is a lightweight scanner, not a full ECMAScript parser.
/// It understands line and block comments, single and double quoted strings,
/// template literals with nested `${}` expressions and tags written directly
/// against the opening backtick (`` html`...` ``).
///
/// Known limitation: regular expression literals are not recognized,
/// so a regex containing a backtick or quote character can confuse the scanner.
/// Supply a custom [`Locator`] for exact parsing of such sources.
#[derive(Debug)]
pub struct DefaultLocator;

impl Locator for DefaultLocator {
	fn locate(&self, source: &str) -> Result<Vec<Template>, Error> {
		let mut templates = Vec::new();
		scan_code(source, &mut templates)?;
		// Nested templates complete before the template that contains them.
		templates.sort_by_key(|template| template.parts[0].start);
		Ok(templates)
	}
}

/// Reserved words that can directly precede a template literal without tagging it.
const RESERVED: &[&str] = &[
	"await", "case", "default", "delete", "do", "else", "in", "instanceof", "new", "of", "return", "throw", "typeof",
	"void", "yield",
];

/// Scan top-level code, collecting template literals.
fn scan_code(source: &str, out: &mut Vec<Template>) -> Result<(), Error> {
	let bytes = source.as_bytes();
	let mut finger = 0;
	while finger < bytes.len() {
		let next = match next_interesting(bytes, finger, bytes.len()) {
			Some(x) => x,
			None => break,
		};
		match bytes[next] {
			b'/' => finger = skip_comment(bytes, next, bytes.len()),
			b'"' | b'\'' => finger = skip_string(bytes, next, bytes.len()),
			b'`' => {
				let tag = tag_before(source, next);
				finger = scan_template(source, next, tag, out)?;
			},
			_ => unreachable!(),
		}
	}
	Ok(())
}

/// Find the next backtick, quote or slash at or after `finger`.
fn next_interesting(bytes: &[u8], finger: usize, end: usize) -> Option<usize> {
	let hay = &bytes[finger..end];
	let quote_or_tick = memchr3(b'`', b'"', b'\'', hay);
	let slash = memchr(b'/', hay);
	match (quote_or_tick, slash) {
		(None, None) => None,
		(Some(x), None) | (None, Some(x)) => Some(finger + x),
		(Some(x), Some(y)) => Some(finger + x.min(y)),
	}
}

/// Scan a template literal starting at the opening backtick.
///
/// Nested templates found inside embedded expressions are collected too.
///
/// Returns the index of the byte after the closing backtick.
fn scan_template(source: &str, backtick: usize, tag: Option<String>, out: &mut Vec<Template>) -> Result<usize, Error> {
	let bytes = source.as_bytes();
	let mut parts = Vec::with_capacity(1);
	let mut part_start = backtick + 1;
	let mut finger = part_start;
	while finger < bytes.len() {
		let next = match memchr3(b'`', b'$', b'\\', &bytes[finger..]) {
			Some(x) => finger + x,
			None => break,
		};
		match bytes[next] {
			b'\\' => finger = next + 2,
			b'`' => {
				parts.push(part(source, part_start, next));
				out.push(Template { tag, parts });
				return Ok(next + 1);
			},
			_ => {
				// Only `${` opens an expression, a bare dollar sign is text.
				if next + 1 < bytes.len() && bytes[next + 1] == b'{' {
					parts.push(part(source, part_start, next));
					let after = scan_expression(source, next, out)?;
					part_start = after;
					finger = after;
				} else {
					finger = next + 1;
				}
			},
		}
	}
	Err(error::UnterminatedTemplate { position: backtick }.into())
}

/// Scan an embedded `${...}` expression, starting at the dollar sign.
///
/// Braces nest; strings, comments and nested templates inside the
/// expression are skipped (and nested templates collected).
///
/// Returns the index of the byte after the matching closing brace.
fn scan_expression(source: &str, dollar: usize, out: &mut Vec<Template>) -> Result<usize, Error> {
	let bytes = source.as_bytes();
	let mut depth = 1usize;
	let mut finger = dollar + 2;
	while finger < bytes.len() {
		let hay = &bytes[finger..];
		let brace_or_tick = memchr3(b'{', b'}', b'`', hay);
		let other = memchr3(b'"', b'\'', b'/', hay);
		let next = match (brace_or_tick, other) {
			(None, None) => break,
			(Some(x), None) | (None, Some(x)) => finger + x,
			(Some(x), Some(y)) => finger + x.min(y),
		};
		match bytes[next] {
			b'{' => {
				depth += 1;
				finger = next + 1;
			},
			b'}' => {
				depth -= 1;
				if depth == 0 {
					return Ok(next + 1);
				}
				finger = next + 1;
			},
			b'`' => {
				let tag = tag_before(source, next);
				finger = scan_template(source, next, tag, out)?;
			},
			b'"' | b'\'' => finger = skip_string(bytes, next, bytes.len()),
			b'/' => finger = skip_comment(bytes, next, bytes.len()),
			_ => unreachable!(),
		}
	}
	Err(error::UnterminatedExpression { position: dollar }.into())
}

/// Skip a comment starting at the given slash, if it is one.
///
/// A plain slash (division, or the start of a regex literal) is skipped as a single byte.
/// An unterminated block comment swallows the rest of the input.
fn skip_comment(bytes: &[u8], position: usize, end: usize) -> usize {
	if position + 1 >= end {
		return position + 1;
	}
	match bytes[position + 1] {
		b'/' => match memchr(b'\n', &bytes[position + 2..end]) {
			Some(x) => position + 2 + x,
			None => end,
		},
		b'*' => match memmem::find(&bytes[position + 2..end], b"*/") {
			Some(x) => position + 2 + x + 2,
			None => end,
		},
		_ => position + 1,
	}
}

/// Skip a string literal starting at the given quote.
///
/// An unterminated string ends at the next newline, so that scanning can resume there.
fn skip_string(bytes: &[u8], position: usize, end: usize) -> usize {
	let quote = bytes[position];
	let mut finger = position + 1;
	while finger < end {
		let next = match memchr3(quote, b'\\', b'\n', &bytes[finger..end]) {
			Some(x) => finger + x,
			None => return end,
		};
		match bytes[next] {
			b'\\' => finger = next + 2,
			b'\n' => return next,
			_ => return next + 1,
		}
	}
	end
}

/// Get the tag expression written directly against a backtick, if any.
///
/// Allows plain and member expressions (`html`, `this.html`).
/// Reserved words and numbers are not tags.
fn tag_before(source: &str, backtick: usize) -> Option<String> {
	let bytes = source.as_bytes();
	let mut start = backtick;
	while start > 0 && is_tag_byte(bytes[start - 1]) {
		start -= 1;
	}
	if start == backtick {
		return None;
	}
	let tag = &source[start..backtick];
	let first = tag.as_bytes()[0];
	if first.is_ascii_digit() || first == b'.' {
		return None;
	}
	if RESERVED.contains(&tag) {
		return None;
	}
	Some(tag.to_owned())
}

/// Bytes that can make up a tag expression.
fn is_tag_byte(c: u8) -> bool {
	c.is_ascii_alphanumeric() || c == b'_' || c == b'$' || c == b'.'
}

fn part(source: &str, start: usize, end: usize) -> TemplatePart {
	TemplatePart {
		text: source[start..end].to_owned(),
		start,
		end,
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use assert2::{assert, check, let_assert};

	fn locate(source: &str) -> Result<Vec<Template>, Error> {
		DefaultLocator.locate(source)
	}

	fn texts(template: &Template) -> Vec<&str> {
		template.parts.iter().map(|part| part.text.as_str()).collect()
	}

	#[test]
	fn test_tagged_template() {
		let source = "const t = html`<b>${x}</b>`;";
		let_assert!(Ok(templates) = locate(source));
		assert!(templates.len() == 1);
		check!(templates[0].tag.as_deref() == Some("html"));
		check!(texts(&templates[0]) == ["<b>", "</b>"]);

		let open = source.find('`').unwrap();
		check!(templates[0].parts[0].start == open + 1);
		check!(templates[0].parts[0].end == open + 4);
		check!(templates[0].parts[1].start == source.find("</b>").unwrap());
		check!(templates[0].parts[1].end == source.rfind('`').unwrap());
	}

	#[test]
	fn test_untagged_and_member_tags() {
		let_assert!(Ok(templates) = locate("const t = `hi`;"));
		assert!(templates.len() == 1);
		check!(templates[0].tag == None);
		check!(texts(&templates[0]) == ["hi"]);

		let_assert!(Ok(templates) = locate("const t = this.css`a { }`;"));
		assert!(templates.len() == 1);
		check!(templates[0].tag.as_deref() == Some("this.css"));
	}

	#[test]
	fn test_reserved_word_is_not_a_tag() {
		let_assert!(Ok(templates) = locate("function f() { return`<b>x</b>`; }"));
		assert!(templates.len() == 1);
		check!(templates[0].tag == None);
	}

	#[test]
	fn test_empty_template_has_one_empty_part() {
		let_assert!(Ok(templates) = locate("const t = html``;"));
		assert!(templates.len() == 1);
		assert!(templates[0].parts.len() == 1);
		check!(templates[0].parts[0].text == "");
		check!(templates[0].parts[0].start == templates[0].parts[0].end);
	}

	#[test]
	fn test_bare_dollar_and_escapes() {
		let_assert!(Ok(templates) = locate(r"const t = html`price: $5 \` ${amount}`;"));
		assert!(templates.len() == 1);
		check!(texts(&templates[0]) == [r"price: $5 \` ", ""]);
	}

	#[test]
	fn test_strings_and_comments_are_skipped() {
		let source = concat!(
			"const a = \"`not a template`\";\n",
			"// html`not this one either`\n",
			"/* css`nor\n this` */\n",
			"const b = html`<p>${'}'}</p>`;\n",
		);
		let_assert!(Ok(templates) = locate(source));
		assert!(templates.len() == 1);
		check!(templates[0].tag.as_deref() == Some("html"));
		check!(texts(&templates[0]) == ["<p>", "</p>"]);
	}

	#[test]
	fn test_nested_templates_in_source_order() {
		let source = "const t = html`<ul>${items.map(i => html`<li>${i}</li>`)}</ul>`;";
		let_assert!(Ok(templates) = locate(source));
		assert!(templates.len() == 2);
		check!(texts(&templates[0]) == ["<ul>", "</ul>"]);
		check!(texts(&templates[1]) == ["<li>", "</li>"]);
		assert!(templates[0].parts[0].start < templates[1].parts[0].start);
	}

	#[test]
	fn test_nested_braces_in_expression() {
		let_assert!(Ok(templates) = locate("const t = html`<p>${fmt({ a: { b: 1 } })}</p>`;"));
		assert!(templates.len() == 1);
		check!(texts(&templates[0]) == ["<p>", "</p>"]);
	}

	#[test]
	fn test_unterminated_template() {
		let source = "const t = html`<div>";
		let_assert!(Err(Error::UnterminatedTemplate(e)) = locate(source));
		check!(e.position == source.find('`').unwrap());
	}

	#[test]
	fn test_unterminated_expression() {
		let source = "const t = html`<div>${x";
		let_assert!(Err(Error::UnterminatedExpression(e)) = locate(source));
		check!(e.position == source.find('$').unwrap());
	}
}
