//! Minify HTML and CSS inside tagged template literals.
//!
//! # Features
//!
//! * Locate tagged template literals in JavaScript or TypeScript like source.
//! * Minify the static text of `html` and `svg` tagged templates.
//! * Minify `css` tagged templates (optional, requires the `css` feature).
//! * Splice the minified text back without touching any other byte of the source.
//! * Generate source maps for the rewritten output (optional, requires the `sourcemap` feature).
//! * Pluggable [`Strategy`], [`Locator`], [`Validation`] and classification predicates.
//!
//! Embedded `${...}` expressions are replaced by a collision-free placeholder
//! before minification and restored afterwards, so the minifier sees one
//! contiguous document while the expressions and the surrounding code stay
//! byte-for-byte untouched.
//!
//! # Examples
//!
//! The [`minify()`] function minifies a whole source text with default options.
//!
//! ```
//! # fn main() -> Result<(), minify_literals::Error> {
//! let source = "const page = html`  <div>  ${user}  </div>  `;";
//! let output = minify_literals::minify(source)?;
//! assert_eq!(output.code(), Some("const page = html`<div>${user}</div>`;"));
//! # Ok(())
//! # }
//! ```
//!
//! When no template content changes, the result is a distinct sentinel,
//! so callers can skip writing output altogether.
//!
//! ```
//! # fn main() -> Result<(), minify_literals::Error> {
//! let output = minify_literals::minify("const b = html`<b>${x}</b>`;")?;
//! assert!(output.is_unchanged());
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs, missing_debug_implementations)]
#![cfg_attr(feature = "doc-cfg", feature(doc_cfg))]

pub mod css;
pub mod error;
pub use error::Error;

mod locate;
pub use locate::{DefaultLocator, Locator};

mod rewrite;
pub use rewrite::RewriteBuffer;

mod strategy;
pub use strategy::{DefaultStrategy, HtmlOptions, InlineCss, Strategy};

mod template;
pub use template::{Template, TemplatePart};

mod validate;
pub use validate::{DefaultValidation, Validate, Validation};

/// Options for [`minify_with_options()`].
///
/// All fields have documented defaults; start from [`Options::default()`]
/// and override the fields you need.
pub struct Options<'a> {
	/// The HTML minification options, including the nested CSS options.
	pub minify_options: HtmlOptions,

	/// The minification strategy.
	///
	/// Defaults to [`DefaultStrategy`].
	pub strategy: &'a dyn Strategy,

	/// Predicate deciding whether a template's content is minified as HTML.
	///
	/// The default, [`default_should_minify()`], matches tags containing
	/// `html` or `svg`, ignoring ASCII case.
	pub should_minify: fn(&Template) -> bool,

	/// Predicate deciding whether a template's content is minified as CSS.
	///
	/// Only consulted when the strategy supports CSS; the CSS path takes
	/// precedence when both predicates match. The default,
	/// [`default_should_minify_css()`], matches tags containing `css`,
	/// ignoring ASCII case.
	pub should_minify_css: fn(&Template) -> bool,

	/// Which validation the pipeline runs.
	///
	/// Defaults to [`Validate::Enabled`].
	pub validate: Validate<'a>,

	/// The locator producing the template list.
	///
	/// Defaults to [`DefaultLocator`].
	pub locator: &'a dyn Locator,

	/// The file name used for source map attribution.
	///
	/// Defaults to [`None`], which attributes the map to an empty name.
	pub file_name: Option<&'a str>,

	/// Whether and how to generate a source map.
	///
	/// Defaults to [`SourceMapMode::Generate`].
	#[cfg(feature = "sourcemap")]
	#[cfg_attr(feature = "doc-cfg", doc(cfg(feature = "sourcemap")))]
	pub source_map: SourceMapMode,
}

impl std::fmt::Debug for Options<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut debug = f.debug_struct("Options");
		debug
			.field("minify_options", &self.minify_options)
			.field("validate", &self.validate)
			.field("file_name", &self.file_name);
		#[cfg(feature = "sourcemap")]
		debug.field("source_map", &self.source_map);
		debug.finish_non_exhaustive()
	}
}

impl Default for Options<'_> {
	fn default() -> Self {
		Self {
			minify_options: HtmlOptions::default(),
			strategy: &DefaultStrategy,
			should_minify: default_should_minify,
			should_minify_css: default_should_minify_css,
			validate: Validate::default(),
			locator: &DefaultLocator,
			file_name: None,
			#[cfg(feature = "sourcemap")]
			source_map: SourceMapMode::default(),
		}
	}
}

/// Whether and how to generate a source map.
#[cfg(feature = "sourcemap")]
#[cfg_attr(feature = "doc-cfg", doc(cfg(feature = "sourcemap")))]
#[derive(Debug, Clone, Copy, Default)]
pub enum SourceMapMode {
	/// Generate a map with [`RewriteBuffer::generate_map()`].
	#[default]
	Generate,

	/// Do not generate a map.
	Skip,

	/// Generate a map with a custom generator.
	///
	/// Receives the rewrite buffer with all recorded edits and the file name.
	Custom(fn(&RewriteBuffer, &str) -> sourcemap::SourceMap),
}

/// The result of a successful minification run.
#[derive(Debug)]
pub enum Output {
	/// No template content changed.
	///
	/// Distinct from an edit that happens to equal the input, so callers can
	/// skip writing output and generating a map when nothing happened.
	Unchanged,

	/// At least one template changed.
	Minified(Minified),
}

impl Output {
	/// Get the minified code, if any template content changed.
	#[inline]
	pub fn code(&self) -> Option<&str> {
		match self {
			Self::Unchanged => None,
			Self::Minified(minified) => Some(&minified.code),
		}
	}

	/// Check whether nothing changed.
	#[inline]
	pub fn is_unchanged(&self) -> bool {
		matches!(self, Self::Unchanged)
	}
}

/// The rewritten source text and its optional source map.
pub struct Minified {
	/// The full source text with minified template contents.
	pub code: String,

	/// The source map, if generation was enabled.
	#[cfg(feature = "sourcemap")]
	#[cfg_attr(feature = "doc-cfg", doc(cfg(feature = "sourcemap")))]
	pub map: Option<sourcemap::SourceMap>,
}

impl std::fmt::Debug for Minified {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Minified").field("code", &self.code).finish_non_exhaustive()
	}
}

/// The default predicate for minifying a template as HTML.
///
/// Matches templates whose tag contains `html` or `svg`, ignoring ASCII case.
pub fn default_should_minify(template: &Template) -> bool {
	template.tag_contains("html") || template.tag_contains("svg")
}

/// The default predicate for minifying a template as CSS.
///
/// Matches templates whose tag contains `css`, ignoring ASCII case.
pub fn default_should_minify_css(template: &Template) -> bool {
	template.tag_contains("css")
}

/// Minify tagged template literals in a source text with default options.
///
/// Templates tagged `html` or `svg` are minified as HTML; templates tagged
/// `css` are minified as CSS when the `css` feature is enabled.
pub fn minify(source: &str) -> Result<Output, Error> {
	minify_with_options(source, &Options::default())
}

/// Minify tagged template literals in a source text.
///
/// For every located template, in source order: classify it with the
/// predicates, generate a placeholder, combine the static parts, minify the
/// combined text, split it back apart, and overwrite each non-empty part
/// range with its minified counterpart. Empty part ranges are skipped, never
/// written as zero-length replacements.
///
/// Any validation or minification failure aborts the whole call; no partial
/// output is returned, because a corrupted placeholder or part count means
/// the source can no longer be trusted for this document.
pub fn minify_with_options(source: &str, options: &Options) -> Result<Output, Error> {
	let templates = options.locator.locate(source)?;
	let validation = options.validate.as_validation();
	let mut buffer = RewriteBuffer::new(source);

	for template in &templates {
		let as_html = (options.should_minify)(template);
		let as_css = options.strategy.supports_css() && (options.should_minify_css)(template);
		if !as_html && !as_css {
			continue;
		}

		let placeholder = options.strategy.placeholder(&template.parts);
		if let Some(validation) = validation {
			validation.check_placeholder(&placeholder)?;
		}

		let combined = options.strategy.combine(&template.parts, &placeholder);
		// The CSS path takes precedence and reads the engine options from
		// the nested CSS option bag.
		let minified = if as_css {
			match &options.minify_options.minify_css {
				InlineCss::Keep => combined,
				InlineCss::Minify(css_options) => options.strategy.minify_css(&combined, css_options)?,
			}
		} else {
			options.strategy.minify_html(&combined, &options.minify_options)?
		};

		let split = options.strategy.split(&minified, &placeholder);
		if let Some(validation) = validation {
			validation.check_split(&template.parts, &split)?;
		}

		// With validation disabled the split may be short; the zip stops at
		// the shorter sequence instead of indexing out of range.
		for (part, replacement) in template.parts.iter().zip(split) {
			if part.start < part.end {
				buffer.overwrite(part.start, part.end, replacement)?;
			}
		}
	}

	let code = buffer.render();
	if code == source {
		return Ok(Output::Unchanged);
	}

	#[cfg(feature = "sourcemap")]
	let map = {
		let file_name = options.file_name.unwrap_or("");
		match options.source_map {
			SourceMapMode::Generate => Some(buffer.generate_map(file_name)),
			SourceMapMode::Skip => None,
			SourceMapMode::Custom(generate) => Some(generate(&buffer, file_name)),
		}
	};

	Ok(Output::Minified(Minified {
		code,
		#[cfg(feature = "sourcemap")]
		map,
	}))
}
