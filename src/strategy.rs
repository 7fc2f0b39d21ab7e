//! The minification strategy: placeholder generation, combining, minifying and splitting.

use crate::css::{self, CssOptions};
use crate::error::{self, Error};
use crate::template::TemplatePart;

/// The base token of the default placeholder.
///
/// An `@` token followed by `();` is kept as a value by CSS engines instead
/// of being discarded as dead code. The semicolon can still be stripped in
/// some contexts (the last declaration of a block, inline styles), which the
/// suffix normalization in [`crate::css`] repairs.
const PLACEHOLDER_BASE: &str = "@TEMPLATE_EXPRESSION";

/// The suffix of the default placeholder.
const PLACEHOLDER_SUFFIX: &str = "();";

/// Trait for the pluggable minification policy.
///
/// A strategy combines the static parts of a template into one string with a
/// placeholder marking each expression slot, minifies the combined string,
/// and splits the result back apart.
///
/// CSS support is an optional capability, signalled by [`supports_css()`][Self::supports_css].
/// The pipeline checks for the capability's presence; it never inspects the concrete type.
pub trait Strategy {
	/// Generate a placeholder that does not occur in any part's text.
	///
	/// Must be deterministic: the same parts always give the same placeholder,
	/// so that repeated minification of identical content is idempotent.
	fn placeholder(&self, parts: &[TemplatePart]) -> String;

	/// Join the part texts with the placeholder as separator.
	///
	/// `n` parts yield `n - 1` separators.
	fn combine(&self, parts: &[TemplatePart], placeholder: &str) -> String;

	/// Minify combined HTML.
	fn minify_html(&self, html: &str, options: &HtmlOptions) -> Result<String, Error>;

	/// Whether this strategy can minify CSS.
	fn supports_css(&self) -> bool {
		false
	}

	/// Minify combined CSS.
	///
	/// Only called when [`supports_css()`][Self::supports_css] returns true.
	/// The default implementation returns the input unchanged.
	fn minify_css(&self, css: &str, options: &CssOptions) -> Result<String, Error> {
		let _ = options;
		Ok(css.to_owned())
	}

	/// Split minified text by the exact placeholder token.
	///
	/// Inverse of [`combine()`][Self::combine]. The split is a naive substring
	/// split: a minifier that rewrote the placeholder beyond the defended
	/// suffix-stripping case produces a wrong part count here, which
	/// validation catches.
	fn split(&self, minified: &str, placeholder: &str) -> Vec<String>;
}

/// Options for minifying HTML.
#[derive(Debug, Clone)]
pub struct HtmlOptions {
	/// Keep HTML comments. Defaults to false.
	pub keep_comments: bool,

	/// Keep closing tags that the HTML spec allows to be omitted. Defaults to true.
	pub keep_closing_tags: bool,

	/// Minify JavaScript inside `<script>` elements. Defaults to true.
	pub minify_js: bool,

	/// How to treat CSS, both inside HTML (`<style>`, inline styles) and for
	/// `css` tagged templates.
	pub minify_css: InlineCss,
}

impl Default for HtmlOptions {
	fn default() -> Self {
		Self {
			keep_comments: false,
			keep_closing_tags: true,
			minify_js: true,
			minify_css: InlineCss::default(),
		}
	}
}

/// Whether, and how, to minify CSS.
#[derive(Debug, Clone)]
pub enum InlineCss {
	/// Leave CSS untouched.
	///
	/// `css` tagged templates are then spliced back without minification.
	Keep,

	/// Minify CSS with the given options.
	Minify(CssOptions),
}

impl Default for InlineCss {
	fn default() -> Self {
		Self::Minify(CssOptions::default())
	}
}

/// The default strategy.
///
/// Uses `minify-html` for HTML and, with the `css` feature enabled,
/// `lightningcss` for CSS.
#[derive(Debug)]
pub struct DefaultStrategy;

impl Strategy for DefaultStrategy {
	fn placeholder(&self, parts: &[TemplatePart]) -> String {
		let mut candidate = format!("{PLACEHOLDER_BASE}{PLACEHOLDER_SUFFIX}");
		while parts.iter().any(|part| part.text.contains(&candidate)) {
			candidate.truncate(candidate.len() - PLACEHOLDER_SUFFIX.len());
			candidate.push('_');
			candidate.push_str(PLACEHOLDER_SUFFIX);
		}
		candidate
	}

	fn combine(&self, parts: &[TemplatePart], placeholder: &str) -> String {
		let texts: Vec<&str> = parts.iter().map(|part| part.text.as_str()).collect();
		texts.join(placeholder)
	}

	fn minify_html(&self, html: &str, options: &HtmlOptions) -> Result<String, Error> {
		let minify_css = matches!(options.minify_css, InlineCss::Minify(_));
		let cfg = minify_html::Cfg {
			keep_comments: options.keep_comments,
			keep_closing_tags: options.keep_closing_tags,
			minify_js: options.minify_js,
			minify_css,
			..minify_html::Cfg::default()
		};
		let minified = minify_html::minify(html.as_bytes(), &cfg);
		let minified = String::from_utf8(minified).map_err(|e| error::Minification {
			errors: vec![e.to_string()],
		})?;
		if minify_css {
			// The engine's own CSS pass can strip the suffix semicolon
			// inside <style> content and inline styles.
			Ok(css::restore_placeholder(&minified, PLACEHOLDER_BASE))
		} else {
			Ok(minified)
		}
	}

	#[cfg(feature = "css")]
	fn supports_css(&self) -> bool {
		true
	}

	#[cfg(feature = "css")]
	fn minify_css(&self, css: &str, options: &CssOptions) -> Result<String, Error> {
		let adjusted = css::adjust_css_options(options);
		if !adjusted.optimize {
			return Ok(css.to_owned());
		}
		let minified = run_css_engine(css, adjusted.two.is_some())?;
		let minified = if adjusted.restore_placeholder {
			css::restore_placeholder(&minified, PLACEHOLDER_BASE)
		} else {
			minified
		};
		Ok(css::apply_value_transforms(&minified, &adjusted.one.transforms))
	}

	fn split(&self, minified: &str, placeholder: &str) -> Vec<String> {
		minified.split(placeholder).map(String::from).collect()
	}
}

/// Run lightningcss over the combined CSS.
///
/// Structural optimizations only run at level two;
/// level one reprints with whitespace minification only.
#[cfg(feature = "css")]
fn run_css_engine(css: &str, structural: bool) -> Result<String, Error> {
	use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};

	let mut stylesheet =
		StyleSheet::parse(css, ParserOptions::default()).map_err(|e| engine_error(e.to_string()))?;
	if structural {
		stylesheet
			.minify(MinifyOptions::default())
			.map_err(|e| engine_error(e.to_string()))?;
	}
	let output = stylesheet
		.to_css(PrinterOptions {
			minify: true,
			..PrinterOptions::default()
		})
		.map_err(|e| engine_error(e.to_string()))?;
	Ok(output.code)
}

#[cfg(feature = "css")]
fn engine_error(message: String) -> Error {
	error::Minification { errors: vec![message] }.into()
}

#[cfg(test)]
mod test {
	use super::*;
	use assert2::{assert, check, let_assert};

	fn parts(texts: &[&str]) -> Vec<TemplatePart> {
		let mut offset = 0;
		texts
			.iter()
			.map(|text| {
				let part = TemplatePart {
					text: (*text).to_owned(),
					start: offset,
					end: offset + text.len(),
				};
				offset = part.end + 4;
				part
			})
			.collect()
	}

	#[test]
	fn test_placeholder_is_deterministic() {
		let parts = parts(&["<b>", "</b>"]);
		check!(DefaultStrategy.placeholder(&parts) == DefaultStrategy.placeholder(&parts));
	}

	#[test]
	fn test_placeholder_widens_until_unique() {
		let plain = parts(&["<b>", "</b>"]);
		check!(DefaultStrategy.placeholder(&plain) == "@TEMPLATE_EXPRESSION();");

		let colliding = parts(&["@TEMPLATE_EXPRESSION();", "</b>"]);
		let placeholder = DefaultStrategy.placeholder(&colliding);
		check!(placeholder == "@TEMPLATE_EXPRESSION_();");
		check!(!colliding.iter().any(|part| part.text.contains(&placeholder)));

		let colliding = parts(&["@TEMPLATE_EXPRESSION();", "@TEMPLATE_EXPRESSION_();"]);
		check!(DefaultStrategy.placeholder(&colliding) == "@TEMPLATE_EXPRESSION__();");
	}

	#[test]
	fn test_combine_split_round_trip() {
		let parts = parts(&["<ul>", "<li>a</li>", "</ul>"]);
		let placeholder = DefaultStrategy.placeholder(&parts);
		let combined = DefaultStrategy.combine(&parts, &placeholder);
		check!(combined == "<ul>@TEMPLATE_EXPRESSION();<li>a</li>@TEMPLATE_EXPRESSION();</ul>");
		check!(DefaultStrategy.split(&combined, &placeholder) == ["<ul>", "<li>a</li>", "</ul>"]);
	}

	#[test]
	fn test_combine_single_part_has_no_separator() {
		let parts = parts(&["<p>hi</p>"]);
		let combined = DefaultStrategy.combine(&parts, "@TEMPLATE_EXPRESSION();");
		check!(combined == "<p>hi</p>");
	}

	#[test]
	fn test_minify_html_collapses_whitespace() {
		let_assert!(
			Ok(minified) = DefaultStrategy.minify_html(
				"  <div>  @TEMPLATE_EXPRESSION();  </div>  ",
				&HtmlOptions::default(),
			)
		);
		check!(minified == "<div>@TEMPLATE_EXPRESSION();</div>");
	}

	#[test]
	fn test_minify_html_strips_comments() {
		let_assert!(
			Ok(minified) = DefaultStrategy.minify_html("<div><!-- note -->x</div>", &HtmlOptions::default())
		);
		check!(minified == "<div>x</div>");
	}

	#[cfg(feature = "css")]
	#[test]
	fn test_supports_css() {
		check!(DefaultStrategy.supports_css());
	}

	#[cfg(feature = "css")]
	#[test]
	fn test_minify_css() {
		let_assert!(
			Ok(minified) = DefaultStrategy.minify_css(".ruler { width: 100%; }", &CssOptions::default())
		);
		check!(minified == ".ruler{width:100%}");
	}

	#[cfg(feature = "css")]
	#[test]
	fn test_minify_css_preserves_placeholder_value() {
		let_assert!(
			Ok(minified) =
				DefaultStrategy.minify_css(".a { color: @TEMPLATE_EXPRESSION(); }", &CssOptions::default())
		);
		check!(minified == ".a{color:@TEMPLATE_EXPRESSION();}");
	}

	#[cfg(feature = "css")]
	#[test]
	fn test_minify_css_level_off_is_verbatim() {
		let options = CssOptions {
			level: crate::css::Level::Off,
		};
		let_assert!(Ok(minified) = DefaultStrategy.minify_css(".a  {  color : red ; }", &options));
		check!(minified == ".a  {  color : red ; }");
	}

	#[cfg(feature = "css")]
	#[test]
	fn test_minify_css_reports_engine_errors() {
		let_assert!(Err(Error::Minification(e)) = DefaultStrategy.minify_css(".a { color: red; } }", &CssOptions::default()));
		assert!(!e.errors.is_empty());
	}
}
