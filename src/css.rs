//! CSS minification options and the adjustment that protects the placeholder.
//!
//! General purpose CSS optimization treats the placeholder as a removable or
//! truncatable value: the one known failure mode is the engine stripping the
//! suffix semicolon (for example from the last declaration of a block).
//! [`adjust_css_options()`] injects the minimum intervention that keeps
//! round-tripping correct without disabling optimization wholesale.

use memchr::memchr3;

/// A transform applied to each declaration value of the minified output.
///
/// Receives the property name and the current value.
/// Return `Some(replacement)` to replace the value, `None` to keep it.
pub type ValueTransform = fn(property: &str, value: &str) -> Option<String>;

/// Options for minifying CSS.
#[derive(Debug, Clone, Default)]
pub struct CssOptions {
	/// The optimization level to run.
	pub level: Level,
}

/// The optimization level of the CSS engine.
#[derive(Debug, Clone)]
pub enum Level {
	/// Do not run the engine at all. The input is returned verbatim.
	Off,

	/// Reprint without structural optimization. This is the default.
	One(LevelOne),

	/// Run structural optimizations before reprinting.
	Two(LevelTwo),

	/// Explicit per-level configuration.
	Custom(LevelMap),
}

impl Default for Level {
	fn default() -> Self {
		Self::One(LevelOne::default())
	}
}

/// Level 1 configuration: per-declaration value transforms.
#[derive(Debug, Clone, Default)]
pub struct LevelOne {
	/// Transforms applied, in order, to each declaration value of the minified output.
	pub transforms: Vec<ValueTransform>,
}

/// Level 2 configuration: structural optimizations.
#[derive(Debug, Clone)]
pub struct LevelTwo {
	/// Run all structural optimizations.
	pub all: bool,
}

impl Default for LevelTwo {
	fn default() -> Self {
		Self { all: true }
	}
}

/// Explicit configuration for both levels.
#[derive(Debug, Clone, Default)]
pub struct LevelMap {
	/// The level 1 configuration.
	pub one: LevelOne,

	/// The level 2 configuration, if structural optimization should run.
	pub two: Option<LevelTwo>,
}

/// CSS options after the placeholder-protecting adjustment.
#[derive(Debug, Clone)]
pub struct AdjustedCssOptions {
	/// Whether to run the engine at all.
	pub optimize: bool,

	/// Whether to normalize placeholder suffixes in the engine output.
	pub restore_placeholder: bool,

	/// The adjusted level 1 configuration.
	///
	/// Caller supplied transforms are kept and run after the placeholder
	/// normalization, so the caller's result wins on conflict.
	pub one: LevelOne,

	/// The adjusted level 2 configuration.
	pub two: Option<LevelTwo>,
}

/// Adjust CSS options so that the placeholder survives minification.
///
/// | input level | adjusted behavior |
/// |---|---|
/// | `One` (default) | reprint only, placeholder normalization on |
/// | `Two` | placeholder normalization, then level 2 with `all` enabled |
/// | `Off` | engine skipped entirely, normalization does not apply |
/// | `Custom` | normalization merged in, caller level 1 transforms kept |
pub fn adjust_css_options(options: &CssOptions) -> AdjustedCssOptions {
	match &options.level {
		Level::Off => AdjustedCssOptions {
			optimize: false,
			restore_placeholder: false,
			one: LevelOne::default(),
			two: None,
		},
		Level::One(one) => AdjustedCssOptions {
			optimize: true,
			restore_placeholder: true,
			one: one.clone(),
			two: None,
		},
		Level::Two(_) => AdjustedCssOptions {
			optimize: true,
			restore_placeholder: true,
			one: LevelOne::default(),
			two: Some(LevelTwo { all: true }),
		},
		Level::Custom(map) => AdjustedCssOptions {
			optimize: true,
			restore_placeholder: true,
			one: map.one.clone(),
			two: map.two.clone(),
		},
	}
}

/// Normalize placeholder occurrences in minifier output.
///
/// Re-appends a stripped suffix semicolon and removes whitespace the
/// serializer inserted inside the suffix, so that the exact placeholder
/// token re-appears in the output. Occurrences that already carry the full
/// suffix are left untouched. This defends the known suffix-stripping
/// failure mode only; it does not undo arbitrary rewrites.
pub(crate) fn restore_placeholder(text: &str, base: &str) -> String {
	let bytes = text.as_bytes();
	let mut output = String::with_capacity(text.len() + 4);
	let mut finger = 0;
	while let Some(found) = text[finger..].find(base) {
		let start = finger + found;
		output.push_str(&text[finger..start]);

		// Widened placeholders carry filler underscores after the base.
		let mut end = start + base.len();
		while end < text.len() && bytes[end] == b'_' {
			end += 1;
		}
		output.push_str(&text[start..end]);
		finger = end;

		let mut probe = end;
		while probe < text.len() && bytes[probe].is_ascii_whitespace() {
			probe += 1;
		}
		if probe + 1 < text.len() && bytes[probe] == b'(' && bytes[probe + 1] == b')' {
			probe += 2;
			let mut after = probe;
			while after < text.len() && bytes[after].is_ascii_whitespace() {
				after += 1;
			}
			output.push_str("();");
			if after < text.len() && bytes[after] == b';' {
				finger = after + 1;
			} else {
				finger = probe;
			}
		}
	}
	output.push_str(&text[finger..]);
	output
}

/// Apply value transforms to the declarations of minified CSS.
///
/// The scanner assumes minified output: declarations separated by `;` inside
/// `{}` blocks, nested rules opened by a selector segment ending in `{`.
/// Declaration values containing unbalanced braces or semicolons inside
/// strings are not understood.
pub(crate) fn apply_value_transforms(css: &str, transforms: &[ValueTransform]) -> String {
	if transforms.is_empty() {
		return css.to_owned();
	}
	let bytes = css.as_bytes();
	let mut output = String::with_capacity(css.len());
	let mut depth = 0usize;
	let mut finger = 0;
	while finger <= css.len() {
		let next = match memchr3(b'{', b'}', b';', &bytes[finger..]) {
			Some(x) => finger + x,
			None => css.len(),
		};
		let segment = &css[finger..next];
		let opens_block = next < css.len() && bytes[next] == b'{';
		if depth > 0 && !opens_block {
			if let Some(colon) = segment.find(':') {
				let property = &segment[..colon];
				let mut value = segment[colon + 1..].to_owned();
				for transform in transforms {
					if let Some(replacement) = transform(property, &value) {
						value = replacement;
					}
				}
				output.push_str(property);
				output.push(':');
				output.push_str(&value);
			} else {
				output.push_str(segment);
			}
		} else {
			output.push_str(segment);
		}
		if next == css.len() {
			break;
		}
		match bytes[next] {
			b'{' => depth += 1,
			b'}' => depth = depth.saturating_sub(1),
			_ => {},
		}
		output.push(char::from(bytes[next]));
		finger = next + 1;
	}
	output
}
