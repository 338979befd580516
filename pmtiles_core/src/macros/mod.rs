//! Testing and assertion macros
//!
//! This module provides utility macros for testing, particularly for pattern-based assertions.

/// Asserts that the string representation of an expression matches a given wildcard pattern.
///
/// Useful for error messages that embed paths or other run-dependent text.
///
/// # Example
/// ```
/// use pmtiles_core::assert_wildcard;
/// let value = "archive '/tmp/abc/berlin.pmtiles' is broken";
/// assert_wildcard!(value, "archive '*berlin.pmtiles' is broken");
/// ```
#[macro_export]
macro_rules! assert_wildcard {
	($expression:expr, $wildcard:expr) => {
		let expression = format!("{}", $expression);
		if !wildmatch::WildMatch::new($wildcard).matches(&expression) {
			panic!(
				"assertion failed: expression \"{expression:?}\" does not match wildcard \"{}\"",
				$wildcard
			)
		}
	};
}
