/// Numeric conversion helpers.
///
/// Safe conversions between `i64`, `usize` and `f64`, floored division and
/// remainder, and translation of the language's 1-based indices into offsets.
/// All functions return a `Result` carrying the source line on failure.
pub mod num;
