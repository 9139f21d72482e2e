/// Dispatch of binary operators.
pub mod core;

/// Arithmetic on integers and reals.
pub mod scalar;

/// Relations and comparison chains.
pub mod comparison;

/// Bitwise and logical operators.
pub mod logic;
