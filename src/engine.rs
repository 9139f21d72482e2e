/// Firing single states and running machines to completion.
pub mod core;

/// Executing a program one transition at a time.
///
/// Calls made by a statement suspend it: the callee gets its own frame and
/// the statement is replayed with the callee's result once it returns.
pub mod step;
