/// States, transitions and the operations the compiler builds machines with.
pub mod core;

/// Per-machine variable bindings.
pub mod store;
