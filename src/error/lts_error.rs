/// Integrity errors of a labeled transition system.
///
/// These are raised when a state or transition is referenced that the
/// machine does not contain. A compiled program never produces them; they
/// guard hand-built machines and records loaded from disk.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LtsError {
    /// The state does not exist.
    #[error("State '{state}' does not exist.")]
    UnknownState {
        /// The missing state.
        state: String,
    },
    /// The state has no transition with this label.
    #[error("State '{state}' has no transition labeled '{label}'.")]
    UnknownTransition {
        /// The source state.
        state: String,
        /// The missing label.
        label: String,
    },
    /// The state cannot be removed while transitions still lead into it.
    #[error("State '{state}' is still the target of {count} transition(s).")]
    StateInUse {
        /// The state that was to be removed.
        state: String,
        /// How many transitions still reach it.
        count: usize,
    },
    /// The initial state cannot be removed.
    #[error("State '{state}' is the initial state and cannot be removed.")]
    InitialState {
        /// The initial state.
        state: String,
    },
    /// The transition was never linked to a parsed statement.
    #[error("Transition '{label}' leaving '{state}' has no parsed statement.")]
    Unlinked {
        /// The source state.
        state: String,
        /// The label of the transition.
        label: String,
    },
}
