use std::{
    collections::{BTreeSet, HashMap},
    fmt,
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    ast::{Action, DeclaredType},
    error::LtsError,
    lts::store::VariableStore,
};

/// Result type of structural operations on a machine.
pub type LtsResult<T> = Result<T, LtsError>;

/// How the engine interprets the outgoing transitions of a state.
///
/// The type is metadata attached by the compiler; the topology alone does not
/// determine it.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateType {
    /// No statement leaves the state: a merge point or a terminal.
    #[default]
    Undefined,
    /// A declaration leaves the state.
    Declare,
    /// An assignment or append leaves the state.
    Assign,
    /// A bare formula leaves the state.
    Formula,
    /// The state returns from the machine.
    Return,
    /// The outgoing labels are branch conditions, tried in order.
    If,
    /// The outgoing labels are a loop guard and its exit.
    While,
    /// The outgoing labels are a counted loop header and its exit.
    For,
}

impl fmt::Display for StateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A labeled edge leaving a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// The statement or condition text, as written in the source.
    pub label:  String,
    /// The state reached when the transition fires.
    pub target: String,
    /// The source line of the label; `0` for synthesized edges.
    #[serde(default)]
    pub line:   usize,
    /// The parsed label. Records store labels only and are linked again on
    /// load.
    #[serde(skip)]
    pub action: Option<Action>,
}

/// A state with its type and outgoing transitions in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// How the engine interprets the outgoing transitions.
    #[serde(default)]
    pub kind:        StateType,
    /// Outgoing transitions; at most one per label.
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

/// A labeled transition system: the compiled form of one function or of the
/// main program.
///
/// States are kept in creation order. Besides the forward transitions the
/// machine keeps a reverse index from each state to the `(label, source)`
/// pairs that reach it, which is what makes removing states and transitions
/// cheap. The reverse index is derived data and is rebuilt after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lts {
    init_state: String,
    states:     IndexMap<String, State>,
    #[serde(default)]
    labels:     BTreeSet<String>,
    #[serde(skip)]
    backwards:  HashMap<String, BTreeSet<(String, String)>>,
    #[serde(default)]
    store:      VariableStore,
    #[serde(default)]
    returns:    Option<DeclaredType>,
}

impl Default for Lts {
    fn default() -> Self {
        Self::new("S0")
    }
}

impl Lts {
    /// Creates a machine containing only its initial state.
    #[must_use]
    pub fn new(init_state: &str) -> Self {
        let mut states = IndexMap::new();
        states.insert(init_state.to_string(), State::default());
        Self { init_state: init_state.to_string(),
               states,
               labels: BTreeSet::new(),
               backwards: HashMap::new(),
               store: VariableStore::new(),
               returns: None }
    }

    #[must_use]
    pub fn init_state(&self) -> &str {
        &self.init_state
    }

    /// Creates a fresh state named `S<n>` and returns its name.
    ///
    /// `n` starts at the current number of states and skips names that are
    /// already taken, so generated names increase in creation order.
    pub fn create_state(&mut self) -> String {
        let mut n = self.states.len();
        while self.states.contains_key(&format!("S{n}")) {
            n += 1;
        }
        let name = format!("S{n}");
        self.states.insert(name.clone(), State::default());
        name
    }

    /// Adds a state with an explicit name. Returns `false` if it existed.
    pub fn add_state(&mut self, name: &str) -> bool {
        if self.states.contains_key(name) {
            return false;
        }
        self.states.insert(name.to_string(), State::default());
        true
    }

    #[must_use]
    pub fn contains(&self, state: &str) -> bool {
        self.states.contains_key(state)
    }

    /// Looks up a state.
    ///
    /// # Errors
    /// `UnknownState` if the machine has no such state.
    pub fn state(&self, state: &str) -> LtsResult<&State> {
        self.states.get(state).ok_or_else(|| unknown(state))
    }

    /// Iterates over all states in creation order.
    pub fn states(&self) -> impl Iterator<Item = (&str, &State)> {
        self.states.iter().map(|(name, state)| (name.as_str(), state))
    }

    /// Every label ever used on this machine.
    #[must_use]
    pub const fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    /// Adds a transition `source --label--> target`.
    ///
    /// A source has at most one transition per label: adding a label the
    /// source already has redirects that transition to the new target and
    /// keeps its position among the outgoing transitions.
    ///
    /// # Errors
    /// `UnknownState` if either end does not exist.
    pub fn add_transition(&mut self,
                          source: &str,
                          label: &str,
                          target: &str,
                          line: usize,
                          action: Option<Action>)
                          -> LtsResult<()> {
        if !self.states.contains_key(target) {
            return Err(unknown(target));
        }
        let state = self.states.get_mut(source).ok_or_else(|| unknown(source))?;
        let transition = Transition { label: label.to_string(),
                                      target: target.to_string(),
                                      line,
                                      action };
        let key = (label.to_string(), source.to_string());

        if let Some(existing) = state.transitions.iter_mut().find(|t| t.label == label) {
            let previous = std::mem::replace(existing, transition);
            if let Some(incoming) = self.backwards.get_mut(&previous.target) {
                incoming.remove(&key);
            }
        } else {
            state.transitions.push(transition);
        }

        self.labels.insert(label.to_string());
        self.backwards.entry(target.to_string()).or_default().insert(key);
        Ok(())
    }

    /// Returns the target of the transition with `label` leaving `state`.
    ///
    /// # Errors
    /// `UnknownState` or `UnknownTransition`.
    pub fn transition_target(&self, state: &str, label: &str) -> LtsResult<&str> {
        self.state(state)?
            .transitions
            .iter()
            .find(|t| t.label == label)
            .map(|t| t.target.as_str())
            .ok_or_else(|| LtsError::UnknownTransition { state: state.to_string(),
                                                         label: label.to_string(), })
    }

    /// Returns the `index`-th outgoing transition of `state`, in insertion
    /// order.
    ///
    /// # Errors
    /// `UnknownState` if the state does not exist.
    pub fn transition(&self, state: &str, index: usize) -> LtsResult<Option<&Transition>> {
        Ok(self.state(state)?.transitions.get(index))
    }

    /// Removes every transition leaving `state`.
    ///
    /// # Errors
    /// `UnknownState` if the state does not exist.
    pub fn clear_transitions(&mut self, state: &str) -> LtsResult<()> {
        let removed = std::mem::take(&mut self.states
                                              .get_mut(state)
                                              .ok_or_else(|| unknown(state))?
                                              .transitions);
        for transition in removed {
            if let Some(incoming) = self.backwards.get_mut(&transition.target) {
                incoming.remove(&(transition.label, state.to_string()));
            }
        }
        Ok(())
    }

    /// Removes a state that nothing leads into any more, together with its
    /// outgoing transitions.
    ///
    /// # Errors
    /// `UnknownState`, `InitialState`, or `StateInUse` while transitions
    /// still target it.
    pub fn remove_state(&mut self, state: &str) -> LtsResult<()> {
        if !self.states.contains_key(state) {
            return Err(unknown(state));
        }
        if state == self.init_state {
            return Err(LtsError::InitialState { state: state.to_string() });
        }
        let count = self.backwards.get(state).map_or(0, BTreeSet::len);
        if count > 0 {
            return Err(LtsError::StateInUse { state: state.to_string(),
                                              count });
        }
        self.clear_transitions(state)?;
        self.states.shift_remove(state);
        self.backwards.remove(state);
        Ok(())
    }

    /// Returns the `(label, source)` pairs of the transitions reaching
    /// `state`.
    pub fn backwards(&self, state: &str) -> impl Iterator<Item = (&str, &str)> {
        self.backwards
            .get(state)
            .into_iter()
            .flatten()
            .map(|(label, source)| (label.as_str(), source.as_str()))
    }

    /// Returns the states without outgoing transitions, in creation order.
    #[must_use]
    pub fn dead_ends(&self) -> Vec<&str> {
        self.states
            .iter()
            .filter(|(_, state)| state.transitions.is_empty())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Sets how the engine interprets the transitions leaving `state`.
    ///
    /// # Errors
    /// `UnknownState` if the state does not exist.
    pub fn set_state_type(&mut self, state: &str, kind: StateType) -> LtsResult<()> {
        self.states.get_mut(state).ok_or_else(|| unknown(state))?.kind = kind;
        Ok(())
    }

    /// # Errors
    /// `UnknownState` if the state does not exist.
    pub fn state_type(&self, state: &str) -> LtsResult<StateType> {
        Ok(self.state(state)?.kind)
    }

    /// Iterates mutably over every transition along with the type of its
    /// source state.
    pub fn transitions_mut(&mut self) -> impl Iterator<Item = (StateType, &mut Transition)> {
        self.states.values_mut().flat_map(|state| {
                                    let kind = state.kind;
                                    state.transitions.iter_mut().map(move |t| (kind, t))
                                })
    }

    /// Recomputes the reverse index and the label set from the transitions.
    ///
    /// # Errors
    /// `UnknownState` if a transition targets a state the machine lacks.
    pub fn rebuild_index(&mut self) -> LtsResult<()> {
        if !self.states.contains_key(&self.init_state) {
            return Err(unknown(&self.init_state));
        }
        self.backwards.clear();
        self.labels.clear();
        for (source, state) in &self.states {
            for transition in &state.transitions {
                if !self.states.contains_key(&transition.target) {
                    return Err(unknown(&transition.target));
                }
                self.labels.insert(transition.label.clone());
                self.backwards
                    .entry(transition.target.clone())
                    .or_default()
                    .insert((transition.label.clone(), source.clone()));
            }
        }
        Ok(())
    }

    #[must_use]
    pub const fn store(&self) -> &VariableStore {
        &self.store
    }

    pub const fn store_mut(&mut self) -> &mut VariableStore {
        &mut self.store
    }

    pub fn set_store(&mut self, store: VariableStore) {
        self.store = store;
    }

    /// The declared return type of a function machine.
    #[must_use]
    pub const fn returns(&self) -> Option<DeclaredType> {
        self.returns
    }

    pub const fn set_returns(&mut self, returns: Option<DeclaredType>) {
        self.returns = returns;
    }
}

fn unknown(state: &str) -> LtsError {
    LtsError::UnknownState { state: state.to_string() }
}

/// Writes one block per state: the state, its type, and one `label -> target`
/// line per transition. The initial state is marked with `*`.
impl fmt::Display for Lts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, state) in &self.states {
            let marker = if *name == self.init_state { "*" } else { " " };
            writeln!(f, "{marker}{name} [{}]", state.kind)?;
            for transition in &state.transitions {
                writeln!(f, "    {} -> {}", transition.label, transition.target)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Lts {
        let mut lts = Lts::new("S0");
        let s1 = lts.create_state();
        let s2 = lts.create_state();
        lts.add_transition("S0", "x ← 1", &s1, 1, None).unwrap();
        lts.add_transition(&s1, "x ← 2", &s2, 2, None).unwrap();
        lts
    }

    #[test]
    fn generated_names_skip_taken_ones() {
        let mut lts = Lts::new("S0");
        assert!(lts.add_state("S2"));
        assert_eq!(lts.create_state(), "S3");
        assert_eq!(lts.create_state(), "S4");
        assert!(!lts.add_state("S0"));
    }

    #[test]
    fn unknown_ends_are_rejected() {
        let mut lts = Lts::new("S0");
        assert_eq!(lts.add_transition("S0", "a", "S9", 1, None),
                   Err(LtsError::UnknownState { state: "S9".into() }));
        assert_eq!(lts.add_transition("S7", "a", "S0", 1, None),
                   Err(LtsError::UnknownState { state: "S7".into() }));
    }

    #[test]
    fn relabeling_redirects_in_place() {
        let mut lts = chain();
        let s3 = lts.create_state();
        lts.add_transition("S0", "x ← 1", &s3, 1, None).unwrap();
        assert_eq!(lts.transition_target("S0", "x ← 1"), Ok(s3.as_str()));
        assert_eq!(lts.state("S0").unwrap().transitions.len(), 1);
        assert_eq!(lts.backwards("S1").count(), 0);
        assert_eq!(lts.backwards(&s3).collect::<Vec<_>>(), vec![("x ← 1", "S0")]);
    }

    #[test]
    fn removal_requires_no_incoming_transitions() {
        let mut lts = chain();
        assert_eq!(lts.remove_state("S2"),
                   Err(LtsError::StateInUse { state: "S2".into(),
                                              count: 1, }));
        assert_eq!(lts.remove_state("S0"),
                   Err(LtsError::InitialState { state: "S0".into() }));

        lts.clear_transitions("S1").unwrap();
        lts.remove_state("S2").unwrap();
        assert!(!lts.contains("S2"));
        assert_eq!(lts.dead_ends(), vec!["S1"]);
    }

    #[test]
    fn index_survives_serialization() {
        let lts = chain();
        let json = serde_json::to_string(&lts).unwrap();
        let mut back: Lts = serde_json::from_str(&json).unwrap();
        back.rebuild_index().unwrap();
        assert_eq!(back, lts);
    }

    #[test]
    fn display_lists_transitions() {
        let mut lts = chain();
        lts.set_state_type("S0", StateType::Assign).unwrap();
        assert_eq!(lts.to_string(),
                   "*S0 [Assign]\n    x ← 1 -> S1\n S1 [Undefined]\n    x ← 2 -> S2\n S2 \
                    [Undefined]\n");
    }
}
