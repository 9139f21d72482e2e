use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    ast::DeclaredType,
    error::RuntimeError,
    interpreter::{evaluator::core::EvalResult, value::core::Value},
};

/// The variable bindings owned by one machine.
///
/// Bindings keep the order in which names were first bound, which is the
/// order they are displayed and serialized in. Declared types are recorded
/// separately and only for declared names; a name may be bound by assignment
/// without ever being declared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableStore {
    #[serde(default)]
    values: IndexMap<String, Value>,
    #[serde(default)]
    types:  IndexMap<String, DeclaredType>,
    #[serde(default)]
    params: Vec<String>,
}

impl VariableStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the initial store of a function: every parameter declared with
    /// its type and bound to `未定義`.
    #[must_use]
    pub fn with_params(params: &[(String, DeclaredType)]) -> Self {
        let mut store = Self::new();
        for (name, declared) in params {
            store.declare(name, *declared, Value::Undefined);
            store.params.push(name.clone());
        }
        store
    }

    /// Builds the store for one invocation of the function owning `self`.
    ///
    /// Arguments are bound to the formal parameters in order; every other
    /// binding starts fresh.
    ///
    /// # Errors
    /// `ArgumentCountMismatch` unless exactly one argument is given per
    /// parameter.
    pub fn for_call(&self, function: &str, arguments: Vec<Value>, line: usize) -> EvalResult<Self> {
        if arguments.len() != self.params.len() {
            return Err(RuntimeError::ArgumentCountMismatch { name: function.to_string(),
                                                             expected: self.params.len(),
                                                             found: arguments.len(),
                                                             line });
        }
        let mut store = Self { values: IndexMap::new(),
                               types:  IndexMap::new(),
                               params: self.params.clone(), };
        for (name, value) in self.params.iter().zip(arguments) {
            match self.types.get(name) {
                Some(declared) => store.declare(name, *declared, value),
                None => store.set(name, value),
            }
        }
        Ok(store)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.values.get_mut(name)
    }

    /// Binds `name`, keeping its position if it was already bound.
    pub fn set(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
        } else {
            self.values.insert(name.to_string(), value);
        }
    }

    /// Records the declared type of `name` and binds it.
    pub fn declare(&mut self, name: &str, declared: DeclaredType, value: Value) {
        self.types.insert(name.to_string(), declared);
        self.set(name, value);
    }

    #[must_use]
    pub fn declared_type(&self, name: &str) -> Option<DeclaredType> {
        self.types.get(name).copied()
    }

    /// Releases a loop variable: declared names fall back to `未定義`, names
    /// bound only by the loop disappear.
    pub fn unbind(&mut self, name: &str) {
        if self.types.contains_key(name) {
            self.set(name, Value::Undefined);
        } else {
            self.values.shift_remove(name);
        }
    }

    /// Formal parameter names, in order.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Iterates over all bindings in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for VariableStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.values {
            match self.types.get(name) {
                Some(declared) => writeln!(f, "{name}: {declared} = {value}")?,
                None => writeln!(f, "{name} = {value}")?,
            }
        }
        Ok(())
    }
}
