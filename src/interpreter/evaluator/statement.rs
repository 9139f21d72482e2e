use std::rc::Rc;

use crate::{
    ast::{Assignment, Declaration, DeclaredType},
    error::RuntimeError,
    interpreter::{
        evaluator::{
            access::element_mut,
            core::{Context, EvalResult},
        },
        value::core::Value,
    },
};

impl Context<'_> {
    /// Applies a declaration.
    ///
    /// Names are declared left to right, so a later initializer may read an
    /// earlier name of the same declaration. A name without an initializer is
    /// bound to `未定義`. If any initializer fails, the store is left exactly
    /// as it was before the declaration.
    ///
    /// # Errors
    /// Any error raised by an initializer, or `TypeError` when an initializer
    /// does not match the array or scalar shape of the declared type.
    pub fn declare(&mut self, declaration: &Declaration) -> EvalResult<()> {
        let snapshot = self.store.clone();
        let result = self.declare_entries(declaration);
        if result.is_err() {
            *self.store = snapshot;
        }
        result
    }

    fn declare_entries(&mut self, declaration: &Declaration) -> EvalResult<()> {
        for (name, initializer) in &declaration.entries {
            let value = match initializer {
                Some(expr) => self.eval(expr)?,
                None => Value::Undefined,
            };
            check_shape(name, declaration.declared, &value, declaration.line)?;
            self.store.declare(name, declaration.declared, value);
        }
        Ok(())
    }

    /// Applies an assignment `name[i]...[j] ← value`.
    ///
    /// The value and all indices are evaluated before anything is stored, so
    /// a failing assignment leaves the store untouched.
    ///
    /// # Errors
    /// - `UnknownVariable` when storing into an element of an unbound name.
    /// - `ExpectedArray`, `ExpectedInteger` or `IndexOutOfBounds` for a bad
    ///   index path.
    /// - `TypeError` when a scalar would replace an array, element or whole.
    pub fn assign(&mut self, assignment: &Assignment) -> EvalResult<()> {
        let Assignment { target,
                         indices,
                         value,
                         line, } = assignment;
        let line = *line;
        let value = self.eval(value)?;
        let indices = self.eval_all(indices)?;

        if indices.is_empty() {
            if let Some(declared) = self.store.declared_type(target) {
                check_shape(target, declared, &value, line)?;
            } else if let Some(current) = self.store.get(target)
                      && current.is_array()
                      && !value.is_array()
                      && !value.is_undefined()
            {
                return Err(scalar_over_array(target, line));
            }
            self.store.set(target, value);
            return Ok(());
        }

        let root = self.store
                       .get_mut(target)
                       .ok_or_else(|| RuntimeError::UnknownVariable { name: target.clone(),
                                                                      line })?;
        let slot = element_mut(root, &indices, line)?;
        if slot.is_array() && !value.is_array() {
            return Err(scalar_over_array(target, line));
        }
        *slot = value;
        Ok(())
    }

    /// Applies an append `name の末尾に value を追加する`.
    ///
    /// # Errors
    /// `UnknownVariable` for an unbound target, `ExpectedArray` when the
    /// target is not an array.
    pub fn append(&mut self, assignment: &Assignment) -> EvalResult<()> {
        let line = assignment.line;
        let value = self.eval(&assignment.value)?;
        let indices = self.eval_all(&assignment.indices)?;

        let root = self.store.get_mut(&assignment.target).ok_or_else(|| {
                                                              RuntimeError::UnknownVariable {
                                                                  name: assignment.target.clone(),
                                                                  line,
                                                              }
                                                          })?;
        match element_mut(root, &indices, line)? {
            Value::Array(elements) => {
                Rc::make_mut(elements).push(value);
                Ok(())
            },
            _ => Err(RuntimeError::ExpectedArray { line }),
        }
    }
}

/// Checks a value against the array or scalar shape of a declared type.
///
/// `未定義` fits every type.
fn check_shape(name: &str, declared: DeclaredType, value: &Value, line: usize) -> EvalResult<()> {
    if value.is_undefined() || declared.is_array() == value.is_array() {
        return Ok(());
    }
    if declared.is_array() {
        Err(scalar_over_array(name, line))
    } else {
        Err(RuntimeError::TypeError { details: format!("Cannot store an array in '{name}' of \
                                                        type {declared}"),
                                      line })
    }
}

fn scalar_over_array(name: &str, line: usize) -> RuntimeError {
    RuntimeError::TypeError { details: format!("Cannot replace array '{name}' with a scalar"),
                              line }
}
