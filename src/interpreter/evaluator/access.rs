use std::rc::Rc;

use crate::{
    ast::SizeMeasure,
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
    util::num::{index_to_offset, usize_to_i64_checked},
};

impl Context<'_> {
    /// Reads the element at a 1-based index.
    ///
    /// # Errors
    /// - `ExpectedArray` if `array` is not an array.
    /// - `ExpectedInteger` if `index` is not an integer.
    /// - `IndexOutOfBounds` unless `1 <= index <= len`.
    ///
    /// # Example
    /// ```
    /// use gijigo::interpreter::{evaluator::core::Context, value::core::Value};
    ///
    /// let array = Value::from(vec![Value::Integer(10), Value::Integer(20)]);
    /// let second = Context::eval_array_index(&array, &Value::Integer(2), 1).unwrap();
    /// assert_eq!(second, Value::Integer(20));
    /// assert!(Context::eval_array_index(&array, &Value::Integer(0), 1).is_err());
    /// ```
    pub fn eval_array_index(array: &Value, index: &Value, line: usize) -> EvalResult<Value> {
        let elements = array.as_vec(line)?;
        let offset = index_to_offset(index.as_integer(line)?, elements.len(), line)?;
        Ok(elements[offset].clone())
    }

    /// Measures an array.
    ///
    /// `の要素数` and `の行数` count the top-level elements. `の列数` counts
    /// the elements of the first row and is `0` for an empty array.
    ///
    /// # Errors
    /// `ExpectedArray` if `array`, or for `の列数` its first row, is not an
    /// array.
    pub fn eval_size(array: &Value, measure: SizeMeasure, line: usize) -> EvalResult<Value> {
        let elements = array.as_vec(line)?;
        let size = match measure {
            SizeMeasure::Elements | SizeMeasure::Rows => elements.len(),
            SizeMeasure::Columns => match elements.first() {
                Some(row) => row.as_vec(line)?.len(),
                None => 0,
            },
        };
        Ok(Value::Integer(usize_to_i64_checked(size, line)?))
    }
}

/// Locates the element addressed by `indices` inside `root` for writing.
///
/// Arrays on the path that are shared with other values are copied first, so
/// a store through the returned reference never shows through another
/// binding.
///
/// # Errors
/// The same errors as [`Context::eval_array_index`], for every level of the
/// path.
pub fn element_mut<'v>(root: &'v mut Value,
                       indices: &[Value],
                       line: usize)
                       -> EvalResult<&'v mut Value> {
    let mut slot = root;
    for index in indices {
        let Value::Array(elements) = slot else {
            return Err(RuntimeError::ExpectedArray { line });
        };
        let elements = Rc::make_mut(elements);
        let offset = index_to_offset(index.as_integer(line)?, elements.len(), line)?;
        slot = &mut elements[offset];
    }
    Ok(slot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Value {
        Value::from(vec![Value::from(vec![1.into(), 2.into()]),
                         Value::from(vec![3.into(), 4.into()]),
                         Value::from(vec![5.into(), 6.into()])])
    }

    #[test]
    fn sizes_of_two_dimensional_arrays() {
        let grid = grid();
        assert_eq!(Context::eval_size(&grid, SizeMeasure::Rows, 1), Ok(Value::Integer(3)));
        assert_eq!(Context::eval_size(&grid, SizeMeasure::Columns, 1), Ok(Value::Integer(2)));
        assert_eq!(Context::eval_size(&Value::from(vec![]), SizeMeasure::Columns, 1),
                   Ok(Value::Integer(0)));
    }

    #[test]
    fn element_mut_copies_shared_rows() {
        let original = grid();
        let mut copy = original.clone();
        *element_mut(&mut copy, &[2.into(), 1.into()], 1).unwrap() = Value::Integer(30);

        let row = Context::eval_array_index(&copy, &2.into(), 1).unwrap();
        assert_eq!(Context::eval_array_index(&row, &1.into(), 1), Ok(Value::Integer(30)));
        let row = Context::eval_array_index(&original, &2.into(), 1).unwrap();
        assert_eq!(Context::eval_array_index(&row, &1.into(), 1), Ok(Value::Integer(3)));
    }

    #[test]
    fn element_mut_rejects_scalars() {
        let mut scalar = Value::Integer(1);
        assert_eq!(element_mut(&mut scalar, &[1.into()], 4).unwrap_err(),
                   RuntimeError::ExpectedArray { line: 4 });
    }
}
