//! Reverse-mode automatic differentiation over scalar values.
//!
//! Expressions are built by combining [`Value`]s with arithmetic operations, each of
//! which allocates a new node pointing at its operands. [`Value::backprop`] then
//! computes the derivative of the chosen root with respect to every node it depends on.
//!
//! ```
//! use scalargrad::Value;
//!
//! let a = Value::new(-4.);
//! let b = Value::new(2.);
//! let c = &(&a * &b) + &a;
//! c.backprop();
//! assert_eq!(c.data(), -12.);
//! assert_eq!(a.grad(), 3.);
//! assert_eq!(b.grad(), -4.);
//! ```

mod backprop;
mod op;
mod value;

pub use op::Op;
pub use value::Value;

#[cfg(feature = "macro")]
pub use scalargrad_macro::scalargrad;
