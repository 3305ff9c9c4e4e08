use std::{
    cell::Cell,
    fmt::{Debug, Display},
    ops::{Add, Div, Mul, Neg, Sub},
    rc::Rc,
};

use crate::Op;

struct ValuePayload {
    data: f64,
    grad: Cell<f64>,
    op: Op,
}

/// Operands are released with an explicit worklist. Dropping them recursively would
/// take one stack frame per node of a long chain.
impl Drop for ValuePayload {
    fn drop(&mut self) {
        let mut pending = vec![];
        self.op.take_operands(&mut pending);
        while let Some(value) = pending.pop() {
            // Payloads still shared with another handle or node stay alive untouched.
            if let Some(mut payload) = Rc::into_inner(value.0) {
                payload.op.take_operands(&mut pending);
            }
        }
    }
}

/// A scalar node in the computation graph.
///
/// Cloning a `Value` clones the handle, not the node: both handles refer to the same
/// node and share its gradient accumulator. Nodes are kept alive for as long as any
/// handle or any node built on top of them exists.
#[derive(Clone)]
pub struct Value(Rc<ValuePayload>);

#[allow(clippy::should_implement_trait)]
impl Value {
    /// Wrap a raw scalar into a leaf node.
    pub fn new(data: f64) -> Value {
        Self::new_payload(data, Op::Leaf)
    }

    fn new_payload(data: f64, op: Op) -> Self {
        Self(Rc::new(ValuePayload {
            data,
            grad: Cell::new(0.),
            op,
        }))
    }

    pub fn data(&self) -> f64 {
        self.0.data
    }

    pub fn grad(&self) -> f64 {
        self.0.grad.get()
    }

    pub fn op(&self) -> &Op {
        &self.0.op
    }

    pub fn operands(&self) -> impl DoubleEndedIterator<Item = &Value> {
        self.0.op.operands()
    }

    /// Returns true if both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub(crate) fn set_grad(&self, grad: f64) {
        self.0.grad.set(grad);
    }

    pub(crate) fn accum_grad(&self, grad: f64) {
        self.0.grad.set(self.0.grad.get() + grad);
    }

    pub fn add(&self, rhs: &Value) -> Value {
        Self::new_payload(
            self.data() + rhs.data(),
            Op::Add(self.clone(), rhs.clone()),
        )
    }

    pub fn add_scalar(&self, scalar: f64) -> Value {
        Self::new_payload(self.data() + scalar, Op::AddScalar(self.clone(), scalar))
    }

    pub fn mul(&self, rhs: &Value) -> Value {
        Self::new_payload(
            self.data() * rhs.data(),
            Op::Mul(self.clone(), rhs.clone()),
        )
    }

    /// The scalar becomes a constant leaf, so the rule of [`Value::mul`] applies.
    pub fn mul_scalar(&self, scalar: f64) -> Value {
        self.mul(&Value::new(scalar))
    }

    /// Raise `self` to the power of `exp`.
    ///
    /// A zero base contributes no gradient to itself, and a non-positive base
    /// contributes no gradient to the exponent.
    pub fn pow(&self, exp: &Value) -> Value {
        Self::new_payload(
            self.data().powf(exp.data()),
            Op::Pow(self.clone(), exp.clone()),
        )
    }

    pub fn pow_scalar(&self, exp: f64) -> Value {
        self.pow(&Value::new(exp))
    }

    pub fn relu(&self) -> Value {
        let data = if self.data() > 0. { self.data() } else { 0. };
        Self::new_payload(data, Op::Relu(self.clone()))
    }

    pub fn neg(&self) -> Value {
        self.mul_scalar(-1.)
    }

    pub fn sub(&self, rhs: &Value) -> Value {
        self.add(&rhs.neg())
    }

    pub fn sub_scalar(&self, scalar: f64) -> Value {
        self.sub(&Value::new(scalar))
    }

    /// Division is multiplication by `rhs ** -1`, so a zero divisor yields an
    /// infinite value instead of an error.
    pub fn div(&self, rhs: &Value) -> Value {
        self.mul(&rhs.pow_scalar(-1.))
    }

    pub fn div_scalar(&self, scalar: f64) -> Value {
        self.div(&Value::new(scalar))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Value(data={}, grad={}, op='{}')",
            self.data(),
            self.grad(),
            self.op()
        )
    }
}

/// Operands are shown by their tag only, not expanded.
impl Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Value")
            .field("data", &self.data())
            .field("grad", &self.grad())
            .field("op", &format_args!("'{}'", self.op()))
            .finish()
    }
}

impl Add for &Value {
    type Output = Value;
    fn add(self, rhs: Self) -> Self::Output {
        Value::add(self, rhs)
    }
}

impl Add<f64> for &Value {
    type Output = Value;
    fn add(self, rhs: f64) -> Self::Output {
        self.add_scalar(rhs)
    }
}

impl Add<&Value> for f64 {
    type Output = Value;
    fn add(self, rhs: &Value) -> Self::Output {
        rhs.add_scalar(self)
    }
}

impl Sub for &Value {
    type Output = Value;
    fn sub(self, rhs: Self) -> Self::Output {
        Value::sub(self, rhs)
    }
}

impl Sub<f64> for &Value {
    type Output = Value;
    fn sub(self, rhs: f64) -> Self::Output {
        self.sub_scalar(rhs)
    }
}

impl Sub<&Value> for f64 {
    type Output = Value;
    fn sub(self, rhs: &Value) -> Self::Output {
        Value::sub(&Value::new(self), rhs)
    }
}

impl Mul for &Value {
    type Output = Value;
    fn mul(self, rhs: Self) -> Self::Output {
        Value::mul(self, rhs)
    }
}

impl Mul<f64> for &Value {
    type Output = Value;
    fn mul(self, rhs: f64) -> Self::Output {
        self.mul_scalar(rhs)
    }
}

impl Mul<&Value> for f64 {
    type Output = Value;
    fn mul(self, rhs: &Value) -> Self::Output {
        rhs.mul_scalar(self)
    }
}

impl Div for &Value {
    type Output = Value;
    fn div(self, rhs: Self) -> Self::Output {
        Value::div(self, rhs)
    }
}

impl Div<f64> for &Value {
    type Output = Value;
    fn div(self, rhs: f64) -> Self::Output {
        self.div_scalar(rhs)
    }
}

impl Div<&Value> for f64 {
    type Output = Value;
    fn div(self, rhs: &Value) -> Self::Output {
        Value::div(&Value::new(self), rhs)
    }
}

impl Neg for &Value {
    type Output = Value;
    fn neg(self) -> Self::Output {
        Value::neg(self)
    }
}

/// Owned operands forward to the reference implementations.
macro_rules! impl_owned_binop {
    ($trait:ident, $method:ident) => {
        impl $trait for Value {
            type Output = Value;
            fn $method(self, rhs: Self) -> Self::Output {
                $trait::$method(&self, &rhs)
            }
        }

        impl $trait<f64> for Value {
            type Output = Value;
            fn $method(self, rhs: f64) -> Self::Output {
                $trait::$method(&self, rhs)
            }
        }

        impl $trait<Value> for f64 {
            type Output = Value;
            fn $method(self, rhs: Value) -> Self::Output {
                $trait::$method(self, &rhs)
            }
        }
    };
}

impl_owned_binop!(Add, add);
impl_owned_binop!(Sub, sub);
impl_owned_binop!(Mul, mul);
impl_owned_binop!(Div, div);

impl Neg for Value {
    type Output = Value;
    fn neg(self) -> Self::Output {
        Value::neg(&self)
    }
}
