use std::fmt::Display;

use log::trace;

use crate::Value;

/// The operator that produced a [`Value`], together with the operands it consumed.
///
/// The variant fixes both the arity of the operands and the local derivative rule
/// applied during [`Value::backprop`]. Negation, subtraction and division have no
/// variant of their own; they are built out of `Mul`, `Add` and `Pow`.
#[derive(Clone, Debug)]
pub enum Op {
    /// A raw scalar wrapped into the graph, either by the caller or as a constant.
    Leaf,
    Add(Value, Value),
    AddScalar(Value, f64),
    Mul(Value, Value),
    Pow(Value, Value),
    Relu(Value),
}

impl Op {
    /// Operands in construction order. Empty for leaves.
    pub fn operands(&self) -> impl DoubleEndedIterator<Item = &Value> {
        use Op::*;
        let (lhs, rhs) = match self {
            Leaf => (None, None),
            AddScalar(term, _) | Relu(term) => (Some(term), None),
            Add(lhs, rhs) | Mul(lhs, rhs) | Pow(lhs, rhs) => (Some(lhs), Some(rhs)),
        };
        lhs.into_iter().chain(rhs)
    }

    /// Turn this op into a leaf, moving its operands into `out`.
    pub(crate) fn take_operands(&mut self, out: &mut Vec<Value>) {
        use Op::*;
        match std::mem::replace(self, Leaf) {
            Leaf => (),
            AddScalar(term, _) | Relu(term) => out.push(term),
            Add(lhs, rhs) | Mul(lhs, rhs) | Pow(lhs, rhs) => {
                out.push(lhs);
                out.push(rhs);
            }
        }
    }

    /// Push the contributions of a node's gradient into its operands.
    /// `data` and `grad` are the value and the finalized gradient of the node owning this op.
    pub(crate) fn backward(&self, data: f64, grad: f64) {
        use Op::*;
        match self {
            Leaf => (),
            Add(lhs, rhs) => {
                lhs.accum_grad(grad);
                rhs.accum_grad(grad);
            }
            AddScalar(term, _) => term.accum_grad(grad),
            Mul(lhs, rhs) => {
                lhs.accum_grad(rhs.data() * grad);
                rhs.accum_grad(lhs.data() * grad);
            }
            Pow(base, exp) => {
                let (b, e) = (base.data(), exp.data());
                if b != 0. {
                    base.accum_grad(e * b.powf(e - 1.) * grad);
                }
                // ln(b) is undefined here, so the exponent term is dropped.
                if b > 0. {
                    exp.accum_grad(b.ln() * data * grad);
                } else {
                    trace!("skipping exponent gradient of pow for base {b} <= 0");
                }
            }
            Relu(term) => {
                if term.data() > 0. {
                    term.accum_grad(grad);
                }
            }
        }
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Op::*;
        match self {
            Leaf => Ok(()),
            Add(..) => write!(f, "+"),
            AddScalar(..) => write!(f, "+scalar"),
            Mul(..) => write!(f, "*"),
            Pow(_, exp) => write!(f, "**{}", exp.data()),
            Relu(_) => write!(f, "ReLU"),
        }
    }
}
