mod common;

use common::{assert_close, init_logger};
use scalargrad::{Op, Value};

#[test]
fn add() {
    init_logger();
    let a = Value::new(-4.);
    let b = Value::new(2.);
    let c = &a + &b;
    c.backprop();
    assert_eq!(c.data(), -2.);
    assert_eq!(a.grad(), 1.);
    assert_eq!(b.grad(), 1.);
}

#[test]
fn add_scalar() {
    let a = Value::new(2.);
    let c = a.add_scalar(3.);
    c.backprop();
    assert_eq!(c.data(), 5.);
    assert_eq!(a.grad(), 1.);
    assert!(matches!(c.op(), Op::AddScalar(_, k) if *k == 3.));
    assert_eq!(c.operands().count(), 1);
}

#[test]
fn mul() {
    let a = Value::new(-4.);
    let b = Value::new(2.);
    let d = a.mul(&b);
    d.backprop();
    assert_eq!(d.data(), -8.);
    assert_eq!(a.grad(), 2.);
    assert_eq!(b.grad(), -4.);
}

#[test]
fn mul_scalar() {
    let a = Value::new(2.);
    let c = &a * 3.;
    c.backprop();
    assert_eq!(c.data(), 6.);
    assert_eq!(a.grad(), 3.);
    assert!(matches!(c.op(), Op::Mul(..)));
}

#[test]
fn sub() {
    let a = Value::new(-4.);
    let b = Value::new(2.);
    let e = &a - &b;
    e.backprop();
    assert_close(e.data(), -6.);
    assert_close(a.grad(), 1.);
    assert_close(b.grad(), -1.);
}

#[test]
fn sub_scalar() {
    let a = Value::new(5.);
    let c = &a - 2.;
    c.backprop();
    assert_eq!(c.data(), 3.);
    assert_eq!(a.grad(), 1.);
}

#[test]
fn neg() {
    let a = Value::new(-4.);
    let c = -&a;
    c.backprop();
    assert_eq!(c.data(), 4.);
    assert_eq!(a.grad(), -1.);
}

#[test]
fn div() {
    let a = Value::new(6.);
    let b = Value::new(3.);
    let c = &a / &b;
    c.backprop();
    assert_close(c.data(), 2.);
    assert_close(a.grad(), 1. / 3.);
    assert_close(b.grad(), -6. / 9.);
}

#[test]
fn div_scalar() {
    let a = Value::new(49.);
    let c = &a / 2.;
    c.backprop();
    assert_close(c.data(), 24.5);
    assert_close(a.grad(), 0.5);
}

#[test]
fn scalar_on_the_left() {
    let a = Value::new(4.);
    let sum = 1. + &a;
    let diff = 1. - &a;
    let prod = 3. * &a;
    let quot = 8. / &a;
    assert_eq!(sum.data(), 5.);
    assert_eq!(diff.data(), -3.);
    assert_eq!(prod.data(), 12.);
    assert_close(quot.data(), 2.);

    quot.backprop();
    assert_close(a.grad(), -8. / 16.);
}

#[test]
fn div_by_zero_is_infinite() {
    let a = Value::new(1.);
    let b = Value::new(0.);
    let c = &a / &b;
    assert!(c.data().is_infinite());
    c.backprop();
    assert!(a.grad().is_infinite());
}

#[test]
fn pow() {
    let a = Value::new(2.);
    let exp = Value::new(3.);
    let c = a.pow(&exp);
    c.backprop();
    assert_close(c.data(), 8.);
    assert_close(a.grad(), 12.);
    assert_close(exp.grad(), 2f64.ln() * 8.);
}

#[test]
fn pow_scalar() {
    let a = Value::new(-4.);
    let d = a.pow_scalar(3.);
    d.backprop();
    assert_close(d.data(), -64.);
    assert_close(a.grad(), 48.);
}

#[test]
fn pow_negative_base() {
    init_logger();
    let a = Value::new(-4.);
    let c = a.pow_scalar(2.);
    c.backprop();
    assert_close(c.data(), 16.);
    assert_close(a.grad(), -8.);

    let exp = c.operands().nth(1).expect("pow has an exponent operand");
    assert_eq!(exp.data(), 2.);
    assert_eq!(exp.grad(), 0.);
}

#[test]
fn pow_zero_base() {
    let a = Value::new(0.);
    let exp = Value::new(2.);
    let c = a.pow(&exp);
    c.backprop();
    assert_eq!(c.data(), 0.);
    assert_eq!(a.grad(), 0.);
    assert_eq!(exp.grad(), 0.);
}

#[test]
fn relu() {
    let a = Value::new(-2.);
    let b = Value::new(3.);
    let ra = a.relu();
    let rb = b.relu();
    ra.backprop();
    rb.backprop();
    assert_eq!(ra.data(), 0.);
    assert_eq!(rb.data(), 3.);
    assert_eq!(a.grad(), 0.);
    assert_eq!(b.grad(), 1.);
}

#[test]
fn relu_at_zero() {
    let a = Value::new(0.);
    let c = a.relu();
    c.backprop();
    assert_eq!(c.data(), 0.);
    assert_eq!(a.grad(), 0.);
}

#[test]
fn display() {
    let a = Value::new(2.);
    let b = Value::new(3.);
    assert_eq!(a.to_string(), "Value(data=2, grad=0, op='')");

    let c = &a + &b;
    c.backprop();
    assert_eq!(c.to_string(), "Value(data=5, grad=1, op='+')");
    assert_eq!(a.add_scalar(1.).op().to_string(), "+scalar");
    assert_eq!((&a * &b).op().to_string(), "*");
    assert_eq!(a.pow_scalar(2.).op().to_string(), "**2");
    assert_eq!(a.relu().op().to_string(), "ReLU");
}

#[test]
fn owned_operators() {
    let a = Value::new(6.);
    let b = Value::new(3.);

    let c = Value::new(2.) * Value::new(3.) + 1.;
    assert_eq!(c.data(), 7.);
    let d = 10. - a.clone() / b.clone();
    assert_close(d.data(), 8.);
    assert_close((-d).data(), -8.);
    assert_close((2. * a.clone() - 1.).data(), 11.);
    assert_close((12. / b.clone()).data(), 4.);

    let e = a.clone() * b.clone() + a.clone();
    e.backprop();
    assert_eq!(e.data(), 24.);
    assert_eq!(a.grad(), 4.);
    assert_eq!(b.grad(), 6.);
}

#[test]
fn debug_is_shallow() {
    let a = Value::new(2.);
    let b = Value::new(3.);
    let c = &a * &b;
    assert_eq!(format!("{c:?}"), "Value { data: 6.0, grad: 0.0, op: '*' }");
    assert_eq!(format!("{a:?}"), "Value { data: 2.0, grad: 0.0, op: '' }");
}
