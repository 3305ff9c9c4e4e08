#![allow(dead_code)]

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[track_caller]
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "{actual} != {expected} (tolerance 1e-6)"
    );
}
