//! Small arithmetic helpers kept around as a smoke test for the test harness.

/// Add two numbers together.
pub fn add(x: i64, y: i64) -> i64 {
    x + y
}

/// Subtract `x` from `y`.
pub fn subtract(x: i64, y: i64) -> i64 {
    y - x
}
