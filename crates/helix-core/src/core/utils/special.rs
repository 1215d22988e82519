use scilib::math::bessel;

/// Bessel function of the first kind `J_n(x)` for integer order.
///
/// Negative orders follow `J_{-n}(x) = (-1)^n J_n(x)`.
pub fn bessel_j(n: i32, x: f64) -> f64 {
    if !x.is_finite() {
        return f64::NAN;
    }
    let value = bessel::j_n(n.unsigned_abs() as i32, x);
    if n < 0 && n % 2 != 0 { -value } else { value }
}
