//! Special functions not covered by `statrs`

use std::f64::consts::PI;

/// Natural log of the modified Bessel function of the first kind, order 0
///
/// Polynomial approximations from Abramowitz and Stegun 9.8.1 and 9.8.2.
/// The large-argument branch works on the exponentially scaled form so the
/// result stays finite for arguments far beyond `f64` overflow of `I0`.
pub fn ln_bessel_i0(x: f64) -> f64 {
    let ax = x.abs();
    if ax < 3.75 {
        let t = (x / 3.75).powi(2);
        let value = 1.0
            + t * (3.5156229
                + t * (3.0899424
                    + t * (1.2067492 + t * (0.2659732 + t * (0.0360768 + t * 0.0045813)))));
        value.ln()
    } else {
        let t = 3.75 / ax;
        let poly = 0.39894228
            + t * (0.01328592
                + t * (0.00225319
                    + t * (-0.00157565
                        + t * (0.00916281
                            + t * (-0.02057706
                                + t * (0.02635537 + t * (-0.01647633 + t * 0.00392377)))))));
        ax - 0.5 * ax.ln() + poly.ln()
    }
}

/// Log density of the standard normal distribution
pub fn ln_std_normal_pdf(x: f64) -> f64 {
    -0.5 * x * x - 0.5 * (2.0 * PI).ln()
}
