//! Binary cross-entropy for sigmoid outputs.
//!
//! Training always pairs a sigmoid output layer with this loss, which is what
//! makes the output delta collapse to `output - target` (see [`output_delta`]).
//! Swapping either piece requires the full chain rule
//! `dL/da * sigmoid'(z)` instead.

/// Clamp applied to outputs before taking logarithms.
pub const EPSILON: f64 = 1e-7;

/// Binary cross-entropy of a single output unit.
///
/// `-t ln(o) - (1 - t) ln(1 - o)` with `o` clamped to `[EPSILON, 1 - EPSILON]`.
#[inline]
pub fn binary_cross_entropy(output: f64, target: f64) -> f64 {
    let o = output.clamp(EPSILON, 1.0 - EPSILON);
    -(target * o.ln() + (1.0 - target) * (1.0 - o).ln())
}

/// Binary cross-entropy summed over all output units of one sample.
///
/// Shape contract: `outputs.len() == targets.len()`.
#[inline]
pub fn sample_loss(outputs: &[f64], targets: &[f64]) -> f64 {
    debug_assert_eq!(outputs.len(), targets.len());
    outputs
        .iter()
        .zip(targets)
        .map(|(&o, &t)| binary_cross_entropy(o, t))
        .sum()
}

/// `dL/dz` at the output layer for sigmoid + binary cross-entropy.
///
/// Writes `deltas[i] = outputs[i] - targets[i]`.
#[inline]
pub fn output_delta(outputs: &[f64], targets: &[f64], deltas: &mut [f64]) {
    debug_assert_eq!(outputs.len(), targets.len());
    debug_assert_eq!(outputs.len(), deltas.len());
    for ((d, &o), &t) in deltas.iter_mut().zip(outputs).zip(targets) {
        *d = o - t;
    }
}
