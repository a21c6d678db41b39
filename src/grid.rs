//! Decision-surface sampling over the unit square.

use crate::{Error, Network, Result};

/// Network output sampled at the centre of each cell of a `resolution²` grid.
///
/// Column `i` covers `x ∈ [i / res, (i + 1) / res)`; row `j` counts from the
/// top, so row 0 is the band nearest `y = 1`. Values are clamped to `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionGrid {
    resolution: usize,
    /// Column-major: `values[i * resolution + j]`.
    values: Vec<f64>,
}

impl DecisionGrid {
    pub fn sample(network: &mut Network, resolution: usize) -> Result<Self> {
        Self::sample_with(network, resolution, |net, x, y| net.predict(x, y))
    }

    /// Same sampling with identity hidden activations.
    pub fn sample_linear(network: &mut Network, resolution: usize) -> Result<Self> {
        Self::sample_with(network, resolution, |net, x, y| {
            Ok(net.forward_linear(&[x, y])?[0])
        })
    }

    fn sample_with<F>(network: &mut Network, resolution: usize, mut eval: F) -> Result<Self>
    where
        F: FnMut(&mut Network, f64, f64) -> Result<f64>,
    {
        if resolution == 0 {
            return Err(Error::InvalidConfiguration(
                "grid resolution must be > 0".to_owned(),
            ));
        }

        let res = resolution as f64;
        let mut values = Vec::with_capacity(resolution * resolution);
        for i in 0..resolution {
            let x = (i as f64 + 0.5) / res;
            for j in 0..resolution {
                let y = 1.0 - (j as f64 + 0.5) / res;
                values.push(eval(network, x, y)?.clamp(0.0, 1.0));
            }
        }
        Ok(Self { resolution, values })
    }

    #[inline]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Value of column `i`, row `j`.
    ///
    /// Panics if either index is out of range.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.resolution && j < self.resolution, "cell ({i}, {j}) out of range");
        self.values[i * self.resolution + j]
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Share of cells predicted as the positive class.
    pub fn positive_fraction(&self) -> f64 {
        let positive = self.values.iter().filter(|&&v| v >= 0.5).count();
        positive as f64 / self.values.len() as f64
    }
}
