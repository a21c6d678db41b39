use rand::Rng;

use crate::{Activation, Error, Result};

/// One dense layer: an affine map plus the scratch values of the last forward pass.
#[derive(Debug, Clone)]
pub struct Layer {
    in_dim: usize,
    out_dim: usize,
    /// Row-major matrix with shape (out_dim, in_dim).
    weights: Vec<f64>,
    biases: Vec<f64>,
    pre_activations: Vec<f64>,
    activations: Vec<f64>,
}

impl Layer {
    /// All-zero layer.
    #[inline]
    pub fn new(in_dim: usize, out_dim: usize) -> Self {
        Self {
            in_dim,
            out_dim,
            weights: vec![0.0; in_dim * out_dim],
            biases: vec![0.0; out_dim],
            pre_activations: vec![0.0; out_dim],
            activations: vec![0.0; out_dim],
        }
    }

    /// Xavier-initialized layer with zero biases.
    ///
    /// Weights are drawn as `uniform(-1, 1) * sqrt(2 / (in_dim + out_dim))`.
    pub fn new_with_rng<R: Rng + ?Sized>(in_dim: usize, out_dim: usize, rng: &mut R) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(Error::InvalidConfiguration(format!(
                "layer dims must be > 0, got in_dim={in_dim} out_dim={out_dim}"
            )));
        }

        let scale = (2.0 / (in_dim + out_dim) as f64).sqrt();
        let mut layer = Self::new(in_dim, out_dim);
        for w in &mut layer.weights {
            *w = rng.gen_range(-1.0_f64..1.0) * scale;
        }
        Ok(layer)
    }

    /// Build a layer from explicit per-neuron weight rows and biases.
    ///
    /// `weights[j]` holds the input weights of neuron `j`.
    pub fn from_parts(weights: &[Vec<f64>], biases: &[f64]) -> Result<Self> {
        let out_dim = weights.len();
        if out_dim == 0 {
            return Err(Error::InvalidConfiguration(
                "layer must have at least one neuron".to_owned(),
            ));
        }
        let in_dim = weights[0].len();
        if in_dim == 0 {
            return Err(Error::InvalidConfiguration(
                "layer must have at least one input".to_owned(),
            ));
        }
        for (j, row) in weights.iter().enumerate() {
            if row.len() != in_dim {
                return Err(Error::InvalidConfiguration(format!(
                    "weight row {j} has len {}, expected {in_dim}",
                    row.len()
                )));
            }
        }
        if biases.len() != out_dim {
            return Err(Error::InvalidConfiguration(format!(
                "biases len {} does not match neuron count {out_dim}",
                biases.len()
            )));
        }

        let mut layer = Self::new(in_dim, out_dim);
        for (dst, row) in layer.weights.chunks_exact_mut(in_dim).zip(weights) {
            dst.copy_from_slice(row);
        }
        layer.biases.copy_from_slice(biases);
        Ok(layer)
    }

    #[inline]
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    #[inline]
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    #[inline]
    pub fn num_params(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    /// Flat row-major weights with shape (out_dim, in_dim).
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    #[inline]
    pub fn weights_mut(&mut self) -> &mut [f64] {
        &mut self.weights
    }

    /// Input weights of neuron `j`.
    ///
    /// Panics if `j >= out_dim`.
    #[inline]
    pub fn row(&self, j: usize) -> &[f64] {
        let start = j * self.in_dim;
        &self.weights[start..start + self.in_dim]
    }

    #[inline]
    pub fn weight(&self, j: usize, k: usize) -> f64 {
        self.weights[j * self.in_dim + k]
    }

    #[inline]
    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    #[inline]
    pub fn biases_mut(&mut self) -> &mut [f64] {
        &mut self.biases
    }

    /// `z` values from the most recent forward pass.
    #[inline]
    pub fn pre_activations(&self) -> &[f64] {
        &self.pre_activations
    }

    /// `a` values from the most recent forward pass.
    #[inline]
    pub fn activations(&self) -> &[f64] {
        &self.activations
    }

    /// Forward pass for a single sample.
    ///
    /// Computes `z = W * inputs + b`, then `a = f(z)`, storing both.
    /// `None` passes `z` through unchanged.
    ///
    /// Shape contract: `inputs.len() == self.in_dim`.
    #[inline]
    pub(crate) fn forward(&mut self, inputs: &[f64], activation: Option<Activation>) {
        debug_assert_eq!(inputs.len(), self.in_dim);

        for j in 0..self.out_dim {
            let row = j * self.in_dim;
            let mut sum = self.biases[j];
            for k in 0..self.in_dim {
                sum = self.weights[row + k].mul_add(inputs[k], sum);
            }
            self.pre_activations[j] = sum;
            self.activations[j] = match activation {
                Some(act) => act.activate(sum),
                None => sum,
            };
        }
    }

    /// Gradient descent update: `p -= scale * dp` for every weight and bias.
    ///
    /// Shape contract:
    /// - `d_weights.len() == self.weights.len()`
    /// - `d_biases.len() == self.out_dim`
    #[inline]
    pub(crate) fn descend(&mut self, d_weights: &[f64], d_biases: &[f64], scale: f64) {
        debug_assert_eq!(d_weights.len(), self.weights.len());
        debug_assert_eq!(d_biases.len(), self.out_dim);

        for (w, &g) in self.weights.iter_mut().zip(d_weights) {
            *w -= scale * g;
        }
        for (b, &g) in self.biases.iter_mut().zip(d_biases) {
            *b -= scale * g;
        }
    }
}
