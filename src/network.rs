use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::activation::sigmoid;
use crate::{Activation, Dataset, Error, Layer, Result, loss};

/// A fully connected feed-forward network with sigmoid outputs.
///
/// Hidden layers share one [`Activation`]; the output layer is always sigmoid so
/// that outputs read as probabilities and the cross-entropy delta stays
/// `output - target`.
///
/// Every evaluation writes `z`/`a` scratch values into the layers, which is why
/// even read-only-looking calls such as [`Network::predict`] take `&mut self`.
/// A network is therefore never shared between two concurrent callers.
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
    input_size: usize,
    activation: Activation,
}

/// Parameter gradients summed over a batch (same shapes as the layers).
#[derive(Debug, Clone)]
struct Gradients {
    d_weights: Vec<Vec<f64>>,
    d_biases: Vec<Vec<f64>>,
}

impl Gradients {
    fn zeros_like(net: &Network) -> Self {
        Self {
            d_weights: net.layers.iter().map(|l| vec![0.0; l.weights().len()]).collect(),
            d_biases: net.layers.iter().map(|l| vec![0.0; l.out_dim()]).collect(),
        }
    }
}

/// A single affine map `y = W x + b`, the result of collapsing a network's
/// layers while ignoring hidden activations.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineMap {
    in_dim: usize,
    out_dim: usize,
    /// Row-major matrix with shape (out_dim, in_dim).
    weights: Vec<f64>,
    biases: Vec<f64>,
}

impl AffineMap {
    #[inline]
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    #[inline]
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    #[inline]
    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    pub fn apply(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.in_dim {
            return Err(Error::ShapeMismatch(format!(
                "input len {} does not match map in_dim {}",
                input.len(),
                self.in_dim
            )));
        }
        Ok(self
            .weights
            .chunks_exact(self.in_dim)
            .zip(&self.biases)
            .map(|(row, &b)| row.iter().zip(input).fold(b, |acc, (&w, &x)| w.mul_add(x, acc)))
            .collect())
    }

    /// `next ∘ self`.
    fn then(&self, next: &Layer) -> AffineMap {
        let mut weights = vec![0.0; next.out_dim() * self.in_dim];
        let mut biases = next.biases().to_vec();
        for j in 0..next.out_dim() {
            for m in 0..next.in_dim() {
                let w = next.weight(j, m);
                biases[j] = w.mul_add(self.biases[m], biases[j]);
                for k in 0..self.in_dim {
                    let idx = j * self.in_dim + k;
                    weights[idx] = w.mul_add(self.weights[m * self.in_dim + k], weights[idx]);
                }
            }
        }
        AffineMap {
            in_dim: self.in_dim,
            out_dim: next.out_dim(),
            weights,
            biases,
        }
    }
}

impl Network {
    /// Create a network with thread-local randomness.
    ///
    /// `layer_sizes` includes the input and output sizes, e.g. `[2, 6, 6, 1]`.
    pub fn new(layer_sizes: &[usize], activation: Activation) -> Result<Self> {
        Self::new_with_rng(layer_sizes, activation, &mut rand::thread_rng())
    }

    pub fn new_with_seed(layer_sizes: &[usize], activation: Activation, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new_with_rng(layer_sizes, activation, &mut rng)
    }

    pub fn new_with_rng<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        activation: Activation,
        rng: &mut R,
    ) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(Error::InvalidConfiguration(format!(
                "layer sizes must include input and output sizes, got {layer_sizes:?}"
            )));
        }
        if layer_sizes.contains(&0) {
            return Err(Error::InvalidConfiguration(format!(
                "all layer sizes must be > 0, got {layer_sizes:?}"
            )));
        }

        let mut layers = Vec::with_capacity(layer_sizes.len() - 1);
        for w in layer_sizes.windows(2) {
            layers.push(Layer::new_with_rng(w[0], w[1], rng)?);
        }

        let net = Self {
            layers,
            input_size: layer_sizes[0],
            activation,
        };
        debug!(
            sizes = ?layer_sizes,
            %activation,
            params = net.num_params(),
            "created network"
        );
        Ok(net)
    }

    /// Assemble a network from explicit layers.
    pub fn from_layers(layers: Vec<Layer>, activation: Activation) -> Result<Self> {
        let Some(first) = layers.first() else {
            return Err(Error::InvalidConfiguration(
                "network must have at least one layer".to_owned(),
            ));
        };
        let input_size = first.in_dim();
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[1].in_dim() != pair[0].out_dim() {
                return Err(Error::InvalidConfiguration(format!(
                    "layer {} in_dim {} does not match previous out_dim {}",
                    i + 1,
                    pair[1].in_dim(),
                    pair[0].out_dim()
                )));
            }
        }
        Ok(Self {
            layers,
            input_size,
            activation,
        })
    }

    #[inline]
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    #[inline]
    pub fn output_size(&self) -> usize {
        self.output_layer().out_dim()
    }

    /// Hidden-layer activation.
    #[inline]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Mutable access to a layer's parameters, e.g. to hand-set weights.
    ///
    /// Panics if `idx >= num_layers()`.
    #[inline]
    pub fn layer_mut(&mut self, idx: usize) -> &mut Layer {
        &mut self.layers[idx]
    }

    /// `[input_size, out_dim of each layer...]`.
    pub fn layer_sizes(&self) -> Vec<usize> {
        std::iter::once(self.input_size)
            .chain(self.layers.iter().map(Layer::out_dim))
            .collect()
    }

    pub fn num_params(&self) -> usize {
        self.layers.iter().map(Layer::num_params).sum()
    }

    #[inline]
    fn output_layer(&self) -> &Layer {
        // `Network` is never built without layers.
        &self.layers[self.layers.len() - 1]
    }

    /// Output of the most recent forward pass.
    #[inline]
    pub fn output(&self) -> &[f64] {
        self.output_layer().activations()
    }

    /// Forward pass for a single sample.
    ///
    /// Overwrites every layer's `z`/`a` scratch and returns the output activations.
    pub fn forward(&mut self, input: &[f64]) -> Result<&[f64]> {
        self.check_input(input)?;
        self.forward_unchecked(input, false);
        Ok(self.output())
    }

    /// Forward pass with the identity on every hidden layer.
    ///
    /// The output layer keeps its sigmoid. However deep the network, the result
    /// equals `sigmoid` of a single affine map (see [`Network::collapse_to_affine`]).
    pub fn forward_linear(&mut self, input: &[f64]) -> Result<&[f64]> {
        self.check_input(input)?;
        self.forward_unchecked(input, true);
        Ok(self.output())
    }

    fn forward_unchecked(&mut self, input: &[f64], linear_hidden: bool) {
        let last = self.layers.len() - 1;
        let hidden = (!linear_hidden).then_some(self.activation);

        for idx in 0..self.layers.len() {
            let act = if idx == last {
                Some(Activation::Sigmoid)
            } else {
                hidden
            };
            if idx == 0 {
                self.layers[0].forward(input, act);
            } else {
                // Borrow the previous layer immutably and the current one mutably.
                let (left, right) = self.layers.split_at_mut(idx);
                right[0].forward(left[idx - 1].activations(), act);
            }
        }
    }

    /// Single-output prediction for a 2D point.
    pub fn predict(&mut self, x: f64, y: f64) -> Result<f64> {
        Ok(self.forward(&[x, y])?[0])
    }

    /// Compose every layer's affine transform into one map, skipping hidden
    /// activations.
    pub fn collapse_to_affine(&self) -> AffineMap {
        let first = &self.layers[0];
        let base = AffineMap {
            in_dim: first.in_dim(),
            out_dim: first.out_dim(),
            weights: first.weights().to_vec(),
            biases: first.biases().to_vec(),
        };
        self.layers[1..].iter().fold(base, |map, layer| map.then(layer))
    }

    /// One full-batch gradient descent step on binary cross-entropy.
    ///
    /// Gradients are summed over every sample and applied once, scaled by
    /// `learning_rate / batch_size`. Returns the mean loss over the batch
    /// (summed over output units), measured before the update.
    ///
    /// Afterwards the layer scratch holds the last sample's forward pass.
    pub fn train_step<I, T>(&mut self, inputs: &[I], targets: &[T], learning_rate: f64) -> Result<f64>
    where
        I: AsRef<[f64]>,
        T: AsRef<[f64]>,
    {
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "learning rate must be finite and > 0, got {learning_rate}"
            )));
        }
        self.check_batch(inputs, targets)?;

        let mut grads = Gradients::zeros_like(self);
        let mut deltas = self.delta_buffers();
        let mut total_loss = 0.0;

        for (input, target) in inputs.iter().zip(targets) {
            let (input, target) = (input.as_ref(), target.as_ref());
            self.forward_unchecked(input, false);
            total_loss += loss::sample_loss(self.output(), target);
            self.backprop(target, &mut deltas);

            for (l, layer) in self.layers.iter().enumerate() {
                let prev = if l == 0 {
                    input
                } else {
                    self.layers[l - 1].activations()
                };
                let d_w = &mut grads.d_weights[l];
                let d_b = &mut grads.d_biases[l];
                for (j, &delta) in deltas[l].iter().enumerate() {
                    let row = j * layer.in_dim();
                    for (k, &p) in prev.iter().enumerate() {
                        d_w[row + k] = delta.mul_add(p, d_w[row + k]);
                    }
                    d_b[j] += delta;
                }
            }
        }

        let n = inputs.len() as f64;
        let scale = learning_rate / n;
        for (l, layer) in self.layers.iter_mut().enumerate() {
            layer.descend(&grads.d_weights[l], &grads.d_biases[l], scale);
        }

        let mean_loss = total_loss / n;
        trace!(loss = mean_loss, batch = inputs.len(), "train step");
        Ok(mean_loss)
    }

    /// Mean absolute backprop delta per layer, averaged over the batch.
    ///
    /// Runs the same forward/backward pass as [`Network::train_step`] without
    /// touching weights or biases, to show how gradient size changes with
    /// depth. Index 0 is the first hidden layer, the last entry is the output
    /// layer.
    pub fn layer_gradient_magnitudes<I, T>(&mut self, inputs: &[I], targets: &[T]) -> Result<Vec<f64>>
    where
        I: AsRef<[f64]>,
        T: AsRef<[f64]>,
    {
        self.check_batch(inputs, targets)?;

        let mut deltas = self.delta_buffers();
        let mut magnitudes = vec![0.0; self.layers.len()];

        for (input, target) in inputs.iter().zip(targets) {
            self.forward_unchecked(input.as_ref(), false);
            self.backprop(target.as_ref(), &mut deltas);

            for (mag, layer_deltas) in magnitudes.iter_mut().zip(&deltas) {
                let sum: f64 = layer_deltas.iter().map(|d| d.abs()).sum();
                *mag += sum / layer_deltas.len() as f64;
            }
        }

        let n = inputs.len() as f64;
        for mag in &mut magnitudes {
            *mag /= n;
        }
        Ok(magnitudes)
    }

    /// Mean binary cross-entropy over a batch, without updating parameters.
    pub fn loss<I, T>(&mut self, inputs: &[I], targets: &[T]) -> Result<f64>
    where
        I: AsRef<[f64]>,
        T: AsRef<[f64]>,
    {
        self.check_batch(inputs, targets)?;

        let mut total = 0.0;
        for (input, target) in inputs.iter().zip(targets) {
            self.forward_unchecked(input.as_ref(), false);
            total += loss::sample_loss(self.output(), target.as_ref());
        }
        Ok(total / inputs.len() as f64)
    }

    /// Fraction of samples whose first output lands on the same side of 0.5
    /// as the target.
    pub fn accuracy(&mut self, data: &Dataset) -> Result<f64> {
        self.check_batch(data.inputs(), data.targets())?;

        let mut correct = 0usize;
        for (input, target) in data.inputs().iter().zip(data.targets()) {
            self.forward_unchecked(input, false);
            if (self.output()[0] >= 0.5) == (target[0] >= 0.5) {
                correct += 1;
            }
        }
        Ok(correct as f64 / data.len() as f64)
    }

    fn delta_buffers(&self) -> Vec<Vec<f64>> {
        self.layers.iter().map(|l| vec![0.0; l.out_dim()]).collect()
    }

    /// Fill `deltas` with `dL/dz` for every layer.
    ///
    /// Must follow `forward_unchecked` on the same sample; reads the cached
    /// `z`/`a` values.
    fn backprop(&self, target: &[f64], deltas: &mut [Vec<f64>]) {
        let last = self.layers.len() - 1;

        // Sigmoid output + cross-entropy: dL/dz = output - target.
        loss::output_delta(self.output(), target, &mut deltas[last]);

        for l in (0..last).rev() {
            let layer = &self.layers[l];
            let next = &self.layers[l + 1];
            let (left, right) = deltas.split_at_mut(l + 1);
            let next_deltas = &right[0];

            for (j, delta) in left[l].iter_mut().enumerate() {
                let mut error = 0.0;
                for (k, &nd) in next_deltas.iter().enumerate() {
                    error = nd.mul_add(next.weight(k, j), error);
                }
                let z = layer.pre_activations()[j];
                let a = layer.activations()[j];
                *delta = error * self.activation.derivative(z, a);
            }
        }
    }

    fn check_input(&self, input: &[f64]) -> Result<()> {
        if input.len() != self.input_size {
            return Err(Error::ShapeMismatch(format!(
                "input len {} does not match network input size {}",
                input.len(),
                self.input_size
            )));
        }
        Ok(())
    }

    fn check_batch<I, T>(&self, inputs: &[I], targets: &[T]) -> Result<()>
    where
        I: AsRef<[f64]>,
        T: AsRef<[f64]>,
    {
        if inputs.is_empty() {
            return Err(Error::EmptyBatch);
        }
        if inputs.len() != targets.len() {
            return Err(Error::ShapeMismatch(format!(
                "{} inputs but {} targets",
                inputs.len(),
                targets.len()
            )));
        }
        for (i, (input, target)) in inputs.iter().zip(targets).enumerate() {
            let (input, target) = (input.as_ref(), target.as_ref());
            if input.len() != self.input_size {
                return Err(Error::ShapeMismatch(format!(
                    "input {i} has len {}, network input size is {}",
                    input.len(),
                    self.input_size
                )));
            }
            if target.len() != self.output_size() {
                return Err(Error::ShapeMismatch(format!(
                    "target {i} has len {}, network output size is {}",
                    target.len(),
                    self.output_size()
                )));
            }
        }
        Ok(())
    }
}

/// Sigmoid of the collapsed affine map, for comparing against
/// [`Network::forward_linear`].
pub fn collapsed_output(map: &AffineMap, input: &[f64]) -> Result<Vec<f64>> {
    Ok(map.apply(input)?.into_iter().map(sigmoid).collect())
}
