//! A miniature feed-forward network engine for interactive teaching widgets.
//!
//! `tiny-mlp` is a from-scratch multi-layer perceptron small enough to read in
//! one sitting. It backs widgets that train a 2D classifier live, compare
//! hidden activations, show gradients vanishing through deep sigmoid stacks,
//! and show that stacked linear layers collapse into one.
//!
//! # Model
//!
//! - Scalars are `f64`.
//! - Every hidden layer uses the same [`Activation`]; the output layer is
//!   always sigmoid.
//! - Training minimizes binary cross-entropy with full-batch gradient descent:
//!   one [`Network::train_step`] accumulates gradients over the whole batch and
//!   applies a single averaged update.
//! - Layer weights are row-major with shape `(out_dim, in_dim)`.
//!
//! # Scratch state
//!
//! Layers cache the `z`/`a` values of the last forward pass and backprop reads
//! them straight back. Every evaluating method therefore takes `&mut self`: a
//! network has one user at a time, and [`TrainingRun`] holds that exclusive
//! borrow for the duration of an animated run.
//!
//! # Errors
//!
//! Shapes, batch sizes and learning rates are validated before anything is
//! written, so a call that returns `Err` leaves the network untouched.
//!
//! # Quick start
//!
//! ```rust
//! use tiny_mlp::{Activation, Dataset, Gate, Network};
//!
//! # fn main() -> tiny_mlp::Result<()> {
//! let xor = Dataset::logic_gate(Gate::Xor);
//! let mut net = Network::new_with_seed(&[2, 4, 1], Activation::Sigmoid, 0)?;
//!
//! let mut loss = f64::INFINITY;
//! for _ in 0..3_000 {
//!     loss = net.train_step(xor.inputs(), xor.targets(), 2.0)?;
//! }
//! assert!(loss < 0.05);
//! assert!(net.predict(1.0, 0.0)? > 0.5);
//! # Ok(())
//! # }
//! ```
//!
//! # Animated training
//!
//! ```rust
//! use tiny_mlp::{Activation, Network, Preset, RunState, TrainConfig, TrainingRun};
//! use rand::SeedableRng;
//!
//! # fn main() -> tiny_mlp::Result<()> {
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! let data = Preset::Circle.generate(&mut rng);
//! let mut net = Network::new_with_rng(&[2, 6, 6, 1], Activation::Swish, &mut rng)?;
//!
//! let cfg = TrainConfig {
//!     max_epochs: 40,
//!     ..TrainConfig::for_activation(Activation::Swish)
//! };
//! let mut run = TrainingRun::new(&mut net, &data, cfg)?;
//! while run.state() == RunState::Running {
//!     let frame = run.frame()?;
//!     // One entry per layer; redraw the gradient chart with it.
//!     assert_eq!(frame.gradient_magnitudes.len(), 3);
//! }
//! assert_eq!(run.epoch(), 40);
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod data;
pub mod error;
pub mod grid;
pub mod layer;
pub mod loss;
pub mod network;
pub mod train;

pub use activation::{Activation, activate, activate_derivative};
pub use data::{Dataset, Gate, Preset};
pub use error::{Error, Result};
pub use grid::DecisionGrid;
pub use layer::Layer;
pub use network::{AffineMap, Network, collapsed_output};
pub use train::{FitReport, FrameReport, RunState, TrainConfig, TrainingRun};

/// Create a network with Xavier-initialized weights and zero biases.
///
/// Thin wrapper around [`Network::new`].
pub fn create_network(layer_sizes: &[usize], activation: Activation) -> Result<Network> {
    Network::new(layer_sizes, activation)
}

/// Forward pass returning an owned copy of the output.
///
/// Thin wrapper around [`Network::forward`].
pub fn forward(network: &mut Network, input: &[f64]) -> Result<Vec<f64>> {
    network.forward(input).map(<[f64]>::to_vec)
}

/// One full-batch gradient descent step; returns the mean batch loss.
///
/// Thin wrapper around [`Network::train_step`].
pub fn train_step<I, T>(
    network: &mut Network,
    inputs: &[I],
    targets: &[T],
    learning_rate: f64,
) -> Result<f64>
where
    I: AsRef<[f64]>,
    T: AsRef<[f64]>,
{
    network.train_step(inputs, targets, learning_rate)
}

/// Per-layer mean absolute delta over a batch, without updating parameters.
///
/// Thin wrapper around [`Network::layer_gradient_magnitudes`].
pub fn layer_gradient_magnitudes<I, T>(
    network: &mut Network,
    inputs: &[I],
    targets: &[T],
) -> Result<Vec<f64>>
where
    I: AsRef<[f64]>,
    T: AsRef<[f64]>,
{
    network.layer_gradient_magnitudes(inputs, targets)
}

/// First output for the 2D point `(x, y)`.
///
/// Thin wrapper around [`Network::predict`].
pub fn predict(network: &mut Network, x: f64, y: f64) -> Result<f64> {
    network.predict(x, y)
}
