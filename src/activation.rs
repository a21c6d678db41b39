//! Activation functions.
//!
//! A layer computes a pre-activation value `z = W x + b` and then applies an
//! activation element-wise: `a = activation(z)`.
//!
//! Both `z` and `a` are cached on the layer after a forward pass, so every
//! derivative takes both and uses whichever is cheaper. Sigmoid only needs `a`
//! (`a * (1 - a)`), the rectifiers only need the sign of `z`, and swish needs
//! `z` because its slope cannot be recovered from the output alone.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Slope of leaky ReLU for non-positive inputs.
pub const LEAKY_SLOPE: f64 = 0.01;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
/// Element-wise hidden-layer activation.
///
/// The output layer of a [`crate::Network`] is always sigmoid; this only
/// selects what the hidden layers use.
pub enum Activation {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "sigmoid"))]
    Sigmoid,
    #[cfg_attr(feature = "serde", serde(rename = "relu"))]
    ReLU,
    #[cfg_attr(feature = "serde", serde(rename = "leaky_relu"))]
    LeakyReLU,
    #[cfg_attr(feature = "serde", serde(rename = "swish"))]
    Swish,
}

impl Activation {
    pub const ALL: [Activation; 4] = [
        Activation::Sigmoid,
        Activation::ReLU,
        Activation::LeakyReLU,
        Activation::Swish,
    ];

    #[inline]
    pub fn activate(self, x: f64) -> f64 {
        match self {
            Activation::Sigmoid => sigmoid(x),
            Activation::ReLU => x.max(0.0),
            Activation::LeakyReLU => {
                if x > 0.0 {
                    x
                } else {
                    LEAKY_SLOPE * x
                }
            }
            Activation::Swish => x * sigmoid(x),
        }
    }

    /// Derivative of the activation at pre-activation `z`, given the cached
    /// post-activation `a = self.activate(z)`.
    ///
    /// The rectifiers use a flat sub-gradient at exactly zero.
    #[inline]
    pub fn derivative(self, z: f64, a: f64) -> f64 {
        match self {
            Activation::Sigmoid => a * (1.0 - a),
            Activation::ReLU => {
                if z > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::LeakyReLU => {
                if z > 0.0 {
                    1.0
                } else {
                    LEAKY_SLOPE
                }
            }
            Activation::Swish => {
                let s = sigmoid(z);
                s + z * s * (1.0 - s)
            }
        }
    }

    /// Learning rate that trains reasonably on the toy 2D presets.
    ///
    /// Sigmoid hidden layers learn slowly and tolerate large steps; plain
    /// ReLU blows up at that rate.
    pub fn suggested_learning_rate(self) -> f64 {
        match self {
            Activation::Sigmoid => 2.0,
            Activation::ReLU => 0.5,
            Activation::LeakyReLU | Activation::Swish => 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Activation::Sigmoid => "sigmoid",
            Activation::ReLU => "relu",
            Activation::LeakyReLU => "leaky_relu",
            Activation::Swish => "swish",
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Activation::ALL
            .into_iter()
            .find(|act| act.name() == s)
            .ok_or_else(|| {
                Error::InvalidConfiguration(format!(
                    "unknown activation {s:?}; expected one of sigmoid, relu, leaky_relu, swish"
                ))
            })
    }
}

/// Evaluate `kind` at `x`.
#[inline]
pub fn activate(x: f64, kind: Activation) -> f64 {
    kind.activate(x)
}

/// Derivative of `kind` at `pre_activation`, see [`Activation::derivative`].
#[inline]
pub fn activate_derivative(pre_activation: f64, post_activation: f64, kind: Activation) -> f64 {
    kind.derivative(pre_activation, post_activation)
}

/// Logistic function.
///
/// `exp` saturates to `inf`/`0` for extreme inputs, which yields exactly 0 or 1.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
