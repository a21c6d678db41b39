//! In-memory datasets and the toy 2D classification presets.
//!
//! Every preset lives on the unit square with a single 0/1 label, which is the
//! shape the decision-surface widgets draw. Generators take any [`Rng`] so a
//! seeded RNG reproduces a dataset exactly.

use std::f64::consts::PI;

use rand::Rng;

use crate::{Error, Result};

/// A supervised dataset: input rows (X) and target rows (Y).
///
/// Every input row has `input_dim` entries and every target row `target_dim`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    inputs: Vec<Vec<f64>>,
    targets: Vec<Vec<f64>>,
    input_dim: usize,
    target_dim: usize,
}

impl Dataset {
    /// Empty dataset with fixed row widths; fill it with [`Dataset::push`].
    pub fn new(input_dim: usize, target_dim: usize) -> Result<Self> {
        if input_dim == 0 || target_dim == 0 {
            return Err(Error::InvalidData(format!(
                "dims must be > 0, got input_dim={input_dim} target_dim={target_dim}"
            )));
        }
        Ok(Self {
            inputs: Vec::new(),
            targets: Vec::new(),
            input_dim,
            target_dim,
        })
    }

    /// Build a dataset from per-sample rows.
    ///
    /// Row widths are taken from the first sample.
    pub fn from_rows(inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<Self> {
        if inputs.is_empty() {
            return Err(Error::EmptyBatch);
        }
        if inputs.len() != targets.len() {
            return Err(Error::InvalidData(format!(
                "inputs len {} does not match targets len {}",
                inputs.len(),
                targets.len()
            )));
        }

        let mut data = Self::new(inputs[0].len(), targets[0].len())?;
        for (input, target) in inputs.iter().zip(targets) {
            data.push(input.clone(), target.clone())?;
        }
        Ok(data)
    }

    /// Truth table of a two-input logic gate over `{0, 1}²`.
    pub fn logic_gate(gate: Gate) -> Self {
        let mut inputs = Vec::with_capacity(4);
        let mut targets = Vec::with_capacity(4);
        for a in [0.0, 1.0] {
            for b in [0.0, 1.0] {
                inputs.push(vec![a, b]);
                targets.push(vec![gate.eval(a == 1.0, b == 1.0) as u8 as f64]);
            }
        }
        Self {
            inputs,
            targets,
            input_dim: 2,
            target_dim: 1,
        }
    }

    pub fn push(&mut self, input: Vec<f64>, target: Vec<f64>) -> Result<()> {
        if input.len() != self.input_dim {
            return Err(Error::InvalidData(format!(
                "input row {} has len {}, expected {}",
                self.len(),
                input.len(),
                self.input_dim
            )));
        }
        if target.len() != self.target_dim {
            return Err(Error::InvalidData(format!(
                "target row {} has len {}, expected {}",
                self.len(),
                target.len(),
                self.target_dim
            )));
        }
        self.inputs.push(input);
        self.targets.push(target);
        Ok(())
    }

    /// Add a labelled 2D point, as when a user clicks on the plot.
    pub fn push_point(&mut self, x: f64, y: f64, label: f64) -> Result<()> {
        self.push(vec![x, y], vec![label])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[inline]
    pub fn target_dim(&self) -> usize {
        self.target_dim
    }

    #[inline]
    pub fn inputs(&self) -> &[Vec<f64>] {
        &self.inputs
    }

    #[inline]
    pub fn targets(&self) -> &[Vec<f64>] {
        &self.targets
    }

    /// Number of samples whose first target is at least 0.5.
    pub fn positives(&self) -> usize {
        self.targets.iter().filter(|t| t[0] >= 0.5).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    And,
    Or,
    Nand,
    Xor,
}

impl Gate {
    pub fn eval(self, a: bool, b: bool) -> bool {
        match self {
            Gate::And => a && b,
            Gate::Or => a || b,
            Gate::Nand => !(a && b),
            Gate::Xor => a != b,
        }
    }

    /// XOR is the only one a single sigmoid unit cannot separate.
    pub fn linearly_separable(self) -> bool {
        !matches!(self, Gate::Xor)
    }
}

/// Named 2D presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Xor,
    Circle,
    Spirals,
    Checkerboard,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Xor,
        Preset::Circle,
        Preset::Spirals,
        Preset::Checkerboard,
    ];

    pub fn generate<R: Rng + ?Sized>(self, rng: &mut R) -> Dataset {
        match self {
            Preset::Xor => xor_clusters(rng),
            Preset::Circle => circle(rng),
            Preset::Spirals => spirals(rng),
            Preset::Checkerboard => checkerboard(rng),
        }
    }
}

/// Fixed-shape builder for the generators below.
fn points(capacity: usize) -> Dataset {
    Dataset {
        inputs: Vec::with_capacity(capacity),
        targets: Vec::with_capacity(capacity),
        input_dim: 2,
        target_dim: 1,
    }
}

fn push_unchecked(data: &mut Dataset, x: f64, y: f64, label: f64) {
    data.inputs.push(vec![x, y]);
    data.targets.push(vec![label]);
}

/// Uniform noise in `[-width / 2, width / 2)`.
#[inline]
fn jitter<R: Rng + ?Sized>(rng: &mut R, width: f64) -> f64 {
    rng.gen_range(-0.5_f64..0.5) * width
}

/// Four jittered clusters, 10 points each; diagonal corners share a label.
pub fn xor_clusters<R: Rng + ?Sized>(rng: &mut R) -> Dataset {
    const CLUSTERS: [(f64, f64, f64); 4] = [
        (0.25, 0.25, 0.0),
        (0.75, 0.75, 0.0),
        (0.25, 0.75, 1.0),
        (0.75, 0.25, 1.0),
    ];
    let mut data = points(40);
    for (cx, cy, label) in CLUSTERS {
        for _ in 0..10 {
            let x = cx + jitter(rng, 0.15);
            let y = cy + jitter(rng, 0.15);
            push_unchecked(&mut data, x, y, label);
        }
    }
    data
}

/// An inner ring (label 0) inside an outer ring (label 1), 40 angles each.
pub fn circle<R: Rng + ?Sized>(rng: &mut R) -> Dataset {
    let mut data = points(80);
    for i in 0..40 {
        let angle = (i as f64 / 40.0) * 2.0 * PI;
        let (sin, cos) = angle.sin_cos();

        let r_inner = 0.15 + rng.gen_range(0.0_f64..0.05);
        push_unchecked(&mut data, 0.5 + r_inner * cos, 0.5 + r_inner * sin, 0.0);

        let r_outer = 0.3 + rng.gen_range(0.0_f64..0.08);
        push_unchecked(&mut data, 0.5 + r_outer * cos, 0.5 + r_outer * sin, 1.0);
    }
    data
}

/// Two interleaved spirals of 50 points, one and a half turns each.
pub fn spirals<R: Rng + ?Sized>(rng: &mut R) -> Dataset {
    const N: usize = 50;
    let mut data = points(2 * N);
    for i in 0..N {
        let t = (i as f64 / N as f64) * 3.0 * PI;
        let r = (i as f64 / N as f64) * 0.4;
        let (sin, cos) = t.sin_cos();

        let (x, y) = (0.5 + r * cos + jitter(rng, 0.03), 0.5 + r * sin + jitter(rng, 0.03));
        push_unchecked(&mut data, x, y, 0.0);
        let (x, y) = (0.5 - r * cos + jitter(rng, 0.03), 0.5 - r * sin + jitter(rng, 0.03));
        push_unchecked(&mut data, x, y, 1.0);
    }
    data
}

/// 80 uniform points in `[0.1, 0.9)²` labelled by a 4×4 checkerboard.
pub fn checkerboard<R: Rng + ?Sized>(rng: &mut R) -> Dataset {
    let mut data = points(80);
    for _ in 0..80 {
        let x: f64 = rng.gen_range(0.1..0.9);
        let y: f64 = rng.gen_range(0.1..0.9);
        let cell = (x * 4.0).floor() as u32 + (y * 4.0).floor() as u32;
        push_unchecked(&mut data, x, y, (cell % 2) as f64);
    }
    data
}
