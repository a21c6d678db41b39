//! Frame-driven training runs.
//!
//! Widgets animate training by running a handful of full-batch steps per
//! rendered frame. [`TrainingRun`] is that loop pulled out of the UI: it
//! borrows one network mutably for the whole run, so nothing else can touch
//! the network's scratch state until the run is dropped. Cancelling just means
//! no more steps get scheduled.

use std::collections::VecDeque;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Activation, Dataset, Error, Network, Result};

/// Knobs for one [`TrainingRun`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    pub learning_rate: f64,
    /// Full-batch steps per [`TrainingRun::frame`].
    pub steps_per_frame: usize,
    /// Total step budget for the run.
    pub max_epochs: usize,
    /// Gradient-magnitude snapshots kept, oldest dropped first.
    pub history_len: usize,
    /// Finish early once the mean loss is at or below this value.
    pub target_loss: Option<f64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            learning_rate: 2.0,
            steps_per_frame: 8,
            max_epochs: 5_000,
            history_len: 60,
            target_loss: None,
        }
    }
}

impl TrainConfig {
    /// Trainer defaults (8 steps per frame, 5000 epochs) with the
    /// activation's suggested learning rate.
    pub fn for_activation(activation: Activation) -> Self {
        Self {
            learning_rate: activation.suggested_learning_rate(),
            ..Self::default()
        }
    }

    /// Pacing of the activation comparison: 5 steps per frame, 3000 epochs.
    pub fn for_explorer(activation: Activation) -> Self {
        Self {
            steps_per_frame: 5,
            max_epochs: 3_000,
            ..Self::for_activation(activation)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "learning rate must be finite and > 0, got {}",
                self.learning_rate
            )));
        }
        if self.steps_per_frame == 0 {
            return Err(Error::InvalidConfiguration(
                "steps_per_frame must be > 0".to_owned(),
            ));
        }
        if self.max_epochs == 0 {
            return Err(Error::InvalidConfiguration(
                "max_epochs must be > 0".to_owned(),
            ));
        }
        if let Some(target) = self.target_loss {
            if !(target.is_finite() && target >= 0.0) {
                return Err(Error::InvalidConfiguration(format!(
                    "target loss must be finite and >= 0, got {target}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    /// Step budget exhausted or target loss reached.
    Finished,
    /// Cancelled through [`TrainingRun::stop`].
    Stopped,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Steps completed so far.
    pub epoch: usize,
    /// Mean loss returned by the last step, `None` before the first one.
    pub loss: Option<f64>,
    /// Per-layer gradient magnitudes after this frame's steps.
    pub gradient_magnitudes: Vec<f64>,
    pub state: RunState,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    pub epochs: usize,
    pub final_loss: Option<f64>,
    pub state: RunState,
}

/// One training run over a fixed dataset.
#[derive(Debug)]
pub struct TrainingRun<'a> {
    network: &'a mut Network,
    data: &'a Dataset,
    config: TrainConfig,
    epoch: usize,
    last_loss: Option<f64>,
    history: VecDeque<Vec<f64>>,
    state: RunState,
}

impl<'a> TrainingRun<'a> {
    pub fn new(network: &'a mut Network, data: &'a Dataset, config: TrainConfig) -> Result<Self> {
        config.validate()?;
        if data.is_empty() {
            return Err(Error::EmptyBatch);
        }
        if data.input_dim() != network.input_size() {
            return Err(Error::ShapeMismatch(format!(
                "dataset input_dim {} does not match network input size {}",
                data.input_dim(),
                network.input_size()
            )));
        }
        if data.target_dim() != network.output_size() {
            return Err(Error::ShapeMismatch(format!(
                "dataset target_dim {} does not match network output size {}",
                data.target_dim(),
                network.output_size()
            )));
        }

        debug!(
            samples = data.len(),
            lr = config.learning_rate,
            max_epochs = config.max_epochs,
            "starting training run"
        );
        Ok(Self {
            network,
            data,
            config,
            epoch: 0,
            last_loss: None,
            history: VecDeque::with_capacity(config.history_len),
            state: RunState::Running,
        })
    }

    /// Run one frame's worth of steps.
    ///
    /// Once the run has finished or been stopped this does nothing and
    /// reports the current state with empty gradient magnitudes.
    pub fn frame(&mut self) -> Result<FrameReport> {
        if self.state != RunState::Running {
            return Ok(self.report(Vec::new()));
        }

        let steps = self
            .config
            .steps_per_frame
            .min(self.config.max_epochs - self.epoch);
        for _ in 0..steps {
            let loss = self.network.train_step(
                self.data.inputs(),
                self.data.targets(),
                self.config.learning_rate,
            )?;
            self.epoch += 1;
            self.last_loss = Some(loss);

            if self.config.target_loss.is_some_and(|target| loss <= target) {
                self.finish();
                break;
            }
        }
        if self.epoch >= self.config.max_epochs {
            self.finish();
        }

        let mags = self
            .network
            .layer_gradient_magnitudes(self.data.inputs(), self.data.targets())?;
        if self.config.history_len > 0 {
            if self.history.len() == self.config.history_len {
                self.history.pop_front();
            }
            self.history.push_back(mags.clone());
        }

        Ok(self.report(mags))
    }

    /// Drive frames until the run finishes or is stopped.
    pub fn run_to_completion(&mut self) -> Result<FitReport> {
        while self.state == RunState::Running {
            self.frame()?;
        }
        Ok(FitReport {
            epochs: self.epoch,
            final_loss: self.last_loss,
            state: self.state,
        })
    }

    /// Stop scheduling steps. Parameters keep whatever the last step produced.
    pub fn stop(&mut self) {
        if self.state == RunState::Running {
            self.state = RunState::Stopped;
            info!(epoch = self.epoch, loss = ?self.last_loss, "training stopped");
        }
    }

    fn finish(&mut self) {
        if self.state == RunState::Running {
            self.state = RunState::Finished;
            info!(epoch = self.epoch, loss = ?self.last_loss, "training finished");
        }
    }

    fn report(&self, gradient_magnitudes: Vec<f64>) -> FrameReport {
        FrameReport {
            epoch: self.epoch,
            loss: self.last_loss,
            gradient_magnitudes,
            state: self.state,
        }
    }

    #[inline]
    pub fn state(&self) -> RunState {
        self.state
    }

    #[inline]
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    #[inline]
    pub fn last_loss(&self) -> Option<f64> {
        self.last_loss
    }

    #[inline]
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Gradient-magnitude snapshots, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        self.history.iter().map(Vec::as_slice)
    }

    /// Read access to the network between frames, e.g. to sample a decision grid.
    #[inline]
    pub fn network(&self) -> &Network {
        &*self.network
    }

    /// Mutable access between frames; evaluation needs `&mut` for scratch.
    #[inline]
    pub fn network_mut(&mut self) -> &mut Network {
        &mut *self.network
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Gate;

    fn xor_net(seed: u64) -> Network {
        Network::new_with_seed(&[2, 4, 1], Activation::Sigmoid, seed).unwrap()
    }

    #[test]
    fn config_validation() {
        assert!(TrainConfig::default().validate().is_ok());
        for bad in [
            TrainConfig {
                learning_rate: 0.0,
                ..Default::default()
            },
            TrainConfig {
                steps_per_frame: 0,
                ..Default::default()
            },
            TrainConfig {
                max_epochs: 0,
                ..Default::default()
            },
            TrainConfig {
                target_loss: Some(f64::NAN),
                ..Default::default()
            },
        ] {
            assert!(matches!(bad.validate(), Err(Error::InvalidConfiguration(_))));
        }
        assert_eq!(TrainConfig::for_activation(Activation::ReLU).learning_rate, 0.5);
    }

    #[test]
    fn explorer_pacing() {
        let cfg = TrainConfig::for_explorer(Activation::LeakyReLU);
        assert_eq!(cfg.learning_rate, 1.0);
        assert_eq!(cfg.steps_per_frame, 5);
        assert_eq!(cfg.max_epochs, 3_000);
        assert_eq!(cfg.history_len, 60);
        assert!(cfg.validate().is_ok());

        let trainer = TrainConfig::for_activation(Activation::Swish);
        assert_eq!((trainer.steps_per_frame, trainer.max_epochs), (8, 5_000));
    }

    #[test]
    fn run_rejects_mismatched_dataset() {
        let mut net = Network::new_with_seed(&[3, 1], Activation::Sigmoid, 0).unwrap();
        let data = Dataset::logic_gate(Gate::And);
        assert!(matches!(
            TrainingRun::new(&mut net, &data, TrainConfig::default()),
            Err(Error::ShapeMismatch(_))
        ));

        let empty = Dataset::new(3, 1).unwrap();
        assert_eq!(
            TrainingRun::new(&mut net, &empty, TrainConfig::default()).unwrap_err(),
            Error::EmptyBatch
        );
    }

    #[test]
    fn frames_advance_by_steps_per_frame_and_cap_at_budget() {
        let mut net = xor_net(0);
        let data = Dataset::logic_gate(Gate::Xor);
        let cfg = TrainConfig {
            steps_per_frame: 8,
            max_epochs: 20,
            ..Default::default()
        };
        let mut run = TrainingRun::new(&mut net, &data, cfg).unwrap();

        let r1 = run.frame().unwrap();
        assert_eq!((r1.epoch, r1.state), (8, RunState::Running));
        assert_eq!(r1.gradient_magnitudes.len(), 2);
        assert!(r1.loss.is_some());

        run.frame().unwrap();
        let r3 = run.frame().unwrap();
        assert_eq!((r3.epoch, r3.state), (20, RunState::Finished));

        let after = run.frame().unwrap();
        assert_eq!(after.epoch, 20);
        assert!(after.gradient_magnitudes.is_empty());
    }

    #[test]
    fn history_is_bounded() {
        let mut net = xor_net(1);
        let data = Dataset::logic_gate(Gate::Xor);
        let cfg = TrainConfig {
            steps_per_frame: 1,
            max_epochs: 10,
            history_len: 3,
            ..Default::default()
        };
        let mut run = TrainingRun::new(&mut net, &data, cfg).unwrap();
        for _ in 0..9 {
            run.frame().unwrap();
        }
        let last = run.frame().unwrap().gradient_magnitudes;
        assert_eq!(run.history().len(), 3);
        assert_eq!(run.history().last().unwrap(), last.as_slice());
    }

    #[test]
    fn stop_freezes_parameters() {
        let mut net = xor_net(2);
        let data = Dataset::logic_gate(Gate::Xor);
        let mut run = TrainingRun::new(&mut net, &data, TrainConfig::default()).unwrap();
        run.frame().unwrap();
        run.stop();
        let frozen = run.network().layers()[0].weights().to_vec();

        let report = run.frame().unwrap();
        assert_eq!(report.state, RunState::Stopped);
        assert_eq!(report.epoch, 8);
        assert_eq!(run.network().layers()[0].weights(), frozen.as_slice());

        let fit = run.run_to_completion().unwrap();
        assert_eq!(fit.state, RunState::Stopped);
        assert_eq!(fit.epochs, 8);
    }

    #[test]
    fn target_loss_finishes_early() {
        let mut net = xor_net(3);
        let data = Dataset::logic_gate(Gate::And);
        let cfg = TrainConfig {
            target_loss: Some(0.1),
            ..Default::default()
        };
        let mut run = TrainingRun::new(&mut net, &data, cfg).unwrap();
        let fit = run.run_to_completion().unwrap();

        assert_eq!(fit.state, RunState::Finished);
        assert!(fit.epochs < cfg.max_epochs);
        assert!(fit.final_loss.unwrap() <= 0.1);
    }
}
