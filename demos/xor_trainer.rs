use rand::SeedableRng;
use rand::rngs::StdRng;

use tiny_mlp::{Activation, DecisionGrid, Network, Preset, RunState, TrainConfig, TrainingRun};

fn main() -> tiny_mlp::Result<()> {
    tracing_subscriber::fmt::init();

    // 2 hidden layers of 4 neurons, like the trainer widget's defaults.
    let sizes = [2, 4, 4, 1];

    for preset in Preset::ALL {
        let mut rng = StdRng::seed_from_u64(7);
        let data = preset.generate(&mut rng);

        for activation in [Activation::Sigmoid, Activation::ReLU, Activation::Swish] {
            let mut net = Network::new_with_rng(&sizes, activation, &mut rng)?;
            let cfg = TrainConfig::for_activation(activation);

            let mut run = TrainingRun::new(&mut net, &data, cfg)?;
            let mut frames = 0usize;
            while run.state() == RunState::Running {
                let frame = run.frame()?;
                frames += 1;
                // Redraw cadence of the widget: every 100 frames.
                if frames % 100 == 0 {
                    println!(
                        "{preset:?}/{activation} epoch={} loss={:.4}",
                        frame.epoch,
                        frame.loss.unwrap_or(f64::NAN)
                    );
                }
            }

            let epochs = run.epoch();
            let accuracy = net.accuracy(&data)?;
            let grid = DecisionGrid::sample(&mut net, 40)?;
            println!(
                "{preset:?}/{activation}: epochs={epochs} accuracy={accuracy:.3} positive_area={:.3}",
                grid.positive_fraction()
            );
        }
    }

    Ok(())
}
