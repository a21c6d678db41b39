use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

use tiny_mlp::{Activation, DecisionGrid, Network, Preset, TrainConfig, TrainingRun};

const GRID_RES: usize = 16;

fn main() -> tiny_mlp::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut rng = StdRng::seed_from_u64(0);
    let data = Preset::Xor.generate(&mut rng);
    let mut net = Network::new_with_rng(&[2, 4, 4, 1], Activation::Sigmoid, &mut rng)?;

    let cfg = TrainConfig {
        max_epochs: 3_000,
        target_loss: Some(0.02),
        ..TrainConfig::for_activation(net.activation())
    };
    let report = TrainingRun::new(&mut net, &data, cfg)?.run_to_completion()?;
    println!(
        "epochs={} final_loss={:?} accuracy={:.3}",
        report.epochs,
        report.final_loss,
        net.accuracy(&data)?
    );

    let grid = DecisionGrid::sample(&mut net, GRID_RES)?;
    for j in 0..GRID_RES {
        let line: String = (0..GRID_RES)
            .map(|i| if grid.get(i, j) >= 0.5 { '#' } else { '.' })
            .collect();
        println!("{line}");
    }

    Ok(())
}
