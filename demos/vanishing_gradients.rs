use rand::SeedableRng;
use rand::rngs::StdRng;

use tiny_mlp::{Activation, Network, Preset, TrainConfig, TrainingRun, collapsed_output};

fn main() -> tiny_mlp::Result<()> {
    tracing_subscriber::fmt::init();

    let mut rng = StdRng::seed_from_u64(3);
    let spirals = Preset::Spirals.generate(&mut rng);

    // Same depth for every activation; only the hidden nonlinearity changes.
    let depth = 5;
    let mut sizes = vec![2];
    sizes.extend(std::iter::repeat_n(6, depth));
    sizes.push(1);

    for activation in Activation::ALL {
        let mut net = Network::new_with_rng(&sizes, activation, &mut rng)?;
        let before = net.layer_gradient_magnitudes(spirals.inputs(), spirals.targets())?;

        let cfg = TrainConfig::for_explorer(activation);
        let mut run = TrainingRun::new(&mut net, &spirals, cfg)?;
        let report = run.run_to_completion()?;
        let after = run.history().last().map(<[f64]>::to_vec).unwrap_or_default();

        println!("{activation}: final_loss={:?}", report.final_loss);
        println!("  before: {}", format_magnitudes(&before));
        println!("  after:  {}", format_magnitudes(&after));
    }

    // Without hidden activations the whole stack is a single affine map.
    let mut net = Network::new_with_rng(&sizes, Activation::Sigmoid, &mut rng)?;
    let map = net.collapse_to_affine();
    for point in [[0.2, 0.8], [0.7, 0.3]] {
        let deep = net.forward_linear(&point)?[0];
        let flat = collapsed_output(&map, &point)?[0];
        println!("linear {point:?}: deep={deep:.6} collapsed={flat:.6}");
    }

    Ok(())
}

fn format_magnitudes(mags: &[f64]) -> String {
    mags.iter()
        .map(|m| format!("{m:.2e}"))
        .collect::<Vec<_>>()
        .join(" ")
}
