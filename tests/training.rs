use rand::SeedableRng;
use rand::rngs::StdRng;

use tiny_mlp::{
    Activation, Dataset, Error, Gate, Network, Preset, RunState, TrainConfig, TrainingRun,
    activate, activate_derivative, create_network, forward, layer_gradient_magnitudes, predict,
    train_step,
};

fn train(net: &mut Network, data: &Dataset, lr: f64, steps: usize) -> f64 {
    let mut loss = f64::INFINITY;
    for _ in 0..steps {
        loss = train_step(net, data.inputs(), data.targets(), lr).unwrap();
    }
    loss
}

fn params(net: &Network) -> Vec<f64> {
    net.layers()
        .iter()
        .flat_map(|l| l.weights().iter().chain(l.biases()).copied())
        .collect()
}

#[test]
fn construction_matches_layer_sizes() {
    for sizes in [vec![2, 1], vec![2, 6, 6, 1], vec![3, 5, 2], vec![1, 1, 1, 1, 1]] {
        let net = create_network(&sizes, Activation::ReLU).unwrap();
        assert_eq!(net.num_layers(), sizes.len() - 1);
        assert_eq!(net.input_size(), sizes[0]);
        assert_eq!(net.output_size(), *sizes.last().unwrap());
        for (layer, pair) in net.layers().iter().zip(sizes.windows(2)) {
            assert_eq!(layer.out_dim(), pair[1]);
            assert_eq!(layer.in_dim(), pair[0]);
            for j in 0..layer.out_dim() {
                assert_eq!(layer.row(j).len(), pair[0]);
            }
            assert_eq!(layer.biases().len(), pair[1]);
        }
    }
}

#[test]
fn construction_rejects_degenerate_sizes() {
    assert!(matches!(
        create_network(&[4], Activation::Sigmoid),
        Err(Error::InvalidConfiguration(_))
    ));
    assert!(matches!(
        create_network(&[2, 3, 0], Activation::Sigmoid),
        Err(Error::InvalidConfiguration(_))
    ));
}

#[test]
fn unseeded_networks_are_independent() {
    let mut a = create_network(&[2, 3, 1], Activation::Sigmoid).unwrap();
    let b = create_network(&[2, 3, 1], Activation::Sigmoid).unwrap();
    assert_ne!(params(&a), params(&b));

    let b_before = params(&b);
    let xor = Dataset::logic_gate(Gate::Xor);
    train(&mut a, &xor, 1.0, 5);
    assert_eq!(params(&b), b_before);
}

#[test]
fn forward_is_deterministic() {
    let mut net = Network::new_with_seed(&[2, 6, 6, 1], Activation::Swish, 5).unwrap();
    let first = forward(&mut net, &[0.25, -0.8]).unwrap();
    let second = forward(&mut net, &[0.25, -0.8]).unwrap();
    assert_eq!(first, second);
    assert_eq!(first[0].to_bits(), second[0].to_bits());
}

#[test]
fn outputs_stay_strictly_between_zero_and_one() {
    let mut rng = StdRng::seed_from_u64(9);
    for activation in Activation::ALL {
        let mut net = Network::new_with_rng(&[2, 8, 8, 3], activation, &mut rng).unwrap();
        for input in [[0.0, 0.0], [1.0, -1.0], [5.0, 5.0], [-7.5, 3.0], [0.3, 0.9]] {
            let out = forward(&mut net, &input).unwrap();
            assert_eq!(out.len(), 3);
            assert!(out.iter().all(|&o| o > 0.0 && o < 1.0), "{activation}: {out:?}");
        }
    }
}

#[test]
fn and_gate_is_learned_quickly() {
    let and = Dataset::logic_gate(Gate::And);
    let mut net = Network::new_with_seed(&[2, 4, 1], Activation::Sigmoid, 0).unwrap();

    let mut reached = None;
    for step in 1..=2_000 {
        let loss = train_step(&mut net, and.inputs(), and.targets(), 2.0).unwrap();
        if loss < 0.1 {
            reached = Some(step);
            break;
        }
    }
    assert!(reached.is_some(), "AND loss never dropped below 0.1");
    assert_eq!(net.accuracy(&and).unwrap(), 1.0);
}

#[test]
fn xor_needs_a_hidden_layer() {
    let xor = Dataset::logic_gate(Gate::Xor);

    let mut linear = Network::new_with_seed(&[2, 1], Activation::Sigmoid, 0).unwrap();
    let plateau = train(&mut linear, &xor, 2.0, 3_000);
    assert!(plateau > 0.5, "single unit reached loss {plateau}");

    let mut hidden = Network::new_with_seed(&[2, 4, 1], Activation::Sigmoid, 0).unwrap();
    let solved = train(&mut hidden, &xor, 2.0, 3_000);
    assert!(solved < 0.05, "hidden layer stuck at loss {solved}");

    for (input, target) in xor.inputs().iter().zip(xor.targets()) {
        let p = predict(&mut hidden, input[0], input[1]).unwrap();
        assert_eq!(p >= 0.5, target[0] == 1.0, "xor{input:?} -> {p}");
    }
}

#[test]
fn gradient_diagnostic_does_not_touch_parameters() {
    let data = Preset::Spirals.generate(&mut StdRng::seed_from_u64(1));
    let mut net = Network::new_with_seed(&[2, 6, 6, 6, 1], Activation::LeakyReLU, 2).unwrap();
    let before = params(&net);

    let mags = layer_gradient_magnitudes(&mut net, data.inputs(), data.targets()).unwrap();
    assert_eq!(mags.len(), 4);
    assert_eq!(params(&net), before);
}

#[test]
fn deep_sigmoid_gradients_shrink_towards_the_input() {
    let xor = Dataset::logic_gate(Gate::Xor);
    let mut net =
        Network::new_with_seed(&[2, 6, 6, 6, 6, 6, 1], Activation::Sigmoid, 0).unwrap();

    let mags = layer_gradient_magnitudes(&mut net, xor.inputs(), xor.targets()).unwrap();
    for pair in mags.windows(2) {
        assert!(pair[0] < pair[1], "{mags:?}");
    }
    assert!(mags[0] < 0.01 * mags[mags.len() - 1], "{mags:?}");
}

#[test]
fn activation_derivatives_match_finite_differences() {
    let h = 1e-5;
    for activation in Activation::ALL {
        for x in [-3.0, -1.0, 0.0, 1.0, 3.0] {
            if x == 0.0 && matches!(activation, Activation::ReLU | Activation::LeakyReLU) {
                continue;
            }
            let numeric = (activate(x + h, activation) - activate(x - h, activation)) / (2.0 * h);
            let analytic = activate_derivative(x, activate(x, activation), activation);
            assert!(
                (numeric - analytic).abs() < 1e-3,
                "{activation} at {x}: numeric={numeric} analytic={analytic}"
            );
        }
    }
}

#[test]
fn hand_set_single_unit_gives_sigmoid_of_two() {
    let mut net = create_network(&[2, 1], Activation::Sigmoid).unwrap();
    let layer = net.layer_mut(0);
    layer.weights_mut().copy_from_slice(&[1.0, 1.0]);
    layer.biases_mut()[0] = 0.0;

    let out = forward(&mut net, &[1.0, 1.0]).unwrap();
    assert!((out[0] - 0.880_797_077_977_882_4).abs() < 1e-12);
}

#[test]
fn invalid_batches_fail_without_updates() {
    let mut net = Network::new_with_seed(&[2, 3, 1], Activation::Sigmoid, 0).unwrap();
    let before = params(&net);

    let empty: Vec<Vec<f64>> = Vec::new();
    assert_eq!(
        train_step(&mut net, &empty, &empty, 1.0).unwrap_err(),
        Error::EmptyBatch
    );
    assert!(matches!(
        train_step(&mut net, &[[0.0, 1.0]], &[[1.0, 0.0]], 1.0),
        Err(Error::ShapeMismatch(_))
    ));
    assert!(matches!(
        forward(&mut net, &[1.0]),
        Err(Error::ShapeMismatch(_))
    ));
    assert_eq!(params(&net), before);
}

#[test]
fn training_run_drives_xor_to_completion() {
    let mut rng = StdRng::seed_from_u64(4);
    let data = Preset::Xor.generate(&mut rng);
    let mut net = Network::new_with_rng(&[2, 4, 1], Activation::Sigmoid, &mut rng).unwrap();

    let cfg = TrainConfig {
        max_epochs: 3_000,
        target_loss: Some(0.05),
        ..TrainConfig::default()
    };
    let mut run = TrainingRun::new(&mut net, &data, cfg).unwrap();
    let report = run.run_to_completion().unwrap();
    assert_eq!(report.state, RunState::Finished);
    assert!(report.epochs <= 3_000);
    assert!(run.history().len() <= cfg.history_len);

    assert!(net.accuracy(&data).unwrap() >= 0.9);
}

#[cfg(feature = "serde")]
#[test]
fn configs_and_reports_round_trip_through_json() {
    let cfg = TrainConfig::for_activation(Activation::LeakyReLU);
    let json = serde_json::to_string(&cfg).unwrap();
    assert_eq!(serde_json::from_str::<TrainConfig>(&json).unwrap(), cfg);

    let act: Activation = serde_json::from_str("\"leaky_relu\"").unwrap();
    assert_eq!(act, Activation::LeakyReLU);

    let report = tiny_mlp::FitReport {
        epochs: 120,
        final_loss: Some(0.25),
        state: RunState::Stopped,
    };
    let json = serde_json::to_string(&report).unwrap();
    assert_eq!(serde_json::from_str::<tiny_mlp::FitReport>(&json).unwrap(), report);
}
