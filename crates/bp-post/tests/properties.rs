use bp_core::RawSimulationOutput;
use bp_post::*;
use nalgebra::DMatrix;
use proptest::prelude::*;

fn raw_with(time: Vec<f64>, current: f64, voltage: Vec<f64>, cells: usize) -> RawSimulationOutput {
    let steps = time.len();
    RawSimulationOutput {
        time,
        current: DMatrix::from_element(steps, cells, current),
        voltage: DMatrix::from_fn(steps, cells, |r, _| voltage[r]),
        temperature: DMatrix::from_element(steps, cells, 298.15),
        heating: DMatrix::from_element(steps, cells, 5.0e3),
    }
}

fn evenly_spaced(steps: usize, dt: f64) -> Vec<f64> {
    (0..steps).map(|i| i as f64 * dt).collect()
}

#[test]
fn no_cutoff_keeps_every_sample() {
    let raw = raw_with(evenly_spaced(50, 10.0), 1.0, vec![4.0; 50], 12);
    let result = process(&raw, &PostConfig::default()).unwrap();

    assert_eq!(result.len(), 50);
    assert_eq!(result.capacity_ah().len(), 50);
    assert_eq!(result.soc().len(), 50);
    assert_eq!(result.current().nrows(), 50);
}

#[test]
fn voltage_cutoff_keeps_k_plus_one_rows() {
    let mut voltage = vec![4.0; 20];
    for v in voltage.iter_mut().skip(7) {
        *v = 2.0;
    }
    let raw = raw_with(evenly_spaced(20, 10.0), 1.0, voltage, 4);
    let result = process(&raw, &PostConfig::default()).unwrap();

    assert_eq!(result.len(), 8);
    assert_eq!(result.time().last(), Some(&70.0));
    assert_eq!(result.temperature().nrows(), 8);
}

#[test]
fn nan_cell_propagates_into_mean_without_firing() {
    let mut voltage = vec![4.0; 10];
    voltage[5] = 2.0;
    let mut raw = raw_with(evenly_spaced(10, 10.0), 1.0, voltage, 2);
    raw.voltage[(2, 0)] = f64::NAN;
    raw.voltage[(2, 1)] = 2.0;

    let mut events = Vec::new();
    let mut observe = |event: &CutoffEvent| events.push(*event);
    let result = process_observed(&raw, &PostConfig::default(), Some(&mut observe)).unwrap();

    assert!(result.voltage_avg()[2].is_nan());
    assert!(result.voltage()[(2, 0)].is_nan());
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].index, 5);
    assert_eq!(result.len(), 6);
    for series in [
        result.current_avg(),
        result.temperature_avg(),
        result.heating_avg(),
        result.capacity_ah(),
        result.soc(),
    ] {
        assert!(series.iter().all(|v| v.is_finite()));
    }
    assert!(result.voltage_avg().iter().enumerate().all(|(i, v)| i == 2 || v.is_finite()));
}

#[test]
fn full_discharge_of_five_amp_hour_cell() {
    let raw = raw_with(evenly_spaced(360, 10.0), 5.0, vec![4.0; 360], 1);
    let config = PostConfig {
        initial_soc: 1.0,
        nominal_capacity_ah: 5.0,
        cutoff_voltage: 2.5,
    };
    let result = process(&raw, &config).unwrap();

    assert_eq!(result.len(), 360);
    let expected = bp_core::charge_ah(bp_core::amps(5.0), bp_core::s(3600.0));
    assert!((result.final_capacity_ah().unwrap() - expected).abs() < 1e-9);
    assert!(result.final_soc().unwrap().abs() < 1e-9);
}

#[test]
fn repeated_processing_is_bit_identical() {
    let raw = raw_with(evenly_spaced(100, 10.0), 3.3, vec![3.7; 100], 12);
    let config = PostConfig::default();
    let first = process(&raw, &config).unwrap();
    let second = process(&raw, &config).unwrap();

    assert_eq!(first, second);
    for (a, b) in first.capacity_ah().iter().zip(second.capacity_ah()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn single_sample_is_invalid() {
    let raw = raw_with(vec![0.0], 1.0, vec![4.0], 1);
    assert!(matches!(
        process(&raw, &PostConfig::default()),
        Err(PostError::InvalidInput(_))
    ));
}

#[test]
fn zero_capacity_is_invalid() {
    let raw = raw_with(evenly_spaced(3, 10.0), 1.0, vec![4.0; 3], 1);
    let config = PostConfig {
        nominal_capacity_ah: 0.0,
        ..PostConfig::default()
    };
    assert!(matches!(
        process(&raw, &config),
        Err(PostError::InvalidInput(_))
    ));
}

#[test]
fn short_discharge_to_voltage_cutoff() {
    let raw = raw_with(vec![0.0, 10.0, 20.0, 30.0], 5.0, vec![4.0, 3.5, 3.2, 2.9], 1);
    let config = PostConfig {
        initial_soc: 1.0,
        nominal_capacity_ah: 5.0,
        cutoff_voltage: 3.0,
    };
    let result = process(&raw, &config).unwrap();

    assert_eq!(result.len(), 4);
    assert!((result.capacity_ah()[3] - 0.0556).abs() < 1e-4);
    assert!(result.final_soc().unwrap() > 0.98);
}

proptest! {
    #[test]
    fn series_lengths_agree(
        steps in 2usize..200,
        cells in 1usize..6,
        current in 0.0f64..50.0,
        dt in 0.1f64..60.0,
        drop_at in 0usize..250,
    ) {
        let voltage: Vec<f64> = (0..steps).map(|i| if i >= drop_at { 2.0 } else { 4.0 }).collect();
        let raw = raw_with(evenly_spaced(steps, dt), current, voltage, cells);
        let result = process(&raw, &PostConfig::default()).unwrap();

        let n = result.len();
        prop_assert!(n >= 1 && n <= steps);
        prop_assert_eq!(result.current_avg().len(), n);
        prop_assert_eq!(result.voltage_avg().len(), n);
        prop_assert_eq!(result.temperature_avg().len(), n);
        prop_assert_eq!(result.heating_avg().len(), n);
        prop_assert_eq!(result.capacity_ah().len(), n);
        prop_assert_eq!(result.soc().len(), n);
        prop_assert_eq!(result.voltage().nrows(), n);
        prop_assert_eq!(result.heating().ncols(), cells);
        if drop_at < steps {
            prop_assert!(n <= drop_at + 1);
        }
    }

    #[test]
    fn discharge_is_monotone(
        steps in 2usize..200,
        current in 0.0f64..20.0,
        dt in 0.1f64..60.0,
    ) {
        let raw = raw_with(evenly_spaced(steps, dt), current, vec![4.0; steps], 2);
        let result = process(&raw, &PostConfig::default()).unwrap();

        for w in result.capacity_ah().windows(2) {
            prop_assert!(w[1] >= w[0]);
        }
        for w in result.soc().windows(2) {
            prop_assert!(w[1] <= w[0]);
        }
    }
}
