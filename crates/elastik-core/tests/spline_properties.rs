use elastik_core::filter::SplinePrefilter;
use elastik_core::interpolation::{SplineInterpolator, SupportBuffer};
use elastik_core::lattice::Lattice;
use elastik_core::{deform_grid, BoundaryMode, Channel, ChannelParams, CoordinateFieldBuilder, SplineOrder};
use ndarray::{ArrayD, IxDyn};
use proptest::prelude::*;

const ALL_MODES: [BoundaryMode; 5] = [
    BoundaryMode::Constant(-3.0),
    BoundaryMode::Nearest,
    BoundaryMode::Mirror,
    BoundaryMode::Reflect,
    BoundaryMode::Wrap,
];

fn samples(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-100.0f64..100.0, len)
}

proptest! {
    #[test]
    fn test_prefilter_reproduces_samples(
        data in (2usize..12).prop_flat_map(samples),
        order in 2u8..=5,
        mode_index in 0usize..5,
    ) {
        let mode = ALL_MODES[mode_index];
        let order = SplineOrder::new(order).unwrap();

        let mut coefficients = ArrayD::from_shape_vec(IxDyn(&[data.len()]), data.clone()).unwrap();
        SplinePrefilter::new(order, mode).apply(&mut coefficients.view_mut()).unwrap();

        let lattice = Lattice::new(&[data.len()]);
        let interpolator = SplineInterpolator::new(order, mode);
        let mut support = SupportBuffer::new(1);
        let coefficients = coefficients.as_slice().unwrap();
        for (i, &expected) in data.iter().enumerate() {
            let value = interpolator.sample(coefficients, &lattice, &[i as f64], &mut support);
            prop_assert!((value - expected).abs() < 1e-8, "at {}: {} vs {}", i, value, expected);
        }
    }

    #[test]
    fn test_modes_agree_inside_the_array(
        rows in 4usize..9,
        cols in 4usize..9,
        seed in samples(81),
        order in 0u8..=5,
        fy in 0.0f64..1.0,
        fx in 0.0f64..1.0,
    ) {
        let data: Vec<f64> = seed[..rows * cols].to_vec();
        let lattice = Lattice::new(&[rows, cols]);
        let order = SplineOrder::new(order).unwrap();
        // Keep the whole support inside the array.
        let margin = (order.get() / 2 + 1) as f64;
        let y = margin + fy * (rows as f64 - 1.0 - 2.0 * margin).max(0.0);
        let x = margin + fx * (cols as f64 - 1.0 - 2.0 * margin).max(0.0);
        prop_assume!(y + margin <= rows as f64 - 1.0 && x + margin <= cols as f64 - 1.0);

        let mut support = SupportBuffer::new(2);
        let reference = SplineInterpolator::new(order, ALL_MODES[0])
            .sample(&data, &lattice, &[y, x], &mut support);
        for mode in ALL_MODES {
            let value = SplineInterpolator::new(order, mode).sample(&data, &lattice, &[y, x], &mut support);
            prop_assert!((value - reference).abs() < 1e-9, "{:?}: {} vs {}", mode, value, reference);
        }
    }

    #[test]
    fn test_grid_corners_reproduce_control_points(
        gy in 1usize..5,
        gx in 1usize..5,
        values in samples(32),
        rows in 2usize..20,
        cols in 2usize..20,
    ) {
        let grid = ArrayD::from_shape_vec(IxDyn(&[2, gy, gx]), values[..2 * gy * gx].to_vec()).unwrap();
        let field = CoordinateFieldBuilder::new(grid.view()).build(&[rows, cols], &[rows, cols]).unwrap();
        let view = field.view().unwrap();
        let corners = [(0, 0, 0, 0), (0, cols - 1, 0, gx - 1), (rows - 1, 0, gy - 1, 0), (rows - 1, cols - 1, gy - 1, gx - 1)];
        for (r, c, i, j) in corners {
            prop_assert!((view[[0, r, c]] - r as f64 - grid[[0, i, j]]).abs() < 1e-8);
            prop_assert!((view[[1, r, c]] - c as f64 - grid[[1, i, j]]).abs() < 1e-8);
        }
    }

    #[test]
    fn test_zero_grid_identity_for_low_orders(
        data in samples(30),
        order in 0u8..=1,
        mode_index in 0usize..5,
    ) {
        let input = ArrayD::from_shape_vec(IxDyn(&[5, 6]), data).unwrap();
        let grid = ArrayD::<f64>::zeros(IxDyn(&[2, 3, 3]));
        let mut output = ArrayD::<f64>::zeros(IxDyn(&[5, 6]));
        let params = ChannelParams::new(SplineOrder::new(order).unwrap(), ALL_MODES[mode_index]);
        deform_grid(&mut [Channel::new(input.view(), output.view_mut(), params)], &grid.view(), None).unwrap();
        prop_assert_eq!(output, input);
    }
}
