use assert_approx_eq::assert_approx_eq;
use forecast_air::metrics::{rmse, Evaluator};
use forecast_air::models::{BoostingParams, MultiOutputRegressor};
use ndarray::Array2;

#[test]
fn rmse_of_identical_series_is_zero() {
    let values = vec![1.0, 2.0, 3.0];
    assert_approx_eq!(rmse(&values, &values).unwrap(), 0.0);
}

#[test]
fn rmse_matches_a_hand_computed_value() {
    let predicted = vec![1.0, 2.0, 3.0];
    let actual = vec![2.0, 2.0, 5.0];
    // sqrt((1 + 0 + 4) / 3)
    assert_approx_eq!(rmse(&predicted, &actual).unwrap(), (5.0f64 / 3.0).sqrt());
}

#[test]
fn rmse_rejects_mismatched_lengths() {
    assert!(rmse(&[1.0, 2.0], &[1.0]).is_err());
    assert!(rmse(&[], &[]).is_err());
}

fn fitted_model() -> (MultiOutputRegressor, Array2<f64>, Array2<f64>) {
    let n = 60;
    let x = Array2::from_shape_fn((n, 2), |(i, j)| if j == 0 { i as f64 } else { 1.0 });
    let y = Array2::from_shape_fn((n, 2), |(i, j)| {
        if j == 0 {
            i as f64 * 2.0
        } else {
            100.0 - i as f64
        }
    });
    let names = vec!["up".to_string(), "down".to_string()];
    let params = BoostingParams {
        n_estimators: 20,
        max_depth: 3,
        ..BoostingParams::default()
    };
    let model = MultiOutputRegressor::fit_boosted(&names, &x, &y, &params).unwrap();
    (model, x, y)
}

#[test]
fn evaluator_reports_one_rmse_per_column() {
    let (model, x, y) = fitted_model();
    let report = Evaluator::evaluate(&model, &x, &y).unwrap();

    assert_eq!(report.per_column_rmse().len(), 2);
    assert_eq!(report.n_rows(), 60);
    assert!(report.rmse("up").is_some());
    assert!(report.overall_rmse() >= 0.0);

    let rendered = format!("{}", report);
    assert!(rendered.contains("up"));
    assert!(rendered.contains("down"));
}

#[test]
fn evaluator_rejects_an_empty_test_segment() {
    let (model, _, _) = fitted_model();
    let x = Array2::zeros((0, 2));
    let y = Array2::zeros((0, 2));
    assert!(Evaluator::evaluate(&model, &x, &y).is_err());
}

#[test]
fn evaluator_rejects_mismatched_target_shape() {
    let (model, x, _) = fitted_model();
    let y = Array2::zeros((x.nrows(), 3));
    assert!(Evaluator::evaluate(&model, &x, &y).is_err());
}
