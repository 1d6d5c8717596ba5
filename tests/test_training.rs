//! Integration test: model evaluation lifecycle end-to-end

use std::collections::HashSet;

use price_regression::config::{EvaluationConfig, Hyperparameter, ModelProfile};
use price_regression::data::{split_data, Column, Dataset, Value};
use price_regression::error::RegressionError;
use price_regression::metrics::ErrorMetrics;
use price_regression::preprocessing::{OutlierMethod, PreprocessStep, PreprocessingPlan};
use price_regression::training::{
    CrossValidator, FitSummary, Folds, GradientDescentConfig, KnnRegressor, LifecycleState,
    MeanBaseline, ModelEvaluator, MultiLinearRegression, Regressor, SimpleLinearRegression,
    CV_ROTATIONS,
};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn names(features: &[&str]) -> Vec<String> {
    features.iter().map(|s| s.to_string()).collect()
}

/// Synthetic car listings with a near-linear price
fn cars(n: usize) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut data = Dataset::new(vec![
        Column::categorical("Manufacturer"),
        Column::numeric("Prod. year"),
        Column::numeric("Mileage"),
        Column::numeric("Engine displacement"),
        Column::numeric("Is diesel"),
        Column::numeric("Price"),
    ])
    .unwrap();

    let makers = ["TOYOTA", "FORD", "HONDA"];
    for i in 0..n {
        let year = 2000.0 + rng.gen_range(0..21) as f64;
        let mileage = rng.gen_range(0.0..200_000.0);
        let engine = 1.0 + rng.gen_range(0..31) as f64 / 10.0;
        let diesel = if rng.gen_bool(0.3) { 1.0 } else { 0.0 };
        let noise = rng.gen_range(-500.0..500.0);
        let price = 20_000.0 + 800.0 * (year - 2000.0) - 0.05 * mileage + 3000.0 * engine
            + 2500.0 * diesel
            + noise;
        data.push_row(vec![
            Value::from(makers[i % 3]),
            Value::Number(year),
            Value::Number(mileage),
            Value::Number(engine),
            Value::Number(diesel),
            Value::Number(price),
        ])
        .unwrap();
    }

    // a duplicate listing and one absurd price
    let first = data.rows()[0].clone();
    data.push_row(first).unwrap();
    let mut absurd = data.rows()[1].clone();
    absurd[5] = Value::Number(5_000_000.0);
    data.push_row(absurd).unwrap();
    data
}

fn cleaning_plan() -> PreprocessingPlan {
    PreprocessingPlan::new()
        .with_step(PreprocessStep::CheckMissing)
        .with_step(PreprocessStep::RemoveDuplicates)
        .with_step(PreprocessStep::RemoveOutliers {
            column: "Price".to_string(),
            method: OutlierMethod::ZScore { threshold: 3.0 },
        })
        .with_step(PreprocessStep::Standardise {
            column: "Prod. year".to_string(),
        })
        .with_step(PreprocessStep::Standardise {
            column: "Mileage".to_string(),
        })
        .with_step(PreprocessStep::Standardise {
            column: "Engine displacement".to_string(),
        })
}

const SCALED: [&str; 3] = [
    "Prod. year scaled",
    "Mileage scaled",
    "Engine displacement scaled",
];

#[test]
fn test_knn_full_lifecycle() {
    init_tracing();
    let profile = ModelProfile::new()
        .with_preprocessing(cleaning_plan())
        .with_ranking_columns(&[SCALED[0], SCALED[1], SCALED[2], "Is diesel"])
        .with_candidate_features(&[SCALED[0], SCALED[1], SCALED[2], "Is diesel"])
        .with_tuning_features(&SCALED)
        .with_tuning_grid(vec![
            Hyperparameter::K(3),
            Hyperparameter::K(5),
            Hyperparameter::K(10),
        ])
        .with_final_features(&SCALED)
        .with_final_hyperparameters(vec![Hyperparameter::K(5)]);
    let config = EvaluationConfig::default().with_profile(profile);
    let model = KnnRegressor::with_k(5, names(&[SCALED[0]]));
    let mut ev = ModelEvaluator::new(model, cars(300), config).unwrap();

    let report = ev.preprocess_data().unwrap();
    assert_eq!(report.duplicates_removed, 1);
    assert_eq!(report.outliers_removed, 1);
    assert_eq!(report.rows_out, 300);
    assert_eq!(ev.state(), LifecycleState::Preprocessed);

    let split = ev.split_data().unwrap();
    assert_eq!(split.training.n_rows(), 216);
    assert_eq!(split.validation.n_rows(), 54);
    assert_eq!(split.holdout.n_rows(), 30);

    let ranking = ev.select_features().unwrap();
    assert_eq!(ranking.continuous.len(), 3);
    assert_eq!(ranking.binary.len(), 1);
    assert_eq!(ranking.continuous[0].feature, "Prod. year scaled");

    let cv = ev.cross_validate().unwrap();
    assert_eq!(cv.folds.len(), CV_ROTATIONS);
    assert_eq!(ev.state(), LifecycleState::Validated);

    let steps = ev.evaluate_feature_selection().unwrap();
    assert_eq!(steps.len(), 4);
    assert_eq!(steps[3].features.len(), 4);
    assert_eq!(steps[3].added, "Is diesel");
    // the evaluator's own model keeps its features
    assert_eq!(ev.model().features(), &names(&[SCALED[0]])[..]);

    let tuning = ev.fine_tune_model().unwrap();
    assert_eq!(tuning.trials.len(), 3);
    assert!(tuning.chosen.is_some());
    assert_eq!(tuning.features, names(&SCALED));
    assert!(tuning.conclusion.contains("KNN regression"));
    assert_eq!(ev.state(), LifecycleState::Tuned);

    let holdout = ev.test_with_holdout_data().unwrap();
    assert!(holdout.r_squared > 0.5, "hold-out R² too low: {}", holdout);
    assert_eq!(ev.model().describe_hyperparameters(), "k = 5");
    assert_eq!(ev.state(), LifecycleState::HoldoutTested);

    // repeating the hold-out test in the same state returns the same report
    assert_eq!(ev.test_with_holdout_data().unwrap(), holdout);
}

#[test]
fn test_gradient_descent_lifecycle() {
    init_tracing();
    let profile = ModelProfile::new()
        .with_preprocessing(cleaning_plan())
        .with_final_hyperparameters(vec![Hyperparameter::LearningRate(0.5)]);
    let config = EvaluationConfig::default()
        .with_parallel(true)
        .with_profile(profile);
    let model = MultiLinearRegression::new(GradientDescentConfig::default(), names(&SCALED));
    let mut ev = ModelEvaluator::new(model, cars(300), config).unwrap();

    ev.preprocess_data().unwrap();
    ev.split_data().unwrap();
    let tuning = ev.fine_tune_model().unwrap();
    assert_eq!(tuning.trials.len(), 5);
    assert!(tuning.chosen.is_some());

    assert!(tuning.conclusion.contains("max epochs = 1000, convergence threshold = 0.1"));

    let holdout = ev.test_with_holdout_data().unwrap();
    assert!(holdout.r_squared > 0.9, "hold-out R² too low: {}", holdout);
    assert_eq!(ev.model().config().learning_rate, 0.5);
}

#[test]
fn test_simple_linear_outlier_threshold_tuning() {
    init_tracing();
    let profile = ModelProfile::new()
        .with_preprocessing(cleaning_plan())
        .with_candidate_features(&SCALED)
        .with_tuning_grid(vec![
            Hyperparameter::OutlierThreshold {
                column: "Prod. year".to_string(),
                threshold: 2.0,
            },
            Hyperparameter::OutlierThreshold {
                column: "Prod. year".to_string(),
                threshold: 3.0,
            },
        ])
        .with_final_hyperparameters(vec![Hyperparameter::OutlierThreshold {
            column: "Prod. year".to_string(),
            threshold: 4.0,
        }]);
    let config = EvaluationConfig::default().with_profile(profile);
    let model = SimpleLinearRegression::new("Prod. year scaled");
    let mut ev = ModelEvaluator::new(model, cars(200), config).unwrap();

    ev.preprocess_data().unwrap();
    ev.split_data().unwrap();

    // one feature at a time
    let steps = ev.evaluate_feature_selection().unwrap();
    assert_eq!(steps.len(), 3);
    assert!(steps.iter().all(|s| s.features.len() == 1));

    let tuning = ev.fine_tune_model().unwrap();
    assert_eq!(tuning.trials.len(), 2);
    assert!(matches!(
        tuning.chosen,
        Some(Hyperparameter::OutlierThreshold { .. })
    ));
    assert!(tuning.conclusion.contains("z-score threshold for Prod. year outliers"));

    let holdout = ev.test_with_holdout_data().unwrap();
    assert!(holdout.rmse > 0.0);
}

#[test]
fn test_mean_baseline_lifecycle() {
    let profile = ModelProfile::new()
        .with_preprocessing(cleaning_plan())
        .with_ranking_columns(&SCALED)
        .with_candidate_features(&SCALED);
    let config = EvaluationConfig::default().with_profile(profile);
    let mut ev = ModelEvaluator::new(MeanBaseline::new(), cars(120), config).unwrap();

    ev.preprocess_data().unwrap();
    ev.split_data().unwrap();
    assert!(ev.select_features().unwrap().is_empty());
    assert!(ev.evaluate_feature_selection().unwrap().is_empty());

    let cv = ev.cross_validate().unwrap();
    // no predictors: adjusted R² is R²
    assert_eq!(cv.report.r_squared, cv.report.adjusted_r_squared);

    let holdout = ev.test_with_holdout_data().unwrap();
    assert_eq!(holdout.r_squared, holdout.adjusted_r_squared);
}

#[test]
fn test_operations_out_of_order() {
    let mut ev = ModelEvaluator::new(
        MeanBaseline::new(),
        cars(50),
        EvaluationConfig::default(),
    )
    .unwrap();

    assert!(matches!(
        ev.cross_validate(),
        Err(RegressionError::InvalidState {
            state: LifecycleState::Raw,
            ..
        })
    ));
    assert!(ev.select_features().is_err());
    assert!(ev.fine_tune_model().is_err());
    assert!(ev.set_final_hyperparameters().is_err());

    ev.preprocess_data().unwrap();
    assert!(ev.test_with_holdout_data().is_err());
    ev.split_data().unwrap();
    ev.test_with_holdout_data().unwrap();
    assert!(matches!(
        ev.split_data(),
        Err(RegressionError::InvalidState {
            state: LifecycleState::HoldoutTested,
            ..
        })
    ));
}

#[test]
fn test_categorical_feature_is_rejected() {
    let config = EvaluationConfig::default();
    let model = KnnRegressor::with_k(3, names(&["Manufacturer"]));
    let mut ev = ModelEvaluator::new(model, cars(60), config).unwrap();
    ev.preprocess_data().unwrap();
    ev.split_data().unwrap();
    assert!(matches!(
        ev.cross_validate(),
        Err(RegressionError::InvalidInput(_))
    ));
}

#[test]
fn test_split_is_reproducible() {
    let data = cars(100);
    let first = split_data(&data, 1).unwrap();
    let second = split_data(&data, 1).unwrap();
    assert_eq!(first.training, second.training);
    assert_eq!(first.validation, second.validation);
    assert_eq!(first.holdout, second.holdout);
}

fn ids(data: &Dataset) -> Vec<i64> {
    data.column_values("id")
        .unwrap()
        .into_iter()
        .map(|v| v as i64)
        .collect()
}

#[test]
fn test_cross_validation_folds_are_disjoint_and_exhaustive() {
    let n = 83;
    let data = Dataset::from_columns(vec![
        ("id", (0..n).map(|i| i as f64).collect()),
        ("Price", (0..n).map(|i| (i * 31 % 17) as f64).collect()),
    ])
    .unwrap();
    let split = split_data(&data, 1).unwrap();
    let folds = Folds::from_split(&split, 1).unwrap();
    let everything: HashSet<i64> = ids(&split.training_and_validation().unwrap())
        .into_iter()
        .collect();

    let mut seen = HashSet::new();
    for rotation in 0..CV_ROTATIONS {
        let (training, validation) = folds.rotation(rotation).unwrap();
        let train_ids: HashSet<i64> = ids(&training).into_iter().collect();
        let val_ids: HashSet<i64> = ids(&validation).into_iter().collect();

        assert!(train_ids.is_disjoint(&val_ids));
        let union: HashSet<i64> = train_ids.union(&val_ids).copied().collect();
        assert_eq!(union, everything);

        for id in val_ids {
            assert!(seen.insert(id), "row {} validated twice", id);
        }
    }
    assert_eq!(seen, everything);
}

#[test]
fn test_simple_linear_exact_line() {
    let xs: Vec<f64> = (0..40).map(|i| i as f64 * 0.5 - 7.0).collect();
    let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 3.0).collect();
    let data = Dataset::from_columns(vec![("x", xs), ("Price", ys)]).unwrap();

    let split = split_data(&data, 1).unwrap();
    let folds = Folds::from_split(&split, 1).unwrap();
    let model = SimpleLinearRegression::new("x");
    let cv = CrossValidator::new("Price").validate(&model, &folds).unwrap();
    assert_eq!(cv.report.rmse, 0.0);
    assert_eq!(cv.report.r_squared, 1.0);

    let mut fitted = model.clone();
    let training = split.training_and_validation().unwrap();
    fitted
        .fit(
            &training.feature_matrix(fitted.features()).unwrap(),
            &training.target("Price").unwrap(),
        )
        .unwrap();
    assert!((fitted.slope().unwrap() - 2.0).abs() < 1e-9);
    assert!((fitted.intercept().unwrap() - 3.0).abs() < 1e-9);
}

#[test]
fn test_gradient_descent_converges_on_exact_plane() {
    let corners = [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)];
    let mut values = Vec::new();
    let mut targets = Vec::new();
    for i in 0..12 {
        let (x1, x2) = corners[i % 4];
        values.extend([x1, x2]);
        targets.push(2.0 * x1 - 3.0 * x2 + 5.0);
    }
    let x = Array2::from_shape_vec((12, 2), values).unwrap();
    let y = Array1::from_vec(targets);

    let config = GradientDescentConfig::default()
        .with_learning_rate(0.1)
        .with_max_epochs(1000)
        .with_convergence_threshold(1e-12);
    let mut model = MultiLinearRegression::new(config, names(&["x1", "x2"]));
    let summary = model.fit(&x, &y).unwrap();
    assert!(summary.is_converged());
    assert!(matches!(summary, FitSummary::Converged { .. }));

    let predicted = model.predict(&x).unwrap();
    let rmse = ErrorMetrics::new(&predicted, &y).unwrap().rmse();
    assert!(rmse < 1e-3, "rmse {}", rmse);
}

#[test]
fn test_knn_k1_predicts_matching_row() {
    let x = Array2::from_shape_vec((5, 2), vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 3.0, 3.0, -2.0, 5.0])
        .unwrap();
    let y = Array1::from_vec(vec![10.0, 20.0, 30.0, 40.0, 50.0]);
    let mut model = KnnRegressor::with_k(1, names(&["a", "b"]));
    model.fit(&x, &y).unwrap();

    let query = Array2::from_shape_vec((1, 2), vec![3.0, 3.0]).unwrap();
    assert_eq!(model.predict(&query).unwrap()[0], 40.0);
}

#[test]
fn test_mean_baseline_predicts_exact_mean() {
    let y = Array1::from_vec(vec![3.0, 5.5, 7.25, 100.0]);
    let mut model = MeanBaseline::new();
    model.fit(&Array2::zeros((4, 0)), &y).unwrap();

    let predicted = model.predict(&Array2::zeros((6, 0))).unwrap();
    let mean = (3.0 + 5.5 + 7.25 + 100.0) / 4.0;
    assert!(predicted.iter().all(|&p| p == mean));
}

/// `Price = 3 + 2a - b` over features spread across [-1, 1]
fn plane(n: usize) -> Dataset {
    let a: Vec<f64> = (0..n).map(|i| ((i * 7) % 20) as f64 / 10.0 - 1.0).collect();
    let b: Vec<f64> = (0..n).map(|i| ((i * 3) % 11) as f64 / 5.0 - 1.0).collect();
    let price: Vec<f64> = a.iter().zip(&b).map(|(a, b)| 3.0 + 2.0 * a - b).collect();
    Dataset::from_columns(vec![("a", a), ("b", b), ("Price", price)]).unwrap()
}

fn tuning_evaluator(grid: Vec<Hyperparameter>) -> ModelEvaluator<MultiLinearRegression> {
    let profile = ModelProfile::new().with_tuning_grid(grid);
    let config = EvaluationConfig::default().with_profile(profile);
    let model = MultiLinearRegression::new(GradientDescentConfig::default(), names(&["a", "b"]));
    let mut ev = ModelEvaluator::new(model, plane(60), config).unwrap();
    ev.preprocess_data().unwrap();
    ev.split_data().unwrap();
    ev
}

#[test]
fn test_diverging_learning_rate_is_skipped() {
    init_tracing();
    let mut ev = tuning_evaluator(vec![
        Hyperparameter::LearningRate(5.0),
        Hyperparameter::LearningRate(0.1),
    ]);
    let tuning = ev.fine_tune_model().unwrap();

    assert_eq!(tuning.trials.len(), 2);
    assert!(tuning.trials[0].report.is_none());
    assert!(tuning.trials[0].skipped.is_some());
    assert!(tuning.trials[1].report.is_some());
    assert!(tuning.trials[1].skipped.is_none());
    assert_eq!(tuning.chosen, Some(Hyperparameter::LearningRate(0.1)));
    assert!(tuning
        .conclusion
        .contains("learning rate = 0.1, max epochs = 1000, convergence threshold = 0.1"));
    assert_eq!(ev.model().config().learning_rate, 0.1);
    assert_eq!(ev.state(), LifecycleState::Tuned);
}

#[test]
fn test_tuning_fails_when_every_setting_diverges() {
    let mut ev = tuning_evaluator(vec![
        Hyperparameter::LearningRate(5.0),
        Hyperparameter::LearningRate(8.0),
    ]);
    assert!(matches!(
        ev.fine_tune_model(),
        Err(RegressionError::ConfigError(_))
    ));
    assert_eq!(ev.state(), LifecycleState::Split);
}

#[test]
fn test_non_converged_folds_are_reported() {
    let split = split_data(&plane(60), 1).unwrap();
    let folds = Folds::from_split(&split, 1).unwrap();
    let config = GradientDescentConfig::default()
        .with_max_epochs(3)
        .with_convergence_threshold(1e-12);
    let model = MultiLinearRegression::new(config, names(&["a", "b"]));

    let cv = CrossValidator::new("Price").validate(&model, &folds).unwrap();
    assert_eq!(cv.folds.len(), CV_ROTATIONS);
    assert!(!cv.all_converged());
    assert!(cv
        .folds
        .iter()
        .all(|f| matches!(f.fit, FitSummary::NotConverged { epochs: 3, .. })));
}

#[test]
fn test_nan_target_fails_cross_validation() {
    let mut price: Vec<f64> = (0..40).map(|i| 100.0 + (i * 7 % 13) as f64).collect();
    price[5] = f64::NAN;
    let data = Dataset::from_columns(vec![("Price", price)]).unwrap();
    let split = split_data(&data, 1).unwrap();
    let folds = Folds::from_split(&split, 1).unwrap();

    assert!(matches!(
        CrossValidator::new("Price").validate(&MeanBaseline::new(), &folds),
        Err(RegressionError::InvalidInput(_))
    ));
}

#[test]
fn test_nan_feature_fails_cross_validation() {
    let mut data = plane(40);
    data.set_value(11, "a", Value::Number(f64::NAN)).unwrap();
    let split = split_data(&data, 1).unwrap();
    let folds = Folds::from_split(&split, 1).unwrap();
    let model = KnnRegressor::with_k(3, names(&["a", "b"]));

    assert!(matches!(
        CrossValidator::new("Price").validate(&model, &folds),
        Err(RegressionError::InvalidInput(_))
    ));
}

#[test]
fn test_numeric_codes_in_categorical_column_are_rejected() {
    let mut data = Dataset::new(vec![Column::categorical("Colour"), Column::numeric("Price")]).unwrap();
    assert!(matches!(
        data.push_row(vec![Value::Number(2.0), Value::Number(10.0)]),
        Err(RegressionError::InvalidInput(_))
    ));
    data.push_row(vec![Value::from("red"), Value::Number(10.0)]).unwrap();
    assert!(matches!(
        data.feature_matrix(&names(&["Colour"])),
        Err(RegressionError::InvalidInput(_))
    ));
}
