// ============================================================================
// Basic Usage Example
// ============================================================================
//
// Run with `cargo run --example basic_usage --features logging` to see the
// evaluator's decisions logged through tracing.

use precise_eval::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

fn show(label: &str, result: ArithmeticResult<MagnitudeCell>) {
    match result {
        Ok(cell) => println!("{label:<32} = {cell:?}"),
        Err(err) => println!("{label:<32} ! {err}"),
    }
}

fn main() {
    #[cfg(feature = "logging")]
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Precise Evaluation Example ===\n");

    let evaluator = EvaluatorBuilder::new()
        .with_max_rearrange_rounds(64)
        .build(Arc::new(LoggingEventHandler))
        .expect("valid configuration");

    let f = MagnitudeCell::from_value::<f64>;

    // Shortcuts and exact folds
    println!("Sums:");
    show("1.5 + 0.25", evaluator.sum(f(1.5), f(0.25)));
    show("0.1 + 0.2", evaluator.sum(f(0.1), f(0.2)));
    show("inf + -inf", evaluator.sum(f(f64::INFINITY), f(f64::NEG_INFINITY)));

    // Mixed representations
    println!("\nMixed representations:");
    show(
        "3 + 0.5 (integer, decimal)",
        evaluator.sum(MagnitudeCell::from_value(3i64), MagnitudeCell::from_value(Decimal::new(5, 1))),
    );
    show(
        "7 / 2 (integers)",
        evaluator.quotient(MagnitudeCell::from_value(7i64), MagnitudeCell::from_value(2i64)),
    );
    show(
        "0.1 (decimal) * 3.0",
        evaluator.product(MagnitudeCell::from_value(Decimal::new(1, 1)), f(3.0)),
    );

    // Intervals and snapshots
    println!("\nIntervals:");
    let mut mass = MagnitudeCell::from_value(Interval::new(5.97e24f64, 5.98e24).unwrap());
    let gravity = Interval::new(6.674e-11f64, 6.675e-11).unwrap();
    show(
        "G * M",
        evaluator.product(mass.snapshot(), MagnitudeCell::from_value(gravity)),
    );
    show(
        "1 / [-1, 1]",
        evaluator.quotient(f(1.0), MagnitudeCell::from_value(Interval::new(-1.0f64, 1.0).unwrap())),
    );
    println!("mass cell still shared: {}", mass.is_shared());

    // Series quotients
    println!("\nSeries quotients:");
    show(
        "3628800 / 10!",
        evaluator.quotient_by_series_product(f(3628800.0), IntegerRange::new(1, 10)),
    );
    show(
        "10^400 / 250!",
        evaluator.quotient_of_series_products(f(10.0), 400, IntegerRange::new(1, 250)),
    );
    show(
        "1 / 200!",
        evaluator.quotient_by_series_product(f(1.0), IntegerRange::new(1, 200)),
    );
    show(
        "6 / ((-3)(-2)(-1))",
        evaluator.quotient_by_series_product(f(6.0), IntegerRange::new(-3, -1)),
    );

    // Scaling
    println!("\nScaling:");
    show("1.5 * 2^3", evaluator.scale(f(1.5), 3));
    show("f64::MAX * 2", evaluator.scale(f(f64::MAX), 1));

    println!("\n=== Example Complete ===");
}
