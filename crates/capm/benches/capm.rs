//! Benchmarks for the analytics pipeline.

#![allow(missing_docs)]

use capm::{AnalysisConfig, CapmAnalyzer, PriceTable, compute_returns, fit};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use polars::prelude::*;
use rand::{Rng, SeedableRng, rngs::StdRng};

fn price_table(days: usize, assets: usize) -> PriceTable {
    let mut rng = StdRng::seed_from_u64(11);
    let start = chrono::NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
    let dates: Vec<String> = (0..days)
        .map(|i| (start + chrono::Days::new(i as u64)).to_string())
        .collect();

    let mut columns = vec![Column::new("date".into(), dates)];
    for name in std::iter::once("SPY".to_string()).chain((0..assets).map(|i| format!("A{i}"))) {
        let mut price = 100.0;
        let series: Vec<f64> = (0..days)
            .map(|_| {
                price *= 1.0 + rng.gen_range(-0.02..0.02);
                price
            })
            .collect();
        columns.push(Column::new(name.into(), series));
    }
    PriceTable::new(DataFrame::new(columns).unwrap()).unwrap()
}

fn bench_returns_and_fit(c: &mut Criterion) {
    let prices = price_table(2520, 1);
    c.bench_function("compute_returns_10y", |b| {
        b.iter(|| compute_returns(black_box(&prices)).unwrap())
    });

    let returns = compute_returns(&prices).unwrap();
    c.bench_function("fit_market_model_10y", |b| {
        b.iter(|| fit(black_box(&returns), "A0", "SPY").unwrap())
    });
}

fn bench_analyzer(c: &mut Criterion) {
    let prices = price_table(1260, 20);
    let config = AnalysisConfig {
        instruments: (0..20).map(|i| format!("A{i}")).collect(),
        ..Default::default()
    };
    let analyzer = CapmAnalyzer::new(config).unwrap();
    c.bench_function("analyze_20_assets_5y", |b| {
        b.iter(|| analyzer.analyze(black_box(&prices)).unwrap())
    });
}

criterion_group!(benches, bench_returns_and_fit, bench_analyzer);
criterion_main!(benches);
