//! Shared fixtures for integration tests.

#![allow(dead_code)]

use debtrank_algo::LoanBook;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Route solver logs through the test harness; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Three banks used throughout the worked examples.
pub fn three_bank_book() -> LoanBook {
    LoanBook::from_edges(
        &[(0, 1, 20.0), (0, 2, 30.0), (1, 0, 40.0), (2, 1, 80.0)],
        &[(0, 100.0), (1, 200.0), (2, 300.0)],
        None,
    )
    .expect("valid loan book")
}

/// Random interbank network with roughly `density * n * n` loans.
///
/// Every institution lends at least once, so the network is never degenerate.
pub fn random_book(seed: u64, n: usize, density: f64) -> LoanBook {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut edges = Vec::new();
    for debtor in 0..n {
        for creditor in 0..n {
            if debtor != creditor && rng.gen_bool(density) {
                edges.push((debtor, creditor, rng.gen_range(1.0..500.0)));
            }
        }
    }
    for creditor in 0..n {
        let debtor = (creditor + 1) % n;
        edges.push((debtor, creditor, rng.gen_range(1.0..500.0)));
    }
    let capitals: Vec<(usize, f64)> = (0..n)
        .map(|i| (i, rng.gen_range(50.0..1_000.0)))
        .collect();

    LoanBook::from_edges(&edges, &capitals, Some(n)).expect("random loan book")
}

/// Random sparse shock touching about a quarter of the institutions.
pub fn random_shock(seed: u64, n: usize) -> Vec<(usize, f64)> {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(7));
    let mut shock = Vec::new();
    for i in 0..n {
        if rng.gen_bool(0.25) {
            shock.push((i, rng.gen_range(0.05..1.0)));
        }
    }
    shock
}
