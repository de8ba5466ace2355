use criterion::{criterion_group, criterion_main};

use exchange::*;

mod zkp;
use zkp::*;

criterion_group!(
    zkp_benches,
    test_compute_proof_1024,
    test_verify_proof_1024,
    test_verify_proof_2048
);

criterion_group!(
    exchange_benches,
    test_round1_1024,
    test_full_exchange_1024,
    test_full_exchange_2048
);

criterion_main!(zkp_benches, exchange_benches);
