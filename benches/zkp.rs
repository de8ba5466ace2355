use criterion::Criterion;
use crypto_bigint::rand_core::OsRng;
use crypto_bigint::{U1024, U2048};
use jpake::zkp::{compute_proof, verify_proof};
use jpake::PrimeOrderGroup;
use sha2::Sha256;

const OWNER: &str = "alice";

// Proofs are made for x = 1 so that gx = g; the cost of proving and verifying
// does not depend on x.

pub fn test_compute_proof_1024(c: &mut Criterion) {
    let group = PrimeOrderGroup::sun_jce_1024();
    let gx = *group.g();
    c.bench_function("compute_proof_1024", |b| {
        b.iter(|| {
            compute_proof::<{ U1024::LIMBS }, Sha256, _>(
                &group,
                group.g(),
                &gx,
                &U1024::ONE,
                OWNER,
                &mut OsRng,
            )
        })
    });
}

pub fn test_verify_proof_1024(c: &mut Criterion) {
    let group = PrimeOrderGroup::sun_jce_1024();
    let gx = *group.g();
    let proof = compute_proof::<{ U1024::LIMBS }, Sha256, _>(
        &group,
        group.g(),
        &gx,
        &U1024::ONE,
        OWNER,
        &mut OsRng,
    );
    c.bench_function("verify_proof_1024", |b| {
        b.iter(|| {
            verify_proof::<{ U1024::LIMBS }, Sha256>(&group, group.g(), &gx, &proof, OWNER)
                .expect("proof verifies")
        })
    });
}

pub fn test_verify_proof_2048(c: &mut Criterion) {
    let group = PrimeOrderGroup::nist_2048();
    let gx = *group.g();
    let proof = compute_proof::<{ U2048::LIMBS }, Sha256, _>(
        &group,
        group.g(),
        &gx,
        &U2048::ONE,
        OWNER,
        &mut OsRng,
    );
    c.bench_function("verify_proof_2048", |b| {
        b.iter(|| {
            verify_proof::<{ U2048::LIMBS }, Sha256>(&group, group.g(), &gx, &proof, OWNER)
                .expect("proof verifies")
        })
    });
}
