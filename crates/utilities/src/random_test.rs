#![forbid(unsafe_code)]

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::test_logger;

/// Runs the given test function repeatedly with a seeded random number
/// generator. Prints the seed to the console so that a failure can be
/// reproduced by setting `SUPC_SEED=<seed>`.
pub fn random_test<F>(iterations: usize, mut test_function: F)
where
    F: FnMut(&mut StdRng),
{
    test_logger();

    let seed = match std::env::var("SUPC_SEED") {
        Ok(seed_str) => {
            let seed = seed_str.parse::<u64>().expect("SUPC_SEED must be a valid u64");
            println!("seed: {seed} (fixed by SUPC_SEED)");
            seed
        }
        Err(_) => {
            let seed: u64 = rand::random();
            println!("random seed: {seed} (use SUPC_SEED=<seed> to set a fixed seed)");
            seed
        }
    };

    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..iterations {
        test_function(&mut rng);
    }
}

/// Runs a random test with a specific seed for reproducibility.
pub fn random_test_seeded<F>(seed: u64, iterations: usize, mut test_function: F)
where
    F: FnMut(&mut StdRng),
{
    test_logger();

    println!("seed: {seed}");
    let mut rng = StdRng::seed_from_u64(seed);

    for _ in 0..iterations {
        test_function(&mut rng);
    }
}
