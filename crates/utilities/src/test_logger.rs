#![forbid(unsafe_code)]

/// Initialises a logger for tests that captures the output per test instead
/// of printing it to the console.
pub fn test_logger() {
    // Ignore double initialisations since tests run in parallel.
    let _ = env_logger::builder().is_test(true).try_init();
}
