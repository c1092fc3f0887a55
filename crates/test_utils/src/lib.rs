//! Utilities for testing peerset crates.

pub mod id;

/// Enable tracing with the RUST_LOG environment variable.
///
/// This is intended to be used in tests, so it defaults to DEBUG level.
pub fn enable_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::DEBUG.into())
                .from_env_lossy(),
        )
        .try_init();
}

/// Run a check block in a loop until it `break`s, sleeping briefly
/// between iterations, or panic when the timeout elapses first.
///
/// Defaults to a 1000ms timeout. Pass a millisecond literal as the
/// first argument to override it.
#[macro_export]
macro_rules! iter_check {
    ($timeout_ms:literal, $code:block) => {
        tokio::time::timeout(
            std::time::Duration::from_millis($timeout_ms),
            async {
                loop {
                    $code
                    tokio::time::sleep(std::time::Duration::from_millis(1))
                        .await;
                }
            },
        )
        .await
        .expect("iter_check timed out");
    };
    ($code:block) => {
        $crate::iter_check!(1000, $code)
    };
}
