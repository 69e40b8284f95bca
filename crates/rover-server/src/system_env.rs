//! Production Environment implementation using system time and RNG.
//!
//! `SystemEnv` is the production implementation of the `Environment` trait:
//! real clock, tokio timers for actuation, OS entropy for participant IDs.

use std::time::Duration;

use rover_core::Environment;

/// Production environment using system time and cryptographic RNG.
///
/// # Security
///
/// Participant IDs come from `getrandom`, so a client cannot predict another
/// client's identity.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> std::time::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).unwrap_or_else(|e| {
            // OS entropy only fails on unsupported platforms. Zeros keep the
            // server up; accept falls back to sequential IDs after repeated
            // collisions.
            tracing::error!("getrandom failed: {}", e);
            buffer.fill(0);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_env_time_advances() {
        let env = SystemEnv::new();

        let t1 = env.now();
        std::thread::sleep(Duration::from_millis(10));
        let t2 = env.now();

        assert!(t2 > t1, "Time should advance");
    }

    #[test]
    fn system_env_participant_ids_differ() {
        let env = SystemEnv::new();

        // Extremely unlikely to be equal if random
        assert_ne!(env.random_u64(), env.random_u64());
    }

    #[tokio::test]
    async fn system_env_sleep_works() {
        let env = SystemEnv::new();

        let start = env.now();
        env.sleep(Duration::from_millis(50)).await;
        let elapsed = env.now() - start;

        assert!(elapsed >= Duration::from_millis(50), "Sleep should wait at least 50ms");
    }
}
