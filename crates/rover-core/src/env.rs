//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples arbitration and actuation logic from
//! system resources (time, randomness). This enables:
//!
//! - Deterministic Simulation: a seeded RNG and an instant `sleep` make
//!   participant IDs and actuation timing reproducible.
//!
//! - Production Runtime: the server's `SystemEnv` uses the OS clock, tokio
//!   timers and OS entropy without any change to the logic using it.
//!
//! # Invariants
//!
//! - Monotonicity: `env.now()` must never go backwards
//! - Determinism: Given the same seed, `random_bytes()` produces the same
//!   sequence
//! - Isolation: Implementations must not share global state

use std::time::{Duration, Instant};

/// Abstract environment providing time, randomness, and async sleeping.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Returns the current time.
    ///
    /// Must never return a value earlier than a previous call within the same
    /// execution context.
    fn now(&self) -> Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code (the actuation task) awaits this; the arbitration
    /// core itself never suspends.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    ///
    /// Production implementations use OS entropy so participant IDs cannot be
    /// guessed by other clients.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`, e.g. for participant IDs.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}
