//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from system resources (monotonic time, wall-clock
//! time). Tests drive a [`ManualEnv`]; production uses [`SystemEnv`].

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

/// Abstract environment providing time and async sleeping.
///
/// # Invariants
///
/// - `now()` never goes backwards
/// - `wall_clock_millis()` is only used for display timestamps, never for
///   timeouts
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production uses `std::time::Instant`; tests use a virtual instant they
    /// can advance by hand.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only used by driver code, never by the session state machine.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Current wall-clock time in Unix milliseconds.
    ///
    /// Stamped onto outbound chat messages.
    fn wall_clock_millis(&self) -> i64;
}

/// Production environment using system time.
#[derive(Debug, Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::disallowed_methods)]
    fn wall_clock_millis(&self) -> i64 {
        // A clock set before 1970 stamps messages with 0 rather than failing
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
    }
}

/// Point on a [`ManualEnv`] clock, measured from the clock's creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualInstant(Duration);

impl std::ops::Sub for VirtualInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

impl std::ops::Add<Duration> for VirtualInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs))
    }
}

/// Deterministic environment with a hand-driven clock.
///
/// Clones share the same clock. Time only moves when [`ManualEnv::advance`]
/// is called, and `sleep` returns immediately, so simulations and tests
/// never depend on real time.
#[derive(Debug, Clone)]
pub struct ManualEnv {
    elapsed_millis: Arc<AtomicU64>,
    wall_clock_base: i64,
}

impl ManualEnv {
    /// Create a clock at zero whose wall clock reads `wall_clock_base`.
    pub fn new(wall_clock_base: i64) -> Self {
        Self { elapsed_millis: Arc::new(AtomicU64::new(0)), wall_clock_base }
    }

    /// Move the clock forward. Sub-millisecond precision is dropped.
    pub fn advance(&self, duration: Duration) {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self.elapsed_millis.fetch_add(millis, Ordering::SeqCst);
    }

    fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_millis.load(Ordering::SeqCst))
    }
}

impl Environment for ManualEnv {
    type Instant = VirtualInstant;

    fn now(&self) -> Self::Instant {
        VirtualInstant(self.elapsed())
    }

    fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        std::future::ready(())
    }

    fn wall_clock_millis(&self) -> i64 {
        let elapsed = i64::try_from(self.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.wall_clock_base.saturating_add(elapsed)
    }
}
