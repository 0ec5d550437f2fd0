use std::time::Duration;

/// Frame timing handed to every tick.
///
/// `total` is the monotonic time since the session started; cooldown deadlines
/// are compared against it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Time {
    pub elapsed: Duration,
    pub total: Duration,
}

impl Time {
    pub fn new(total: Duration, elapsed: Duration) -> Self {
        Self { elapsed, total }
    }

    pub fn from_secs(total: f32) -> Self {
        Self {
            elapsed: Duration::ZERO,
            total: Duration::from_secs_f32(total),
        }
    }

    /// Next frame, `delta` later.
    pub fn advance(&self, delta: Duration) -> Self {
        Self {
            elapsed: delta,
            total: self.total + delta,
        }
    }
}
