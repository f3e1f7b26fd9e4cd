use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Wall-clock seam. Injected so countdown behavior is testable
/// without real delays.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Production clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Unix epoch milliseconds for the wire. Clients sync their local
/// countdowns against this.
pub fn epoch_ms(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Ceiling of a duration in whole seconds.
pub fn ceil_secs(d: Duration) -> u64 {
    (d.as_millis() as u64 + 999) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn ceil_rounds_up() {
        assert_eq!(ceil_secs(Duration::from_millis(0)), 0);
        assert_eq!(ceil_secs(Duration::from_millis(1)), 1);
        assert_eq!(ceil_secs(Duration::from_millis(1000)), 1);
        assert_eq!(ceil_secs(Duration::from_millis(2001)), 3);
    }
    #[test]
    fn epoch_ms_is_monotonic_enough() {
        let a = epoch_ms(SystemTime::now());
        let b = epoch_ms(SystemTime::now() + Duration::from_secs(5));
        assert_eq!(b - a, 5000);
    }
}
