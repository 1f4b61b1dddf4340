///! This module contains helper functions for creating nanosecond spans.
///! All functions are const and compile down to plain multiplications.

/// Returns the number of nanoseconds in the given number of seconds.
pub const fn sec(s: u64) -> u64 {
    s * 1_000_000_000
}

/// Returns the number of nanoseconds in the given number of milliseconds.
pub const fn ms(ms: u64) -> u64 {
    ms * 1_000_000
}

/// Returns the number of nanoseconds in the given number of microseconds.
pub const fn us(us: u64) -> u64 {
    us * 1_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from() {
        assert_eq!(sec(2), 2_000_000_000);
        assert_eq!(ms(14), 14_000_000);
        assert_eq!(us(1), 1_000);
    }
}
