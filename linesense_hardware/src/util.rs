use std::time::{Duration, Instant};

/// Time how long `is_high` stays true after an RC node was charged, in microseconds.
///
/// Never waits past `timeout`: a node that is still high at the deadline reports
/// the ceiling itself, which downstream reads as "darkest possible". The result
/// saturates at `u16::MAX`.
pub fn discharge_time_us(mut is_high: impl FnMut() -> bool, timeout: Duration) -> u16 {
    let ceiling = ceiling_us(timeout);
    let start = Instant::now();
    loop {
        let elapsed = elapsed_us(start);
        if elapsed >= ceiling {
            return ceiling;
        }
        if !is_high() {
            return elapsed;
        }
        std::hint::spin_loop();
    }
}

/// Timeout ceiling expressed in the same unit as `discharge_time_us`.
#[inline]
pub fn ceiling_us(timeout: Duration) -> u16 {
    u16::try_from(timeout.as_micros()).unwrap_or(u16::MAX)
}

#[inline]
fn elapsed_us(start: Instant) -> u16 {
    u16::try_from(start.elapsed().as_micros()).unwrap_or(u16::MAX)
}
