use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use linesense_hardware::util::{ceiling_us, discharge_time_us};
use rstest::rstest;

#[test]
fn node_that_never_discharges_reports_ceiling() {
    let t = discharge_time_us(|| true, Duration::from_micros(800));
    assert_eq!(t, 800);
}

#[test]
fn node_already_low_reports_near_zero() {
    let t = discharge_time_us(|| false, Duration::from_millis(3));
    assert!(t < 3000, "expected early return, got {t}");
}

#[test]
fn discharge_mid_window_is_below_ceiling() {
    let high = Arc::new(AtomicBool::new(true));
    let high_bg = high.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(2));
        high_bg.store(false, Ordering::Relaxed);
    });

    let t = discharge_time_us(|| high.load(Ordering::Relaxed), Duration::from_millis(50));
    assert!(t < 50_000, "discharge should end before the ceiling, got {t}");
}

#[rstest]
#[case(Duration::from_micros(2500), 2500)]
#[case(Duration::from_millis(1), 1000)]
#[case(Duration::from_secs(1), u16::MAX)]
fn ceiling_saturates(#[case] timeout: Duration, #[case] expected: u16) {
    assert_eq!(ceiling_us(timeout), expected);
}
