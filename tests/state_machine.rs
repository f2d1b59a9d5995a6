//! State machine behavior observed through the public breaker API.

use std::cell::Cell;
use std::sync::atomic::Ordering;
use std::time::Duration;

use circuit_breaker::{BreakerError, Overloading, Settings, StateType};

mod common;

use common::{harness, settings};

#[test]
fn test_trips_on_error_rate() {
    let h = harness(settings());
    h.trip();

    assert_eq!(h.breaker.state(), StateType::Open);
    let stats = h.breaker.stats();
    assert_eq!(stats.success, 4);
    assert_eq!(stats.failure, 6);
    assert_eq!(stats.fast_fail, 1);
}

#[test]
fn test_never_trips_below_min_requests() {
    let h = harness(Settings {
        min_qps_for_open: 20,
        ..settings()
    });

    // 19 requests per 1s window, all failing, against a floor of 20.
    for _ in 0..5 {
        for _ in 0..19 {
            assert_eq!(h.fail(), Err(BreakerError::Call("overloaded")));
        }
        h.advance_secs(1);
    }

    assert_eq!(h.breaker.state(), StateType::Closed);
    assert_eq!(h.breaker.stats().fast_fail, 0);
}

#[test]
fn test_open_rejects_without_invoking() {
    let h = harness(settings());
    h.trip();

    let invoked = Cell::new(0);
    for _ in 0..9 {
        h.advance_secs(1);
        let result = h.breaker.execute(|| {
            invoked.set(invoked.get() + 1);
            (Ok::<_, ()>(()), Overloading::No)
        });
        assert_eq!(result, Err(BreakerError::Open));
    }

    assert_eq!(invoked.get(), 0);
    assert_eq!(h.breaker.state(), StateType::Open);
    assert_eq!(h.sink.fast_fail.load(Ordering::SeqCst), 10);
}

#[test]
fn test_cooldown_admits_exactly_one_probe() {
    let h = harness(Settings {
        half_open_success_count: 1,
        ..settings()
    });
    h.trip();
    h.advance_secs(10);

    // The probe is in flight while a second caller arrives.
    let result = h.breaker.execute(|| {
        assert_eq!(h.breaker.state(), StateType::HalfOpen);
        assert!(h.succeed().unwrap_err().is_open());
        (Ok::<_, ()>("probe"), Overloading::No)
    });

    assert_eq!(result, Ok("probe"));
    assert_eq!(h.succeed(), Ok("ok"));
    assert_eq!(h.breaker.state(), StateType::Closed);
}

#[test]
fn test_half_open_successes_close_with_fresh_counters() {
    let h = harness(settings());
    h.trip();
    h.advance_secs(10);

    for _ in 0..3 {
        assert_eq!(h.succeed(), Ok("ok"));
        assert_eq!(h.breaker.state(), StateType::HalfOpen);
    }
    let snapshot = h.breaker.snapshot();
    assert_eq!(snapshot.success_count, 3);
    assert_eq!(snapshot.pending_count, 3);

    assert_eq!(h.succeed(), Ok("ok"));
    let snapshot = h.breaker.snapshot();
    assert_eq!(snapshot.state, StateType::Closed);
    assert_eq!(snapshot.success_count, 1);
    assert_eq!(snapshot.failure_count, 0);
    assert_eq!(snapshot.pending_count, 0);
}

#[test]
fn test_half_open_failure_reopens() {
    let h = harness(settings());
    h.trip();
    h.advance_secs(10);

    assert!(h.succeed().is_ok());
    assert_eq!(h.fail(), Err(BreakerError::Call("overloaded")));
    assert_eq!(h.breaker.state(), StateType::HalfOpen);

    assert!(h.succeed().unwrap_err().is_open());
    assert_eq!(h.breaker.state(), StateType::Open);

    // A full cooldown is served again.
    h.advance_secs(9);
    assert!(h.succeed().unwrap_err().is_open());
    h.advance_secs(1);
    assert!(h.succeed().is_ok());
    assert_eq!(h.breaker.state(), StateType::HalfOpen);
}

#[test]
fn test_empty_window_starts_fresh_window() {
    let h = harness(Settings {
        min_qps_for_open: 0,
        ..settings()
    });

    h.advance_secs(5);
    assert_eq!(h.succeed(), Ok("ok"));
    assert_eq!(h.breaker.state(), StateType::Closed);
    assert_eq!(h.breaker.snapshot().success_count, 1);
}

#[test]
fn test_transition_mid_flight_drops_outcome() {
    let h = harness(settings());
    for _ in 0..3 {
        assert!(h.succeed().is_ok());
    }

    let result = h.breaker.execute(|| {
        // Window ends and another request rolls the breaker into a new sojourn.
        h.advance_secs(1);
        assert!(h.succeed().is_ok());
        (Err::<(), _>("slow"), Overloading::Yes)
    });
    assert_eq!(result, Err(BreakerError::Call("slow")));

    let snapshot = h.breaker.snapshot();
    assert_eq!(snapshot.state, StateType::Closed);
    assert_eq!(snapshot.success_count, 1);
    assert_eq!(snapshot.failure_count, 0);
    assert_eq!(snapshot.totals.failure, 1);
}

#[test]
fn test_settings_change_reaches_open_breaker() {
    let h = harness(settings());
    h.trip();

    h.breaker
        .change_settings(|s| s.cool_down_interval = Duration::from_secs(1));

    // The current sojourn's deadline was fixed when it started.
    h.advance_secs(1);
    assert!(h.succeed().unwrap_err().is_open());

    h.advance_secs(9);
    assert!(h.succeed().is_ok());
    assert_eq!(h.fail(), Err(BreakerError::Call("overloaded")));
    assert!(h.succeed().unwrap_err().is_open());

    // The next open sojourn picks up the shorter cooldown.
    h.advance_secs(1);
    assert!(h.succeed().is_ok());
    assert_eq!(h.breaker.state(), StateType::HalfOpen);
}

#[test]
fn test_lowering_success_count_below_recorded_closes() {
    let h = harness(settings());
    h.trip();
    h.advance_secs(10);

    assert!(h.succeed().is_ok());
    assert!(h.succeed().is_ok());
    assert_eq!(h.breaker.snapshot().success_count, 2);

    h.breaker.change_settings(|s| s.half_open_success_count = 1);

    assert_eq!(h.succeed(), Ok("ok"));
    assert_eq!(h.breaker.state(), StateType::Closed);
}
