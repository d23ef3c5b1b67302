//! Event queue ordering, cancellation and horizon handling

use junction_sim::simulation::{EventQueue, SimError};

#[test]
fn test_events_fire_in_time_order() {
    let mut queue = EventQueue::new();
    queue.schedule(3.0, "late").unwrap();
    queue.schedule(1.0, "early").unwrap();
    queue.schedule(2.0, "middle").unwrap();

    assert_eq!(queue.pop(), Some("early"));
    assert_eq!(queue.now(), 1.0);
    assert_eq!(queue.pop(), Some("middle"));
    assert_eq!(queue.pop(), Some("late"));
    assert_eq!(queue.now(), 3.0);
    assert_eq!(queue.pop(), None);
}

#[test]
fn test_equal_timestamps_fire_first_scheduled_first() {
    let mut queue = EventQueue::new();
    for i in 0..10 {
        queue.schedule(5.0, i).unwrap();
    }

    let fired: Vec<i32> = std::iter::from_fn(|| queue.pop()).collect();
    assert_eq!(fired, (0..10).collect::<Vec<_>>());
}

#[test]
fn test_delay_is_relative_to_current_time() {
    let mut queue = EventQueue::new();
    queue.schedule(2.0, 'a').unwrap();
    assert_eq!(queue.pop(), Some('a'));

    queue.schedule(0.5, 'b').unwrap();
    assert_eq!(queue.peek_time(), Some(2.5));
}

#[test]
fn test_cancelled_event_never_fires() {
    let mut queue = EventQueue::new();
    let first = queue.schedule(1.0, "timeout").unwrap();
    queue.schedule(2.0, "work").unwrap();

    assert!(queue.is_pending(first));
    assert!(queue.cancel(first));
    assert!(!queue.is_pending(first));
    assert!(!queue.cancel(first), "Cancelling twice should report false");
    assert_eq!(queue.len(), 1);

    assert_eq!(queue.pop(), Some("work"));
    assert_eq!(queue.now(), 2.0);
    assert!(queue.is_empty());
}

#[test]
fn test_cancel_after_fire_is_noop() {
    let mut queue = EventQueue::new();
    let handle = queue.schedule(1.0, ()).unwrap();
    assert_eq!(queue.pop(), Some(()));
    assert!(!queue.cancel(handle));
}

#[test]
fn test_negative_and_nan_delays_are_rejected() {
    let mut queue: EventQueue<()> = EventQueue::new();
    assert_eq!(queue.schedule(-1.0, ()), Err(SimError::InvalidDelay(-1.0)));
    assert!(queue.schedule(f64::NAN, ()).is_err());
    assert!(queue.schedule(f64::INFINITY, ()).is_err());
    assert!(queue.is_empty());
}

#[test]
fn test_run_until_stops_at_horizon() {
    let mut queue = EventQueue::new();
    queue.schedule(1.0, 1).unwrap();

    // Each event reschedules itself one unit later
    let mut fired = Vec::new();
    queue
        .run_until(5.0, |queue, n| {
            fired.push(n);
            queue.schedule(1.0, n + 1).map(|_| ())
        })
        .unwrap();

    assert_eq!(fired, vec![1, 2, 3, 4, 5]);
    assert_eq!(queue.now(), 5.0);
    assert_eq!(queue.peek_time(), Some(6.0));
}

#[test]
fn test_run_until_advances_idle_clock() {
    let mut queue: EventQueue<()> = EventQueue::new();
    queue
        .run_until(10.0, |_, _| Ok::<(), SimError>(()))
        .unwrap();
    assert_eq!(queue.now(), 10.0);
    assert_eq!(queue.fired(), 0);
}
