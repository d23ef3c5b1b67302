//! Sample series windows and explicit no-data results

use junction_sim::simulation::{
    reconstructed_queue_lengths, RouteStats, SampleSeries, StatsError, Train, TrainId,
};

#[test]
fn test_window_bounds_are_inclusive() {
    let mut series = SampleSeries::new();
    for t in 0..=10 {
        series.record(t as f64, t as f64 * 2.0);
    }

    let window = series.window(2.0, 4.0);
    assert_eq!(window.len(), 3);
    assert_eq!(series.mean(2.0, 4.0), Some(6.0));
    assert_eq!(series.mean(10.0, 10.0), Some(20.0));
}

#[test]
fn test_out_of_order_records_are_sorted() {
    let mut series = SampleSeries::new();
    series.record(5.0, 1.0);
    series.record(1.0, 3.0);
    series.record(3.0, 2.0);

    let times: Vec<f64> = series.iter().map(|(t, _)| t).collect();
    assert_eq!(times, vec![1.0, 3.0, 5.0]);
}

#[test]
fn test_empty_window_has_no_mean() {
    let mut series = SampleSeries::new();
    series.record(1.0, 5.0);
    assert_eq!(series.mean(2.0, 3.0), None);
    assert_eq!(series.mean(3.0, 2.0), None);
    assert!(series.window(2.0, 3.0).is_empty());
}

#[test]
fn test_route_stats_report_no_data() {
    let stats = RouteStats::default();
    let err = stats.mean_waiting_time("a-b", 60.0, 1260.0).unwrap_err();
    assert_eq!(
        err,
        StatsError::NoData {
            route: "a-b".to_string(),
            series: "waiting time",
            start: 60.0,
            end: 1260.0,
        }
    );
    assert!(stats.mean_queue_length("a-b", 0.0, 1.0).is_err());
    assert!(stats.mean_service_time("a-b", 0.0, 1.0).is_err());
    assert_eq!(stats.observed_mean_inter_arrival(), None);
}

#[test]
fn test_zero_queue_length_is_data_not_absence() {
    let mut stats = RouteStats::default();
    stats.queue_lengths.record(1.0, 0.0);
    stats.queue_lengths.record(2.0, 0.0);
    assert_eq!(stats.mean_queue_length("a-b", 0.0, 5.0), Ok(0.0));
}

#[test]
fn test_reconstructed_queue_lengths_count_waiting_trains() {
    let served = |id: u64, arrival: f64, start: f64| {
        Train::arrive(TrainId(id), "a-b", arrival)
            .begin_service(start, 1.0)
            .complete(start + 1.0)
    };
    let trains = [
        served(1, 0.5, 2.5),
        served(2, 1.5, 4.0),
        Train::arrive(TrainId(3), "a-b", 2.0),
        Train::arrive(TrainId(4), "a-b", 0.8).begin_service(4.5, 3.0),
    ];

    let lengths = reconstructed_queue_lengths([1.0, 2.0, 3.0, 5.0], trains.iter());
    // train 3 never started and train 4 never finished, so neither is counted
    assert_eq!(lengths, vec![(1.0, 1), (2.0, 2), (3.0, 1), (5.0, 0)]);
}
