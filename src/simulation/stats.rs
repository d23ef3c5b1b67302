//! Statistics collection and windowed aggregation
//!
//! Samples are appended as the run progresses and only read afterwards.
//! Every aggregate over an empty window is a [`StatsError::NoData`], never a
//! NaN or a zero.

use ordered_float::OrderedFloat;
use sorted_vec::SortedVec;

use super::error::StatsError;
use super::train::Train;
use super::types::{SimTime, TimeKey};

/// One observation at a point in virtual time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Sample {
    pub time: TimeKey,
    pub value: OrderedFloat<f64>,
}

/// Observations ordered by timestamp
#[derive(Debug, Clone)]
pub struct SampleSeries {
    samples: SortedVec<Sample>,
}

impl Default for SampleSeries {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSeries {
    pub fn new() -> Self {
        Self {
            samples: SortedVec::new(),
        }
    }

    pub fn record(&mut self, time: SimTime, value: f64) {
        self.samples.insert(Sample {
            time: OrderedFloat(time),
            value: OrderedFloat(value),
        });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SimTime, f64)> + '_ {
        self.samples
            .iter()
            .map(|sample| (sample.time.into_inner(), sample.value.into_inner()))
    }

    /// Samples with `start <= time <= end`
    pub fn window(&self, start: SimTime, end: SimTime) -> &[Sample] {
        let lo = self.samples.partition_point(|s| s.time < OrderedFloat(start));
        let hi = self.samples.partition_point(|s| s.time <= OrderedFloat(end));
        if lo >= hi {
            &[]
        } else {
            &self.samples[lo..hi]
        }
    }

    /// Arithmetic mean over the window, `None` if it holds no samples
    pub fn mean(&self, start: SimTime, end: SimTime) -> Option<f64> {
        mean(self.window(start, end).iter().map(|s| s.value.into_inner()))
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Everything recorded about one route during a run
#[derive(Debug, Clone, Default)]
pub struct RouteStats {
    /// Queue length sampled at a fixed cadence
    pub queue_lengths: SampleSeries,
    /// Waiting time per dispatched train, keyed by service start
    pub waiting_times: SampleSeries,
    /// Service time per completed train, keyed by service start
    pub service_times: SampleSeries,
    /// Every inter-arrival duration drawn
    pub inter_arrival_samples: Vec<SimTime>,
    /// Every service duration drawn
    pub service_samples: Vec<SimTime>,
    pub admitted: usize,
    pub rejected: usize,
    pub completed: usize,
}

impl RouteStats {
    pub fn mean_queue_length(
        &self,
        route: &str,
        start: SimTime,
        end: SimTime,
    ) -> Result<f64, StatsError> {
        self.queue_lengths
            .mean(start, end)
            .ok_or_else(|| no_data(route, "queue length", start, end))
    }

    /// Mean waiting time of trains whose service started inside the window
    pub fn mean_waiting_time(
        &self,
        route: &str,
        start: SimTime,
        end: SimTime,
    ) -> Result<f64, StatsError> {
        self.waiting_times
            .mean(start, end)
            .ok_or_else(|| no_data(route, "waiting time", start, end))
    }

    /// Mean service time of completed trains whose service started inside the window
    pub fn mean_service_time(
        &self,
        route: &str,
        start: SimTime,
        end: SimTime,
    ) -> Result<f64, StatsError> {
        self.service_times
            .mean(start, end)
            .ok_or_else(|| no_data(route, "service time", start, end))
    }

    pub fn observed_mean_inter_arrival(&self) -> Option<f64> {
        mean(self.inter_arrival_samples.iter().copied())
    }

    pub fn observed_mean_service(&self) -> Option<f64> {
        mean(self.service_samples.iter().copied())
    }
}

fn no_data(route: &str, series: &'static str, start: SimTime, end: SimTime) -> StatsError {
    StatsError::NoData {
        route: route.to_string(),
        series,
        start,
        end,
    }
}

/// Rebuild queue lengths from train timestamps: at each sample time `t`,
/// count the completed trains with `arrival < t <= service_start`.
///
/// Trains still queued or in service when the run stopped are left out, so
/// this under-reports near the end of a run compared to the live sampler.
pub fn reconstructed_queue_lengths<'a>(
    sample_times: impl IntoIterator<Item = SimTime>,
    trains: impl IntoIterator<Item = &'a Train> + Clone,
) -> Vec<(SimTime, usize)> {
    sample_times
        .into_iter()
        .map(|t| {
            let queued = trains
                .clone()
                .into_iter()
                .filter(|train| train.completion_time.is_some())
                .filter(|train| {
                    train
                        .service_start_time
                        .is_some_and(|start| train.arrival_time < t && start >= t)
                })
                .count();
            (t, queued)
        })
        .collect()
}

/// Aggregate export for one route over a window. `None` means no data.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStatistics {
    pub route: String,
    /// Mean of the queue-length samples in the window
    pub mean_queue_length: Option<f64>,
    /// Mean wait of trains whose service started in the window
    pub mean_waiting_time: Option<f64>,
    /// Configured arrival rate, if the source reports one
    pub arrival_rate: Option<f64>,
    /// Configured service rate, if the source reports one
    pub service_rate: Option<f64>,
    /// Window start (inclusive)
    pub start: SimTime,
    /// Window end (inclusive)
    pub end: SimTime,
    /// Counters over the whole run, not just the window
    pub admitted: usize,
    pub rejected: usize,
    pub completed: usize,
}

/// Whole-junction counters, reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JunctionSummary {
    /// Clock reading when the summary was taken
    pub elapsed_time: SimTime,
    pub events_fired: u64,
    /// Trains admitted so far
    pub total_trains: usize,
    pub trains_completed: usize,
    pub trains_in_service: usize,
    /// Trains queued, including those blocked on held segments
    pub trains_waiting: usize,
    /// Arrivals turned away by full queues
    pub arrivals_rejected: usize,
    pub scheduler_ticks: u64,
    pub dispatches: u64,
    pub contended_checks: u64,
}
