// Copyright @yucwang 2026

use crate::core::convergence::{ConvergenceCriterion, PixelState};
use crate::core::error::{Error, Result};
use crate::core::rng::SampleRng;
use crate::core::stats::RunningStats;
use crate::math::constants::Vector3f;
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Fork/reduce contract: a private accumulator per worker, one sample per
/// index folded into it, and a merge into the shared aggregate.
///
/// `merge` must be commutative and associative over locals for the result
/// to be independent of worker count and completion order.
pub trait ReduceTask: Sync {
    type Local;
    type Global: Send;

    fn new_local(&self) -> Self::Local;
    fn sample(&self, local: &mut Self::Local, index: usize, rng: &mut SampleRng);
    fn merge(&self, global: &mut Self::Global, local: Self::Local) -> Result<()>;
}

/// One stochastic estimate for a work item (a pixel).
pub trait AdaptiveTask: Sync {
    fn sample(&self, item: usize, rng: &mut SampleRng) -> Vector3f;
}

/// Samples one item on its own stream until the criterion calls it done.
/// `run_adaptive` records exactly this for every item.
pub fn sample_until_terminal<T: AdaptiveTask + ?Sized>(task: &T,
                                                       item: usize,
                                                       seed: u64,
                                                       criterion: &ConvergenceCriterion) -> (RunningStats, PixelState) {
    let mut rng = SampleRng::for_stream(seed, item as u64);
    let mut stats = RunningStats::new();
    let mut state = PixelState::Pending;
    while !state.is_terminal() {
        let sample = task.sample(item, &mut rng);
        stats.push(&sample);
        state = criterion.classify(&stats);
    }
    (stats, state)
}

#[derive(Debug, Clone)]
pub struct AdaptiveOutcome {
    pub stats: Vec<RunningStats>,
    pub states: Vec<PixelState>,
    pub total_samples: u64,
}

impl AdaptiveOutcome {
    fn new(items: usize) -> Self {
        Self {
            stats: vec![RunningStats::new(); items],
            states: vec![PixelState::Pending; items],
            total_samples: 0,
        }
    }

    fn absorb(&mut self, item: usize, stats: &RunningStats, state: PixelState) {
        self.stats[item].merge(stats);
        self.states[item] = state;
        self.total_samples += stats.count();
    }

    pub fn converged(&self) -> usize {
        self.states.iter().filter(|s| matches!(s, PixelState::Converged { .. })).count()
    }

    pub fn exhausted(&self) -> usize {
        self.states.iter().filter(|s| matches!(s, PixelState::Exhausted { .. })).count()
    }
}

pub struct SamplingScheduler {
    workers: usize,
    seed: u64,
    block_size: usize,
    show_progress: bool,
}

impl SamplingScheduler {
    /// `workers == 0` uses the available parallelism.
    pub fn new(workers: usize, seed: u64) -> Self {
        let workers = match workers {
            0 => thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            n => n,
        };
        Self { workers, seed, block_size: 64, show_progress: false }
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Contiguous shards whose sizes differ by at most one.
    pub fn partition(range: Range<usize>, workers: usize) -> Vec<Range<usize>> {
        let total = range.len();
        let workers = workers.max(1);
        let base = total / workers;
        let extra = total % workers;

        let mut shards = Vec::with_capacity(workers);
        let mut start = range.start;
        for w in 0..workers {
            let len = base + if w < extra { 1 } else { 0 };
            if len == 0 {
                continue;
            }
            shards.push(start..start + len);
            start += len;
        }
        shards
    }

    pub fn reduce<T: ReduceTask>(&self, task: &T, range: Range<usize>, global: T::Global) -> Result<T::Global> {
        let shards = Self::partition(range.clone(), self.workers);
        log::info!("Reducing {} samples over {} shards.", range.len(), shards.len());

        let global = Mutex::new(global);
        let failure: Mutex<Option<Error>> = Mutex::new(None);
        let progress = self.progress_bar(range.len() as u64, "samples");
        let seed = self.seed;

        thread::scope(|scope| {
            for (worker, shard) in shards.into_iter().enumerate() {
                let global = &global;
                let failure = &failure;
                let progress = &progress;
                scope.spawn(move || {
                    let mut local = task.new_local();
                    for index in shard.clone() {
                        let mut rng = SampleRng::for_stream(seed, index as u64);
                        task.sample(&mut local, index, &mut rng);
                        progress.inc(1);
                    }

                    let mut guard = global.lock();
                    match task.merge(&mut guard, local) {
                        Ok(()) => log::debug!("Worker {} merged shard {:?}.", worker, shard),
                        Err(e) => {
                            log::error!("Worker {} failed to merge shard {:?}: {}", worker, shard, e);
                            failure.lock().get_or_insert(e);
                        }
                    }
                });
            }
        });
        progress.finish_and_clear();

        match failure.into_inner() {
            Some(e) => Err(e),
            None => Ok(global.into_inner()),
        }
    }

    /// Samples every item until its state is terminal. Items are claimed in
    /// blocks; a block's statistics are merged under one lock acquisition.
    pub fn run_adaptive<T: AdaptiveTask>(&self,
                                         task: &T,
                                         items: usize,
                                         criterion: &ConvergenceCriterion) -> Result<AdaptiveOutcome> {
        criterion.validate()?;

        let block_size = self.block_size;
        let total_blocks = (items + block_size - 1) / block_size;
        let thread_count = self.workers.min(total_blocks).max(1);
        log::info!("Adaptive sampling of {} items in {} blocks on {} workers.", items, total_blocks, thread_count);

        let table = Mutex::new(AdaptiveOutcome::new(items));
        let next_block = AtomicUsize::new(0);
        let progress = self.progress_bar(items as u64, "pixels");
        let seed = self.seed;

        thread::scope(|scope| {
            for _ in 0..thread_count {
                scope.spawn(|| {
                    loop {
                        let block_index = next_block.fetch_add(1, Ordering::Relaxed);
                        if block_index >= total_blocks {
                            break;
                        }
                        let start = block_index * block_size;
                        let end = (start + block_size).min(items);

                        let mut block = Vec::with_capacity(end - start);
                        for item in start..end {
                            let (stats, state) = sample_until_terminal(task, item, seed, criterion);
                            block.push((item, stats, state));
                        }

                        let mut guard = table.lock();
                        for (item, stats, state) in block.iter() {
                            guard.absorb(*item, stats, *state);
                        }
                        drop(guard);
                        progress.inc((end - start) as u64);
                    }
                });
            }
        });
        progress.finish_and_clear();

        let outcome = table.into_inner();
        log::info!("Adaptive sampling done: {} converged, {} exhausted, {} samples.",
                   outcome.converged(), outcome.exhausted(), outcome.total_samples);
        Ok(outcome)
    }

    fn progress_bar(&self, len: u64, unit: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress = ProgressBar::new(len);
        let template = format!("[{{elapsed_precise}}] {{bar:40.cyan/blue}} {{pos}}/{{len}} {}", unit);
        progress.set_style(
            ProgressStyle::with_template(&template)
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::Float;

    struct SumTask;

    impl ReduceTask for SumTask {
        type Local = (Float, usize);
        type Global = (Float, usize);

        fn new_local(&self) -> Self::Local {
            (0.0, 0)
        }

        fn sample(&self, local: &mut Self::Local, _index: usize, rng: &mut SampleRng) {
            local.0 += rng.next_float();
            local.1 += 1;
        }

        fn merge(&self, global: &mut Self::Global, local: Self::Local) -> Result<()> {
            global.0 += local.0;
            global.1 += local.1;
            Ok(())
        }
    }

    struct FailingTask;

    impl ReduceTask for FailingTask {
        type Local = ();
        type Global = usize;

        fn new_local(&self) -> Self::Local {}

        fn sample(&self, _local: &mut Self::Local, _index: usize, _rng: &mut SampleRng) {}

        fn merge(&self, _global: &mut Self::Global, _local: Self::Local) -> Result<()> {
            Err(Error::HeightFieldMismatch("test".to_string()))
        }
    }

    // Item 0 is constant, item 1 flips between 0 and 1.
    struct TwoPixelTask;

    impl AdaptiveTask for TwoPixelTask {
        fn sample(&self, item: usize, rng: &mut SampleRng) -> Vector3f {
            match item {
                0 => Vector3f::new(0.5, 0.5, 0.5),
                _ => {
                    let v = if rng.next_float() < 0.5 { 0.0 } else { 1.0 };
                    Vector3f::new(v, v, v)
                }
            }
        }
    }

    #[test]
    fn test_partition() {
        let shards = SamplingScheduler::partition(3..13, 4);
        assert_eq!(shards, vec![3..6, 6..9, 9..11, 11..13]);

        let shards = SamplingScheduler::partition(0..2, 4);
        assert_eq!(shards, vec![0..1, 1..2]);

        assert!(SamplingScheduler::partition(0..0, 4).is_empty());
    }

    #[test]
    fn test_reduce_visits_every_index_once() {
        let scheduler = SamplingScheduler::new(3, 9);
        let (_, count) = scheduler.reduce(&SumTask, 0..1000, (0.0, 0)).unwrap();
        assert_eq!(count, 1000);
    }

    #[test]
    fn test_reduce_independent_of_worker_count() {
        let one = SamplingScheduler::new(1, 9).reduce(&SumTask, 0..500, (0.0, 0)).unwrap();
        let five = SamplingScheduler::new(5, 9).reduce(&SumTask, 0..500, (0.0, 0)).unwrap();
        assert!((one.0 - five.0).abs() < 1e-9);

        let other_seed = SamplingScheduler::new(5, 10).reduce(&SumTask, 0..500, (0.0, 0)).unwrap();
        assert!((one.0 - other_seed.0).abs() > 1e-9);
    }

    #[test]
    fn test_reduce_reports_merge_failure() {
        let scheduler = SamplingScheduler::new(2, 0);
        assert!(matches!(scheduler.reduce(&FailingTask, 0..10, 0), Err(Error::HeightFieldMismatch(_))));
    }

    #[test]
    fn test_adaptive_stops_each_pixel_independently() {
        let criterion = ConvergenceCriterion { min_samples: 16, max_samples: 500, ..Default::default() };
        let scheduler = SamplingScheduler::new(2, 1).with_block_size(1);
        let outcome = scheduler.run_adaptive(&TwoPixelTask, 2, &criterion).unwrap();

        assert_eq!(outcome.states[0], PixelState::Converged { samples: 16 });
        assert_eq!(outcome.states[1], PixelState::Exhausted { samples: 500 });
        assert_eq!(outcome.total_samples, 16 + 500);
        assert_eq!(outcome.converged(), 1);
        assert_eq!(outcome.exhausted(), 1);
        assert_eq!(outcome.stats[0].count(), 16);
    }

    #[test]
    fn test_adaptive_deterministic_across_workers() {
        let criterion = ConvergenceCriterion { min_samples: 4, max_samples: 50, ..Default::default() };
        let a = SamplingScheduler::new(1, 3).run_adaptive(&TwoPixelTask, 40, &criterion).unwrap();
        let b = SamplingScheduler::new(4, 3).with_block_size(3).run_adaptive(&TwoPixelTask, 40, &criterion).unwrap();
        assert_eq!(a.states, b.states);
        assert_eq!(a.stats, b.stats);
        assert_eq!(a.total_samples, b.total_samples);
    }

    #[test]
    fn test_single_item_matches_batch_record() {
        let criterion = ConvergenceCriterion { min_samples: 4, max_samples: 50, ..Default::default() };
        let batch = SamplingScheduler::new(2, 11).run_adaptive(&TwoPixelTask, 8, &criterion).unwrap();
        let (stats, state) = sample_until_terminal(&TwoPixelTask, 5, 11, &criterion);
        assert_eq!(stats, batch.stats[5]);
        assert_eq!(state, batch.states[5]);
    }

    #[test]
    fn test_adaptive_rejects_bad_criterion() {
        let criterion = ConvergenceCriterion { min_samples: 10, max_samples: 1, ..Default::default() };
        let scheduler = SamplingScheduler::new(1, 0);
        assert!(scheduler.run_adaptive(&TwoPixelTask, 2, &criterion).is_err());
    }
}
