//! Dependency graphs of simulation work, and the thread pool that runs them.

use rayon::prelude::*;

/// Identifies a job within a [`JobGraph`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct JobId(usize);

type Job<'a> = Box<dyn FnOnce() + Send + 'a>;

/// A dependency graph of jobs for one batch of simulation work.
///
/// Jobs may borrow data for `'a`, which lets a simulator hand out disjoint mutable views
/// of the energy fields it fills. A graph is consumed by [`ThreadPool::process`].
#[derive(Default)]
pub struct JobGraph<'a> {
    jobs: Vec<Job<'a>>,
    levels: Vec<usize>,
}

impl<'a> JobGraph<'a> {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            levels: Vec::new(),
        }
    }

    /// Adds a job with no dependencies.
    pub fn add_job<F>(&mut self, job: F) -> JobId
    where
        F: FnOnce() + Send + 'a,
    {
        self.add_job_after(&[], job)
    }

    /// Adds a job that only starts once every job in `dependencies` has completed.
    ///
    /// # Panics
    ///
    /// Panics if a dependency does not belong to this graph.
    pub fn add_job_after<F>(&mut self, dependencies: &[JobId], job: F) -> JobId
    where
        F: FnOnce() + Send + 'a,
    {
        let level = dependencies
            .iter()
            .map(|&JobId(index)| {
                assert!(index < self.jobs.len(), "unknown job dependency");
                self.levels[index] + 1
            })
            .max()
            .unwrap_or(0);

        self.jobs.push(Box::new(job));
        self.levels.push(level);
        JobId(self.jobs.len() - 1)
    }

    /// Number of jobs in the graph.
    pub fn num_jobs(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Removes every job, keeping allocated capacity.
    pub fn reset(&mut self) {
        self.jobs.clear();
        self.levels.clear();
    }

    /// Splits the graph into groups of jobs that can run concurrently, in execution order.
    fn into_levels(self) -> Vec<Vec<Job<'a>>> {
        let num_levels = self.levels.iter().max().map_or(0, |&level| level + 1);
        let mut levels: Vec<Vec<Job<'a>>> = (0..num_levels).map(|_| Vec::new()).collect();

        for (job, level) in self.jobs.into_iter().zip(self.levels) {
            levels[level].push(job);
        }

        levels
    }
}

impl std::fmt::Debug for JobGraph<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobGraph")
            .field("num_jobs", &self.jobs.len())
            .finish()
    }
}

/// A fixed-size pool of worker threads.
#[derive(Debug)]
pub struct ThreadPool {
    pool: rayon::ThreadPool,
}

impl ThreadPool {
    /// Creates a pool with `num_threads` workers. Zero picks one worker per logical CPU.
    ///
    /// # Errors
    ///
    /// Returns [`rayon::ThreadPoolBuildError`] if the worker threads cannot be spawned.
    pub fn try_new(num_threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|index| format!("audiobake-worker-{index}"))
            .build()?;

        Ok(Self { pool })
    }

    /// Number of worker threads.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs every job in `job_graph` to completion.
    ///
    /// Blocks the calling thread until the last job has finished. Jobs whose dependencies
    /// are satisfied run in parallel across the workers.
    pub fn process(&self, job_graph: JobGraph<'_>) {
        let levels = job_graph.into_levels();

        self.pool.install(|| {
            for level in levels {
                level.into_par_iter().for_each(|job| job());
            }
        });
    }
}
