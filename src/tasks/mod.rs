pub mod task_runner;
pub mod verification_sweep;
