mod runner;
mod scheduler;

pub use self::{
  runner::{JobRunner, PrecompileJob, ProcessRunner},
  scheduler::PrecompileScheduler,
};
