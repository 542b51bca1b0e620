pub mod job;
pub mod worker;

pub use job::ScheduledJob;
pub use worker::ScheduledJobWorker;
