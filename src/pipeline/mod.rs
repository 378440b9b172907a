pub mod bundle;
pub mod extract;
pub mod job_runner;
pub mod orchestrator;
pub mod regenerate;
