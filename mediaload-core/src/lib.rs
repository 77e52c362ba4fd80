pub mod runner;

pub use runner::{
    Error, LoadTest, LoadTestOptions, Orchestrator, Params, Result, RunReport, RunStats, Session,
    SessionFactory, SessionParams, SessionRole,
};
