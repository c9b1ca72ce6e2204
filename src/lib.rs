pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod runner;
pub mod scan;
pub mod types;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const TRIM_FAILURES: i32 = 1;
    pub const RUNTIME_FAILURE: i32 = 3;
}
