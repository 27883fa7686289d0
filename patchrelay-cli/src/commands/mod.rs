pub mod branch;
pub mod config;
pub mod run;
pub mod runs;
