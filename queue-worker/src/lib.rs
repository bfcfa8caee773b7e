#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]

pub mod cli;
pub mod processor;
pub mod types;
pub mod worker;
