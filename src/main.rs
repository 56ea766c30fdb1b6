use crate::cli::run;

pub mod app;
pub mod catalog;
pub mod cli;
mod config;
pub mod domain;
pub mod http;
pub mod offline;
pub mod playback;
pub mod request;
pub mod storage;

fn main() {
    run();
}
