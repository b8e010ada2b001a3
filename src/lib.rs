//! Desktop viewer for the AC measurement activity series: download the data
//! file with basic auth, filter it by date, chart and tabulate it.

pub mod app;
pub mod config;
pub mod data;
pub mod state;
pub mod tasks;
pub mod ui;
