//! SeaORM entity definitions for the tracking tables

pub mod awarded_goal;
pub mod goal;
pub mod history_config;
pub mod log_channel;
pub mod prohibited_channel;
pub mod reset_config;
pub mod reset_state;
pub mod session;
pub mod total_time;
pub mod weekly_history;
