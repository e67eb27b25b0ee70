pub mod providers;
pub mod rate_cache;
pub mod throttle;
pub mod sources;
pub mod aggregator;
pub mod evaluator;
pub mod alert_store;
pub mod access;
pub mod telegram;
pub mod dispatch;
pub mod supervisor;
pub mod alert_monitor;
pub mod commands;
pub mod command_poller;
pub mod keepalive;
