//! Polls the ecobee cloud API for thermostat telemetry and forwards it to
//! Datadog as metrics. Best-effort delivery: failed submissions are logged
//! and dropped, never queued.

pub mod command;
pub mod constants;
pub mod data_mgmt;
pub mod helpers;
pub mod interfaces;
pub mod node_mgmt;
