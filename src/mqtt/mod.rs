//! Broker connection for the controller telemetry feed.

pub mod listener;

pub use listener::{mqtt_options, MqttListener};
