use std::time::Duration;

use anyhow::Result;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio_util::sync::CancellationToken;

use crate::{settings::ListenerSettings, telemetry::TelemetryHandler};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

const REQUEST_CHANNEL_CAPACITY: usize = 10;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

pub fn mqtt_options(settings: &ListenerSettings) -> MqttOptions {
    let mut options = MqttOptions::new(
        settings.client_id.clone(),
        settings.broker_host.clone(),
        settings.broker_port,
    );
    options.set_keep_alive(settings.keep_alive);
    options.set_credentials(settings.username.clone(), settings.password.clone());
    options
}

/// Subscribes to the controller topic and feeds each publish to the
/// telemetry handler, one message at a time.
///
/// The subscription is re-issued on every ConnAck, so a reconnect needs no
/// other setup. Connection errors are retried until `shutdown` fires.
pub struct MqttListener {
    settings: ListenerSettings,
    handler: TelemetryHandler,
}

impl MqttListener {
    pub fn new(settings: ListenerSettings, handler: TelemetryHandler) -> Self {
        Self { settings, handler }
    }

    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let (client, mut eventloop) =
            AsyncClient::new(mqtt_options(&self.settings), REQUEST_CHANNEL_CAPACITY);
        let topic = self.settings.topic.clone();

        log_info!(
            "Connecting to MQTT broker {}:{} as {}",
            self.settings.broker_host,
            self.settings.broker_port,
            self.settings.client_id
        );

        loop {
            tokio::select! {
                event = eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        self.handler.handle(&publish.payload).await;
                    }
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        log_info!("Connected to MQTT broker ({:?})", ack.code);
                        if let Err(err) = client.subscribe(topic.as_str(), QoS::AtLeastOnce).await {
                            log_error!("Failed to subscribe to {topic}: {err}");
                        } else {
                            log_info!("Subscribed to {topic}");
                        }
                    }
                    Ok(Event::Incoming(Packet::Disconnect)) => {
                        log_warn!("MQTT broker closed the connection");
                    }
                    Ok(_) => {}
                    Err(err) => {
                        log_error!("MQTT connection error: {err}; retrying in {}s", RECONNECT_DELAY.as_secs());
                        tokio::select! {
                            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                            _ = shutdown.cancelled() => break,
                        }
                    }
                },
                _ = shutdown.cancelled() => break,
            }
        }

        log_info!("MQTT listener shutting down");
        if let Err(err) = client.try_disconnect() {
            log_warn!("Failed to send MQTT disconnect: {err}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ListenerSettings {
        ListenerSettings::from_lookup(|key| {
            match key {
                "MQTT_BROKER" => Some("broker.local"),
                "MQTT_PORT" => Some("1884"),
                "MQTT_USERNAME" => Some("smoker"),
                "MQTT_PASSWORD" => Some("secret"),
                "MQTT_TOPIC" => Some("flameboss/42/send/data"),
                _ => None,
            }
            .map(String::from)
        })
        .expect("settings")
    }

    #[test]
    fn options_follow_settings() {
        let options = mqtt_options(&settings());
        assert_eq!(options.broker_address(), ("broker.local".to_string(), 1884));
        assert_eq!(options.client_id(), "smokenotes-mqtt");
        assert_eq!(options.keep_alive(), Duration::from_secs(60));
    }
}
