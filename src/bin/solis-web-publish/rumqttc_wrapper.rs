use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::warn;
use rumqttc::{Client, Event, MqttOptions, Packet};
use solis2web::mqtt_config::MqttConfig;
use solis2web::mqtt_wrapper::{self, BusMessage};

pub struct RumqttcWrapper {
    client: Client,
    messages: Receiver<BusMessage>,
    connection_thread: Option<JoinHandle<()>>,
}

fn match_qos(qos: mqtt_wrapper::QoS) -> rumqttc::QoS {
    match qos {
        mqtt_wrapper::QoS::AtMostOnce => rumqttc::QoS::AtMostOnce,
        mqtt_wrapper::QoS::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
        mqtt_wrapper::QoS::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
    }
}

impl mqtt_wrapper::MqttWrapper for RumqttcWrapper {
    fn new(config: &MqttConfig, suffix: &str) -> Self {
        let client_id = config
            .client_id
            .clone()
            .unwrap_or_else(|| "solis-web-publisher".to_string())
            + suffix;
        let mut mqttoptions =
            MqttOptions::new(client_id, &config.host, config.port.unwrap_or(1883));
        mqttoptions.set_keep_alive(Duration::from_secs(5));

        //parse the mqtt authentication options
        if let Some((username, password)) = match (&config.username, &config.password) {
            (None, None) => None,
            (None, Some(_)) => None,
            (Some(username), None) => Some((username.clone(), "".into())),
            (Some(username), Some(password)) => Some((username.clone(), password.clone())),
        } {
            mqttoptions.set_credentials(username, password);
        }

        let (client, mut connection) = Client::new(mqttoptions, 10);

        // keep polling the event loop so the subscriptions get sent and
        // incoming publishes arrive; the loop ends on disconnect or on the
        // first connection error, the receiver then sees a closed channel
        let (sender, messages) = mpsc::channel();
        let connection_thread = thread::spawn(move || {
            for notification in connection.iter() {
                match notification {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let message = BusMessage {
                            topic: publish.topic.clone(),
                            payload: publish.payload.to_vec(),
                        };
                        if sender.send(message).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("mqtt connection error: {e}");
                        break;
                    }
                }
            }
        });

        Self {
            client,
            messages,
            connection_thread: Some(connection_thread),
        }
    }

    fn subscribe(&mut self, topic: &str, qos: mqtt_wrapper::QoS) -> anyhow::Result<()> {
        Ok(self.client.subscribe(topic, match_qos(qos))?)
    }

    fn recv_timeout(&mut self, timeout: Duration) -> Option<BusMessage> {
        self.messages.recv_timeout(timeout).ok()
    }

    fn disconnect(&mut self) {
        if let Err(e) = self.client.disconnect() {
            warn!("mqtt disconnect failed: {e}");
        }
        if let Some(thread) = self.connection_thread.take() {
            let _ = thread.join();
        }
    }
}
