use std::time::Duration;

use crate::mqtt_config::MqttConfig;

#[derive(Clone, Copy)]
pub enum QoS {
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

/// One message delivered by the broker on a subscribed topic.
#[derive(Clone, Debug)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

pub trait MqttWrapper {
    // This trait provides an interface that decouples library code from an
    // implementation of the MQTT client. On library calling code, one needs to
    // wrap the MQTT implementation, i.e. the client, in a new type that in
    // turn implements this trait.

    fn new(config: &MqttConfig, suffix: &str) -> Self;

    fn subscribe(&mut self, topic: &str, qos: QoS) -> anyhow::Result<()>;

    /// Block for up to `timeout` waiting for the next message. `None` means
    /// the wait timed out or the connection is gone; the caller stops
    /// collecting either way.
    fn recv_timeout(&mut self, timeout: Duration) -> Option<BusMessage>;

    /// Tear down the connection and stop its background loop. Must be safe
    /// to call even if the connection never came up.
    fn disconnect(&mut self);
}
