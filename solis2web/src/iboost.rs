use std::time::{Duration, Instant};

use log::{debug, warn};
use serde_derive::Deserialize;
use serde_json::Value;

use crate::mqtt_config::MqttConfig;
use crate::mqtt_wrapper::{BusMessage, MqttWrapper, QoS};

/// Topic carrying the consolidated JSON document from the ESP32 monitor.
const CONSOLIDATED_TOPIC: &str = "iboost/iboost";
const SAVED_TODAY_TOPIC: &str = "iboost/savedToday";
const HOT_WATER_TOPIC: &str = "iboost/hotWater";
const BATTERY_TOPIC: &str = "iboost/battery";

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// All three readings in one JSON document on `iboost/iboost`.
    #[default]
    Json,
    /// One raw scalar per `iboost/...` topic.
    Raw,
}

impl PayloadFormat {
    fn topics(&self) -> &'static [&'static str] {
        match self {
            PayloadFormat::Json => &[CONSOLIDATED_TOPIC],
            PayloadFormat::Raw => &[SAVED_TODAY_TOPIC, HOT_WATER_TOPIC, BATTERY_TOPIC],
        }
    }

    /// The ESP32 publishes every ten seconds, messages are either there or
    /// not. The consolidated document gets fifteen seconds to show up, the
    /// per-topic scalars five.
    fn default_window(&self) -> Duration {
        match self {
            PayloadFormat::Json => Duration::from_secs(15),
            PayloadFormat::Raw => Duration::from_secs(5),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct IBoostConfig {
    pub format: PayloadFormat,
    pub timeout_secs: Option<u64>,
}

impl IBoostConfig {
    pub fn window(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.format.default_window())
    }
}

/// A field is set once it was explicitly received, a genuine zero included.
/// Fields still unset at the end of the window render as empty strings in
/// the report.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IBoostReadings {
    pub saved_today: Option<String>,
    pub hot_water: Option<String>,
    pub battery: Option<String>,
}

impl IBoostReadings {
    pub fn is_complete(&self) -> bool {
        self.saved_today.is_some() && self.hot_water.is_some() && self.battery.is_some()
    }
}

pub struct IBoostCollector<MQTT: MqttWrapper> {
    client: MQTT,
    format: PayloadFormat,
    window: Duration,
}

impl<MQTT: MqttWrapper> IBoostCollector<MQTT> {
    pub fn new(mqtt: &MqttConfig, config: &IBoostConfig) -> Self {
        Self::with_client(MQTT::new(mqtt, "-iboost"), config)
    }

    pub fn with_client(client: MQTT, config: &IBoostConfig) -> Self {
        Self {
            client,
            format: config.format,
            window: config.window(),
        }
    }

    /// Collects until all three fields arrived or the window elapsed,
    /// whichever comes first. The connection is torn down before the
    /// readings are handed back; partial results are not an error.
    pub fn collect(mut self) -> IBoostReadings {
        let mut readings = IBoostReadings::default();
        for topic in self.format.topics() {
            if let Err(e) = self.client.subscribe(topic, QoS::AtMostOnce) {
                warn!("subscription to {topic} failed: {e}");
            }
        }

        let deadline = Instant::now() + self.window;
        while !readings.is_complete() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!("collection window elapsed");
                break;
            }
            match self.client.recv_timeout(remaining) {
                Some(message) => decode(self.format, &message, &mut readings),
                None => break,
            }
        }

        self.client.disconnect();
        readings
    }
}

fn decode(format: PayloadFormat, message: &BusMessage, readings: &mut IBoostReadings) {
    match format {
        PayloadFormat::Json => decode_consolidated(&message.payload, readings),
        PayloadFormat::Raw => decode_per_topic(message, readings),
    }
}

/// One JSON document with `savedToday`, `hotWater` and `battery` fields.
/// Fields are recorded whenever the key is present, whatever its value.
fn decode_consolidated(payload: &[u8], readings: &mut IBoostReadings) {
    let document: Value = match serde_json::from_slice(payload) {
        Ok(document) => document,
        Err(e) => {
            warn!("undecodable iboost document: {e}");
            return;
        }
    };
    if let Some(value) = scalar(&document, "savedToday") {
        readings.saved_today = Some(value);
    }
    if let Some(value) = scalar(&document, "hotWater") {
        readings.hot_water = Some(value);
    }
    if let Some(value) = scalar(&document, "battery") {
        readings.battery = Some(value);
    }
}

/// Strings keep their content, numbers their rendering. `null` and a missing
/// key both count as not received.
fn scalar(document: &Value, field: &str) -> Option<String> {
    match document.get(field)? {
        Value::Null => None,
        Value::String(value) => Some(value.clone()),
        value => Some(value.to_string()),
    }
}

fn decode_per_topic(message: &BusMessage, readings: &mut IBoostReadings) {
    let value = String::from_utf8_lossy(&message.payload).into_owned();
    match message.topic.as_str() {
        topic if topic == SAVED_TODAY_TOPIC => readings.saved_today = Some(value),
        topic if topic == HOT_WATER_TOPIC => readings.hot_water = Some(value),
        topic if topic == BATTERY_TOPIC => readings.battery = Some(value),
        topic => debug!("ignoring message on {topic}"),
    }
}
