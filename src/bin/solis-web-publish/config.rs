use std::{env, fs};

use log::warn;
use serde_derive::Deserialize;
use solis2web::iboost::IBoostConfig;
use solis2web::inverter::SerialConfig;
use solis2web::mqtt_config::MqttConfig;
use solis2web::report::ReportConfig;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub mqtt: MqttConfig,
    pub iboost: IBoostConfig,
    pub report: ReportConfig,
}

impl Config {
    pub fn is_valid(&self) -> bool {
        !self.report.url.is_empty() && self.mqtt.is_valid()
    }

    pub fn load() -> Config {
        // parse config from TOML file if present
        let filename = "config.toml";
        let contents = match fs::read_to_string(filename) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Could not read config.toml: {e}");
                "".into()
            }
        };
        let mut config = match toml::from_str::<Config>(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!("toml config unparsable: {e}");
                Config::default()
            }
        };

        // overwrite config if environment variables are set
        if let Ok(host) = env::var("MQTT_BROKER_HOST") {
            config.mqtt.host = host;
        }
        if let Ok(port) = env::var("MQTT_PORT") {
            config.mqtt.port = Some(port.parse().unwrap_or(1883));
        }
        if let Ok(username) = env::var("MQTT_USERNAME") {
            config.mqtt.username = Some(username);
        }
        if let Ok(password) = env::var("MQTT_PASSWORD") {
            config.mqtt.password = Some(password);
        }
        if let Ok(url) = env::var("REPORT_URL") {
            config.report.url = url;
        }
        config
    }
}
