use std::time::Duration;

use chrono::Utc;
use log::info;
use serde_derive::Deserialize;

use crate::iboost::IBoostReadings;

static HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub url: String,
}

/// One upload record, built per run and discarded after the POST.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub total: f64,
    pub time: String,
    pub used_today: String,
    pub hot_water: String,
    pub battery: String,
}

impl Report {
    pub fn new(energy_today: f64, time: String, readings: &IBoostReadings) -> Self {
        Self {
            total: energy_today,
            time,
            used_today: readings.saved_today.clone().unwrap_or_default(),
            hot_water: readings.hot_water.clone().unwrap_or_default(),
            battery: readings.battery.clone().unwrap_or_default(),
        }
    }

    /// The web application reads everything from the query string; field
    /// order matches what it renders.
    pub fn query_string(&self) -> String {
        format!(
            "&total={}&time={}&usedtoday={}&hotwater={}&battery={}",
            self.total, self.time, self.used_today, self.hot_water, self.battery
        )
    }

    /// Parameters travel in the URL, the request body stays empty. The
    /// response body is logged, the status code is not inspected.
    pub fn post(&self, url: &str) -> anyhow::Result<()> {
        let query_string = self.query_string();
        info!("{query_string}");

        let client = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()?;
        let response = client.post(format!("{url}{query_string}")).send()?;
        info!("{}", response.text()?);
        Ok(())
    }
}

/// Wall clock at read time; the web page displays it verbatim.
pub fn utc_timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
