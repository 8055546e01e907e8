mod config;
mod logging;
mod rumqttc_wrapper;

use config::Config;
use log::{error, info};
use rumqttc_wrapper::RumqttcWrapper;
use solis2web::iboost::IBoostCollector;
use solis2web::inverter::Inverter;
use solis2web::report::{self, Report};

fn main() {
    logging::init_logger();
    info!("Running revision: {}", env!("GIT_HASH"));
    if std::env::args().len() > 1 {
        error!("Arguments passed. Tool is configured by config.toml in its path");
    }

    let config = Config::load();
    if !config.is_valid() {
        error!("configuration incomplete: a report url and a broker host are required");
        return;
    }

    // every failure ends up here; the run logs it and exits cleanly, the
    // scheduler simply starts the next one
    if let Err(e) = run(&config) {
        error!("{e:#}");
    }
}

fn run(config: &Config) -> anyhow::Result<()> {
    let inverter = Inverter::new(&config.serial);
    let energy_today = inverter.read_energy_today()?;
    let timestamp = report::utc_timestamp();

    let collector = IBoostCollector::<RumqttcWrapper>::new(&config.mqtt, &config.iboost);
    let readings = collector.collect();

    let report = Report::new(energy_today, timestamp, &readings);
    report.post(&config.report.url)
}
