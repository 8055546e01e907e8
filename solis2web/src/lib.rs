// externally visible interfaces
pub mod iboost;
pub mod inverter;
pub mod mqtt_config;
pub mod mqtt_wrapper;
pub mod report;
