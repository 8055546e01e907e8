use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use solis2web::iboost::{IBoostCollector, IBoostConfig, PayloadFormat};
use solis2web::mqtt_config::MqttConfig;
use solis2web::mqtt_wrapper::{BusMessage, MqttWrapper, QoS};
use solis2web::report::Report;

/// Handles into the fake broker that survive the collector consuming it.
#[derive(Clone, Default)]
struct TesterState {
    subscriptions: Arc<Mutex<Vec<String>>>,
    disconnected: Arc<AtomicBool>,
}

/// Scripted stand-in for the broker: a message becomes visible once its
/// arrival offset has passed.
struct MqttTester {
    started: Instant,
    scripted: Vec<(Duration, BusMessage)>,
    state: TesterState,
}

impl MqttTester {
    fn with_script(state: &TesterState, script: Vec<(Duration, BusMessage)>) -> Self {
        Self {
            started: Instant::now(),
            scripted: script,
            state: state.clone(),
        }
    }

    fn message(topic: &str, payload: &str) -> BusMessage {
        BusMessage {
            topic: topic.to_string(),
            payload: payload.as_bytes().to_vec(),
        }
    }
}

impl MqttWrapper for MqttTester {
    fn new(_config: &MqttConfig, _suffix: &str) -> Self {
        Self::with_script(&TesterState::default(), Vec::new())
    }

    fn subscribe(&mut self, topic: &str, _qos: QoS) -> anyhow::Result<()> {
        self.state
            .subscriptions
            .lock()
            .unwrap()
            .push(topic.to_string());
        Ok(())
    }

    fn recv_timeout(&mut self, timeout: Duration) -> Option<BusMessage> {
        if self.scripted.is_empty() {
            thread::sleep(timeout);
            return None;
        }
        let arrival = self.scripted[0].0;
        let elapsed = self.started.elapsed();
        if arrival > elapsed + timeout {
            thread::sleep(timeout);
            return None;
        }
        if arrival > elapsed {
            thread::sleep(arrival - elapsed);
        }
        Some(self.scripted.remove(0).1)
    }

    fn disconnect(&mut self) {
        self.state.disconnected.store(true, Ordering::SeqCst);
    }
}

fn json_config(timeout_secs: u64) -> IBoostConfig {
    IBoostConfig {
        format: PayloadFormat::Json,
        timeout_secs: Some(timeout_secs),
    }
}

fn raw_config(timeout_secs: u64) -> IBoostConfig {
    IBoostConfig {
        format: PayloadFormat::Raw,
        timeout_secs: Some(timeout_secs),
    }
}

#[test]
fn collector_stops_as_soon_as_all_fields_arrive() {
    let state = TesterState::default();
    let tester = MqttTester::with_script(
        &state,
        vec![(
            Duration::from_millis(50),
            MqttTester::message(
                "iboost/iboost",
                r#"{"savedToday":3169,"hotWater":"HOT","battery":"OK"}"#,
            ),
        )],
    );

    let started = Instant::now();
    let readings = IBoostCollector::with_client(tester, &json_config(15)).collect();

    // all fields were in after 50ms; the 15s window must not be waited out
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(readings.saved_today.as_deref(), Some("3169"));
    assert_eq!(readings.hot_water.as_deref(), Some("HOT"));
    assert_eq!(readings.battery.as_deref(), Some("OK"));
    assert!(state.disconnected.load(Ordering::SeqCst));
    assert_eq!(*state.subscriptions.lock().unwrap(), vec!["iboost/iboost"]);
}

#[test]
fn collector_gives_up_at_the_deadline() {
    let state = TesterState::default();
    let tester = MqttTester::with_script(&state, Vec::new());

    let started = Instant::now();
    let readings = IBoostCollector::with_client(tester, &json_config(1)).collect();

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(readings.saved_today, None);
    assert_eq!(readings.hot_water, None);
    assert_eq!(readings.battery, None);
    assert!(state.disconnected.load(Ordering::SeqCst));
}

#[test]
fn partial_collection_is_kept() {
    let state = TesterState::default();
    let tester = MqttTester::with_script(
        &state,
        vec![(
            Duration::from_millis(50),
            MqttTester::message("iboost/savedToday", "3169"),
        )],
    );

    let readings = IBoostCollector::with_client(tester, &raw_config(1)).collect();

    assert_eq!(readings.saved_today.as_deref(), Some("3169"));
    assert_eq!(readings.hot_water, None);
    assert_eq!(readings.battery, None);
    assert!(state.disconnected.load(Ordering::SeqCst));
}

#[test]
fn raw_topics_collect_three_fields() {
    let state = TesterState::default();
    let tester = MqttTester::with_script(
        &state,
        vec![
            (
                Duration::from_millis(10),
                MqttTester::message("iboost/savedToday", "3169"),
            ),
            (
                Duration::from_millis(20),
                MqttTester::message("iboost/hotWater", "Heating by Solar"),
            ),
            (
                Duration::from_millis(30),
                MqttTester::message("iboost/battery", "LOW"),
            ),
        ],
    );

    let started = Instant::now();
    let readings = IBoostCollector::with_client(tester, &raw_config(5)).collect();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(readings.is_complete());
    assert_eq!(readings.hot_water.as_deref(), Some("Heating by Solar"));
    assert_eq!(
        *state.subscriptions.lock().unwrap(),
        vec!["iboost/savedToday", "iboost/hotWater", "iboost/battery"]
    );
}

#[test]
fn zero_values_terminate_the_window() {
    let state = TesterState::default();
    let tester = MqttTester::with_script(
        &state,
        vec![(
            Duration::from_millis(10),
            MqttTester::message(
                "iboost/iboost",
                r#"{"savedToday":0,"hotWater":"Off","battery":"OK"}"#,
            ),
        )],
    );

    let started = Instant::now();
    let readings = IBoostCollector::with_client(tester, &json_config(15)).collect();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(readings.saved_today.as_deref(), Some("0"));
    assert!(readings.is_complete());
}

#[test]
fn empty_collection_posts_empty_fields() {
    let state = TesterState::default();
    let tester = MqttTester::with_script(&state, Vec::new());

    let readings = IBoostCollector::with_client(tester, &json_config(1)).collect();
    let report = Report::new(12.5, "2026-08-07 10:15:00".into(), &readings);

    assert_eq!(
        report.query_string(),
        "&total=12.5&time=2026-08-07 10:15:00&usedtoday=&hotwater=&battery="
    );
}
