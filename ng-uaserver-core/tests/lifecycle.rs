mod common;

use common::{init_tracing, provider_config, RecordingRuntime};
use ng_uaserver_core::{
    lifecycle::{ANSWER_BROWSE_NAME, ANSWER_NODE_ID},
    populator::{ARRAY_FOLDER_ID, DEMO_FOLDER_ID, SCALAR_FOLDER_ID},
    providers::{StatusLed, SystemClock, TemperatureSensor},
    Lifecycle,
};
use ng_uaserver_sdk::{
    AccessMode, BuiltinType, NGValue, NodeKey, RunningFlag, ServeStatus, StaticValue,
    WriteRequest,
};
use parking_lot::Mutex;
use std::{collections::HashSet, fs, sync::Arc, time::Duration};

#[tokio::test]
async fn absent_hardware_registers_only_the_clock() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (runtime, recording) = RecordingRuntime::new();

    let summary = Lifecycle::new()
        .run(&provider_config(dir.path()), runtime.stop_after(1), RunningFlag::new())
        .await
        .unwrap();

    assert_eq!(summary.status, ServeStatus::GOOD);
    assert_eq!(summary.status.exit_code(), 0);
    assert_eq!(summary.closed, 0);

    let rec = recording.lock();
    let names: Vec<_> = rec.sources.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, [SystemClock::NAME]);
    assert_eq!(rec.sources[0].id, NodeKey::string("current-time"));
    assert_eq!(rec.sources[0].parent, NodeKey::ObjectsFolder);
    assert_eq!(rec.sources[0].access, AccessMode::Read);
}

#[tokio::test]
async fn corrupt_sensor_fails_before_running() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = provider_config(dir.path());
    fs::write(&config.temperature_path, "not a temperature").unwrap();
    let (runtime, recording) = RecordingRuntime::new();

    let err = Lifecycle::new()
        .run(&config, runtime, RunningFlag::new())
        .await
        .unwrap_err();

    assert!(err.is_fatal());
    let rec = recording.lock();
    assert!(!rec.served);
    assert!(rec.sources.is_empty());
}

#[tokio::test]
async fn full_hardware_registers_every_node() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = provider_config(dir.path());
    fs::write(&config.temperature_path, "47250\n").unwrap();
    fs::write(&config.led_trigger_path, "mmc0").unwrap();
    fs::write(&config.led_brightness_path, "1").unwrap();
    let (runtime, recording) = RecordingRuntime::new();

    let summary = Lifecycle::new()
        .run(&config, runtime.stop_after(2), RunningFlag::new())
        .await
        .unwrap();
    assert_eq!(summary.closed, 2);

    let rec = recording.lock();
    let sources: Vec<_> = rec
        .sources
        .iter()
        .map(|s| (s.name.as_str(), s.access))
        .collect();
    assert_eq!(
        sources,
        [
            (SystemClock::NAME, AccessMode::Read),
            (TemperatureSensor::NAME, AccessMode::Read),
            (<StatusLed>::NAME, AccessMode::ReadWrite),
        ]
    );

    let answer = rec
        .variables
        .iter()
        .find(|v| v.id == NodeKey::string(ANSWER_NODE_ID))
        .unwrap();
    assert_eq!(answer.browse_name, ANSWER_BROWSE_NAME);
    assert_eq!(answer.value, StaticValue::Value(NGValue::Int32(42)));

    let folders: Vec<_> = rec
        .objects
        .iter()
        .map(|o| (o.id.clone(), o.browse_name.as_str(), o.parent.clone()))
        .collect();
    assert_eq!(
        folders,
        [
            (NodeKey::Numeric(DEMO_FOLDER_ID), "Demo", NodeKey::ObjectsFolder),
            (NodeKey::Numeric(SCALAR_FOLDER_ID), "Scalar", NodeKey::Numeric(DEMO_FOLDER_ID)),
            (NodeKey::Numeric(ARRAY_FOLDER_ID), "Array", NodeKey::Numeric(DEMO_FOLDER_ID)),
        ]
    );
}

#[tokio::test]
async fn populated_nodes_are_two_per_type_with_unique_ids() {
    let dir = tempfile::tempdir().unwrap();
    let (runtime, recording) = RecordingRuntime::new();
    Lifecycle::new()
        .run(&provider_config(dir.path()), runtime.stop_after(1), RunningFlag::new())
        .await
        .unwrap();

    let rec = recording.lock();
    let generated: Vec<_> = rec
        .variables
        .iter()
        .filter_map(|v| match v.id {
            NodeKey::Numeric(id) => Some((id, v.value.data_type())),
            _ => None,
        })
        .collect();
    let supported = BuiltinType::ALL.iter().filter(|t| !t.is_meta()).count();
    assert_eq!(generated.len(), supported * 2);

    let ids: HashSet<u32> = generated.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids.len(), generated.len());
    assert!(ids.iter().all(|id| *id > ARRAY_FOLDER_ID));
    assert!(generated
        .iter()
        .all(|(_, t)| *t != BuiltinType::Variant && *t != BuiltinType::DiagnosticInfo));
}

#[tokio::test]
async fn clearing_the_flag_returns_within_one_iteration() {
    let dir = tempfile::tempdir().unwrap();
    let (runtime, recording) = RecordingRuntime::new();
    let running = RunningFlag::new();

    let stopper = {
        let running = running.clone();
        let recording = Arc::clone(&recording);
        tokio::spawn(async move {
            while recording.lock().iterations < 3 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            let seen = recording.lock().iterations;
            running.stop();
            seen
        })
    };

    let summary = tokio::time::timeout(
        Duration::from_secs(5),
        Lifecycle::new().run(&provider_config(dir.path()), runtime, running),
    )
    .await
    .expect("serve loop ignored the running flag")
    .unwrap();
    let seen = stopper.await.unwrap();

    assert_eq!(summary.status, ServeStatus::GOOD);
    assert!(recording.lock().iterations <= seen + 1);
}

#[tokio::test]
async fn led_round_trips_through_registered_binding_and_is_restored() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = provider_config(dir.path());
    fs::write(&config.led_trigger_path, "mmc0").unwrap();
    fs::write(&config.led_brightness_path, "0").unwrap();

    let observed = Arc::new(Mutex::new(Vec::new()));
    let runtime = {
        let observed = Arc::clone(&observed);
        let brightness = config.led_brightness_path.clone();
        let trigger = config.led_trigger_path.clone();
        let (runtime, _) = RecordingRuntime::new();
        runtime.stop_after(1).on_serve(move |nodes| {
            assert_eq!(fs::read_to_string(&trigger).unwrap(), "none");
            let led = nodes
                .iter()
                .find(|n| n.browse_name() == <StatusLed>::NAME)
                .unwrap();
            let sink = led.binding.sink().unwrap();
            for on in [true, false] {
                sink.write(WriteRequest::new(on)).unwrap();
                let mut snap = led.binding.read(None, false).unwrap();
                observed
                    .lock()
                    .push((snap.value().cloned(), fs::read_to_string(&brightness).unwrap()));
                led.binding.release(&mut snap);
            }
        })
    };

    let summary = Lifecycle::new()
        .run(&config, runtime, RunningFlag::new())
        .await
        .unwrap();

    assert_eq!(summary.closed, 1);
    assert_eq!(
        *observed.lock(),
        [
            (Some(NGValue::Boolean(true)), "1".to_string()),
            (Some(NGValue::Boolean(false)), "0".to_string()),
        ]
    );
    assert_eq!(fs::read_to_string(&config.led_trigger_path).unwrap(), "mmc0");
}
