//! Integration tests for group fan-out and membership buffering

use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;
use tweenkit::{
    AxisMask, EngineConfig, ThreadHint, TweenEngine, TweenError, TweenParams, Vector3,
};

fn create_engine() -> TweenEngine {
    TweenEngine::new(EngineConfig::default())
}

/// Helper building a sink that records every received value
fn recording_sink(values: &Arc<Mutex<Vec<f32>>>) -> impl FnMut(f32) + Send + 'static {
    let values = Arc::clone(values);
    move |value| values.lock().unwrap().push(value)
}

#[test]
fn test_members_hold_their_join_offsets() {
    let mut engine = create_engine();
    let near = Arc::new(Mutex::new(Vec::new()));
    let far = Arc::new(Mutex::new(Vec::new()));

    let driver = engine.create(TweenParams::new(0.0f32, 10.0, 1.0)).unwrap();
    engine
        .create_group::<f32>("squad", driver, ThreadHint::Auto)
        .unwrap();
    engine
        .add_to_group("squad", 5.0f32, recording_sink(&near))
        .unwrap();
    engine
        .add_to_group("squad", -2.0f32, recording_sink(&far))
        .unwrap();

    engine.update(0.25);
    assert_relative_eq!(*near.lock().unwrap().last().unwrap(), 7.5);
    assert_relative_eq!(*far.lock().unwrap().last().unwrap(), 0.5);

    engine.update(0.25);
    assert_relative_eq!(*near.lock().unwrap().last().unwrap(), 10.0);
    assert_relative_eq!(*far.lock().unwrap().last().unwrap(), 3.0);
}

#[test]
fn test_membership_changes_are_buffered() {
    let mut engine = create_engine();
    let values = Arc::new(Mutex::new(Vec::new()));

    let driver = engine.create(TweenParams::new(0.0f32, 10.0, 1.0)).unwrap();
    engine
        .create_group::<f32>("squad", driver, ThreadHint::Auto)
        .unwrap();

    // Joining between updates takes effect at the next update.
    assert_eq!(engine.group::<f32>("squad").unwrap().len(), 0);
    let member = engine
        .add_to_group("squad", 0.0f32, recording_sink(&values))
        .unwrap();
    assert_eq!(engine.group::<f32>("squad").unwrap().len(), 0);

    engine.update(0.25);
    assert_eq!(engine.group::<f32>("squad").unwrap().len(), 1);
    assert_eq!(values.lock().unwrap().len(), 1);

    // Removal is buffered the same way: the member misses the update
    // that flushes it out.
    engine.remove_from_group::<f32>("squad", member).unwrap();
    engine.update(0.25);
    assert_eq!(engine.group::<f32>("squad").unwrap().len(), 0);
    assert_eq!(values.lock().unwrap().len(), 1);

    engine.update(0.25);
    assert_eq!(values.lock().unwrap().len(), 1);
}

#[test]
fn test_completing_driver_fans_terminal_value() {
    let mut engine = create_engine();
    let values = Arc::new(Mutex::new(Vec::new()));

    let driver = engine.create(TweenParams::new(0.0f32, 10.0, 0.5)).unwrap();
    engine
        .create_group::<f32>("squad", driver, ThreadHint::Auto)
        .unwrap();
    engine
        .add_to_group("squad", 1.0f32, recording_sink(&values))
        .unwrap();

    // The driver completes and is recycled in this update, but the group
    // still receives the terminal value first.
    engine.update(0.5);
    assert!(!engine.is_alive(driver));
    assert_relative_eq!(*values.lock().unwrap().last().unwrap(), 11.0);

    // With the driver gone the fan-out stops.
    engine.update(0.5);
    assert_eq!(values.lock().unwrap().len(), 1);
}

#[test]
fn test_terminate_group_leaves_driver_running() {
    let mut engine = create_engine();
    let values = Arc::new(Mutex::new(Vec::new()));

    let driver = engine.create(TweenParams::new(0.0f32, 10.0, 1.0)).unwrap();
    engine
        .create_group::<f32>("squad", driver, ThreadHint::Auto)
        .unwrap();
    engine
        .add_to_group("squad", 0.0f32, recording_sink(&values))
        .unwrap();

    engine.update(0.25);
    engine.terminate_group::<f32>("squad").unwrap();
    assert!(engine.group::<f32>("squad").is_none());

    engine.update(0.25);
    assert!(engine.is_alive(driver));
    assert_relative_eq!(engine.progress(driver).unwrap(), 0.5);
    assert_eq!(values.lock().unwrap().len(), 1);

    // The name is free again.
    engine
        .create_group::<f32>("squad", driver, ThreadHint::Auto)
        .unwrap();
}

#[test]
fn test_duplicate_group_name_rejected() {
    let mut engine = create_engine();
    let driver = engine.create(TweenParams::new(0.0f32, 1.0, 1.0)).unwrap();
    engine
        .create_group::<f32>("squad", driver, ThreadHint::Auto)
        .unwrap();

    let err = engine
        .create_group::<f32>("squad", driver, ThreadHint::Auto)
        .unwrap_err();
    assert!(matches!(err, TweenError::DuplicateGroup { .. }));
}

#[test]
fn test_group_names_scoped_per_value_type() {
    let mut engine = create_engine();
    let scalar_driver = engine.create(TweenParams::new(0.0f32, 1.0, 1.0)).unwrap();
    let vector_driver = engine
        .create(TweenParams::new(Vector3::zero(), Vector3::one(), 1.0))
        .unwrap();

    engine
        .create_group::<f32>("squad", scalar_driver, ThreadHint::Auto)
        .unwrap();
    engine
        .create_group::<Vector3>("squad", vector_driver, ThreadHint::Auto)
        .unwrap();

    assert!(engine.group::<f32>("squad").is_some());
    assert!(engine.group::<Vector3>("squad").is_some());
}

#[test]
fn test_disabled_group_stays_silent() {
    let mut engine = create_engine();
    let values = Arc::new(Mutex::new(Vec::new()));

    let driver = engine.create(TweenParams::new(0.0f32, 10.0, 1.0)).unwrap();
    engine
        .create_group::<f32>("squad", driver, ThreadHint::Auto)
        .unwrap();
    engine
        .add_to_group("squad", 0.0f32, recording_sink(&values))
        .unwrap();

    engine.set_group_enabled::<f32>("squad", false).unwrap();
    engine.update(0.25);
    engine.update(0.25);
    assert!(values.lock().unwrap().is_empty());

    engine.set_group_enabled::<f32>("squad", true).unwrap();
    engine.update(0.25);
    assert_eq!(values.lock().unwrap().len(), 1);
    assert_relative_eq!(*values.lock().unwrap().last().unwrap(), 7.5);
}

#[test]
fn test_parallel_hint_applies_vector_members() {
    let mut engine = create_engine();
    let driver = engine
        .create(TweenParams::new(
            Vector3::zero(),
            Vector3::new(4.0, 0.0, 0.0),
            1.0,
        ))
        .unwrap();
    engine
        .create_group::<Vector3>("flock", driver, ThreadHint::Parallel)
        .unwrap();

    let mut cells = Vec::new();
    for i in 0..8 {
        let cell = Arc::new(Mutex::new(Vector3::zero()));
        let sink_cell = Arc::clone(&cell);
        engine
            .add_to_group(
                "flock",
                Vector3::new(0.0, i as f32, 0.0),
                move |value: Vector3| {
                    *sink_cell.lock().unwrap() = value;
                },
            )
            .unwrap();
        cells.push(cell);
    }

    engine.update(0.5);
    for (i, cell) in cells.iter().enumerate() {
        let value = *cell.lock().unwrap();
        assert_relative_eq!(value.x, 2.0);
        assert_relative_eq!(value.y, i as f32);
    }
}

#[test]
fn test_masked_driver_moves_only_masked_axes_of_members() {
    let mut engine = create_engine();
    let received = Arc::new(Mutex::new(Vector3::zero()));
    let sink_cell = Arc::clone(&received);

    let driver = engine
        .create(
            TweenParams::new(
                Vector3::new(1.0, 2.0, 3.0),
                Vector3::new(9.0, 9.0, 9.0),
                1.0,
            )
            .with_mask(AxisMask::X),
        )
        .unwrap();
    engine
        .create_group::<Vector3>("squad", driver, ThreadHint::Auto)
        .unwrap();
    engine
        .add_to_group("squad", Vector3::new(11.0, 22.0, 33.0), move |value: Vector3| {
            *sink_cell.lock().unwrap() = value;
        })
        .unwrap();

    engine.update(0.5);
    let value = *received.lock().unwrap();
    assert_relative_eq!(value.x, 15.0);
    // Unmasked axes never leave the member's join value.
    assert_relative_eq!(value.y, 22.0);
    assert_relative_eq!(value.z, 33.0);
}

#[test]
fn test_unknown_group_is_an_error() {
    let mut engine = create_engine();
    let err = engine
        .add_to_group("ghost", 0.0f32, |_| {})
        .unwrap_err();
    assert!(matches!(err, TweenError::GroupNotFound { .. }));
    assert!(engine.terminate_group::<f32>("ghost").is_err());
}
