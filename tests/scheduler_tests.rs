//! Integration tests for the tween engine: lifecycle, ticking, and
//! control operations

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;
use tweenkit::{
    AxisMask, EngineConfig, EventFlags, ProcessStatus, TimeControl, TweenEngine, TweenError,
    TweenEvent, TweenParams, Vector2, Vector3,
};

/// Helper to build an engine with default configuration
fn create_engine() -> TweenEngine {
    TweenEngine::new(EngineConfig::default())
}

#[test]
fn test_completion_writes_end_value_and_retires() {
    let mut engine = create_engine();
    let final_value = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&final_value);

    let id = engine.create(TweenParams::new(0.0f32, 10.0, 1.0)).unwrap();
    engine
        .on(id, EventFlags::COMPLETE, move |event: &TweenEvent<f32>| {
            *sink.lock().unwrap() = Some((event.progress, event.value));
        })
        .unwrap();

    engine.update(0.5);
    assert_relative_eq!(engine.value::<f32>(id).unwrap(), 5.0);
    assert!(final_value.lock().unwrap().is_none());

    engine.update(0.5);
    let (progress, value) = final_value.lock().unwrap().unwrap();
    assert_eq!(progress, 1.0);
    assert_relative_eq!(value, 10.0);

    // The slot is recycled at the end of the completing update.
    assert!(!engine.is_alive(id));
    assert_eq!(engine.metrics().processes_completed, 1);
    assert_eq!(engine.metrics().live_processes, 0);
}

#[test]
fn test_pause_resume_are_idempotent() {
    let mut engine = create_engine();
    let pauses = Arc::new(AtomicUsize::new(0));
    let resumes = Arc::new(AtomicUsize::new(0));

    let id = engine.create(TweenParams::new(0.0f32, 10.0, 1.0)).unwrap();
    {
        let pauses = Arc::clone(&pauses);
        engine
            .on(id, EventFlags::PAUSE, move |_: &TweenEvent<f32>| {
                pauses.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }
    {
        let resumes = Arc::clone(&resumes);
        engine
            .on(id, EventFlags::RESUME, move |_: &TweenEvent<f32>| {
                resumes.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    engine.update(0.25);
    engine.pause(id).unwrap();
    engine.pause(id).unwrap();
    assert_eq!(pauses.load(Ordering::SeqCst), 1);
    assert_eq!(engine.status(id).unwrap(), ProcessStatus::Paused);

    engine.resume(id).unwrap();
    engine.resume(id).unwrap();
    assert_eq!(resumes.load(Ordering::SeqCst), 1);
    assert_eq!(engine.status(id).unwrap(), ProcessStatus::Running);
}

#[test]
fn test_paused_process_accrues_nothing() {
    let mut engine = create_engine();
    let updates = Arc::new(AtomicUsize::new(0));

    let id = engine.create(TweenParams::new(0.0f32, 10.0, 1.0)).unwrap();
    {
        let updates = Arc::clone(&updates);
        engine
            .on(id, EventFlags::UPDATE, move |_: &TweenEvent<f32>| {
                updates.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    engine.update(0.25);
    engine.pause(id).unwrap();
    let frozen = engine.progress(id).unwrap();
    for _ in 0..10 {
        engine.update(0.25);
    }
    assert_eq!(engine.progress(id).unwrap(), frozen);
    assert_eq!(updates.load(Ordering::SeqCst), 1);

    engine.resume(id).unwrap();
    engine.update(0.25);
    assert_relative_eq!(engine.progress(id).unwrap(), 0.5);
    assert_eq!(updates.load(Ordering::SeqCst), 2);
}

#[test]
fn test_loop_limit_completes_after_crossings() {
    let mut engine = create_engine();
    let loops = Arc::new(AtomicUsize::new(0));
    let completions = Arc::new(AtomicUsize::new(0));

    let id = engine.create(
        TweenParams::new(0.0f32, 1.0, 1.0)
            .with_time_control(TimeControl::Loop)
            .with_loop_limit(2),
    )
    .unwrap();
    let unlimited = engine
        .create(TweenParams::new(0.0f32, 1.0, 1.0).with_time_control(TimeControl::Loop))
        .unwrap();
    {
        let loops = Arc::clone(&loops);
        engine
            .on(id, EventFlags::LOOP_COMPLETED, move |_: &TweenEvent<f32>| {
                loops.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }
    {
        let completions = Arc::clone(&completions);
        engine
            .on(id, EventFlags::COMPLETE, move |event: &TweenEvent<f32>| {
                assert_eq!(event.progress, 1.0);
                completions.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    engine.update(1.0);
    assert!(engine.is_alive(id));
    assert_eq!(loops.load(Ordering::SeqCst), 1);

    // A limit of two allows both wraps to run out in full.
    engine.update(1.0);
    assert!(engine.is_alive(id));
    assert_eq!(loops.load(Ordering::SeqCst), 2);

    engine.update(1.0);
    assert!(!engine.is_alive(id));
    assert_eq!(loops.load(Ordering::SeqCst), 3);
    assert_eq!(completions.load(Ordering::SeqCst), 1);

    // An unlimited sibling keeps looping past the bounded one's death.
    for _ in 0..8 {
        engine.update(1.0);
    }
    assert!(engine.is_alive(unlimited));
}

#[test]
fn test_invert_reverses_motion() {
    let mut engine = create_engine();
    let final_value = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&final_value);

    let id = engine.create(TweenParams::new(0.0f32, 10.0, 1.0)).unwrap();
    engine
        .on(id, EventFlags::COMPLETE, move |event: &TweenEvent<f32>| {
            *sink.lock().unwrap() = Some(event.value);
        })
        .unwrap();

    engine.update(0.25);
    assert_relative_eq!(engine.value::<f32>(id).unwrap(), 2.5);

    engine.invert(id).unwrap();
    engine.update(0.125);
    assert_relative_eq!(engine.value::<f32>(id).unwrap(), 1.25);

    // Running backwards completes at the start bound with the start value.
    engine.update(0.5);
    assert!(!engine.is_alive(id));
    assert_relative_eq!(final_value.lock().unwrap().unwrap(), 0.0);
}

#[test]
fn test_stale_handle_rejected_after_slot_reuse() {
    let mut engine = create_engine();
    let first = engine.create(TweenParams::new(0.0f32, 1.0, 0.1)).unwrap();
    engine.update(0.2);
    assert!(!engine.is_alive(first));

    let second = engine.create(TweenParams::new(5.0f32, 6.0, 1.0)).unwrap();
    assert_eq!(first.slot(), second.slot());
    assert_ne!(first.version(), second.version());

    // Operations through the stale handle never touch the new occupant.
    assert!(matches!(
        engine.pause(first),
        Err(TweenError::InvalidHandle { .. })
    ));
    assert!(matches!(
        engine.seek(first, 0.9),
        Err(TweenError::InvalidHandle { .. })
    ));
    assert!(!engine.kill(first));
    assert!(engine.value::<f32>(first).is_err());

    assert_eq!(engine.status(second).unwrap(), ProcessStatus::Running);
    assert_relative_eq!(engine.value::<f32>(second).unwrap(), 5.0);
}

#[test]
fn test_growable_pool_expands_past_initial_capacity() {
    let mut engine = TweenEngine::new(
        EngineConfig::default()
            .with_initial_capacity(2)
            .with_growable(true),
    );
    for _ in 0..5 {
        engine.create(TweenParams::new(0.0f32, 1.0, 1.0)).unwrap();
    }
    assert_eq!(engine.pool_live::<f32>(), 5);
    assert!(engine.pool_capacity::<f32>() >= 5);
}

#[test]
fn test_zero_duration_completes_on_first_update() {
    let mut engine = create_engine();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let id = engine.create(TweenParams::new(5.0f32, 9.0, 0.0)).unwrap();
    engine
        .on(id, EventFlags::all(), move |event: &TweenEvent<f32>| {
            sink.lock().unwrap().push((event.flags, event.value));
        })
        .unwrap();

    engine.update(0.016);
    assert!(!engine.is_alive(id));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (flags, value) = seen[0];
    assert!(flags.contains(
        EventFlags::START | EventFlags::UPDATE | EventFlags::COMPLETE | EventFlags::KILL
    ));
    assert_relative_eq!(value, 9.0);
}

#[test]
fn test_faulty_custom_easing_degrades_to_raw_progress() {
    let mut engine = create_engine();
    engine
        .easings_mut()
        .register("broken", |_| f32::NAN)
        .unwrap();

    let bad = engine
        .create(TweenParams::new(0.0f32, 10.0, 1.0).with_named_ease("broken"))
        .unwrap();
    let good = engine.create(TweenParams::new(0.0f32, 10.0, 1.0)).unwrap();

    engine.update(0.5);

    // The faulty process falls back to raw progress instead of poisoning
    // its value, and the neighbour is untouched.
    assert_relative_eq!(engine.value::<f32>(bad).unwrap(), 5.0);
    assert_relative_eq!(engine.value::<f32>(good).unwrap(), 5.0);
    assert!(engine.metrics().easing_faults >= 1);

    engine.update(0.5);
    assert!(!engine.is_alive(bad));
}

#[test]
fn test_no_listeners_means_no_dispatch() {
    let mut engine = create_engine();
    engine.create(TweenParams::new(0.0f32, 1.0, 1.0)).unwrap();
    engine.create(TweenParams::new(Vector2::zero(), Vector2::one(), 1.0)).unwrap();

    for _ in 0..4 {
        engine.update(0.25);
    }
    assert_eq!(engine.metrics().events_dispatched, 0);
    assert_eq!(engine.metrics().callbacks_invoked, 0);
}

#[test]
fn test_events_disabled_by_config() {
    let mut engine = TweenEngine::new(EngineConfig::default().with_events(false));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let id = engine.create(TweenParams::new(0.0f32, 1.0, 1.0)).unwrap();
    engine
        .on(id, EventFlags::all(), move |_: &TweenEvent<f32>| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    engine.update(0.5);
    engine.pause(id).unwrap();
    engine.resume(id).unwrap();
    engine.kill(id);

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(engine.metrics().events_dispatched, 0);
}

#[test]
fn test_seek_then_resume_continues_from_target() {
    let mut engine = create_engine();
    let id = engine.create(TweenParams::new(0.0f32, 10.0, 1.0)).unwrap();

    engine.pause(id).unwrap();
    engine.seek(id, 0.75).unwrap();
    assert_relative_eq!(engine.value::<f32>(id).unwrap(), 7.5);

    engine.resume(id).unwrap();
    engine.update(0.125);
    assert_relative_eq!(engine.progress(id).unwrap(), 0.875);
}

#[test]
fn test_masked_axes_keep_start_values() {
    let mut engine = create_engine();
    let id = engine
        .create(
            TweenParams::new(
                Vector3::new(1.0, 2.0, 3.0),
                Vector3::new(10.0, 20.0, 30.0),
                1.0,
            )
            .with_mask(AxisMask::X | AxisMask::Z),
        )
        .unwrap();

    engine.update(0.5);
    let mid = engine.value::<Vector3>(id).unwrap();
    assert_relative_eq!(mid.x, 5.5);
    assert_relative_eq!(mid.y, 2.0);
    assert_relative_eq!(mid.z, 16.5);
}

#[test]
fn test_set_speed_rescales_playback() {
    let mut engine = create_engine();
    let id = engine.create(TweenParams::new(0.0f32, 1.0, 1.0)).unwrap();

    engine.set_speed(id, 0.5).unwrap();
    engine.update(0.5);
    assert_relative_eq!(engine.progress(id).unwrap(), 0.25);

    engine.set_duration(id, 0.5).unwrap();
    engine.update(0.25);
    assert_relative_eq!(engine.progress(id).unwrap(), 0.75);
}

#[test]
fn test_infinite_speed_freezes_progress() {
    let mut engine = create_engine();
    let id = engine.create(TweenParams::new(0.0f32, 10.0, 1.0)).unwrap();

    engine.update(0.25);
    engine.set_speed(id, f32::INFINITY).unwrap();

    for _ in 0..4 {
        engine.update(0.25);
    }
    assert!(engine.is_alive(id));
    assert_relative_eq!(engine.progress(id).unwrap(), 0.25);
    assert_relative_eq!(engine.value::<f32>(id).unwrap(), 2.5);
    assert_eq!(engine.status(id).unwrap(), ProcessStatus::Running);
}

#[test]
fn test_update_ignores_non_finite_delta() {
    let mut engine = create_engine();
    let id = engine.create(TweenParams::new(0.0f32, 1.0, 1.0)).unwrap();
    engine.update(0.25);

    engine.update(f32::NAN);
    engine.update(f32::INFINITY);

    assert_relative_eq!(engine.progress(id).unwrap(), 0.25);
    assert_eq!(engine.metrics().ticks, 1);
}

#[test]
fn test_metrics_track_lifecycle() {
    let mut engine = create_engine();
    let a = engine.create(TweenParams::new(0.0f32, 1.0, 0.5)).unwrap();
    let b = engine.create(TweenParams::new(0.0f32, 1.0, 10.0)).unwrap();
    engine
        .create(TweenParams::new(Vector3::zero(), Vector3::one(), 10.0))
        .unwrap();

    engine.update(0.25);
    assert_eq!(engine.metrics().ticks, 1);
    assert_eq!(engine.metrics().live_processes, 3);

    engine.update(0.5);
    assert!(!engine.is_alive(a));
    assert_eq!(engine.metrics().processes_completed, 1);
    assert_eq!(engine.metrics().live_processes, 2);

    engine.kill(b);
    engine.update(0.1);
    assert_eq!(engine.metrics().processes_killed, 1);
    assert_eq!(engine.metrics().live_processes, 1);
    assert_eq!(engine.metrics().processes_created, 3);
}

#[test]
fn test_restart_replays_from_start() {
    let mut engine = create_engine();
    let starts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&starts);

    let id = engine.create(TweenParams::new(0.0f32, 10.0, 1.0)).unwrap();
    engine
        .on(id, EventFlags::START, move |_: &TweenEvent<f32>| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    engine.update(0.5);
    assert_eq!(starts.load(Ordering::SeqCst), 1);

    engine.restart(id).unwrap();
    assert_eq!(engine.progress(id).unwrap(), 0.0);
    assert_relative_eq!(engine.value::<f32>(id).unwrap(), 0.0);

    engine.update(0.25);
    assert_eq!(starts.load(Ordering::SeqCst), 2);
    assert_relative_eq!(engine.value::<f32>(id).unwrap(), 2.5);
}

#[test]
fn test_fluent_chain_drives_vector_tween() {
    let mut engine = create_engine();
    let completions = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&completions);

    let id = engine
        .tween(
            TweenParams::new(Vector3::zero(), Vector3::new(2.0, 4.0, 6.0), 1.0)
                .with_time_control(TimeControl::PlayOnce),
        )
        .unwrap()
        .on_complete(move |_: &TweenEvent<Vector3>| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .id();

    engine.update(0.5);
    let mid = engine.value::<Vector3>(id).unwrap();
    assert_relative_eq!(mid.y, 2.0);

    engine.update(0.5);
    assert_eq!(completions.load(Ordering::SeqCst), 1);
    assert!(!engine.is_alive(id));
}
