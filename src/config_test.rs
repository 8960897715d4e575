use super::*;

/// # Safety
/// Tests must run with `--test-threads=1` to avoid env races.
unsafe fn clear_studio_env() {
    unsafe {
        std::env::remove_var("HISTORY_CAPACITY");
        std::env::remove_var("HISTORY_DEBOUNCE_MS");
        std::env::remove_var("SYNC_DEBOUNCE_MS");
        std::env::remove_var("SOFT_LOCK_MS");
        std::env::remove_var("FRAME_TICK_MS");
        std::env::remove_var("SYNTH_RETRY_ATTEMPTS");
        std::env::remove_var("SYNTH_RETRY_BASE_MS");
        std::env::remove_var("ANIMATION_DURATION_SECS");
    }
}

#[test]
fn from_env_defaults_then_overrides() {
    unsafe { clear_studio_env() };

    let cfg = StudioConfig::from_env();
    assert_eq!(cfg, StudioConfig::default());
    assert_eq!(cfg.history_capacity, 50);
    assert_eq!(cfg.sync_debounce, Duration::from_millis(3000));
    assert_eq!(cfg.soft_lock, Duration::from_millis(1500));

    // Overrides apply; garbage falls back to the default.
    unsafe {
        std::env::set_var("HISTORY_CAPACITY", "10");
        std::env::set_var("SYNC_DEBOUNCE_MS", "250");
        std::env::set_var("SYNTH_RETRY_ATTEMPTS", "5");
        std::env::set_var("SOFT_LOCK_MS", "not-a-number");
        std::env::set_var("ANIMATION_DURATION_SECS", "-3");
    }

    let cfg = StudioConfig::from_env();
    assert_eq!(cfg.history_capacity, 10);
    assert_eq!(cfg.sync_debounce, Duration::from_millis(250));
    assert_eq!(cfg.retry.max_attempts, 5);
    assert_eq!(cfg.soft_lock, Duration::from_millis(DEFAULT_SOFT_LOCK_MS));
    assert!((cfg.animation_duration_secs - DEFAULT_ANIMATION_DURATION_SECS).abs() < f64::EPSILON);

    unsafe { clear_studio_env() };
}

#[test]
fn retry_delay_doubles_per_attempt() {
    let policy = RetryPolicy { max_attempts: 3, base_delay: Duration::from_millis(2000) };
    assert_eq!(policy.delay_for(0), Duration::from_millis(2000));
    assert_eq!(policy.delay_for(1), Duration::from_millis(4000));
    assert_eq!(policy.delay_for(2), Duration::from_millis(8000));
}

#[test]
fn grid_size_rejects_unsupported_density() {
    let mut settings = EditorSettings::default();
    assert!(settings.set_grid_size(16));
    assert_eq!(settings.grid_size, 16);
    assert!(!settings.set_grid_size(10));
    assert_eq!(settings.grid_size, 16);
}
