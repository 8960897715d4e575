use super::*;

/// # Safety
/// Tests must run with `--test-threads=1` to avoid env races.
unsafe fn clear_genai_env() {
    unsafe {
        std::env::remove_var("GENAI_API_KEY_ENV");
        std::env::remove_var("GENAI_IMAGE_MODEL");
        std::env::remove_var("GENAI_BASE_URL");
        std::env::remove_var("GENAI_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("GENAI_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("BRANDSTUDIO_TEST_KEY");
    }
}

#[test]
fn from_env_requires_key_then_applies_overrides() {
    unsafe { clear_genai_env() };
    match BackendConfig::from_env() {
        Err(BackendError::MissingApiKey { var }) => assert_eq!(var, "GENAI_API_KEY_ENV"),
        other => panic!("unexpected {other:?}"),
    }

    unsafe { std::env::set_var("GENAI_API_KEY_ENV", "BRANDSTUDIO_TEST_KEY") };
    match BackendConfig::from_env() {
        Err(BackendError::MissingApiKey { var }) => assert_eq!(var, "BRANDSTUDIO_TEST_KEY"),
        other => panic!("unexpected {other:?}"),
    }

    unsafe { std::env::set_var("BRANDSTUDIO_TEST_KEY", "secret") };
    let cfg = BackendConfig::from_env().unwrap();
    assert_eq!(cfg.api_key, "secret");
    assert_eq!(cfg.model, DEFAULT_GENAI_IMAGE_MODEL);
    assert_eq!(cfg.base_url, DEFAULT_GENAI_BASE_URL);
    assert_eq!(cfg.timeouts, BackendTimeouts::default());

    unsafe {
        std::env::set_var("GENAI_IMAGE_MODEL", "image-model-test");
        std::env::set_var("GENAI_BASE_URL", "https://example.test/v1/");
        std::env::set_var("GENAI_REQUEST_TIMEOUT_SECS", "42");
        std::env::set_var("GENAI_CONNECT_TIMEOUT_SECS", "nope");
    }
    let cfg = BackendConfig::from_env().unwrap();
    assert_eq!(cfg.model, "image-model-test");
    assert_eq!(cfg.base_url, "https://example.test/v1");
    assert_eq!(cfg.timeouts, BackendTimeouts { request_secs: 42, connect_secs: DEFAULT_GENAI_CONNECT_TIMEOUT_SECS });

    unsafe { std::env::set_var("GENAI_IMAGE_MODEL", "  ") };
    assert!(matches!(BackendConfig::from_env(), Err(BackendError::ConfigParse(_))));

    unsafe { clear_genai_env() };
}
