use api_gate::{
    AppConfig,
    config::{DEFAULT_PORT, Env},
    error::ConfigError,
};
use serial_test::serial;
use std::{env, panic};

const CONFIG_VARS: [&str; 6] = [
    "APP_ENV",
    "JWT_SECRET",
    "PORT",
    "API_ROOT",
    "PUBLIC_ROUTE_PREFIXES",
    "AUTH_USERS",
];

// --- Setup/Teardown Utilities ---

/// Runs `test` with exactly the given variables set (all other config variables
/// cleared) and restores the previous environment afterwards, even on panic.
fn run_with_env<T, R>(vars: &[(&str, &str)], test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals {
        unsafe {
            if let Some(val) = original_value {
                env::set_var(key, val);
            } else {
                env::remove_var(key);
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_missing_secret_is_a_configuration_error() {
    let result = run_with_env(&[("APP_ENV", "production")], AppConfig::load);
    assert!(matches!(result, Err(ConfigError::Missing("JWT_SECRET"))));

    // No local fallback key either.
    let result = run_with_env(&[("APP_ENV", "local")], AppConfig::load);
    assert!(matches!(result, Err(ConfigError::Missing("JWT_SECRET"))));
}

#[test]
#[serial]
fn test_blank_secret_is_a_configuration_error() {
    let result = run_with_env(&[("JWT_SECRET", "   ")], AppConfig::load);
    assert!(matches!(result, Err(ConfigError::EmptySecret)));
}

#[test]
#[serial]
fn test_defaults_with_only_a_secret() {
    let config = run_with_env(&[("JWT_SECRET", "local-secret")], AppConfig::load).unwrap();

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.api_root, "/api");
    assert_eq!(config.public_prefixes, vec!["/api/auth".to_string()]);
    assert!(config.seed_users.is_empty());
    assert_eq!(config.bind_addr(), "0.0.0.0:5000");
}

#[test]
#[serial]
fn test_production_overrides() {
    let config = run_with_env(
        &[
            ("APP_ENV", "production"),
            ("JWT_SECRET", "prod-secret"),
            ("PORT", "8080"),
            ("API_ROOT", "/v1"),
            ("PUBLIC_ROUTE_PREFIXES", "/v1/auth, /v1/status"),
            (
                "AUTH_USERS",
                r#"[{"email":"a@example.com","password":"pw-123456","id":"user-1"}]"#,
            ),
        ],
        AppConfig::load,
    )
    .unwrap();

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.port, 8080);
    assert_eq!(config.api_root, "/v1");
    assert_eq!(
        config.public_prefixes,
        vec!["/v1/auth".to_string(), "/v1/status".to_string()]
    );
    assert_eq!(config.seed_users.len(), 1);
    assert_eq!(config.seed_users[0].id.as_deref(), Some("user-1"));
}

#[test]
#[serial]
fn test_invalid_port_and_seed_users_are_rejected() {
    let result = run_with_env(
        &[("JWT_SECRET", "s"), ("PORT", "not-a-port")],
        AppConfig::load,
    );
    assert!(matches!(result, Err(ConfigError::InvalidPort(_))));

    let result = run_with_env(
        &[("JWT_SECRET", "s"), ("AUTH_USERS", "{not json")],
        AppConfig::load,
    );
    assert!(matches!(result, Err(ConfigError::InvalidSeedUsers(_))));
}
