use clap::Parser;
use std::sync::{Mutex, MutexGuard};
use sysaidmin_app::cli::{Args, DEFAULT_BASE_URL, DEFAULT_MODEL};

// The parser reads SYSAIDMIN_* from the process environment, so every test
// in this file serializes on one lock and env mutation stays race-free.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_guard() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

#[test]
fn test_defaults_apply_when_only_problem_given() {
    let _env = env_guard();
    std::env::remove_var("SYSAIDMIN_BASE_URL");
    std::env::remove_var("SYSAIDMIN_API_KEY");
    std::env::remove_var("SYSAIDMIN_MODEL");

    let args = Args::try_parse_from(["sysaidmin", "disk full"]).unwrap();
    assert_eq!(args.problem, "disk full");
    assert_eq!(args.base_url, DEFAULT_BASE_URL);
    assert_eq!(args.model, DEFAULT_MODEL);
    // Credential presence is validated at startup, not by the parser.
    assert!(args.api_key.is_empty());
}

#[test]
fn test_env_fallback_fills_missing_flags() {
    let _env = env_guard();
    std::env::set_var("SYSAIDMIN_API_KEY", "sk-env");
    std::env::set_var("SYSAIDMIN_MODEL", "gpt-4o");

    let args = Args::try_parse_from(["sysaidmin", "disk full"]).unwrap();
    assert_eq!(args.api_key, "sk-env");
    assert_eq!(args.model, "gpt-4o");

    std::env::remove_var("SYSAIDMIN_API_KEY");
    std::env::remove_var("SYSAIDMIN_MODEL");
}

#[test]
fn test_short_flags_parse() {
    let _env = env_guard();
    let args = Args::try_parse_from([
        "sysaidmin",
        "-b",
        "http://localhost:8080/v1",
        "-a",
        "sk-test",
        "-m",
        "gpt-4o-mini",
        "wifi keeps dropping",
    ])
    .unwrap();
    assert_eq!(args.base_url, "http://localhost:8080/v1");
    assert_eq!(args.api_key, "sk-test");
    assert_eq!(args.model, "gpt-4o-mini");
    assert_eq!(args.problem, "wifi keeps dropping");
}

#[test]
fn test_long_flags_parse() {
    let _env = env_guard();
    let args = Args::try_parse_from([
        "sysaidmin",
        "--api-key",
        "sk-test",
        "--model",
        "o4-mini",
        "printer offline",
    ])
    .unwrap();
    assert_eq!(args.api_key, "sk-test");
    assert_eq!(args.problem, "printer offline");
}

#[test]
fn test_problem_is_required() {
    let _env = env_guard();
    assert!(Args::try_parse_from(["sysaidmin"]).is_err());
}

#[test]
fn test_version_flag_short_circuits() {
    let _env = env_guard();
    let err = Args::try_parse_from(["sysaidmin", "--version"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
}
