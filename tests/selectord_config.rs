use std::sync::Mutex;

use tempfile::NamedTempFile;

use detection_selector::config::SelectorConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "SELECTOR_CONFIG",
        "SELECTOR_MIN_CONFIDENCE",
        "SELECTOR_MIN_WIDTH",
        "SELECTOR_MIN_HEIGHT",
        "SELECTOR_MAX_DETECTIONS",
        "SELECTOR_TIME_PAST",
        "SELECTOR_LOG_LEVEL",
    ] {
        std::env::remove_var(key);
    }
}

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = SelectorConfig::load().expect("load config");

    assert_eq!(cfg.min_confidence, 0.5);
    assert_eq!(cfg.min_width, 10.0);
    assert_eq!(cfg.min_height, 10.0);
    assert_eq!(cfg.max_detections, 4);
    assert_eq!(cfg.time_past, "1d");
    assert_eq!(cfg.log_level, log::LevelFilter::Info);

    clear_env();
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        r#"{
            "min_confidence": 0.7,
            "min_width": 24,
            "min_height": 16,
            "max_detections": 8,
            "time_past": "5h",
            "log_level": "debug"
        }"#,
    );

    std::env::set_var("SELECTOR_CONFIG", file.path());
    std::env::set_var("SELECTOR_MIN_CONFIDENCE", "0.25");
    std::env::set_var("SELECTOR_TIME_PAST", "30m");

    let cfg = SelectorConfig::load().expect("load config");

    assert_eq!(cfg.min_confidence, 0.25);
    assert_eq!(cfg.min_width, 24.0);
    assert_eq!(cfg.min_height, 16.0);
    assert_eq!(cfg.max_detections, 8);
    assert_eq!(cfg.time_past, "30m");
    assert_eq!(cfg.log_level, log::LevelFilter::Debug);

    clear_env();
}

#[test]
fn rejects_unparseable_period() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(r#"{ "time_past": "1x" }"#);
    std::env::set_var("SELECTOR_CONFIG", file.path());

    assert!(SelectorConfig::load().is_err());

    clear_env();
}

#[test]
fn rejects_out_of_range_confidence() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("SELECTOR_MIN_CONFIDENCE", "1.5");

    assert!(SelectorConfig::load().is_err());

    clear_env();
}

#[test]
fn rejects_unknown_log_level() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("SELECTOR_LOG_LEVEL", "chatty");

    assert!(SelectorConfig::load().is_err());

    clear_env();
}
