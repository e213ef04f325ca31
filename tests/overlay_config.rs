use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use face_overlay::config::OverlayConfig;
use face_overlay::{Color, ContentMode, Size};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "FACE_OVERLAY_CONFIG",
        "FACE_OVERLAY_DISPLAY",
        "FACE_OVERLAY_CONTENT_MODE",
        "FACE_OVERLAY_STROKE_COLOR",
        "FACE_OVERLAY_STROKE_WIDTH",
        "FACE_OVERLAY_BACKEND",
        "FACE_OVERLAY_MODEL_PATH",
        "FACE_OVERLAY_TIMEOUT_MS",
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
fn defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = OverlayConfig::load().expect("load defaults");
    assert_eq!(cfg.display, Size::new(375.0, 667.0));
    assert_eq!(cfg.content_mode, ContentMode::AspectFit);
    assert_eq!(cfg.stroke.color, Color::YELLOW);
    assert_eq!(cfg.stroke.width, 2.0);
    assert_eq!(cfg.detector.backend, "stub");
    assert_eq!(cfg.detector.model_path, None);
    assert_eq!(cfg.detector.min_face_size, 20);
    assert_eq!(cfg.detector.timeout, Duration::from_secs(10));
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        r##"{
            "display": { "width": 1024, "height": 768 },
            "content_mode": "orientation_fit",
            "stroke": { "color": "#ff0000", "width": 3.5 },
            "detector": {
                "backend": "Stub",
                "min_face_size": 40,
                "score_threshold": 1.5,
                "timeout_ms": 2500
            }
        }"##,
    );

    std::env::set_var("FACE_OVERLAY_CONFIG", file.path());
    std::env::set_var("FACE_OVERLAY_DISPLAY", "320x480");
    std::env::set_var("FACE_OVERLAY_STROKE_COLOR", "#00ff0080");
    std::env::set_var("FACE_OVERLAY_MODEL_PATH", "/models/seeta.bin");

    let cfg = OverlayConfig::load().expect("load config");

    assert_eq!(cfg.display, Size::new(320.0, 480.0));
    assert_eq!(cfg.content_mode, ContentMode::OrientationFit);
    assert_eq!(
        cfg.stroke.color,
        Color {
            r: 0,
            g: 255,
            b: 0,
            a: 0x80
        }
    );
    assert_eq!(cfg.stroke.width, 3.5);
    assert_eq!(cfg.detector.backend, "stub");
    assert_eq!(cfg.detector.model_path, Some(PathBuf::from("/models/seeta.bin")));
    assert_eq!(cfg.detector.min_face_size, 40);
    assert_eq!(cfg.detector.score_threshold, 1.5);
    assert_eq!(cfg.detector.timeout, Duration::from_millis(2500));

    clear_env();
}

#[test]
fn explicit_path_wins_over_defaults() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(r#"{ "content_mode": "stretch" }"#);
    std::env::set_var("FACE_OVERLAY_CONTENT_MODE", "aspect-fit");

    let cfg = OverlayConfig::load_with(Some(file.path())).expect("load config");
    assert_eq!(cfg.content_mode, ContentMode::AspectFit);
    assert_eq!(cfg.display, Size::new(375.0, 667.0));

    clear_env();
}

#[test]
fn rejects_invalid_settings() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("FACE_OVERLAY_STROKE_WIDTH", "0");
    assert!(OverlayConfig::load().is_err());
    clear_env();

    std::env::set_var("FACE_OVERLAY_DISPLAY", "wide");
    assert!(OverlayConfig::load().is_err());
    clear_env();

    std::env::set_var("FACE_OVERLAY_BACKEND", "rustface");
    let err = OverlayConfig::load().unwrap_err();
    assert!(err.to_string().contains("model_path"));
    clear_env();

    std::env::set_var("FACE_OVERLAY_TIMEOUT_MS", "0");
    assert!(OverlayConfig::load().is_err());
    clear_env();

    let file = write_config(r#"{ "detector": { "min_face_size": 8 } }"#);
    assert!(OverlayConfig::load_with(Some(file.path())).is_err());

    let file = write_config("{ not json");
    assert!(OverlayConfig::load_with(Some(file.path())).is_err());
    assert!(OverlayConfig::load_with(Some(std::path::Path::new(
        "/nonexistent/face-overlay.json"
    )))
    .is_err());

    clear_env();
}
