use rawhttp::config::{CONFIG_ENV, Config, LISTEN_ENV};

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn test_config_defaults() {
    let cfg = Config::from_lookup(no_env).unwrap();

    assert_eq!(cfg.server.listen_addr, "127.0.0.1:8080");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.http.read_buffer_size, 8192);
    assert_eq!(cfg.http.max_header_bytes, 64 * 1024);
    assert!(cfg.http.reject_ambiguous_framing);
    assert!(cfg.http.compression);
    assert_eq!(cfg.handlers.sheep_interval_ms, 1000);
}

#[test]
fn test_config_listen_override() {
    let cfg = Config::from_lookup(|key| (key == LISTEN_ENV).then(|| "0.0.0.0:3000".to_string())).unwrap();

    assert_eq!(cfg.server.listen_addr, "0.0.0.0:3000");
}

#[test]
fn test_config_from_yaml_partial() {
    let cfg = Config::from_yaml(
        "server:\n  listen_addr: \"0.0.0.0:9000\"\nhttp:\n  compression: false\n  max_chunk_size: 1024\n",
    )
    .unwrap();

    assert_eq!(cfg.server.listen_addr, "0.0.0.0:9000");
    assert!(!cfg.http.compression);
    assert_eq!(cfg.http.max_chunk_size, 1024);
    // Unset keys keep their defaults.
    assert_eq!(cfg.http.read_buffer_size, 8192);
    assert_eq!(cfg.log_level, "info");
}

#[test]
fn test_config_file_then_env_override() {
    let path = std::env::temp_dir().join(format!("rawhttp-config-{}.yaml", std::process::id()));
    std::fs::write(
        &path,
        "server:\n  listen_addr: \"127.0.0.1:7000\"\nlog_level: debug\nhandlers:\n  files_root: /srv/www\n",
    )
    .unwrap();
    let file = path.to_string_lossy().into_owned();

    let from_file = Config::from_lookup(|key| (key == CONFIG_ENV).then(|| file.clone())).unwrap();
    assert_eq!(from_file.server.listen_addr, "127.0.0.1:7000");
    assert_eq!(from_file.log_level, "debug");
    assert_eq!(from_file.handlers.files_root, std::path::PathBuf::from("/srv/www"));

    let overridden = Config::from_lookup(|key| match key {
        CONFIG_ENV => Some(file.clone()),
        LISTEN_ENV => Some("0.0.0.0:5000".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(overridden.server.listen_addr, "0.0.0.0:5000");
    assert_eq!(overridden.log_level, "debug");

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_config_missing_file_is_an_error() {
    let result = Config::from_lookup(|key| (key == CONFIG_ENV).then(|| "/nonexistent/rawhttp.yaml".to_string()));

    assert!(result.is_err());
}

#[test]
fn test_config_rejects_malformed_yaml() {
    assert!(Config::from_yaml("server: [unclosed").is_err());
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::from_lookup(no_env).unwrap();
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1.server.listen_addr, cfg2.server.listen_addr);
}
