// Config loading and validation tests

use netdash::config::{AppConfig, OutputFormat};

const VALID_CONFIG: &str = r#"
[sampling]
refresh_interval_ms = 500
history_length = 40
skip_loopback = false

[connections]
max_listen = 5
max_established = 10

[probes]
gateway_ping_interval_ms = 2000
ping_timeout_ms = 1000
dns_interval_ms = 5000
dns_timeout_ms = 1000
dns_host = "example.org"
wifi_interval_ms = 2000
public_ip_timeout_ms = 3000
geo_url = "http://ip-api.com/json/?fields=status,query,isp,city,countryCode"
ip_url = "https://icanhazip.com"

[publishing]
broadcast_capacity = 8
stats_log_interval_secs = 30
format = "json"
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.sampling.refresh_interval_ms, 500);
    assert_eq!(config.sampling.history_length, 40);
    assert!(!config.sampling.skip_loopback);
    assert_eq!(config.connections.max_listen, 5);
    assert_eq!(config.connections.max_established, 10);
    assert_eq!(config.probes.dns_host, "example.org");
    assert_eq!(config.publishing.broadcast_capacity, 8);
    assert_eq!(config.publishing.format, OutputFormat::Json);
}

#[test]
fn test_config_empty_uses_defaults() {
    let config = AppConfig::load_from_str("").expect("defaults");
    assert_eq!(config.sampling.refresh_interval_ms, 1000);
    assert_eq!(config.sampling.history_length, 60);
    assert!(config.sampling.skip_loopback);
    assert_eq!(config.connections.max_listen, 3);
    assert_eq!(config.connections.max_established, 7);
    assert_eq!(config.probes.ping_timeout_ms, 1000);
    assert_eq!(config.probes.dns_host, "google.com");
    assert_eq!(config.publishing.format, OutputFormat::Summary);
}

#[test]
fn test_config_partial_section_keeps_other_defaults() {
    let config = AppConfig::load_from_str("[sampling]\nhistory_length = 20\n").unwrap();
    assert_eq!(config.sampling.history_length, 20);
    assert_eq!(config.sampling.refresh_interval_ms, 1000);
}

#[test]
fn test_config_validation_rejects_refresh_interval_out_of_range() {
    for value in ["0", "50", "120000"] {
        let bad = VALID_CONFIG.replace(
            "refresh_interval_ms = 500",
            &format!("refresh_interval_ms = {}", value),
        );
        let err = AppConfig::load_from_str(&bad).unwrap_err();
        assert!(err.to_string().contains("sampling.refresh_interval_ms"));
    }
}

#[test]
fn test_config_validation_rejects_history_length_zero() {
    let bad = VALID_CONFIG.replace("history_length = 40", "history_length = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("sampling.history_length"));
}

#[test]
fn test_config_validation_rejects_ping_timeout_zero() {
    let bad = VALID_CONFIG.replace("ping_timeout_ms = 1000", "ping_timeout_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("probes.ping_timeout_ms"));
}

#[test]
fn test_config_validation_rejects_dns_interval_zero() {
    let bad = VALID_CONFIG.replace("dns_interval_ms = 5000", "dns_interval_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("probes.dns_interval_ms"));
}

#[test]
fn test_config_validation_rejects_empty_dns_host() {
    let bad = VALID_CONFIG.replace("dns_host = \"example.org\"", "dns_host = \" \"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("probes.dns_host"));
}

#[test]
fn test_config_validation_rejects_empty_geo_url() {
    let bad = VALID_CONFIG.replace(
        "geo_url = \"http://ip-api.com/json/?fields=status,query,isp,city,countryCode\"",
        "geo_url = \"\"",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("probes.geo_url"));
}

#[test]
fn test_config_validation_rejects_broadcast_capacity_zero() {
    let bad = VALID_CONFIG.replace("broadcast_capacity = 8", "broadcast_capacity = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("broadcast_capacity"));
}

#[test]
fn test_config_validation_rejects_stats_log_interval_zero() {
    let bad = VALID_CONFIG.replace(
        "stats_log_interval_secs = 30",
        "stats_log_interval_secs = 0",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("stats_log_interval_secs"));
}

#[test]
fn test_config_rejects_unknown_format() {
    let bad = VALID_CONFIG.replace("format = \"json\"", "format = \"xml\"");
    assert!(AppConfig::load_from_str(&bad).is_err());
}

#[test]
fn test_config_validation_rejects_invalid_toml() {
    let err = AppConfig::load_from_str("not valid toml [[[").unwrap_err();
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_config_load_from_file_via_env() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, VALID_CONFIG).unwrap();
    unsafe { std::env::set_var("CONFIG_FILE", path.to_str().unwrap()) };
    let result = AppConfig::load();
    let missing = dir.path().join("missing.toml");
    unsafe { std::env::set_var("CONFIG_FILE", missing.to_str().unwrap()) };
    let missing_result = AppConfig::load();
    unsafe { std::env::remove_var("CONFIG_FILE") };

    let config = result.expect("load from CONFIG_FILE");
    assert_eq!(config.sampling.history_length, 40);
    let err = missing_result.unwrap_err();
    assert!(err.to_string().contains("missing.toml"));
}
