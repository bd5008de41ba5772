use std::fs;
use std::path::PathBuf;
use sweepdupe::config::{ConfigError, ScanOptions};
use sweepdupe::duplicates::ScanError;
use sweepdupe::progress::NoopObserver;
use sweepdupe::service::DuplicateService;
use sweepdupe::signal::CancelToken;
use tempfile::tempdir;

#[test]
fn test_config_file_drives_scan() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("a.txt"), b"small dup").unwrap();
    fs::write(data.join("b.txt"), b"small dup").unwrap();

    let config = dir.path().join("config.toml");
    fs::write(&config, "min_file_size = 0\nuse_perceptual_hash = false\nio_threads = 1\n").unwrap();

    let options = ScanOptions::load(Some(&config)).unwrap();
    assert_eq!(options.io_threads, 1);

    let service = DuplicateService::new();
    let result = service
        .scan(&[data], &options, &NoopObserver, &CancelToken::new())
        .unwrap();
    assert_eq!(result.groups.len(), 1);
}

#[test]
fn test_malformed_config_file() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "min_file_size = \"lots\"\n").unwrap();

    assert!(matches!(
        ScanOptions::load(Some(&config)),
        Err(ConfigError::Load(_))
    ));
}

#[test]
fn test_inverted_size_range_fails_scan_before_walking() {
    let options = ScanOptions {
        min_file_size: 10,
        max_file_size: 1,
        ..Default::default()
    };
    let service = DuplicateService::new();
    let err = service
        .scan(
            &[PathBuf::from("/definitely/not/here")],
            &options,
            &NoopObserver,
            &CancelToken::new(),
        )
        .unwrap_err();

    assert!(matches!(
        err,
        ScanError::InvalidOptions(ConfigError::InvalidSizeRange { min: 10, max: 1 })
    ));
}

#[test]
fn test_dumped_config_is_loadable() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("dumped.toml");
    let options = ScanOptions {
        exclude_paths: vec![PathBuf::from("/sdcard/Android")],
        similarity_threshold: 0.9,
        ..Default::default()
    };
    fs::write(&config, options.to_toml().unwrap()).unwrap();

    assert_eq!(ScanOptions::load(Some(&config)).unwrap(), options);
}
