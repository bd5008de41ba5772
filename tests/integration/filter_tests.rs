use std::fs;
use std::path::{Path, PathBuf};
use sweepdupe::config::ScanOptions;
use sweepdupe::progress::NoopObserver;
use sweepdupe::scanner::Collector;
use sweepdupe::service::DuplicateService;
use sweepdupe::signal::CancelToken;
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn grouped_names(options: &ScanOptions, root: &Path) -> Vec<String> {
    let service = DuplicateService::new();
    let result = service
        .scan(&[root.to_path_buf()], options, &NoopObserver, &CancelToken::new())
        .unwrap();
    let mut names: Vec<String> = result
        .groups
        .iter()
        .flat_map(|g| g.files.iter().map(|f| f.file_name.clone()))
        .collect();
    names.sort();
    names
}

#[test]
fn test_default_min_size_skips_small_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "tiny1.txt", b"tiny");
    write(dir.path(), "tiny2.txt", b"tiny");
    write(dir.path(), "big1.txt", &[1u8; 2048]);
    write(dir.path(), "big2.txt", &[1u8; 2048]);

    let options = ScanOptions {
        use_perceptual_hash: false,
        ..Default::default()
    };
    assert_eq!(grouped_names(&options, dir.path()), vec!["big1.txt", "big2.txt"]);
}

#[test]
fn test_exclude_prefix() {
    let dir = tempdir().unwrap();
    write(dir.path(), "Music/a.mp3", b"track");
    write(dir.path(), "Music/b.mp3", b"track");
    write(dir.path(), "Android/data/c.mp3", b"track");

    let options = ScanOptions {
        min_file_size: 0,
        use_perceptual_hash: false,
        exclude_paths: vec![dir.path().join("Android")],
        ..Default::default()
    };
    assert_eq!(grouped_names(&options, dir.path()), vec!["a.mp3", "b.mp3"]);
}

#[test]
fn test_include_prefix() {
    let dir = tempdir().unwrap();
    write(dir.path(), "DCIM/one.txt", b"copy");
    write(dir.path(), "DCIM/two.txt", b"copy");
    write(dir.path(), "Download/three.txt", b"copy");

    let options = ScanOptions {
        min_file_size: 0,
        use_perceptual_hash: false,
        include_paths: vec![dir.path().join("DCIM")],
        ..Default::default()
    };
    assert_eq!(grouped_names(&options, dir.path()), vec!["one.txt", "two.txt"]);
}

#[test]
fn test_disabled_category_is_ignored() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.pdf", b"doc");
    write(dir.path(), "b.pdf", b"doc");
    write(dir.path(), "a.bin", b"blob");
    write(dir.path(), "b.bin", b"blob");

    let options = ScanOptions {
        min_file_size: 0,
        use_perceptual_hash: false,
        include_documents: false,
        ..Default::default()
    };
    assert_eq!(grouped_names(&options, dir.path()), vec!["a.bin", "b.bin"]);
}

#[test]
fn test_max_size_is_inclusive() {
    let dir = tempdir().unwrap();
    write(dir.path(), "fits1", &[0u8; 100]);
    write(dir.path(), "fits2", &[0u8; 100]);
    write(dir.path(), "over1", &[0u8; 101]);
    write(dir.path(), "over2", &[0u8; 101]);

    let options = ScanOptions {
        min_file_size: 0,
        max_file_size: 100,
        use_perceptual_hash: false,
        ..Default::default()
    };
    assert_eq!(grouped_names(&options, dir.path()), vec!["fits1", "fits2"]);
}

#[cfg(unix)]
#[test]
fn test_unlistable_subdirectory_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write(dir.path(), "open/a.txt", b"x");
    let locked = dir.path().join("locked");
    write(dir.path(), "locked/b.txt", b"x");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let options = ScanOptions {
        min_file_size: 0,
        ..Default::default()
    };
    let result = Collector::new(&options).collect(&[dir.path().to_path_buf()]);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    // Root may bypass permissions; either way the walk must not fail.
    let files = result.unwrap();
    assert!(files.iter().any(|f| f.path.ends_with("open/a.txt")));
}
