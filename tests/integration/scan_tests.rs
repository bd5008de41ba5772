use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use sweepdupe::config::ScanOptions;
use sweepdupe::duplicates::{DuplicateKind, ScanError};
use sweepdupe::progress::NoopObserver;
use sweepdupe::scanner::CollectError;
use sweepdupe::service::DuplicateService;
use sweepdupe::signal::CancelToken;
use tempfile::tempdir;

fn exact_only() -> ScanOptions {
    ScanOptions {
        min_file_size: 0,
        use_perceptual_hash: false,
        ..Default::default()
    }
}

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let service = DuplicateService::new();

    let result = service
        .scan(&[dir.path().to_path_buf()], &exact_only(), &NoopObserver, &CancelToken::new())
        .unwrap();

    assert!(result.groups.is_empty());
    assert_eq!(result.files_scanned, 0);
    assert_eq!(result.total_wasted_space, 0);
}

#[test]
fn test_three_hellos_and_one_world() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"hello");
    write(dir.path(), "b.txt", b"hello");
    write(dir.path(), "c.txt", b"hello");
    let d = write(dir.path(), "d.txt", b"world!");

    let service = DuplicateService::new();
    let result = service
        .scan(&[dir.path().to_path_buf()], &exact_only(), &NoopObserver, &CancelToken::new())
        .unwrap();

    assert_eq!(result.groups.len(), 1);
    let group = &result.groups[0];
    assert_eq!(group.kind, DuplicateKind::Exact);
    assert_eq!(group.len(), 3);
    assert_eq!(group.wasted_space, 10);
    assert_eq!(group.total_size, 15);
    assert!(!group.contains(&d));
    assert_eq!(result.total_duplicates, 2);
    assert_eq!(result.total_wasted_space, 10);
    assert_eq!(result.files_scanned, 4);

    let mut members = names(&group.paths());
    members.sort();
    assert_eq!(members, vec!["a.txt", "b.txt", "c.txt"]);
}

#[test]
fn test_members_are_ordered_oldest_first() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.txt", b"same bytes");
    let b = write(dir.path(), "b.txt", b"same bytes");
    let c = write(dir.path(), "c.txt", b"same bytes");
    set_file_mtime(&a, FileTime::from_unix_time(2_000_000, 0)).unwrap();
    set_file_mtime(&b, FileTime::from_unix_time(3_000_000, 0)).unwrap();
    set_file_mtime(&c, FileTime::from_unix_time(1_000_000, 0)).unwrap();

    let service = DuplicateService::new();
    let result = service
        .scan(&[dir.path().to_path_buf()], &exact_only(), &NoopObserver, &CancelToken::new())
        .unwrap();

    assert_eq!(names(&result.groups[0].paths()), vec!["c.txt", "a.txt", "b.txt"]);
}

#[test]
fn test_rescan_of_unchanged_tree_is_identical() {
    let dir = tempdir().unwrap();
    for i in 0..12 {
        write(dir.path(), &format!("sub{}/file{}.bin", i % 3, i), format!("{}", i % 5).as_bytes());
    }

    let service = DuplicateService::new();
    let roots = [dir.path().to_path_buf()];
    let first = service
        .scan(&roots, &exact_only(), &NoopObserver, &CancelToken::new())
        .unwrap();
    let second = service
        .scan(&roots, &exact_only(), &NoopObserver, &CancelToken::new())
        .unwrap();

    assert_eq!(first.groups, second.groups);
    assert_eq!(first.total_wasted_space, second.total_wasted_space);
    assert_eq!(first.files_scanned, second.files_scanned);
}

#[test]
fn test_groups_sorted_by_wasted_space() {
    let dir = tempdir().unwrap();
    write(dir.path(), "small1", b"ab");
    write(dir.path(), "small2", b"ab");
    write(dir.path(), "large1", &[7u8; 300]);
    write(dir.path(), "large2", &[7u8; 300]);
    write(dir.path(), "large3", &[7u8; 300]);

    let service = DuplicateService::new();
    let result = service
        .scan(&[dir.path().to_path_buf()], &exact_only(), &NoopObserver, &CancelToken::new())
        .unwrap();

    let wasted: Vec<u64> = result.groups.iter().map(|g| g.wasted_space).collect();
    assert_eq!(wasted, vec![600, 2]);
    assert!(result.groups.iter().all(|g| g.len() >= 2));
}

#[test]
fn test_progress_is_increasing_and_ends_at_100() {
    let dir = tempdir().unwrap();
    for i in 0..25 {
        write(dir.path(), &format!("f{:02}", i), format!("{}", i % 7).as_bytes());
    }

    let seen = Mutex::new(Vec::new());
    let observer = |percent: u8| seen.lock().unwrap().push(percent);
    let service = DuplicateService::new();
    service
        .scan(&[dir.path().to_path_buf()], &exact_only(), &observer, &CancelToken::new())
        .unwrap();

    let seen = seen.into_inner().unwrap();
    assert_eq!(seen.first(), Some(&0));
    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|w| w[0] < w[1]), "not increasing: {:?}", seen);
    assert!(seen.contains(&20));
    assert!(seen.contains(&70));
}

#[test]
fn test_multiple_roots_are_combined() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    write(first.path(), "one.txt", b"shared content");
    write(second.path(), "two.txt", b"shared content");

    let service = DuplicateService::new();
    let result = service
        .scan(
            &[first.path().to_path_buf(), second.path().to_path_buf()],
            &exact_only(),
            &NoopObserver,
            &CancelToken::new(),
        )
        .unwrap();

    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.groups[0].len(), 2);
}

#[test]
fn test_no_accessible_root_fails_and_keeps_cache() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"dup");
    write(dir.path(), "b", b"dup");

    let service = DuplicateService::new();
    let published = service
        .scan(&[dir.path().to_path_buf()], &exact_only(), &NoopObserver, &CancelToken::new())
        .unwrap();

    let missing = dir.path().join("missing");
    let err = service
        .scan(&[missing], &exact_only(), &NoopObserver, &CancelToken::new())
        .unwrap_err();

    assert!(matches!(err, ScanError::Collect(CollectError::NoAccessibleRoot(1))));
    assert_eq!(*service.scan_results(), *published);
}

#[test]
fn test_empty_root_list_is_an_error() {
    let service = DuplicateService::new();
    let err = service
        .scan(&[], &exact_only(), &NoopObserver, &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, ScanError::Collect(CollectError::NoRoots)));
}

#[test]
fn test_results_before_any_scan_are_empty() {
    let service = DuplicateService::new();
    let result = service.scan_results();
    assert!(result.groups.is_empty());
    assert_eq!(result.total_duplicates, 0);
    assert!(service.duplicate_group("anything").is_none());
}
