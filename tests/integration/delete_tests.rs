use std::fs;
use std::path::{Path, PathBuf};
use sweepdupe::actions::DeleteError;
use sweepdupe::config::ScanOptions;
use sweepdupe::progress::NoopObserver;
use sweepdupe::service::DuplicateService;
use sweepdupe::signal::CancelToken;
use tempfile::{tempdir, TempDir};

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Three "hello" files plus "world!", scanned.
fn scanned_hellos() -> (TempDir, DuplicateService, String, Vec<PathBuf>) {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"hello");
    write(dir.path(), "b.txt", b"hello");
    write(dir.path(), "c.txt", b"hello");
    write(dir.path(), "d.txt", b"world!");

    let options = ScanOptions {
        min_file_size: 0,
        use_perceptual_hash: false,
        ..Default::default()
    };
    let service = DuplicateService::new();
    let result = service
        .scan(&[dir.path().to_path_buf()], &options, &NoopObserver, &CancelToken::new())
        .unwrap();
    let group = result.groups[0].clone();
    (dir, service, group.id.clone(), group.paths())
}

#[test]
fn test_deleting_two_of_three_dissolves_group() {
    let (_dir, service, id, members) = scanned_hellos();
    let before = service.scan_results().total_wasted_space;

    let deleted = service.delete_files(&id, &members[1..]).unwrap();

    assert_eq!(deleted, 2);
    assert!(members[0].exists());
    assert!(!members[1].exists());
    assert!(!members[2].exists());
    assert!(service.duplicate_group(&id).is_none());
    assert!(service.scan_results().groups.is_empty());
    assert_eq!(before - service.scan_results().total_wasted_space, 10);
}

#[test]
fn test_deleting_all_members_is_rejected() {
    let (_dir, service, id, members) = scanned_hellos();

    let err = service.delete_files(&id, &members).unwrap_err();

    assert!(matches!(err, DeleteError::MustKeepOne { requested: 3, members: 3 }));
    assert!(members.iter().all(|p| p.exists()));
    assert_eq!(service.duplicate_group(&id).unwrap().len(), 3);
}

#[test]
fn test_repeated_paths_count_toward_keep_one() {
    let (_dir, service, id, members) = scanned_hellos();
    let request = vec![members[0].clone(), members[0].clone(), members[1].clone()];

    let err = service.delete_files(&id, &request).unwrap_err();
    assert!(matches!(err, DeleteError::MustKeepOne { .. }));
    assert!(members.iter().all(|p| p.exists()));
}

#[test]
fn test_deleting_one_shrinks_group() {
    let (_dir, service, id, members) = scanned_hellos();

    let deleted = service.delete_files(&id, &members[..1]).unwrap();

    assert_eq!(deleted, 1);
    let group = service.duplicate_group(&id).unwrap();
    assert_eq!(group.len(), 2);
    assert_eq!(group.wasted_space, 5);
    assert_eq!(service.scan_results().total_duplicates, 1);
}

#[test]
fn test_unknown_group() {
    let (_dir, service, _id, members) = scanned_hellos();
    let err = service.delete_files("no-such-group", &members[..1]).unwrap_err();
    assert_eq!(err, DeleteError::GroupNotFound("no-such-group".to_string()));
}

#[test]
fn test_already_removed_file_is_not_counted() {
    let (_dir, service, id, members) = scanned_hellos();
    fs::remove_file(&members[2]).unwrap();

    let report = service.delete_files_report(&id, &members[1..]).unwrap();

    assert_eq!(report.success_count(), 1);
    assert_eq!(report.failure_count(), 1);
    let group = service.duplicate_group(&id).unwrap();
    assert_eq!(group.len(), 2);
    assert!(group.contains(&members[2]));
}

#[test]
fn test_delete_after_clear_finds_nothing() {
    let (_dir, service, id, members) = scanned_hellos();
    service.clear_results();

    let err = service.delete_files(&id, &members[..1]).unwrap_err();
    assert!(matches!(err, DeleteError::GroupNotFound(_)));
    assert!(members[0].exists());
}
