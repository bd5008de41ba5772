use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use sweepdupe::actions::DeleteError;
use sweepdupe::config::ScanOptions;
use sweepdupe::duplicates::ScanError;
use sweepdupe::progress::{NoopObserver, ScanEvent};
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

fn populate(dir: &Path) -> Vec<PathBuf> {
    (0..8)
        .map(|i| {
            let path = dir.join(format!("f{}.dat", i));
            fs::write(&path, format!("content {}", i % 2)).unwrap();
            path
        })
        .collect()
}

#[test]
fn test_background_scan_ends_with_one_terminal_event() {
    let dir = tempdir().unwrap();
    populate(dir.path());

    let service = Arc::new(DuplicateService::new());
    let handle = service
        .start_scan(vec![dir.path().to_path_buf()], exact_only())
        .unwrap();

    let events: Vec<ScanEvent> = handle.events().iter().collect();
    let terminal: Vec<&ScanEvent> = events.iter().filter(|e| e.is_terminal()).collect();
    assert_eq!(terminal.len(), 1);
    assert!(events.last().unwrap().is_terminal());

    let progress: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert!(progress.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(progress.last(), Some(&100));

    match events.last().unwrap() {
        ScanEvent::Completed(result) => {
            assert_eq!(result.groups.len(), 2);
            assert_eq!(*service.scan_results(), **result);
        }
        other => panic!("unexpected terminal event: {:?}", other),
    }
}

#[test]
fn test_wait_with_collects_progress() {
    let dir = tempdir().unwrap();
    populate(dir.path());

    let service = Arc::new(DuplicateService::new());
    let handle = service
        .start_scan(vec![dir.path().to_path_buf()], exact_only())
        .unwrap();

    let mut seen = Vec::new();
    let result = handle.wait_with(|p| seen.push(p)).unwrap();

    assert_eq!(result.files_scanned, 8);
    assert_eq!(seen.last(), Some(&100));
}

#[test]
fn test_cancelled_scan_keeps_previous_result() {
    let dir = tempdir().unwrap();
    populate(dir.path());
    let service = DuplicateService::new();
    let roots = [dir.path().to_path_buf()];

    let published = service
        .scan(&roots, &exact_only(), &NoopObserver, &CancelToken::new())
        .unwrap();

    fs::write(dir.path().join("extra.dat"), "content 0").unwrap();
    let token = CancelToken::new();
    let canceller = token.clone();
    let observer = move |percent: u8| {
        if percent >= 20 {
            canceller.cancel();
        }
    };

    let err = service
        .scan(&roots, &exact_only(), &observer, &token)
        .unwrap_err();

    assert!(matches!(err, ScanError::Cancelled));
    assert_eq!(*service.scan_results(), *published);
    assert!(!service.is_scanning());
}

#[test]
fn test_pre_cancelled_scan_does_not_publish() {
    let dir = tempdir().unwrap();
    populate(dir.path());
    let service = DuplicateService::new();

    let token = CancelToken::new();
    token.cancel();
    let err = service
        .scan(&[dir.path().to_path_buf()], &exact_only(), &NoopObserver, &token)
        .unwrap_err();

    assert!(matches!(err, ScanError::Cancelled));
    assert!(service.scan_results().groups.is_empty());
}

#[test]
fn test_scan_and_delete_are_rejected_during_a_scan() {
    let dir = tempdir().unwrap();
    let files = populate(dir.path());
    let service = DuplicateService::new();
    let roots = [dir.path().to_path_buf()];

    let outcomes = Mutex::new(Vec::new());
    let observer = |percent: u8| {
        if percent == 5 {
            let nested = service.scan(&roots, &exact_only(), &NoopObserver, &CancelToken::new());
            let delete = service.delete_files("any", &files[..1]);
            outcomes.lock().unwrap().push((nested.err(), delete.err()));
        }
    };

    service
        .scan(&roots, &exact_only(), &observer, &CancelToken::new())
        .unwrap();

    let outcomes = outcomes.into_inner().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0].0, Some(ScanError::AlreadyRunning)));
    assert_eq!(outcomes[0].1, Some(DeleteError::ScanInProgress));
    assert!(files[0].exists());
}
