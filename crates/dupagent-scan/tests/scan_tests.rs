use dupagent_scan::{
    CancellationToken, ScanController, ScanEvent, ScanOptions, ScanOutcome, ScanTask, start_scan,
    status,
};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn run(roots: &[&Path], options: ScanOptions) -> (Vec<ScanEvent>, ScanOutcome) {
    let roots = roots.iter().map(|p| p.to_path_buf()).collect();
    let mut task = ScanTask::new(roots, options).unwrap();
    let mut events = Vec::new();
    let outcome = task.run(&CancellationToken::new(), |e| events.push(e));
    (events, outcome)
}

#[test]
fn test_identical_pair_scenario() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("a.txt"), "0123456789").unwrap();
    fs::write(root.join("b.txt"), "0123456789").unwrap();
    fs::write(root.join("c.txt"), "abcdefghij").unwrap();

    let (events, outcome) = run(&[root], ScanOptions::default());
    let report = outcome.into_report().unwrap();

    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0];
    assert_eq!(group.human_size, "10.0 B");
    assert_eq!(group.paths, vec![root.join("a.txt"), root.join("b.txt")]);
    assert_eq!(report.candidates, 3);
    assert_eq!(report.reclaimable_bytes(), 10);

    let tail: Vec<_> = events.iter().rev().take(3).rev().cloned().collect();
    assert_eq!(
        tail,
        vec![
            ScanEvent::Status(status::finished(1)),
            ScanEvent::Progress(100),
            ScanEvent::Completed(report.groups.clone()),
        ]
    );
    assert!(events.contains(&ScanEvent::Status(status::hashing(3))));
    assert!(events.contains(&ScanEvent::Status(status::hashing_file("c.txt"))));
}

#[test]
fn test_zero_byte_file_is_walked_but_not_checked() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("empty.txt"), "").unwrap();
    fs::write(root.join("other.txt"), "content").unwrap();

    let (events, outcome) = run(&[root], ScanOptions::default());
    let report = outcome.into_report().unwrap();

    assert_eq!(report.files_walked, 2);
    assert_eq!(report.files_checked, 1);
    assert!(report.groups.is_empty());
    assert!(events.contains(&ScanEvent::Status(status::no_duplicates(1))));
}

#[test]
fn test_empty_files_group_when_included() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("empty1"), "").unwrap();
    fs::write(root.join("empty2"), "").unwrap();

    let options = ScanOptions::builder().skip_zero_byte(false).build().unwrap();
    let report = run(&[root], options).1.into_report().unwrap();
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].human_size, "0.0 B");
}

#[test]
fn test_groups_are_disjoint_and_size_consistent() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("x/y")).unwrap();
    for (name, content) in [
        ("1", "alpha"),
        ("x/2", "alpha"),
        ("x/y/3", "alpha"),
        ("4", "bravo"),
        ("x/5", "bravo"),
        ("6", "a much longer file"),
        ("x/y/7", "a much longer file"),
        ("8", "unique size here!!!!"),
    ] {
        fs::write(root.join(name), content).unwrap();
    }

    let report = run(&[root], ScanOptions::default()).1.into_report().unwrap();
    assert_eq!(report.groups.len(), 3);

    let mut seen = HashSet::new();
    for group in &report.groups {
        assert!(group.count() >= 2);
        for path in &group.paths {
            assert!(seen.insert(path.clone()), "{} in two groups", path.display());
            assert_eq!(fs::metadata(path).unwrap().len(), group.size);
        }
    }
    assert!(!seen.contains(&root.join("8")));
}

#[test]
fn test_name_matching_splits_and_merges() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("one")).unwrap();
    fs::create_dir_all(root.join("two")).unwrap();
    fs::write(root.join("one/photo.jpg"), "same bytes").unwrap();
    fs::write(root.join("two/renamed.jpg"), "same bytes").unwrap();

    let by_content = run(&[root], ScanOptions::default()).1.into_report().unwrap();
    assert_eq!(by_content.groups.len(), 1);

    let options = ScanOptions::builder().match_name(true).build().unwrap();
    let by_name = run(&[root], options).1.into_report().unwrap();
    assert!(by_name.groups.is_empty());
}

#[test]
fn test_multiple_roots_in_order() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    fs::write(second.path().join("copy"), "payload").unwrap();
    fs::write(first.path().join("orig"), "payload").unwrap();

    let report = run(&[first.path(), second.path()], ScanOptions::default())
        .1
        .into_report()
        .unwrap();
    assert_eq!(
        report.groups[0].keep(),
        Some(&first.path().join("orig"))
    );
}

#[test]
fn test_overlapping_roots_never_pair_a_file_with_itself() {
    let temp = TempDir::new().unwrap();
    let sub = temp.path().join("sub");
    fs::create_dir_all(&sub).unwrap();
    fs::write(sub.join("only_copy.txt"), "the one and only").unwrap();

    for roots in [
        vec![temp.path(), sub.as_path()],
        vec![sub.as_path(), temp.path()],
        vec![temp.path(), temp.path()],
    ] {
        let report = run(&roots, ScanOptions::default()).1.into_report().unwrap();
        assert!(report.groups.is_empty(), "roots {roots:?} produced {:?}", report.groups);
        assert_eq!(report.files_checked, 1);
    }
}

#[cfg(unix)]
#[test]
fn test_symlink_is_not_a_duplicate_of_its_target() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("real.txt"), "linked content").unwrap();
    std::os::unix::fs::symlink(root.join("real.txt"), root.join("a_link.txt")).unwrap();

    let report = run(&[root], ScanOptions::default()).1.into_report().unwrap();
    assert!(report.groups.is_empty());

    fs::write(root.join("z_copy.txt"), "linked content").unwrap();
    let report = run(&[root], ScanOptions::default()).1.into_report().unwrap();
    assert_eq!(
        report.groups[0].paths,
        vec![root.join("real.txt"), root.join("z_copy.txt")]
    );
}

#[tokio::test]
async fn test_background_scan_streams_events() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a"), "dup").unwrap();
    fs::write(temp.path().join("b"), "dup").unwrap();

    let mut handle = start_scan(vec![temp.path().to_path_buf()], ScanOptions::default()).unwrap();
    let mut completed = None;
    while let Some(event) = handle.recv().await {
        if let ScanEvent::Completed(groups) = event {
            completed = Some(groups);
        }
    }

    assert_eq!(completed.unwrap().len(), 1);
    assert!(handle.wait().await.unwrap().into_report().is_some());
}

#[tokio::test]
async fn test_start_scan_rejects_empty_roots() {
    assert!(start_scan(Vec::new(), ScanOptions::default()).is_err());
}

#[tokio::test]
async fn test_cancelled_scan_sends_no_completion() {
    let temp = TempDir::new().unwrap();
    for i in 0..50 {
        fs::write(temp.path().join(format!("f{i}")), vec![1u8; 4096]).unwrap();
    }

    let mut handle = start_scan(vec![temp.path().to_path_buf()], ScanOptions::default()).unwrap();
    handle.cancel();

    let mut events = Vec::new();
    while let Some(event) = handle.recv().await {
        events.push(event);
    }
    assert!(!events.iter().any(|e| matches!(e, ScanEvent::Completed(_))));
    assert!(handle.wait().await.unwrap().is_cancelled());
}

#[tokio::test]
async fn test_controller_restart_cancels_previous() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a"), "dup").unwrap();
    fs::write(temp.path().join("b"), "dup").unwrap();
    let roots: Vec<PathBuf> = vec![temp.path().to_path_buf()];

    let mut controller = ScanController::new();
    let _first = controller
        .start(roots.clone(), ScanOptions::default())
        .await
        .unwrap();
    let mut second = controller
        .start(roots.clone(), ScanOptions::default())
        .await
        .unwrap();

    let mut groups = None;
    while let Some(event) = second.recv().await {
        if let ScanEvent::Completed(g) = event {
            groups = Some(g);
        }
    }
    assert_eq!(groups.unwrap().len(), 1);

    let outcome = controller.wait().await.unwrap().unwrap();
    assert!(!outcome.is_cancelled());
    assert!(!controller.is_running());
    assert!(controller.cancel().await.unwrap().is_none());
}

#[tokio::test]
async fn test_controller_keeps_running_scan_on_bad_config() {
    let mut controller = ScanController::new();
    assert!(controller.start(Vec::new(), ScanOptions::default()).await.is_err());
    assert!(controller.cancel().await.unwrap().is_none());
}
