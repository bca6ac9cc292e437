mod common;

use common::{QUERIES, SCRIPTS, Workspace, count_changes, key, next_change, pid};
use rescope_api::{EngineEvent, Origin, WarningKind};
use rescope_core::project::watcher::{ChangeKind, FsEvent};
use std::fs;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_burst_of_edits_produces_one_cycle() {
    let ws = Workspace::new();
    ws.project("p", None);
    let code = ws.script("p", "utils/helpers", "def one():\n    pass\n");

    let engine = ws.open().await;
    engine.effective_resources(&pid("p")).await.unwrap();

    let mut rx = engine.subscribe();
    let handle = engine.start_coordinator(CancellationToken::new());

    fs::write(&code, "def one():\n    pass\n\ndef two():\n    pass\n").unwrap();
    for _ in 0..10 {
        handle
            .submit(FsEvent::new(code.clone(), ChangeKind::Modified))
            .unwrap();
    }

    next_change(&mut rx, &pid("p")).await;
    assert_eq!(
        count_changes(&mut rx, &pid("p"), Duration::from_millis(300)).await,
        0
    );

    let items = engine
        .query_completions(&pid("p"), "utils.helpers.t")
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].label, "two");

    handle.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_new_resource_visible_after_notification() {
    let ws = Workspace::new();
    ws.project("p", None);
    ws.query("p", "first", "SELECT 1");

    let engine = ws.open().await;
    assert_eq!(
        engine.effective_resources(&pid("p")).await.unwrap().len(),
        1
    );

    let mut rx = engine.subscribe();
    let handle = engine.start_coordinator(CancellationToken::new());

    let added = ws.query("p", "second", "SELECT 2");
    handle
        .submit(FsEvent::new(added.parent().unwrap(), ChangeKind::Created))
        .unwrap();
    next_change(&mut rx, &pid("p")).await;

    let set = engine.effective_resources(&pid("p")).await.unwrap();
    assert!(set.contains(&key(QUERIES, "second")));
    handle.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_ancestor_change_reaches_descendants() {
    let ws = Workspace::new();
    ws.project("base", None);
    ws.project("app", Some("base"));
    let shared = ws.query("base", "shared", "SELECT 'v1'");

    let engine = ws.open().await;
    let before = engine.effective_resources(&pid("app")).await.unwrap();
    let before_hash = before
        .get(&key(QUERIES, "shared"))
        .unwrap()
        .file("query.sql")
        .unwrap()
        .content_hash;

    let mut rx = engine.subscribe();
    let handle = engine.start_coordinator(CancellationToken::new());

    fs::write(&shared, "SELECT 'v2'").unwrap();
    handle
        .submit(FsEvent::new(shared.clone(), ChangeKind::Modified))
        .unwrap();

    next_change(&mut rx, &pid("base")).await;
    // The descendant is rescanned as a follow-up.
    next_change(&mut rx, &pid("app")).await;

    let after = engine.effective_resources(&pid("app")).await.unwrap();
    let record = after.get(&key(QUERIES, "shared")).unwrap();
    assert_eq!(record.origin, Origin::Inherited(pid("base")));
    assert_ne!(record.file("query.sql").unwrap().content_hash, before_hash);
    handle.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reparenting_invalidates_descendants() {
    let ws = Workspace::new();
    ws.project("a", None);
    ws.project("b", None);
    ws.project("mid", Some("a"));
    ws.project("leaf", Some("mid"));
    ws.script("a", "from_a", "def a():\n    pass\n");
    ws.script("b", "from_b", "def b():\n    pass\n");

    let engine = ws.open().await;
    let leaf = engine.effective_resources(&pid("leaf")).await.unwrap();
    assert!(leaf.contains(&key(SCRIPTS, "from_a")));

    let mut rx = engine.subscribe();
    let handle = engine.start_coordinator(CancellationToken::new());

    let manifest = ws.project("mid", Some("b"));
    handle
        .submit(FsEvent::new(manifest, ChangeKind::Modified))
        .unwrap();
    next_change(&mut rx, &pid("mid")).await;

    assert_eq!(
        engine.ancestor_chain(&pid("leaf")).await.unwrap(),
        vec![pid("mid"), pid("b")]
    );
    let leaf = engine.effective_resources(&pid("leaf")).await.unwrap();
    assert!(leaf.contains(&key(SCRIPTS, "from_b")));
    assert!(!leaf.contains(&key(SCRIPTS, "from_a")));

    let items = engine.query_completions(&pid("leaf"), "").await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].label, "from_b");
    handle.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_removed_project_is_forgotten() {
    let ws = Workspace::new();
    ws.project("gone", None);
    ws.project("kept", None);

    let engine = ws.open().await;
    let mut rx = engine.subscribe();
    let handle = engine.start_coordinator(CancellationToken::new());

    fs::remove_dir_all(ws.path("gone")).unwrap();
    handle
        .submit(FsEvent::new(ws.path("gone"), ChangeKind::Deleted))
        .unwrap();

    let removed = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if let Ok(EngineEvent::ProjectRemoved { project }) = rx.recv().await {
                return project;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(removed, pid("gone"));
    assert!(engine.project(&pid("gone")).await.is_none());
    assert!(engine.project(&pid("kept")).await.is_some());
    handle.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_events_outside_resources_are_ignored() {
    let ws = Workspace::new();
    ws.project("p", None);
    let engine = ws.open().await;
    engine.effective_resources(&pid("p")).await.unwrap();

    let notes = ws.write("p/notes.txt", "hello");
    assert!(engine
        .classify(&FsEvent::new(notes, ChangeKind::Modified))
        .is_none());
    assert!(engine
        .classify(&FsEvent::new("/elsewhere/x/project.json", ChangeKind::Modified))
        .is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rejected_parent_linked_once_cycle_is_gone() {
    let ws = Workspace::new();
    ws.project("a", Some("b"));
    ws.project("b", Some("a"));
    ws.query("a", "from_a", "SELECT 'a'");

    let engine = ws.open().await;
    assert_eq!(engine.ancestor_chain(&pid("a")).await.unwrap(), vec![pid("b")]);
    assert!(engine.ancestor_chain(&pid("b")).await.unwrap().is_empty());
    let warnings = engine.warnings(Some(&pid("b"))).await.unwrap();
    assert!(warnings
        .iter()
        .any(|w| matches!(w.kind, WarningKind::CycleDetected { .. })));

    let mut rx = engine.subscribe();
    let handle = engine.start_coordinator(CancellationToken::new());

    let manifest = ws.project("a", None);
    handle
        .submit(FsEvent::new(manifest, ChangeKind::Modified))
        .unwrap();
    next_change(&mut rx, &pid("a")).await;
    // b's declared parent is accepted now and b is rescanned.
    next_change(&mut rx, &pid("b")).await;

    assert!(engine.ancestor_chain(&pid("a")).await.unwrap().is_empty());
    assert_eq!(engine.ancestor_chain(&pid("b")).await.unwrap(), vec![pid("a")]);
    assert_eq!(
        engine.project(&pid("b")).await.unwrap().parent_id,
        Some(pid("a"))
    );
    let warnings = engine.warnings(Some(&pid("b"))).await.unwrap();
    assert!(!warnings
        .iter()
        .any(|w| matches!(w.kind, WarningKind::CycleDetected { .. })));

    let set = engine.effective_resources(&pid("b")).await.unwrap();
    assert_eq!(
        set.get(&key(QUERIES, "from_a")).unwrap().origin,
        Origin::Inherited(pid("a"))
    );
    handle.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_moving_type_tree_out_empties_project() {
    let ws = Workspace::new();
    ws.project("p", None);
    ws.query("p", "first", "SELECT 1");

    let engine = ws.open().await;
    assert_eq!(engine.effective_resources(&pid("p")).await.unwrap().len(), 1);

    let mut rx = engine.subscribe();
    let handle = engine.start_coordinator(CancellationToken::new());

    let moved = ws.root().join("moved-away");
    fs::rename(ws.path("p/ignition"), &moved).unwrap();
    handle
        .submit(FsEvent::new(ws.path("p/ignition"), ChangeKind::Deleted))
        .unwrap();
    next_change(&mut rx, &pid("p")).await;

    assert!(engine.effective_resources(&pid("p")).await.unwrap().is_empty());
    handle.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_scan_failure_becomes_warning_and_recovers() {
    let ws = Workspace::new();
    ws.project("p", None);
    let code = ws.script("p", "utils", "def one():\n    pass\n");

    let engine = ws.open().await;
    assert_eq!(engine.effective_resources(&pid("p")).await.unwrap().len(), 1);

    let mut rx = engine.subscribe();
    let handle = engine.start_coordinator(CancellationToken::new());

    // The project directory disappears without a manifest event.
    let parked = ws.root().join("parked");
    fs::rename(ws.path("p"), &parked).unwrap();
    handle
        .submit(FsEvent::new(code.clone(), ChangeKind::Modified))
        .unwrap();

    let warning = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if let Ok(EngineEvent::Warning(w)) = rx.recv().await {
                if matches!(w.kind, WarningKind::ScanFailed { .. }) {
                    return w;
                }
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(warning.project, pid("p"));

    // Readers get an empty view plus the warning, never stale data or an error.
    assert!(engine.effective_resources(&pid("p")).await.unwrap().is_empty());
    assert!(engine
        .query_completions(&pid("p"), "")
        .await
        .unwrap()
        .is_empty());
    let warnings = engine.warnings(Some(&pid("p"))).await.unwrap();
    assert!(warnings
        .iter()
        .any(|w| matches!(w.kind, WarningKind::ScanFailed { .. })));

    fs::rename(&parked, ws.path("p")).unwrap();
    handle
        .submit(FsEvent::new(code.clone(), ChangeKind::Modified))
        .unwrap();
    next_change(&mut rx, &pid("p")).await;

    let set = engine.effective_resources(&pid("p")).await.unwrap();
    assert!(set.contains(&key(SCRIPTS, "utils")));
    let warnings = engine.warnings(Some(&pid("p"))).await.unwrap();
    assert!(!warnings
        .iter()
        .any(|w| matches!(w.kind, WarningKind::ScanFailed { .. })));
    handle.stop();
}
