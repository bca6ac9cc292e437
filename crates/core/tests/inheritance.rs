mod common;

use common::{QUERIES, SCRIPTS, Workspace, key, pid};
use rescope_api::{Origin, ResourceKind, ResourcePath, ResourceTypeId, WarningKind};

#[tokio::test]
async fn test_project_without_parent_sees_only_its_own_resources() {
    let ws = Workspace::new();
    ws.project("solo", None);
    ws.script("solo", "utils/helpers", "def load():\n    pass\n");
    ws.query("solo", "reports/daily", "SELECT 1");

    let engine = ws.open().await;
    let set = engine.effective_resources(&pid("solo")).await.unwrap();

    let helpers = set.get(&key(SCRIPTS, "utils/helpers")).unwrap();
    assert_eq!(helpers.kind, ResourceKind::Resource);
    assert!(set.get(&key(SCRIPTS, "utils")).unwrap().is_folder());
    assert!(set.contains(&key(QUERIES, "reports/daily")));
    assert!(set.iter().all(|r| r.origin == Origin::Local));
}

#[tokio::test]
async fn test_nearest_ancestor_wins() {
    let ws = Workspace::new();
    ws.project("global", None);
    ws.project("site", Some("global"));
    ws.project("line", Some("site"));
    ws.query("global", "shared/alarms", "SELECT * FROM alarms");
    ws.query("global", "shared/tags", "SELECT 'global'");
    ws.query("site", "shared/tags", "SELECT 'site'");
    ws.query("line", "local/counts", "SELECT 2");

    let engine = ws.open().await;
    assert_eq!(
        engine.ancestor_chain(&pid("line")).await.unwrap(),
        vec![pid("site"), pid("global")]
    );

    let set = engine.effective_resources(&pid("line")).await.unwrap();
    assert_eq!(
        set.get(&key(QUERIES, "shared/alarms")).unwrap().origin,
        Origin::Inherited(pid("global"))
    );
    assert_eq!(
        set.get(&key(QUERIES, "shared/tags")).unwrap().origin,
        Origin::Inherited(pid("site"))
    );
    assert_eq!(
        set.get(&key(QUERIES, "local/counts")).unwrap().origin,
        Origin::Local
    );

    // The folder mixes records from two ancestors.
    let queries = ResourceTypeId::from_static(QUERIES);
    assert_eq!(
        set.folder_origin(&queries, &ResourcePath::new("shared")),
        Origin::Local
    );
}

#[tokio::test]
async fn test_local_definition_shadows_ancestor() {
    let ws = Workspace::new();
    ws.project("base", None);
    ws.project("child", Some("base"));
    ws.query("base", "lookup", "SELECT 'base'");
    ws.query("child", "lookup", "SELECT 'child'");

    let engine = ws.open().await;
    let set = engine.effective_resources(&pid("child")).await.unwrap();
    let lookup = set.get(&key(QUERIES, "lookup")).unwrap();
    assert_eq!(lookup.origin, Origin::Local);
    assert!(lookup.file("query.sql").unwrap().path.starts_with(ws.path("child")));
}

#[tokio::test]
async fn test_missing_ancestor_truncates_chain() {
    let ws = Workspace::new();
    ws.project("orphan", Some("ghost"));
    ws.query("orphan", "mine", "SELECT 1");

    let engine = ws.open().await;
    assert!(engine.ancestor_chain(&pid("orphan")).await.unwrap().is_empty());

    let set = engine.effective_resources(&pid("orphan")).await.unwrap();
    assert!(set.iter().all(|r| r.origin == Origin::Local));

    let warnings = engine.warnings(Some(&pid("orphan"))).await.unwrap();
    assert!(warnings.iter().any(|w| w.kind
        == WarningKind::MissingAncestor {
            ancestor: pid("ghost")
        }));
}

#[tokio::test]
async fn test_cycle_is_rejected_and_first_link_kept() {
    let ws = Workspace::new();
    ws.project("a", Some("b"));
    ws.project("b", Some("a"));

    let engine = ws.open().await;
    // Manifests apply in id order: a -> b is accepted, b -> a would close the loop.
    assert_eq!(engine.ancestor_chain(&pid("a")).await.unwrap(), vec![pid("b")]);
    assert!(engine.ancestor_chain(&pid("b")).await.unwrap().is_empty());

    let project = engine.project(&pid("b")).await.unwrap();
    assert_eq!(project.parent_id, None);

    let warnings = engine.warnings(Some(&pid("b"))).await.unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].kind,
        WarningKind::CycleDetected { parent: pid("a") }
    );
}

#[tokio::test]
async fn test_resource_warnings_are_reported() {
    let ws = Workspace::new();
    ws.project("p", None);
    ws.write("p/ignition/named-query/bare/query.sql", "SELECT 1");
    ws.write("p/ignition/named-query/lonely/resource.json", "{}");

    let engine = ws.open().await;
    let set = engine.effective_resources(&pid("p")).await.unwrap();
    assert_eq!(
        set.get(&key(QUERIES, "lonely")).unwrap().kind,
        ResourceKind::OrphanedManifest
    );

    let warnings = engine.warnings(Some(&pid("p"))).await.unwrap();
    assert!(warnings.iter().any(|w| w.resource == Some(key(QUERIES, "bare"))
        && w.kind == WarningKind::MissingManifest));
    assert!(warnings.iter().any(|w| w.resource == Some(key(QUERIES, "lonely"))
        && w.kind == WarningKind::OrphanedManifest));
}

#[tokio::test]
async fn test_unknown_project_is_not_found() {
    let ws = Workspace::new();
    ws.project("p", None);
    let engine = ws.open().await;

    assert!(matches!(
        engine.effective_resources(&pid("nope")).await,
        Err(rescope_core::RescopeError::NotFound(_))
    ));
    assert!(engine.ancestor_chain(&pid("nope")).await.is_err());
    assert!(engine.warnings(Some(&pid("nope"))).await.is_err());
}
