//! Expansion scenarios over the in-memory store

use pretty_assertions::assert_eq;
use rddms_graph::{cancel_pair, FetchError, ResolveError};
use rddms_manifest::{
    AclOverride, ExpansionService, ManifestDefaults, ManifestError, SelectionItem,
    SelectionRequest, SingleExpansionRequest,
};
use rddms_test_utils::{
    crs_uri, grid_uri, volve_store, MemoryStore, CRS_TYPE, GRID_TYPE, VOLVE_DS,
};
use std::sync::Arc;
use std::time::Duration;

fn service(store: MemoryStore) -> ExpansionService {
    ExpansionService::new(Arc::new(store), ManifestDefaults::for_partition("dp1"))
}

fn grid_request() -> SingleExpansionRequest {
    SingleExpansionRequest::new(VOLVE_DS, GRID_TYPE, "G1")
}

#[tokio::test]
async fn single_object_with_refs() {
    let uris = service(volve_store()).expand_single(&grid_request()).await.unwrap();
    assert_eq!(uris, vec![grid_uri(), crs_uri()]);
}

#[tokio::test]
async fn single_object_without_refs() {
    let uris = service(volve_store())
        .expand_single(&grid_request().with_include_refs(false))
        .await
        .unwrap();
    assert_eq!(uris, vec![grid_uri()]);
}

#[tokio::test]
async fn empty_selection_falls_back_to_dataspace() {
    let manifest = service(MemoryStore::new())
        .expand_selection(&SelectionRequest::new().with_dataspace(VOLVE_DS))
        .await
        .unwrap();
    assert_eq!(manifest.uris, vec!["eml:///dataspace('demo/Volve')"]);
    assert!(manifest.create_missing_references);
}

#[tokio::test]
async fn empty_selection_without_any_dataspace() {
    let err = service(MemoryStore::new())
        .expand_selection(&SelectionRequest::new())
        .await
        .unwrap_err();
    assert_eq!(err, ManifestError::NoFallbackDataspace);
}

#[tokio::test]
async fn selection_shares_one_traversal() {
    let store = Arc::new(
        volve_store().with_target((GRID_TYPE, "G2"), (CRS_TYPE, "C1")),
    );
    let service = ExpansionService::new(store.clone(), ManifestDefaults::for_partition("dp1"));

    let request = SelectionRequest::new()
        .with_item(SelectionItem::new(VOLVE_DS, GRID_TYPE, "G1"))
        .with_item(SelectionItem::new(VOLVE_DS, GRID_TYPE, "G2"))
        .with_raw_uris(vec![crs_uri(), "eml:///dataspace('demo/Volve')/resqml20.obj_Fault('F1')".into()])
        .with_dataspace_uris(vec!["demo/Other".into()]);

    let manifest = service.expand_selection(&request).await.unwrap();
    assert_eq!(
        manifest.uris,
        vec![
            grid_uri(),
            "eml:///dataspace('demo/Volve')/resqml20.obj_Grid2dRepresentation('G2')".to_string(),
            crs_uri(),
            "eml:///dataspace('demo/Volve')/resqml20.obj_Fault('F1')".to_string(),
            "eml:///dataspace('demo/Other')".to_string(),
        ]
    );
    // C1 is at the depth bound; only the two grids were fetched
    assert_eq!(store.call_count(), 2);
}

#[tokio::test]
async fn selection_overrides_and_item_dataspace_inheritance() {
    let request: SelectionRequest = serde_json::from_value(serde_json::json!({
        "items": [{"typePath": GRID_TYPE, "id": "G1"}],
        "includeRefs": true,
        "dataspace": VOLVE_DS,
        "acl": {"owners": ["team@dp1.dataservices.energy"]},
        "createMissingReferences": false
    }))
    .unwrap();

    let manifest = service(volve_store()).expand_selection(&request).await.unwrap();
    assert_eq!(manifest.uris, vec![grid_uri(), crs_uri()]);
    assert_eq!(manifest.acl.owners, vec!["team@dp1.dataservices.energy"]);
    assert_eq!(
        manifest.acl.viewers,
        vec!["data.default.viewers@dp1.dataservices.energy"]
    );
    assert!(!manifest.create_missing_references);
}

#[tokio::test]
async fn raw_uris_are_canonicalized_and_malformed_ones_skipped() {
    let request = SelectionRequest::new().with_dataspace(VOLVE_DS).with_raw_uris(vec![
        "eml:///resqml20.obj_Fault(F1)".into(),
        "not a uri at all".into(),
        "eml:///dataspace('demo/Volve')/resqml20.obj_Fault('F1')".into(),
    ]);
    let manifest = service(MemoryStore::new()).expand_selection(&request).await.unwrap();
    assert_eq!(
        manifest.uris,
        vec!["eml:///dataspace('demo/Volve')/resqml20.obj_Fault('F1')"]
    );
}

#[tokio::test]
async fn only_malformed_raw_uris_fall_back_to_dataspace() {
    let request = SelectionRequest::new()
        .with_dataspace(VOLVE_DS)
        .with_raw_uris(vec!["not a uri at all".into()])
        .with_dataspace_uris(vec!["eml:///dataspace(".into()]);
    let manifest = service(MemoryStore::new()).expand_selection(&request).await.unwrap();
    assert_eq!(manifest.uris, vec!["eml:///dataspace('demo/Volve')"]);
}

#[tokio::test]
async fn item_without_any_dataspace_is_rejected() {
    let request = SelectionRequest::new().with_item(SelectionItem::new("", GRID_TYPE, "G1"));
    let err = service(volve_store()).expand_selection(&request).await.unwrap_err();
    assert!(matches!(err, ManifestError::InvalidRequest(_)));
}

#[tokio::test]
async fn credential_failure_is_terminal() {
    let store = volve_store().with_failure((GRID_TYPE, "G1"), FetchError::Unauthorized("expired".into()));
    let err = service(store).expand_single(&grid_request()).await.unwrap_err();
    assert!(err.is_credential_failure());
}

#[tokio::test]
async fn overall_deadline_maps_to_timed_out() {
    let store = volve_store().with_delay(Duration::from_secs(5));
    let service = service(store).with_resolve_timeout(Duration::from_millis(20));

    let err = service.expand_single(&grid_request()).await.unwrap_err();
    assert_eq!(
        err,
        ManifestError::Resolve(ResolveError::TimedOut { duration_ms: 20 })
    );
}

#[tokio::test]
async fn cancellation_yields_no_partial_manifest() {
    let store = volve_store().with_delay(Duration::from_secs(5));
    let service = service(store);
    let (handle, signal) = cancel_pair();
    handle.cancel();

    let request = SelectionRequest::new().with_item(SelectionItem::new(VOLVE_DS, GRID_TYPE, "G1"));
    let err = service
        .expand_selection_with_cancel(&request, signal)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn acl_override_does_not_leak_into_next_call() {
    let service = service(volve_store());
    let mut request = SelectionRequest::new().with_dataspace(VOLVE_DS);
    request.acl = Some(AclOverride {
        owners: vec!["team@x".into()],
        viewers: vec![],
    });
    let first = service.expand_selection(&request).await.unwrap();
    let second = service
        .expand_selection(&SelectionRequest::new().with_dataspace(VOLVE_DS))
        .await
        .unwrap();

    assert_eq!(first.acl.owners, vec!["team@x"]);
    assert_eq!(
        second.acl.owners,
        vec!["data.default.owners@dp1.dataservices.energy"]
    );
}
