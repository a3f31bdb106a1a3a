//! Catalog tests: recursive listing, de-duplication and fatal errors

mod common;

use common::{CatalogFailure, FakeGroupApi};
use glsync::catalog::ProjectCatalog;
use glsync::error::SyncError;
use std::collections::HashSet;
use std::sync::atomic::Ordering;

fn nested_tree() -> FakeGroupApi {
    FakeGroupApi::new()
        .group(1, "acme")
        .group(2, "acme/platform")
        .group(3, "acme/platform/infra")
        .group(4, "acme/platform/infra/cloud")
        .project(10, "acme/platform/api", "git@host:acme/platform/api.git")
        .project(11, "acme/platform/web", "git@host:acme/platform/web.git")
        .project(12, "acme/platform/infra/terraform", "git@host:acme/platform/infra/terraform.git")
        .project(13, "acme/platform/infra/cloud/dns", "git@host:acme/platform/infra/cloud/dns.git")
        .project(14, "acme/marketing/site", "git@host:acme/marketing/site.git")
}

#[tokio::test]
async fn test_lists_projects_at_every_depth() {
    let catalog = ProjectCatalog::new(nested_tree());
    let root = catalog.resolve("acme/platform").await.unwrap();
    assert_eq!(root.id, 2);

    let projects = catalog.list_all_projects(&root).await.unwrap();
    let paths: Vec<String> = projects.iter().map(|p| p.path_with_namespace()).collect();
    assert_eq!(
        paths,
        vec![
            "acme/platform/api",
            "acme/platform/web",
            "acme/platform/infra/terraform",
            "acme/platform/infra/cloud/dns",
        ]
    );
}

#[tokio::test]
async fn test_root_path_is_trimmed() {
    let catalog = ProjectCatalog::new(nested_tree());
    let root = catalog.resolve(" /acme/platform/ ").await.unwrap();
    assert_eq!(root.full_path, "acme/platform");
}

#[tokio::test]
async fn test_duplicate_listing_entries_are_dropped() {
    let catalog = ProjectCatalog::new(nested_tree().with_duplicate_entry());
    let root = catalog.resolve("acme").await.unwrap();
    let projects = catalog.list_all_projects(&root).await.unwrap();

    assert_eq!(projects.len(), 5);
    let ids: HashSet<u64> = projects.iter().map(|p| p.id).collect();
    assert_eq!(ids.len(), projects.len());
}

#[tokio::test]
async fn test_empty_group_lists_nothing() {
    let catalog = ProjectCatalog::new(FakeGroupApi::new().group(1, "empty"));
    let root = catalog.resolve("empty").await.unwrap();
    assert!(catalog.list_all_projects(&root).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_root_group_is_fatal() {
    let catalog = ProjectCatalog::new(nested_tree());
    let err = catalog.resolve("acme/nope").await.unwrap_err();
    assert!(matches!(err, SyncError::NotFound { .. }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_empty_root_path_is_not_found() {
    let catalog = ProjectCatalog::new(nested_tree());
    let err = catalog.resolve("  ").await.unwrap_err();
    assert!(matches!(err, SyncError::NotFound { .. }));
}

#[tokio::test]
async fn test_rejected_credentials_are_fatal() {
    let catalog = ProjectCatalog::new(nested_tree().failing(CatalogFailure::Unauthorized));
    let err = catalog.resolve("acme/platform").await.unwrap_err();
    assert!(matches!(err, SyncError::Authentication { .. }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_listing_failure_is_fatal() {
    let api = nested_tree().failing(CatalogFailure::ListingFails);
    let catalog = ProjectCatalog::new(api);
    let root = catalog.resolve("acme/platform").await.unwrap();
    let err = catalog.list_all_projects(&root).await.unwrap_err();
    assert!(matches!(err, SyncError::List { .. }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_listing_is_requested_once() {
    let catalog = ProjectCatalog::new(nested_tree());
    let root = catalog.resolve("acme").await.unwrap();
    catalog.list_all_projects(&root).await.unwrap();
    assert_eq!(catalog.api().list_calls.load(Ordering::SeqCst), 1);
}
