use crate::common::{create_orchestrator, create_test_config, start_origin};
use linkscope::storage::open_repository;
use linkscope::{gather_addresses, BatchError, Repository};
use std::collections::HashSet;
use tempfile::TempDir;

#[tokio::test]
async fn test_batch_end_to_end() {
    let origin = start_origin().await;
    let orchestrator = create_orchestrator(&create_test_config(""));

    let text = format!("{0}/ok\n{0}/ok?copy=2\n", origin.uri());
    let addresses = gather_addresses(&text).unwrap();

    let results = orchestrator.process_batch(addresses).await.unwrap();

    assert_eq!(results.len(), 2);
    for result in &results {
        assert!(result.success);
        assert_eq!(result.external_links_num, 3);
        assert_eq!(result.internal_links_num, 2);
        assert_eq!(result.error, None);
    }

    let batch_id = results[0].batch_id.clone();
    let stored = orchestrator.get_batch(&batch_id).unwrap();
    assert_eq!(stored, results);

    let missing = orchestrator.get_batch(&uuid::Uuid::new_v4().to_string());
    assert!(matches!(missing, Err(BatchError::NotFound(_))));
}

#[tokio::test]
async fn test_batch_keeps_failed_pages() {
    let origin = start_origin().await;
    let orchestrator = create_orchestrator(&create_test_config(""));

    let text = format!("{0}/ok\n{0}/missing", origin.uri());
    let results = orchestrator
        .process_batch(gather_addresses(&text).unwrap())
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    let failed: Vec<_> = results.iter().filter(|r| !r.success).collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].page_url.ends_with("/missing"));
    assert_eq!(failed[0].error.as_deref(), Some("bad status code"));
    assert_eq!(failed[0].external_links_num, 0);
    assert_eq!(failed[0].internal_links_num, 0);

    let ids: HashSet<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), 2);
}

#[tokio::test]
async fn test_batch_persists_to_sqlite() {
    let origin = start_origin().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("results.db");
    let storage = format!(
        "backend = \"sqlite\"\ndatabase-path = \"{}\"",
        db_path.display()
    );
    let config = create_test_config(&storage);

    let results = {
        let orchestrator = create_orchestrator(&config);
        let text = format!("{0}/ok\n{0}/missing\n{0}/ok#again", origin.uri());
        orchestrator
            .process_batch(gather_addresses(&text).unwrap())
            .await
            .unwrap()
    };

    let reopened = open_repository(&config.storage).unwrap();
    let stored = reopened.get_batch_results(&results[0].batch_id).unwrap();
    assert_eq!(stored, results);
    assert_eq!(reopened.list_results().unwrap().len(), 1);
}
