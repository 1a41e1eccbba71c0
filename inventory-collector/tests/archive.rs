use inventory_collector::archive::{list_archives, restore_archive};
use inventory_collector::error::{ArchiveError, StoreError};
use inventory_collector::out::gzip;
use inventory_collector::store::{MemoryStore, ObjectStore, PublishedArtifact};

const PREFIX: &str = "aws-config-inventory/historical/";

async fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new("inventory-bucket");
    let csv = "\"ResourceType\",\"ResourceId\"\r\n\"AWS::S3::Bucket\",\"logs\"\r\n".repeat(50);
    let archives = [
        ("aws-config-inventory/historical/resources_20250102_000000.csv.gz", csv.as_str()),
        ("aws-config-inventory/historical/resources_20250101_000000.csv.gz", csv.as_str()),
        ("aws-config-inventory/historical/summary_20250101_000000.json.gz", "{}"),
    ];
    for (key, text) in archives {
        let artifact = PublishedArtifact::new(key, gzip::compress(text).unwrap(), "application/gzip")
            .with_encoding("gzip");
        store.put(&artifact).await.unwrap();
    }
    store
        .put(&PublishedArtifact::new(
            "aws-config-inventory/historical/README.txt",
            "not an archive",
            "text/plain",
        ))
        .await
        .unwrap();
    store
        .put(&PublishedArtifact::new(
            "aws-config-inventory/current/resources.csv",
            csv,
            "text/csv",
        ))
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn list_only_returns_gzip_objects_under_prefix() {
    let store = seeded_store().await;
    let archives = list_archives(&store, PREFIX).await.unwrap();

    let keys: Vec<_> = archives.iter().map(|a| a.key.as_str()).collect();
    assert_eq!(
        keys,
        [
            "aws-config-inventory/historical/resources_20250101_000000.csv.gz",
            "aws-config-inventory/historical/resources_20250102_000000.csv.gz",
            "aws-config-inventory/historical/summary_20250101_000000.json.gz",
        ]
    );
    assert!(archives.iter().all(|a| a.size > 0 && a.last_modified.is_some()));
}

#[tokio::test]
async fn restore_writes_decompressed_file_and_reports_sizes() {
    let store = seeded_store().await;
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("restored.csv");
    let key = "aws-config-inventory/historical/resources_20250101_000000.csv.gz";

    let report = restore_archive(&store, key, Some(out.as_path())).await.unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("\"ResourceType\""));
    assert_eq!(report.output, out);
    assert_eq!(report.original_size, written.len());
    assert_eq!(report.compressed_size, store.artifact(key).unwrap().body.len());
    assert!(report.compressed_size < report.original_size);
    assert!(report.compression_ratio() > 50.0);
}

#[tokio::test]
async fn restore_of_missing_key_fails_with_not_found() {
    let store = seeded_store().await;
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("x");

    let err = restore_archive(&store, "aws-config-inventory/historical/nope.csv.gz", Some(out.as_path()))
        .await
        .unwrap_err();

    assert!(matches!(err, ArchiveError::Store(StoreError::NotFound(_))));
    assert!(!out.exists());
}

#[tokio::test]
async fn restore_of_plain_object_fails_to_decompress() {
    let store = seeded_store().await;
    let dir = tempfile::tempdir().unwrap();

    let err = restore_archive(
        &store,
        "aws-config-inventory/historical/README.txt",
        Some(dir.path().join("readme").as_path()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ArchiveError::Decompress { .. }));
}
