mod common;

use tempfile::TempDir;

use common::{JobBehavior, spawn_tensorlake, test_client};
use tensorlake_tools::TensorlakeBackend;

fn backend(base_url: &str, out: &TempDir) -> TensorlakeBackend {
    let mut config = test_client(base_url).config().clone();
    config.output_dir = Some(out.path().to_string_lossy().to_string());
    let client = tensorlake_tools::TensorlakeClient::new(&config)
        .unwrap()
        .with_poll_interval(std::time::Duration::from_millis(20));
    TensorlakeBackend::with_client(client).unwrap()
}

#[tokio::test]
async fn batch_writes_markdown_and_reuses_cache() {
    let (base_url, server) = spawn_tensorlake(JobBehavior::SucceedAfter(0)).await;
    let out = TempDir::new().unwrap();
    let inputs = TempDir::new().unwrap();

    let pdf = inputs.path().join("lease.pdf");
    std::fs::write(&pdf, b"%PDF-1.7 lease").unwrap();
    let notes = inputs.path().join("notes.md");
    std::fs::write(&notes, "# already markdown").unwrap();

    let backend = backend(&base_url, &out);
    let files = vec![
        pdf.to_string_lossy().to_string(),
        notes.to_string_lossy().to_string(),
    ];

    let results = backend.parse(files.clone()).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.contains(&notes.to_string_lossy().to_string()));

    let markdown_path = results
        .iter()
        .find(|path| path.starts_with(&*out.path().to_string_lossy()))
        .unwrap()
        .clone();
    assert!(markdown_path.ends_with(".md"));
    assert_eq!(
        std::fs::read_to_string(&markdown_path).unwrap(),
        "# Lease Agreement\n\nSigned: Jane Doe"
    );
    let metadata_path = format!("{}.metadata.json", markdown_path.strip_suffix(".md").unwrap());
    assert!(std::path::Path::new(&metadata_path).exists());
    assert_eq!(server.parse_requests().len(), 1);

    // Same file, same options: served from cache
    let again = backend.parse(files).await.unwrap();
    assert_eq!(again.len(), 2);
    assert_eq!(server.parse_requests().len(), 1);
    assert_eq!(server.upload_count(), 1);
}

#[tokio::test]
async fn failed_documents_are_skipped() {
    let (base_url, _server) = spawn_tensorlake(JobBehavior::Fail).await;
    let out = TempDir::new().unwrap();
    let backend = backend(&base_url, &out);

    let results = backend
        .parse(vec![
            "https://example.com/broken.pdf".to_string(),
            "/missing/file.pdf".to_string(),
        ])
        .await
        .unwrap();

    assert!(results.is_empty());
}

#[tokio::test]
async fn url_and_local_file_with_same_name_do_not_share_output() {
    let (base_url, server) = spawn_tensorlake(JobBehavior::SucceedAfter(0)).await;
    let out = TempDir::new().unwrap();
    let inputs = TempDir::new().unwrap();
    let backend = backend(&base_url, &out);

    let pdf = inputs.path().join("lease.pdf");
    std::fs::write(&pdf, b"%PDF-1.7 lease").unwrap();
    let local = pdf.to_string_lossy().to_string();

    let first = backend
        .parse(vec![local.clone(), "https://other.example/lease.pdf".to_string()])
        .await
        .unwrap();
    assert_eq!(first.len(), 2);
    assert_ne!(first[0], first[1]);
    assert_eq!(server.parse_requests().len(), 2);

    // The URL result did not replace the local entry
    let again = backend.parse(vec![local]).await.unwrap();
    assert_eq!(again, vec![first[0].clone()]);
    assert_eq!(server.parse_requests().len(), 2);
}

#[tokio::test]
async fn same_file_name_in_different_directories() {
    let (base_url, server) = spawn_tensorlake(JobBehavior::SucceedAfter(0)).await;
    let out = TempDir::new().unwrap();
    let inputs = TempDir::new().unwrap();
    let backend = backend(&base_url, &out);

    let mut files = Vec::new();
    for dir in ["a", "b"] {
        let dir = inputs.path().join(dir);
        std::fs::create_dir_all(&dir).unwrap();
        let report = dir.join("report.pdf");
        std::fs::write(&report, format!("%PDF-1.7 {}", dir.display())).unwrap();
        files.push(report.to_string_lossy().to_string());
    }

    let results = backend.parse(files.clone()).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_ne!(results[0], results[1]);
    assert!(results.iter().all(|path| std::path::Path::new(path).exists()));
    assert_eq!(server.upload_count(), 2);

    let again = backend.parse(files).await.unwrap();
    assert_eq!(again, results);
    assert_eq!(server.upload_count(), 2);
}
