#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

//! End-to-end retrieval over generated PDFs with deterministic providers
use std::sync::Arc;

use legal_rag::RagError;
use legal_rag::config::Config;
use legal_rag::database::VectorStoreManager;
use legal_rag::documents::load_documents;
use legal_rag::embeddings::chunk_pages;
use legal_rag::mock::{EchoGenerator, HashEmbedder, write_sample_corpus, write_test_pdf};
use legal_rag::rag::RagPipeline;
use tempfile::TempDir;

fn corpus_config() -> (Arc<Config>, TempDir) {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Arc::new(Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    });
    write_sample_corpus(&config).expect("should write corpus");
    (config, temp_dir)
}

fn chunk_count(config: &Config) -> usize {
    let pages = load_documents(&config.pdf_files()).expect("should load documents");
    chunk_pages(&pages, &config.chunking)
        .expect("should chunk documents")
        .len()
}

fn manager(config: &Arc<Config>, embedder: &Arc<HashEmbedder>) -> VectorStoreManager {
    VectorStoreManager::new(Arc::clone(config), Arc::<HashEmbedder>::clone(embedder))
}

#[tokio::test]
async fn build_then_reopen_across_restarts() {
    let (config, _temp_dir) = corpus_config();
    let expected = chunk_count(&config);

    let first_embedder = Arc::new(HashEmbedder::default());
    {
        let mut first = manager(&config, &first_embedder);
        let store = first.get_or_build().await.expect("should build store");
        assert_eq!(
            store.count_embeddings().await.expect("should count"),
            expected as u64
        );
    }
    assert_eq!(first_embedder.call_count(), expected);

    // Simulated restart: a new manager over the same directory
    let second_embedder = Arc::new(HashEmbedder::default());
    let mut second = manager(&config, &second_embedder);
    let store = second.get_or_build().await.expect("should open store");
    assert_eq!(
        store.count_embeddings().await.expect("should count"),
        expected as u64
    );
    assert_eq!(second_embedder.call_count(), 0);
}

#[tokio::test]
async fn existing_store_is_trusted_when_documents_change() {
    let (config, _temp_dir) = corpus_config();
    let expected = chunk_count(&config) as u64;

    {
        let mut first = manager(&config, &Arc::new(HashEmbedder::default()));
        first.get_or_build().await.expect("should build store");
    }

    let extra_pages = ["Halaman tambahan satu", "Halaman tambahan dua"];
    write_test_pdf(&config.pdf_files()[0], &extra_pages).expect("should rewrite pdf");

    let embedder = Arc::new(HashEmbedder::default());
    let mut second = manager(&config, &embedder);
    let store = second.get_or_build().await.expect("should open store");

    assert_eq!(store.count_embeddings().await.expect("should count"), expected);
    assert_eq!(embedder.call_count(), 0);
}

#[tokio::test]
async fn query_returns_at_most_three_nearest_first() {
    let (config, _temp_dir) = corpus_config();
    let mut manager = manager(&config, &Arc::new(HashEmbedder::new(256)));

    let results = manager
        .query("Bumi dan air dikuasai oleh negara", config.retrieval.top_k)
        .await
        .expect("query should succeed");

    assert_eq!(results.len(), 3);
    assert!(results[0].metadata.content.contains("Bumi dan air"));
    assert_eq!(results[0].metadata.page, 2);
    for pair in results.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
}

#[tokio::test]
async fn fewer_chunks_than_k_returns_all() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Arc::new(Config {
        base_dir: temp_dir.path().to_path_buf(),
        documents: legal_rag::config::DocumentsConfig {
            files: vec!["ringkas.pdf".to_string()],
            ..Default::default()
        },
        ..Config::default()
    });
    write_test_pdf(
        &config.pdf_files()[0],
        &["Pasal 1\nKetentuan umum.", "Pasal 2\nKetentuan peralihan."],
    )
    .expect("should write pdf");

    let mut manager = manager(&config, &Arc::new(HashEmbedder::default()));
    let results = manager
        .query("Ketentuan", 3)
        .await
        .expect("query should succeed");

    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn same_question_gives_same_prompt() {
    let (config, _temp_dir) = corpus_config();
    let generator = Arc::new(EchoGenerator::new("Jawaban tetap."));
    let pipeline = RagPipeline::new(
        manager(&config, &Arc::new(HashEmbedder::default())),
        Arc::<EchoGenerator>::clone(&generator),
        config.retrieval.top_k,
    );

    let question = "Apakah Komisi Pemberantasan Korupsi independen?";
    let first = pipeline.answer(question).await.expect("first answer");
    let second = pipeline.answer(question).await.expect("second answer");

    assert_eq!(first.text, "Jawaban tetap.");
    assert_eq!(first.text, second.text);
    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0], prompts[1]);

    let first_contents: Vec<_> = first.context.iter().map(|r| &r.metadata.content).collect();
    let second_contents: Vec<_> = second.context.iter().map(|r| &r.metadata.content).collect();
    assert_eq!(first_contents, second_contents);
}

#[tokio::test]
async fn missing_pdf_names_the_file() {
    let (config, _temp_dir) = corpus_config();
    let missing = config.pdf_files()[3].clone();
    std::fs::remove_file(&missing).expect("should remove pdf");

    let pipeline = RagPipeline::new(
        manager(&config, &Arc::new(HashEmbedder::default())),
        Arc::new(EchoGenerator::new("tidak dipakai")),
        3,
    );

    let err = pipeline
        .answer("Apa itu TNI?")
        .await
        .expect_err("missing pdf should fail");

    match &err {
        RagError::MissingFile { path } => assert_eq!(path, &missing),
        other => panic!("expected missing file error, got {other:?}"),
    }
    assert!(err.to_string().starts_with("File tidak ditemukan:"));
    assert!(err.to_string().contains("UU Nomor 3 Tahun 2025.pdf"));
    assert!(!pipeline.is_ready().await);
}
