use super::*;
use crate::RagError;
use crate::generation::GenerationError;
use crate::rag::composer::UNAVAILABLE_NOTICE;
use async_trait::async_trait;

struct DownBackend;

#[async_trait]
impl GenerationBackend for DownBackend {
    async fn generate(&self, _prompt: &str) -> std::result::Result<String, GenerationError> {
        Err(GenerationError::Unavailable("connection refused".to_string()))
    }
}

struct CannedBackend(&'static str);

#[async_trait]
impl GenerationBackend for CannedBackend {
    async fn generate(&self, _prompt: &str) -> std::result::Result<String, GenerationError> {
        Ok(self.0.to_string())
    }
}

fn service_with(backend: Option<Arc<dyn GenerationBackend>>) -> RagService {
    RagService::new(ChunkingConfig::default(), RetrievalConfig::default(), backend)
}

fn offline_service() -> RagService {
    service_with(Some(Arc::new(DownBackend)))
}

#[test]
fn preview_is_truncated_at_200_chars() {
    let short = "short text";
    assert_eq!(content_preview(short), short);

    let exact = "x".repeat(200);
    assert_eq!(content_preview(&exact), exact);

    let long = "é".repeat(250);
    let preview = content_preview(&long);
    assert_eq!(preview.chars().count(), 203);
    assert!(preview.ends_with("..."));
}

#[test]
fn chunk_ids_are_unique() {
    let a = chunk_id("notes.txt", 0);
    let b = chunk_id("notes.txt", 0);
    assert!(a.starts_with("notes.txt_0_"));
    assert_eq!(a.len(), "notes.txt_0_".len() + 8);
    assert_ne!(a, b);
}

#[tokio::test]
async fn ten_word_upload_creates_one_chunk() {
    let service = offline_service();

    let summary = service
        .upload(
            "notes.txt",
            b"alpha beta gamma delta epsilon zeta eta theta iota kappa".to_vec(),
        )
        .await
        .expect("upload should succeed");

    assert_eq!(summary.chunks_created, 1);
    assert_eq!(summary.filename, "notes.txt");
    assert_eq!(
        summary.message,
        "Successfully uploaded and processed notes.txt"
    );
    assert_eq!(service.corpus_len().await, 1);

    let documents = service.documents().await;
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].id, "notes.txt");
    assert!(documents[0].content_preview.starts_with("alpha beta"));
}

#[tokio::test]
async fn chat_on_empty_corpus_reports_no_documents() {
    let service = offline_service();

    let reply = service.chat("anything?", true).await.expect("chat never fails");

    assert_eq!(reply.response, NO_DOCUMENTS_NOTICE);
    assert!(reply.sources.is_empty());
}

#[tokio::test]
async fn offline_backend_returns_retrieved_text() {
    let service = offline_service();
    service
        .ingest_text("cache.txt", "The cache is invalidated every hour by the janitor task")
        .await
        .expect("ingest should succeed");

    let reply = service
        .chat("When is the cache invalidated?", true)
        .await
        .expect("chat never fails");

    assert!(
        reply
            .response
            .contains("The cache is invalidated every hour by the janitor task")
    );
    assert!(reply.response.contains("search-only"));
    assert_eq!(reply.sources, vec!["cache.txt"]);
}

#[tokio::test]
async fn generated_answer_is_returned_verbatim() {
    let service = service_with(Some(Arc::new(CannedBackend("Every hour."))));
    service
        .ingest_text("cache.txt", "The cache is invalidated every hour")
        .await
        .expect("ingest should succeed");

    let reply = service.chat("When?", true).await.expect("chat never fails");

    assert_eq!(reply.response, "Every hour.");
    assert_eq!(reply.sources, vec!["cache.txt"]);
}

#[tokio::test]
async fn chat_without_rag_skips_retrieval() {
    let service = offline_service();
    service
        .ingest_text("a.txt", "some searchable words")
        .await
        .expect("ingest should succeed");

    let reply = service.chat("searchable", false).await.expect("chat never fails");

    assert_eq!(reply.response, UNAVAILABLE_NOTICE);
    assert!(reply.sources.is_empty());
}

#[tokio::test]
async fn two_files_yield_at_most_two_sources() {
    let service = RagService::new(
        ChunkingConfig {
            chunk_size: 5,
            overlap: 1,
        },
        RetrievalConfig::default(),
        None,
    );
    service
        .ingest_text(
            "rust.txt",
            "rust ownership borrowing lifetimes traits generics macros cargo crates modules",
        )
        .await
        .expect("ingest should succeed");
    service
        .ingest_text(
            "garden.txt",
            "tomatoes basil watering soil compost seedlings mulch pruning harvest sunlight",
        )
        .await
        .expect("ingest should succeed");

    let reply = service
        .chat("rust traits and tomatoes", true)
        .await
        .expect("chat never fails");

    assert!(!reply.sources.is_empty());
    assert!(reply.sources.len() <= 2);
    assert!(reply.response.contains("Document 1: "));
    assert!(reply.response.contains("Document 3: "));
    assert!(!reply.response.contains("Document 4: "));
}

#[tokio::test]
async fn documents_list_one_entry_per_file() {
    let service = RagService::new(
        ChunkingConfig {
            chunk_size: 3,
            overlap: 0,
        },
        RetrievalConfig::default(),
        None,
    );
    service
        .ingest_text("b.txt", "one two three four five six seven")
        .await
        .expect("ingest should succeed");
    service
        .ingest_text("a.txt", "eight nine ten")
        .await
        .expect("ingest should succeed");

    assert_eq!(service.chunk_count().await, 4);
    let documents = service.documents().await;
    assert_eq!(
        documents.iter().map(|d| d.filename.as_str()).collect::<Vec<_>>(),
        vec!["b.txt", "a.txt"]
    );
    assert_eq!(documents[0].content_preview, "one two three");
}

#[tokio::test]
async fn clear_resets_everything() {
    let service = offline_service();
    service
        .ingest_text("a.txt", "some words to index")
        .await
        .expect("ingest should succeed");

    service.clear().await;
    service.clear().await;

    assert_eq!(service.corpus_len().await, 0);
    assert_eq!(service.chunk_count().await, 0);
    assert!(service.documents().await.is_empty());
    let reply = service.chat("words", true).await.expect("chat never fails");
    assert_eq!(reply.response, NO_DOCUMENTS_NOTICE);
}

#[tokio::test]
async fn unsupported_upload_is_client_error() {
    let service = offline_service();

    let error = service
        .upload("image.png", vec![1, 2, 3])
        .await
        .expect_err("png is not supported");

    assert!(error.is_client_error());
    assert!(matches!(error, RagError::Extraction(_)));
    assert_eq!(service.corpus_len().await, 0);
}

#[tokio::test]
async fn empty_upload_does_not_mutate_state() {
    let service = offline_service();

    let error = service
        .upload("blank.txt", b"  \n\t ".to_vec())
        .await
        .expect_err("blank text has no chunks");

    assert!(error.is_client_error());
    assert!(matches!(error, RagError::Chunking(_)));
    assert_eq!(service.corpus_len().await, 0);
    assert_eq!(service.chat("x", true).await.expect("chat").response, NO_DOCUMENTS_NOTICE);
}

#[tokio::test]
async fn stored_embeddings_keep_fixed_width() {
    let service = offline_service();
    service
        .ingest_text("tiny.txt", "apple banana cherry")
        .await
        .expect("ingest should succeed");

    let state = service.state.read().await;
    assert_eq!(state.engine.vocabulary_size(), 3);
    assert!(
        state
            .store
            .list_all()
            .iter()
            .all(|chunk| chunk.embedding.len() == 500)
    );
    assert_eq!(
        state.engine.embed_query("banana").expect("fitted").len(),
        500
    );
}

#[tokio::test]
async fn stale_embeddings_are_kept_by_default() {
    let service = offline_service();
    service
        .ingest_text("first.txt", "apple banana")
        .await
        .expect("ingest should succeed");
    let before = service.state.read().await.store.list_all()[0].embedding.clone();

    service
        .ingest_text("second.txt", "aardvark apple")
        .await
        .expect("ingest should succeed");

    let state = service.state.read().await;
    assert_eq!(state.store.list_all()[0].embedding, before);
    assert_ne!(
        state.engine.embed("apple banana").expect("fitted"),
        before
    );
}

#[tokio::test]
async fn reembed_on_refit_refreshes_old_chunks() {
    let service = RagService::new(
        ChunkingConfig::default(),
        RetrievalConfig {
            reembed_on_refit: true,
            ..RetrievalConfig::default()
        },
        None,
    );
    service
        .ingest_text("first.txt", "apple banana")
        .await
        .expect("ingest should succeed");
    service
        .ingest_text("second.txt", "aardvark apple")
        .await
        .expect("ingest should succeed");

    let state = service.state.read().await;
    for chunk in state.store.list_all() {
        assert_eq!(
            chunk.embedding,
            state.engine.embed(&chunk.text).expect("fitted")
        );
    }
}

#[tokio::test]
async fn failed_insert_rolls_back_corpus_and_model() {
    let service = offline_service();
    service
        .ingest_text("kept.txt", "apple banana cherry")
        .await
        .expect("ingest should succeed");

    {
        let mut state = service.state.write().await;
        let existing = state.store.list_all().to_vec();
        let mut narrower = VectorStore::new(499);
        narrower
            .insert(
                existing.iter().map(|c| c.id.clone()).collect(),
                existing.iter().map(|c| c.embedding[..499].to_vec()).collect(),
                existing.iter().map(|c| c.text.clone()).collect(),
                existing.iter().map(|c| c.metadata.clone()).collect(),
            )
            .expect("narrower store accepts trimmed vectors");
        state.store = narrower;
    }

    let error = service
        .ingest_text("rejected.txt", "durian elderberry fig")
        .await
        .expect_err("dimension mismatch should fail the insert");
    assert!(matches!(error, RagError::Store(_)));
    assert!(!error.is_client_error());

    let state = service.state.read().await;
    assert_eq!(state.corpus, vec!["apple banana cherry".to_string()]);
    assert_eq!(state.store.len(), 1);
    assert_eq!(state.engine.vocabulary_size(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_uploads_and_chats_see_whole_uploads() {
    const FILES: usize = 8;
    // 250 four-word phrases make 1000 words, three windows at the default size
    const CHUNKS_PER_FILE: usize = 3;

    let service = Arc::new(offline_service());
    let filenames = (0..FILES)
        .map(|i| format!("doc{}.txt", i))
        .collect::<Vec<_>>();

    let uploads = filenames
        .iter()
        .enumerate()
        .map(|(i, filename)| {
            let service = Arc::clone(&service);
            let filename = filename.clone();
            tokio::spawn(async move {
                let text = (0..250)
                    .map(|w| format!("shared topic file{} word{}", i, w % 50))
                    .collect::<Vec<_>>()
                    .join(" ");
                service
                    .ingest_text(&filename, &text)
                    .await
                    .expect("ingest should succeed")
            })
        })
        .collect::<Vec<_>>();

    let readers = (0..FILES)
        .map(|_| {
            let service = Arc::clone(&service);
            let filenames = filenames.clone();
            tokio::spawn(async move {
                for _ in 0..20 {
                    {
                        let state = service.state.read().await;
                        assert_eq!(state.corpus.len(), state.store.len());
                        assert_eq!(state.engine.is_fitted(), !state.corpus.is_empty());
                        for filename in &filenames {
                            let stored = state
                                .store
                                .list_all()
                                .iter()
                                .filter(|c| &c.metadata.filename == filename)
                                .count();
                            assert!(stored == 0 || stored == CHUNKS_PER_FILE);
                        }
                    }

                    let reply = service
                        .chat("shared topic", true)
                        .await
                        .expect("chat should succeed");
                    if reply.sources.is_empty() {
                        assert_eq!(reply.response, NO_DOCUMENTS_NOTICE);
                    } else {
                        assert!(reply.response.contains("Retrieved Information"));
                        assert!(reply.sources.iter().all(|s| filenames.contains(s)));
                    }
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect::<Vec<_>>();

    for upload in uploads {
        let summary = upload.await.expect("upload task should not panic");
        assert_eq!(summary.chunks_created, CHUNKS_PER_FILE);
    }
    for reader in readers {
        reader.await.expect("reader task should not panic");
    }

    assert_eq!(service.corpus_len().await, service.chunk_count().await);
    assert_eq!(service.chunk_count().await, FILES * CHUNKS_PER_FILE);
    assert_eq!(service.documents().await.len(), FILES);
}
