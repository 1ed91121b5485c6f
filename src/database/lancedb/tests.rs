use super::*;
use std::path::PathBuf;

fn sample_chunk() -> ContentChunk {
    ContentChunk {
        content: "Negara Indonesia ialah Negara Kesatuan, yang berbentuk Republik.".to_string(),
        source: PathBuf::from("data/UUD45_SatuNaskah.pdf"),
        page: 2,
        chunk_index: 1,
    }
}

#[test]
fn record_from_chunk_copies_metadata() {
    let record = EmbeddingRecord::from_chunk(&sample_chunk(), vec![0.1, 0.2, 0.3]);

    assert_eq!(record.vector, vec![0.1, 0.2, 0.3]);
    assert_eq!(record.metadata.source, "data/UUD45_SatuNaskah.pdf");
    assert_eq!(record.metadata.page, 2);
    assert_eq!(record.metadata.chunk_index, 1);
    assert!(record.metadata.content.starts_with("Negara Indonesia"));
    assert!(
        chrono::DateTime::parse_from_rfc3339(&record.metadata.created_at).is_ok(),
        "created_at should be RFC 3339: {}",
        record.metadata.created_at
    );
}

#[test]
fn record_ids_are_unique() {
    let chunk = sample_chunk();
    let first = EmbeddingRecord::from_chunk(&chunk, vec![1.0]);
    let second = EmbeddingRecord::from_chunk(&chunk, vec![1.0]);

    assert_ne!(first.id, second.id);
    assert!(Uuid::parse_str(&first.id).is_ok());
}

#[test]
fn chunk_metadata_serialization() {
    let metadata = ChunkMetadata {
        source: "data/UU Nomor 30 Tahun 2002.pdf".to_string(),
        page: 7,
        chunk_index: 0,
        content: "Komisi Pemberantasan Korupsi".to_string(),
        created_at: "2025-01-01T00:00:00+00:00".to_string(),
    };

    let json = serde_json::to_string(&metadata).expect("can serialize json");
    let deserialized: ChunkMetadata = serde_json::from_str(&json).expect("can parse json");

    assert_eq!(metadata, deserialized);
}
