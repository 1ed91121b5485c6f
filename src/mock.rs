//! Deterministic stand-ins for the external collaborators.
//!
//! Tests and local experiments swap these in for the Gemini clients so the
//! pipeline can run without network access. [`write_test_pdf`] produces small
//! but real PDF files for exercising the document loader.

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::config::Config;
use crate::embeddings::EmbeddingProvider;
use crate::generation::AnswerGenerator;
use crate::{RagError, Result};

/// Embeds text by hashing its words into a fixed number of buckets.
///
/// Texts that share words end up close to each other, which is enough for
/// similarity search to behave sensibly in tests. Every embedded text is
/// counted so callers can assert how often the provider was hit.
#[derive(Debug)]
pub struct HashEmbedder {
    dimension: usize,
    calls: AtomicUsize,
}

impl HashEmbedder {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of texts embedded so far
    #[inline]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimension];

        for word in text.split_whitespace() {
            let word = word.to_lowercase();
            let bucket = word
                .bytes()
                .fold(5381_usize, |hash, b| hash.wrapping_mul(33) ^ usize::from(b))
                % self.dimension;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

impl Default for HashEmbedder {
    #[inline]
    fn default() -> Self {
        Self::new(16)
    }
}

impl EmbeddingProvider for HashEmbedder {
    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vectorize(text))
    }
}

/// Embedding provider that always fails, like an unreachable API
#[derive(Debug, Default)]
pub struct FailingEmbedder;

impl EmbeddingProvider for FailingEmbedder {
    #[inline]
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::Embedding("embedding service unavailable".to_string()))
    }
}

/// Generator returning a fixed response and remembering every prompt it saw
#[derive(Debug)]
pub struct EchoGenerator {
    response: String,
    prompts: Mutex<Vec<String>>,
}

impl EchoGenerator {
    #[inline]
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, oldest first
    #[inline]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }

    #[inline]
    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|prompts| prompts.len()).unwrap_or(0)
    }
}

impl AnswerGenerator for EchoGenerator {
    #[inline]
    fn generate(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        Ok(self.response.clone())
    }
}

/// Generator that always fails, like a rejected API key
#[derive(Debug, Default)]
pub struct FailingGenerator;

impl AnswerGenerator for FailingGenerator {
    #[inline]
    fn generate(&self, _prompt: &str) -> Result<String> {
        Err(RagError::Generation("API key not valid".to_string()))
    }
}

/// Write a PDF with one page per entry in `pages`; each line of an entry becomes a text line.
#[inline]
pub fn write_test_pdf(path: &Path, pages: &[&str]) -> Result<()> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page_text in pages {
        // One text object per line so extraction sees a line break after each
        let mut operations = Vec::new();
        for (y, line) in (0..780_i64).rev().step_by(12).zip(page_text.lines()) {
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 10.into()]),
                Operation::new("Td", vec![50.into(), y.into()]),
                Operation::new("Tj", vec![Object::string_literal(line)]),
                Operation::new("ET", vec![]),
            ]);
        }

        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| RagError::Pdf(format!("Failed to encode page content: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = i64::try_from(kids.len())
        .map_err(|e| RagError::Pdf(format!("Too many pages: {}", e)))?;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    doc.save(path)
        .map_err(|e| RagError::Pdf(format!("Failed to write {}: {}", path.display(), e)))?;
    Ok(())
}

/// Page texts of a small stand-in corpus, one entry per configured document
pub const SAMPLE_CORPUS: [&[&str]; 4] = [
    &[
        "Pasal 1\nNegara Indonesia ialah Negara Kesatuan, yang berbentuk Republik.\nKedaulatan berada di tangan rakyat.",
        "Pasal 33\nBumi dan air dan kekayaan alam yang terkandung di dalamnya\ndikuasai oleh negara untuk kemakmuran rakyat.",
    ],
    &[
        "Cipta Kerja\nPeraturan ini mengatur kemudahan berusaha dan perlindungan pekerja.",
        "Ketenagakerjaan\nPerjanjian kerja waktu tertentu dibuat secara tertulis.",
    ],
    &[
        "Komisi Pemberantasan Korupsi\nKomisi bersifat independen dan bebas dari pengaruh kekuasaan manapun.",
    ],
    &[
        "Tentara Nasional Indonesia\nPrajurit aktif dapat menduduki jabatan pada kementerian tertentu.",
    ],
];

/// Write [`SAMPLE_CORPUS`] to the configured PDF paths, pairing files and entries in order
#[inline]
pub fn write_sample_corpus(config: &Config) -> Result<()> {
    for (path, pages) in config.pdf_files().iter().zip(SAMPLE_CORPUS) {
        write_test_pdf(path, pages)?;
    }
    Ok(())
}
