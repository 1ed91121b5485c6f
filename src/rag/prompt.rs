use crate::database::SearchResult;

const PROMPT_TEMPLATE: &str = "Anda adalah asisten AI hukum yang ahli dalam hukum Indonesia.
Jawablah pertanyaan pengguna dengan mengacu pada dokumen hukum berikut.
Berikan jawaban yang akurat, jelas, dan mengutip pasal/ayat yang relevan jika ada.

Konteks dari dokumen hukum:
{context}

Pertanyaan pengguna:
{question}

Jawaban yang jelas, ringkas, dan relevan dengan mengutip dasar hukum yang sesuai:";

/// Fill the legal-assistant template with the retrieved context and the question
#[inline]
pub fn build_prompt(context: &str, question: &str) -> String {
    // Split once so a `{question}` inside the context is left alone
    let (head, tail) = PROMPT_TEMPLATE
        .split_once("{context}")
        .unwrap_or((PROMPT_TEMPLATE, ""));

    let mut prompt = String::with_capacity(PROMPT_TEMPLATE.len() + context.len() + question.len());
    prompt.push_str(head);
    prompt.push_str(context);
    prompt.push_str(&tail.replacen("{question}", question, 1));
    prompt
}

/// Chunk contents joined by a blank line, in retrieval order
#[inline]
pub fn join_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|result| result.metadata.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
