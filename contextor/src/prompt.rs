//! Context strings handed to the assistant as the user's content turn.
//!
//! Every variant contains the user's message so the assistant never loses
//! it, whatever retrieval produced.

use std::fmt::Write as _;

use crate::rerank::RankedDocument;

/// Zero candidates came back from the vector store.
pub fn no_candidates(message: &str) -> String {
    format!("No relevant documents found in the knowledgebase for user message: \"{message}\"")
}

/// Candidates existed but none reached the threshold.
pub fn below_threshold(message: &str, threshold: f32) -> String {
    format!(
        "No relevant documents found at or above the relevance threshold of {threshold:.2} for user message: \"{message}\""
    )
}

/// Retrieval failed; the assistant gets the bare message.
pub fn message_only(message: &str) -> String {
    format!("User message: \"{message}\"")
}

/// Numbered document blocks with a preamble and a closing marker.
pub fn format_documents(message: &str, docs: &[RankedDocument]) -> String {
    let mut out = format!(
        "The following are the top {} most relevant documents for the user message: \"{message}\"\n\n",
        docs.len()
    );

    for (i, d) in docs.iter().enumerate() {
        let item = &d.item;
        let _ = writeln!(out, "Document {}:", i + 1);
        let _ = writeln!(out, "Filename: {}", item.filename);
        let _ = writeln!(out, "Filetype: {}", item.filetype);
        let _ = writeln!(out, "Languages: {}", item.languages);
        if let Some(page) = &item.page_number {
            let _ = writeln!(out, "Page Number: {page}");
        }
        let _ = writeln!(out, "Relevance Score: {:.4}", d.relevance);
        let _ = writeln!(out, "Text: {}", item.text);
        let _ = writeln!(out, "Citation: {}", item.citation);
        out.push('\n');
    }

    out.push_str("End of retrieved documents.");
    out
}
