
use std::fmt::Write as _;

use clap::ValueEnum;

use super::AnswerContext;
use crate::store::SearchResult;

/// Length and depth of the final answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ResponseMode {
    #[default]
    Concise,
    Detailed,
}

impl ResponseMode {
    #[inline]
    pub fn instructions(self) -> &'static str {
        match self {
            Self::Concise => {
                "Give a short, 2–3 sentence answer with only necessary details. \
                 If you use sources, mention 1–2 briefly."
            }
            Self::Detailed => {
                "Give an in-depth answer with explanation, examples, and 3 practical action items. \
                 If you use sources, clearly mention them."
            }
        }
    }
}

/// Render retrieved chunks as a context block; empty when nothing was retrieved
#[inline]
pub fn format_document_context(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return String::new();
    }

    let mut context = String::from("Relevant documents:\n");
    for result in results {
        let metadata = &result.chunk_metadata;
        // Writing into a String cannot fail
        let _ = write!(
            context,
            "- Source: {} | chunk_index: {}\n{}\n\n",
            metadata.source, metadata.chunk_index, metadata.text
        );
    }
    context
}

/// Build the final instruction prompt for the language model
#[inline]
pub fn build_answer_prompt(query: &str, mode: ResponseMode, context: &AnswerContext) -> String {
    let prompt = format!(
        "You are an expert assistant. Use the following retrieved document context and web search summary\n\
         to answer the user's query. If the context is empty, fall back to general knowledge.\n\
         \n\
         User query:\n\
         {query}\n\
         \n\
         Response style:\n\
         {style}\n\
         \n\
         Document context:\n\
         {documents}\n\
         \n\
         Web search summary:\n\
         {web}\n\
         \n\
         Now provide the answer in the requested style.",
        style = mode.instructions(),
        documents = format_document_context(&context.retrieved),
        web = context.web_summary,
    );
    prompt.trim().to_string()
}
