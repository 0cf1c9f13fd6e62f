use crate::models::Record;

const QUESTION_PREFIX: &str = "Please review the following pull request diff:\n";

const CONTEXT_PREAMBLE: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

/// Chat-template control tokens that must never reach the model verbatim.
const CONTROL_TOKENS: &[&str] = &["<|im_start|>", "<|im_end|>", "<|endoftext|>"];

/// A review question plus the corpus records retrieved for it.
#[derive(Debug, Clone)]
pub struct ReviewPrompt {
    pub question: String,
    pub context: Vec<Record>,
}

impl ReviewPrompt {
    pub fn for_diff(diff: &str, context: Vec<Record>) -> Self {
        Self {
            question: format!("{QUESTION_PREFIX}{}", sanitize_for_prompt(diff)),
            context,
        }
    }

    /// Render as a single user message: preamble, retrieved records
    /// separated by blank lines, then the question.
    pub fn render(&self) -> String {
        let mut out = String::from(CONTEXT_PREAMBLE);
        out.push_str("\n\n");

        let context = self
            .context
            .iter()
            .map(|r| sanitize_for_prompt(&r.text))
            .collect::<Vec<_>>()
            .join("\n\n");
        out.push_str(&context);

        out.push_str("\n\nQuestion: ");
        out.push_str(&self.question);
        out.push_str("\nHelpful Answer:");
        out
    }
}

/// Strip chat-template control tokens from user-supplied text.
pub fn sanitize_for_prompt(text: &str) -> String {
    let mut out = text.to_string();
    for token in CONTROL_TOKENS {
        if out.contains(token) {
            out = out.replace(token, "");
        }
    }
    out
}
