/// System prompt for an agent that is expected to call the document tool itself.
pub const REACT_SYSTEM_PROMPT: &str = "I have a document that needs to be parsed.\n\nPlease parse this document and answer the question about it.";

const SIGNATURE_ANALYSIS_PREAMBLE: &str = "You are a helpful assistant that answers questions about documents with signature detection data.

Your responsibilities:
1. Answer questions based on that loaded data
2. Help users understand the signature analysis results

You can answer questions like:
- How many signatures were found?
- Which pages contain signatures?
- Who signed the document?
- What does the content say around signatures?
- What type of document is this?
- Who are the parties involved?
- What is the date of the signature?
- Did each party sign the document?
- Are there any missing signatures on any pages?
- Which property is missing signatures?
- Who is the agent for the properties missing signatures?";

/// Prompt asking the model to answer `questions` about an already parsed
/// document. Questions are numbered from 1.
pub fn build_document_analysis_prompt<S: AsRef<str>>(parsed_result: &str, questions: &[S]) -> String {
    let question_block = questions
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {}", i + 1, q.as_ref()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{SIGNATURE_ANALYSIS_PREAMBLE}\n\nI've processed a document and got this result:\n{parsed_result}\n\nPlease analyze the above parsed output and answer the following:\n{question_block}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn questions_are_numbered() {
        let prompt = build_document_analysis_prompt(
            "# Lease\nSigned by Jane Doe",
            &["Who signed?", "Are any signatures missing?"],
        );

        assert!(prompt.contains("I've processed a document and got this result:\n# Lease\nSigned by Jane Doe"));
        assert!(prompt.ends_with("answer the following:\n1. Who signed?\n2. Are any signatures missing?\n"));
    }

    #[test]
    fn single_question() {
        let prompt = build_document_analysis_prompt("text", &[String::from("How many signatures?")]);
        assert!(prompt.contains("\n1. How many signatures?\n"));
        assert!(!prompt.contains("\n2. "));
    }
}
