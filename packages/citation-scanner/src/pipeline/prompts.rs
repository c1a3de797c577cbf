//! Prompts for claim extraction.

/// Prompt asking for every claim on a page together with its cited links.
pub const CLAIMS_PROMPT: &str = r#"You are a parser that extracts claims and their reference sources from a scraped webpage article.
Read the content below and return ALL of its claims together with the sources linked from the page.

Sources appear as links inside a claim (written as "text (url)"), as reference markers, or in a bibliography elsewhere on the page.
- Every source must be returned and associated with a claim.
- A claim may have more than one source; return them as an array of strings.
- Claims must be direct quotes from the page text. Prefix and/or postfix with "..." when a claim is part of a sentence.
- Return the actual citation links, not the reference markers.
- Do not wrap the response in a Markdown code block. Do not omit any claims or sources.

Respond only with a JSON object formatted as follows:
{
    "claims": [
        {"claim": "... Example claim 1[34][35].", "sources": ["https://www.example-source-1.com/article1", "https://www.example-source-1.org/"]},
        {"claim": "... Example claim 2[65] ...", "sources": ["https://www.example-source-2.com/"]}
    ]
}

Content:
{content}"#;

/// Format the claims prompt for one document's text.
pub fn format_claims_prompt(content: &str) -> String {
    CLAIMS_PROMPT.replace("{content}", content)
}
