//! Prompt asking the model for the document's reference code

/// Build the reference-code prompt around (already truncated) page text
pub fn reference_code_prompt(page_text: &str) -> String {
    format!(
        r#"Analyze the following text extracted from a business PDF document.
Your goal is to find a specific Reference Number, Policy Number, Order ID, or PB Number that needs to be stamped.

Common formats include: "PB 123456", "Ref: #999", "PO-2024-X".

Return ONLY the code/number string found. Do not add labels like "Found:" or markdown.
If multiple exist, pick the most likely primary identifier.
If nothing resembling a code is found, return an empty string.

Text content:
"{}""#,
        page_text
    )
}

/// First `limit` characters of `text` (never splits a character)
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
