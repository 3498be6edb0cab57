/// Replace each line-break character with one space. Nothing is trimmed or collapsed.
pub fn normalize_body(body: &str) -> String {
    body.chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

/// Text the tokenizer can accept. NUL marks binary content that leaked into a text field.
pub fn is_text(value: &str) -> bool {
    !value.contains('\0')
}
