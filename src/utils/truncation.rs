const MAX_EVIDENCE_LENGTH: usize = 512;

/// Shorten text for findings and log lines without splitting a UTF-8 character.
pub fn truncate_evidence(text: &str) -> String {
    if text.len() <= MAX_EVIDENCE_LENGTH {
        return text.to_string();
    }
    let mut end = MAX_EVIDENCE_LENGTH;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated {} bytes]", &text[..end], text.len() - end)
}
