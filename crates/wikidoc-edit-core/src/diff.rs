use similar::TextDiff;

pub fn build_unified_diff(original: &str, modified: &str, label: &str) -> Option<String> {
    if original == modified {
        return None;
    }

    let diff = TextDiff::from_lines(original, modified);
    let header_old = format!("a/{label}");
    let header_new = format!("b/{label}");

    Some(
        diff.unified_diff()
            .header(&header_old, &header_new)
            .to_string(),
    )
}
