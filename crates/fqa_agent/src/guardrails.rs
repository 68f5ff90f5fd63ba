/// `S#` labels named on the answer's last `Citations:` line, deduplicated, in order.
///
/// Informational only: an answer without citations is still returned to the caller.
pub fn cited_source_labels(answer: &str) -> Vec<String> {
    let line = match answer
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with("Citations:"))
    {
        Some(l) => &l["Citations:".len()..],
        None => return Vec::new(),
    };

    let mut out: Vec<String> = Vec::new();
    for word in line.split(|c: char| !c.is_ascii_alphanumeric()) {
        let is_label = word.len() > 1
            && word.starts_with('S')
            && word[1..].bytes().all(|b| b.is_ascii_digit());
        if is_label && !out.iter().any(|l| l == word) {
            out.push(word.to_string());
        }
    }
    out
}
