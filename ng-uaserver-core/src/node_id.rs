/// Sanitize a browse name into a stable string node id.
///
/// `[A-Za-z0-9._-]` are kept, everything else becomes `-`. Clients map nodes
/// by these ids, so the policy must not change between releases.
pub fn sanitize_node_id(input: &str) -> String {
    input
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '-'
            }
        })
        .collect()
}
