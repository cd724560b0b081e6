use uuid::Uuid;

/// Mint a document-unique node id.
///
/// Ids are UUIDv4-backed so concurrent call sites need no shared counter;
/// collision probability is negligible even at ~10^5 nodes per document.
/// An optional prefix keeps ids readable in serialized documents
/// (`"heading-1f9e..."`).
pub fn new_id(prefix: Option<&str>) -> String {
    let raw = Uuid::new_v4().simple().to_string();
    match prefix {
        Some(p) if !p.is_empty() => format!("{}-{}", p, raw),
        _ => raw,
    }
}
