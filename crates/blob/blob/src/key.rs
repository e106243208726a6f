use crate::error::BlobError;

/// Reject scope or hash values that cannot safely name a storage location.
pub fn validate_key_component(value: &str) -> Result<(), BlobError> {
    if value.is_empty()
        || value == "."
        || value == ".."
        || value.starts_with('.')
        || value.contains(['/', '\\', '\0'])
    {
        return Err(BlobError::InvalidKey(value.to_owned()));
    }
    Ok(())
}

/// Strip any directory components from a client-supplied file name.
///
/// Returns `None` when nothing usable is left.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches('\0');
    if base.is_empty() || base == "." || base == ".." {
        return None;
    }
    Some(base.to_owned())
}
