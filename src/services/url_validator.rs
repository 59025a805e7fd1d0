/// Decide whether a playlist location line is accepted as a playable stream.
///
/// Accepts `http://`, `https://` and `rtmp*` prefixes (case-insensitive),
/// or any string containing `m3u8` or `ts`. The substring fallback is loose
/// on purpose: it admits scheme-less and protocol-relative stream URLs, and
/// it also admits unrelated strings such as `stats` or `tsx`.
pub fn is_acceptable(candidate: &str) -> bool {
    if candidate.is_empty() {
        return false;
    }

    let lower = candidate.to_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("rtmp")
        || lower.contains("m3u8")
        || lower.contains("ts")
}
