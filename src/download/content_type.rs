//! Content-Type to file extension mapping.
//!
//! The table is a process-wide constant. Lookups use the MIME essence
//! (`type/subtype`, lowercased, parameters stripped); unknown types fall back
//! to the subtype itself.

/// Known MIME types and the extension used for them.
const CONTENT_TYPE_EXTENSIONS: &[(&str, &str)] = &[
    // Images
    ("image/jpeg", "jpeg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/bmp", "bmp"),
    ("image/webp", "webp"),
    ("image/svg+xml", "svg"),
    ("image/tiff", "tiff"),
    ("image/heif", "heif"),
    // Documents
    ("application/pdf", "pdf"),
    ("application/msword", "doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
    ("application/vnd.ms-excel", "xls"),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xlsx",
    ),
    ("application/vnd.ms-powerpoint", "ppt"),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "pptx",
    ),
    ("application/rtf", "rtf"),
    // Archives
    ("application/zip", "zip"),
    ("application/x-tar", "tar"),
    ("application/x-rar-compressed", "rar"),
    ("application/x-7z-compressed", "7z"),
    ("application/x-gzip", "gz"),
    // Text
    ("text/plain", "txt"),
    ("text/html", "html"),
    ("text/css", "css"),
    ("text/javascript", "js"),
    ("application/javascript", "js"),
    // Data
    ("application/json", "json"),
    ("application/xml", "xml"),
    ("application/octet-stream", "bin"),
    // Audio
    ("audio/mpeg", "mp3"),
    ("audio/wav", "wav"),
    ("audio/ogg", "ogg"),
    ("audio/flac", "flac"),
    // Video
    ("video/mp4", "mp4"),
    ("video/x-msvideo", "avi"),
    ("video/x-matroska", "mkv"),
    ("video/quicktime", "mov"),
    ("video/x-flv", "flv"),
];

/// Returns the mapped extension for a MIME essence such as `image/png`.
#[must_use]
pub fn lookup_extension(mime: &str) -> Option<&'static str> {
    CONTENT_TYPE_EXTENSIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(mime))
        .map(|(_, ext)| *ext)
}

/// Splits a Content-Type header value into its lowercased essence and subtype.
///
/// Returns `None` for empty values and values without a non-empty subtype.
fn parse_mime(content_type: &str) -> Option<(String, String)> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    let (kind, subtype) = essence.split_once('/')?;
    let subtype = subtype.trim();
    if kind.trim().is_empty() || subtype.is_empty() {
        return None;
    }
    let subtype = subtype.to_string();
    Some((essence, subtype))
}

/// Resolves the extension for a download.
///
/// An explicit `format_override` always wins and is returned unchanged. Otherwise
/// the content type is looked up in the table, falling back to its subtype.
/// `None` means no extension is determinable from the content type; the caller
/// falls back to the URL.
#[must_use]
pub fn resolve_extension(content_type: Option<&str>, format_override: Option<&str>) -> Option<String> {
    if let Some(format) = format_override {
        return Some(format.to_string());
    }

    let (essence, subtype) = parse_mime(content_type?)?;
    Some(
        lookup_extension(&essence)
            .map(str::to_string)
            .unwrap_or(subtype),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_covers_every_category() {
        assert_eq!(lookup_extension("image/svg+xml"), Some("svg"));
        assert_eq!(lookup_extension("application/msword"), Some("doc"));
        assert_eq!(
            lookup_extension(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            ),
            Some("xlsx")
        );
        assert_eq!(lookup_extension("application/x-7z-compressed"), Some("7z"));
        assert_eq!(lookup_extension("text/plain"), Some("txt"));
        assert_eq!(lookup_extension("application/octet-stream"), Some("bin"));
        assert_eq!(lookup_extension("audio/mpeg"), Some("mp3"));
        assert_eq!(lookup_extension("video/x-matroska"), Some("mkv"));
        assert_eq!(lookup_extension("video/unknown"), None);
    }

    #[test]
    fn test_both_javascript_types_map_to_js() {
        assert_eq!(lookup_extension("text/javascript"), Some("js"));
        assert_eq!(lookup_extension("application/javascript"), Some("js"));
    }

    #[test]
    fn test_override_wins_over_content_type() {
        assert_eq!(
            resolve_extension(Some("image/png"), Some("webp")),
            Some("webp".to_string())
        );
        assert_eq!(resolve_extension(None, Some("tar.gz")), Some("tar.gz".to_string()));
    }

    #[test]
    fn test_parameters_are_stripped_before_lookup() {
        assert_eq!(
            resolve_extension(Some("text/plain; charset=utf-8"), None),
            Some("txt".to_string())
        );
        assert_eq!(
            resolve_extension(Some("application/json;q=0.9"), None),
            Some("json".to_string())
        );
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(resolve_extension(Some("Image/PNG"), None), Some("png".to_string()));
    }

    #[test]
    fn test_unknown_type_falls_back_to_subtype() {
        assert_eq!(
            resolve_extension(Some("application/x-custom; v=2"), None),
            Some("x-custom".to_string())
        );
    }

    #[test]
    fn test_full_mime_is_used_not_subtype() {
        // subtype alone would give "mpeg"
        assert_eq!(resolve_extension(Some("audio/mpeg"), None), Some("mp3".to_string()));
    }

    #[test]
    fn test_missing_or_unparseable_content_type_yields_none() {
        assert_eq!(resolve_extension(None, None), None);
        assert_eq!(resolve_extension(Some(""), None), None);
        assert_eq!(resolve_extension(Some("   "), None), None);
        assert_eq!(resolve_extension(Some("garbage"), None), None);
        assert_eq!(resolve_extension(Some("text/"), None), None);
    }
}
