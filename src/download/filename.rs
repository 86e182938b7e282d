//! Filename derivation, sanitization, and extension handling for downloads.
//!
//! The base name comes from an explicit override or the URL's last path
//! segment; the extension comes from [`resolve_extension`], or from the URL
//! path when the server declared no usable content type.

use std::path::{Component, Path};

use tracing::{debug, warn};
use url::Url;

use super::constants::FALLBACK_BASE_NAME;
use super::content_type::resolve_extension;

/// Where the extension of a resolved filename came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionSource {
    /// The caller passed an explicit format.
    Override,
    /// Derived from the declared Content-Type.
    ContentType,
    /// No content type; the URL path's own extension was used.
    UrlFallback,
    /// No content type and the URL path has no extension either.
    Undetermined,
}

impl ExtensionSource {
    /// True when resolution degraded because the content type was missing.
    #[must_use]
    pub fn is_fallback(self) -> bool {
        matches!(self, Self::UrlFallback | Self::Undetermined)
    }
}

/// Result of filename resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFilename {
    /// Final filename, including the extension.
    pub filename: String,
    /// Provenance of the extension.
    pub extension_source: ExtensionSource,
}

/// Resolves the target filename for a download.
///
/// The extension is appended at most once: a base name that already ends with
/// `.ext` (ASCII case-insensitive) is left alone, so resolving an already
/// resolved name is a no-op.
#[must_use]
pub fn resolve_filename(
    url: &Url,
    explicit_filename: Option<&str>,
    content_type: Option<&str>,
    format_override: Option<&str>,
) -> ResolvedFilename {
    let base = explicit_filename
        .map(sanitize_filename)
        .filter(|name| !name.trim_matches('_').is_empty())
        .unwrap_or_else(|| base_name_from_url(url));

    if let Some(extension) = resolve_extension(content_type, format_override) {
        let source = if format_override.is_some() {
            ExtensionSource::Override
        } else {
            ExtensionSource::ContentType
        };
        debug!(%extension, ?source, "resolved extension");
        return ResolvedFilename {
            filename: append_extension(base, &extension),
            extension_source: source,
        };
    }

    match extension_from_url(url) {
        Some(extension) => {
            warn!(
                url = %url,
                %extension,
                "could not determine file format from content type; using URL extension"
            );
            ResolvedFilename {
                filename: append_extension(base, &extension),
                extension_source: ExtensionSource::UrlFallback,
            }
        }
        None => {
            warn!(
                url = %url,
                "could not determine file format from content type or URL; keeping name as-is"
            );
            ResolvedFilename {
                filename: base,
                extension_source: ExtensionSource::Undetermined,
            }
        }
    }
}

/// Appends `.extension` unless `base` already ends with it.
#[must_use]
pub fn append_extension(base: String, extension: &str) -> String {
    let extension = sanitize_filename(extension.trim_start_matches('.'));
    if extension.is_empty() || extension.chars().all(|c| c == '_') {
        return base;
    }
    if has_extension(&base, &extension) {
        return base;
    }
    format!("{base}.{extension}")
}

// A name that is exactly `.ext` already ends with the extension.
fn has_extension(name: &str, extension: &str) -> bool {
    let suffix_len = extension.len() + 1;
    if name.len() < suffix_len {
        return false;
    }
    let split = name.len() - suffix_len;
    if !name.is_char_boundary(split) {
        return false;
    }
    let suffix = &name[split..];
    suffix.starts_with('.') && suffix[1..].eq_ignore_ascii_case(extension)
}

/// Extension of the URL's last path segment, without the leading dot.
pub(crate) fn extension_from_url(url: &Url) -> Option<String> {
    let last_segment = url.path_segments()?.next_back()?;
    let decoded = urlencoding::decode(last_segment).ok()?;
    let dot_index = decoded.rfind('.')?;
    let ext = &decoded[dot_index + 1..];
    if ext.is_empty() || ext.len() > 11 {
        return None;
    }
    Some(ext.to_string())
}

/// Base name derived from the URL's last path segment, or `download`.
pub(crate) fn base_name_from_url(url: &Url) -> String {
    if let Some(mut segments) = url.path_segments()
        && let Some(last) = segments.next_back()
        && !last.is_empty()
    {
        let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
            debug!(
                segment = %last,
                error = %e,
                "URL decoding failed, using raw segment"
            );
            last.into()
        });
        return sanitize_filename(&decoded);
    }

    FALLBACK_BASE_NAME.to_string()
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn test_sanitize_filename_removes_invalid_chars() {
        assert_eq!(sanitize_filename("file/name.pdf"), "file_name.pdf");
        assert_eq!(sanitize_filename("file\\name.pdf"), "file_name.pdf");
        assert_eq!(sanitize_filename("file:name.pdf"), "file_name.pdf");
        assert_eq!(sanitize_filename("file<name>.pdf"), "file_name_.pdf");
        assert_eq!(sanitize_filename("file|name.pdf"), "file_name.pdf");
    }

    #[test]
    fn test_sanitize_filename_rewrites_dot_segments() {
        assert_eq!(sanitize_filename("."), "_");
        assert_eq!(sanitize_filename(".."), "__");
    }

    #[test]
    fn test_sanitize_filename_preserves_valid_chars() {
        assert_eq!(sanitize_filename("file (1).pdf"), "file (1).pdf");
        assert_eq!(sanitize_filename("日本語.pdf"), "日本語.pdf");
    }

    #[test]
    fn test_resolve_appends_content_type_extension() {
        let resolved = resolve_filename(
            &url("https://example.com/api/data"),
            None,
            Some("application/json"),
            None,
        );
        assert_eq!(resolved.filename, "data.json");
        assert_eq!(resolved.extension_source, ExtensionSource::ContentType);
    }

    #[test]
    fn test_resolve_explicit_filename_is_idempotent() {
        let target = url("https://cdn.example.com/img/12345");
        let first = resolve_filename(&target, Some("photo"), Some("image/png"), None);
        assert_eq!(first.filename, "photo.png");

        let second = resolve_filename(&target, Some(&first.filename), Some("image/png"), None);
        assert_eq!(second.filename, "photo.png");
    }

    #[test]
    fn test_resolve_does_not_duplicate_extension_from_url_segment() {
        let resolved = resolve_filename(
            &url("https://example.com/files/report.pdf"),
            None,
            Some("application/pdf"),
            None,
        );
        assert_eq!(resolved.filename, "report.pdf");
    }

    #[test]
    fn test_resolve_only_matches_whole_extension() {
        // "photojpeg" does not end with ".jpeg"
        let resolved = resolve_filename(
            &url("https://example.com/x"),
            Some("photojpeg"),
            Some("image/jpeg"),
            None,
        );
        assert_eq!(resolved.filename, "photojpeg.jpeg");
    }

    #[test]
    fn test_resolve_dotfile_named_after_extension_is_not_doubled() {
        let resolved = resolve_filename(
            &url("https://example.com/x"),
            Some(".png"),
            Some("image/png"),
            None,
        );
        assert_eq!(resolved.filename, ".png");
        assert_eq!(append_extension(".png".to_string(), "png"), ".png");
        assert_eq!(append_extension(".jpg".to_string(), "png"), ".jpg.png");
    }

    #[test]
    fn test_resolve_extension_check_ignores_case() {
        let resolved = resolve_filename(
            &url("https://example.com/x"),
            Some("SCAN.PDF"),
            Some("application/pdf"),
            None,
        );
        assert_eq!(resolved.filename, "SCAN.PDF");
    }

    #[test]
    fn test_resolve_override_wins() {
        let resolved = resolve_filename(
            &url("https://example.com/archive"),
            None,
            Some("application/octet-stream"),
            Some("tar.gz"),
        );
        assert_eq!(resolved.filename, "archive.tar.gz");
        assert_eq!(resolved.extension_source, ExtensionSource::Override);
    }

    #[test]
    fn test_resolve_override_with_leading_dot_is_not_doubled() {
        let resolved = resolve_filename(
            &url("https://example.com/archive"),
            None,
            None,
            Some(".zip"),
        );
        assert_eq!(resolved.filename, "archive.zip");
    }

    #[test]
    fn test_resolve_missing_content_type_uses_url_extension() {
        let resolved = resolve_filename(
            &url("https://example.com/media/clip.mp4?token=abc"),
            Some("holiday"),
            None,
            None,
        );
        assert_eq!(resolved.filename, "holiday.mp4");
        assert_eq!(resolved.extension_source, ExtensionSource::UrlFallback);
        assert!(resolved.extension_source.is_fallback());
    }

    #[test]
    fn test_resolve_missing_content_type_keeps_url_name_single_extension() {
        let resolved = resolve_filename(&url("https://example.com/pic.png"), None, None, None);
        assert_eq!(resolved.filename, "pic.png");
        assert_eq!(resolved.extension_source, ExtensionSource::UrlFallback);
    }

    #[test]
    fn test_resolve_without_any_extension_source_is_undetermined() {
        let resolved = resolve_filename(&url("https://example.com/blob"), None, Some(""), None);
        assert_eq!(resolved.filename, "blob");
        assert_eq!(resolved.extension_source, ExtensionSource::Undetermined);
    }

    #[test]
    fn test_resolve_decodes_and_sanitizes_url_segment() {
        let resolved = resolve_filename(
            &url("https://example.com/my%20report%3Av2"),
            None,
            Some("application/pdf"),
            None,
        );
        assert_eq!(resolved.filename, "my report_v2.pdf");
    }

    #[test]
    fn test_resolve_url_without_segment_uses_fallback_base() {
        let resolved = resolve_filename(
            &url("https://example.com/"),
            None,
            Some("text/html"),
            None,
        );
        assert_eq!(resolved.filename, "download.html");
    }

    #[test]
    fn test_resolve_explicit_filename_cannot_escape_folder() {
        let resolved = resolve_filename(
            &url("https://example.com/a"),
            Some("../../etc/passwd"),
            Some("text/plain"),
            None,
        );
        assert!(!resolved.filename.contains('/'));
        assert_eq!(resolved.filename, ".._.._etc_passwd.txt");
    }
}
