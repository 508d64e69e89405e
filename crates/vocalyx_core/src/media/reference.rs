//! Media reference classification.

/// Scheme prefix of bucket-relative handles.
pub const BUCKET_SCHEME: &str = "gs://";
const HOSTED_BUCKET_SUFFIX: &str = ".firebasestorage.app";
const FALLBACK_STEM: &str = "media";

/// Parsed view of a stored media reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaRef<'a> {
    /// Already fetchable (`http://` / `https://`).
    Public(&'a str),
    /// `gs://{bucket}/{path}`; `path` may be empty for malformed handles.
    Bucket { bucket: &'a str, path: &'a str },
    /// Anything else; passed through untouched.
    Opaque(&'a str),
}

impl<'a> MediaRef<'a> {
    /// Classifies `raw`. Returns `None` for the empty string.
    pub fn parse(raw: &'a str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        if raw.starts_with("https://") || raw.starts_with("http://") {
            return Some(Self::Public(raw));
        }
        if let Some(rest) = raw.strip_prefix(BUCKET_SCHEME) {
            let (bucket, path) = rest.split_once('/').unwrap_or((rest, ""));
            return Some(Self::Bucket { bucket, path });
        }
        Some(Self::Opaque(raw))
    }
}

/// Trailing file name of `raw` with everything from the first `.` removed.
///
/// `gs://bucket/family/mom.jpg` -> `mom`. Blank stems become `media`.
pub fn filename_stem(raw: &str) -> &str {
    let file_name = raw.rsplit('/').next().unwrap_or(raw);
    let stem = file_name.split('.').next().unwrap_or(file_name);
    if stem.trim().is_empty() {
        FALLBACK_STEM
    } else {
        stem
    }
}

/// Deterministic public download URL for an object in a hosted bucket.
pub fn public_download_url(bucket: &str, path: &str) -> String {
    let bucket = bucket.strip_suffix(HOSTED_BUCKET_SUFFIX).unwrap_or(bucket);
    format!(
        "https://firebasestorage.googleapis.com/v0/b/{bucket}/o/{}?alt=media",
        urlencoding::encode(path)
    )
}
