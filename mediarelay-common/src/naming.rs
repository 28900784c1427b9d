//! File and object naming for rehosted uploads.

use chrono::{DateTime, Datelike, Utc};

const MAX_STEM_LEN: usize = 100;
const DEFAULT_STEM: &str = "image";

/// Extension for a declared content type, `bin` when we don't know it.
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/png" | "image/x-png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        _ => "bin",
    }
}

/// Reduce a client supplied name to something safe for an object key.
pub fn sanitize_file_stem(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let stem = match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base,
    };

    let mut out = String::with_capacity(stem.len());
    for c in stem.chars() {
        let keep = c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-');
        if keep {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }

    let mut collapsed = String::with_capacity(out.len());
    for c in out.chars() {
        if c == '-' && collapsed.ends_with('-') {
            continue;
        }
        collapsed.push(c);
    }

    let trimmed: String = collapsed
        .trim_matches('-')
        .chars()
        .take(MAX_STEM_LEN)
        .collect();
    let trimmed = trimmed.trim_end_matches('-');
    if trimmed.is_empty() {
        DEFAULT_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// `<stem>-<8 hex>.<ext>`; every call returns a fresh name.
pub fn unique_file_name(name: &str, extension: &str) -> String {
    let tag = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}.{}", sanitize_file_stem(name), &tag[..8], extension)
}

/// Date-partitioned object key: `<prefix>/<YYYY>/<MM>/<DD>/<file_name>`.
pub fn dated_object_path(prefix: &str, file_name: &str, now: DateTime<Utc>) -> String {
    let prefix = prefix.trim_matches('/');
    let dated = format!("{:04}/{:02}/{:02}/{}", now.year(), now.month(), now.day(), file_name);
    if prefix.is_empty() {
        dated
    } else {
        format!("{}/{}", prefix, dated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn extensions() {
        assert_eq!(extension_for_content_type("image/jpeg"), "jpg");
        assert_eq!(extension_for_content_type("IMAGE/PJPEG"), "jpg");
        assert_eq!(extension_for_content_type("image/x-png"), "png");
        assert_eq!(extension_for_content_type("video/quicktime"), "mov");
        assert_eq!(extension_for_content_type("application/pdf"), "bin");
        assert_eq!(extension_for_content_type(""), "bin");
    }

    #[test]
    fn sanitize() {
        assert_eq!(sanitize_file_stem("My Holiday Photo.JPG"), "My-Holiday-Photo");
        assert_eq!(sanitize_file_stem("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_stem("  ***.png"), "image");
        assert_eq!(sanitize_file_stem(""), "image");
        assert_eq!(sanitize_file_stem(".hidden"), ".hidden");
        assert_eq!(sanitize_file_stem("a -- b.webp"), "a-b");
        assert_eq!(sanitize_file_stem(&"x".repeat(300)).len(), MAX_STEM_LEN);
    }

    #[test]
    fn unique_names_differ() {
        let a = unique_file_name("cat.png", "png");
        let b = unique_file_name("cat.png", "png");
        assert_ne!(a, b);
        assert!(a.starts_with("cat-"));
        assert!(a.ends_with(".png"));
        assert_eq!(a.len(), "cat-".len() + 8 + ".png".len());
    }

    #[test]
    fn dated_paths() {
        let now = Utc.with_ymd_and_hms(2025, 3, 7, 12, 0, 0).unwrap();
        assert_eq!(
            dated_object_path("/images/user-uploads/", "cat-1234abcd.png", now),
            "images/user-uploads/2025/03/07/cat-1234abcd.png"
        );
        assert_eq!(dated_object_path("", "a.gif", now), "2025/03/07/a.gif");
    }
}
