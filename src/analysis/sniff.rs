//! Lightweight content sniffing of a downloaded blueprint file.
//!
//! Nothing here parses PDF structure; the page count is a rough estimate from
//! object markers and the keyword scan is a plain byte search.

use serde::{Deserialize, Serialize};
use std::fmt;

const BLUEPRINT_KEYWORDS: &[&str] = &[
    "図面",
    "設計",
    "CAD",
    "blueprint",
    "drawing",
    "specification",
    "仕様",
];

/// Keywords that mark the file as drawing-related rather than a generic document.
const DRAWING_KEYWORDS: &[&str] = &["図面", "設計", "CAD", "blueprint", "drawing"];

const SUFFICIENT_CONTENT_BYTES: usize = 10 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectedFormat {
    Pdf,
    Png,
    Jpeg,
    ZipOrOffice,
    Other(String),
}

impl DetectedFormat {
    pub fn from_magic(bytes: &[u8], file_path: &str) -> Self {
        if bytes.starts_with(b"%PDF") {
            DetectedFormat::Pdf
        } else if bytes.starts_with(b"\x89PNG") {
            DetectedFormat::Png
        } else if bytes.starts_with(b"\xff\xd8\xff") {
            DetectedFormat::Jpeg
        } else if bytes.starts_with(b"PK") {
            DetectedFormat::ZipOrOffice
        } else {
            let ext = file_path
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_uppercase())
                .filter(|ext| !ext.is_empty() && !ext.contains('/'))
                .unwrap_or_else(|| "UNKNOWN".to_string());
            DetectedFormat::Other(ext)
        }
    }
}

impl fmt::Display for DetectedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectedFormat::Pdf => f.write_str("PDFファイル"),
            DetectedFormat::Png => f.write_str("PNGファイル"),
            DetectedFormat::Jpeg => f.write_str("JPEGファイル"),
            DetectedFormat::ZipOrOffice => f.write_str("ZIPアーカイブまたはOffice文書"),
            DetectedFormat::Other(ext) => write!(f, "{}ファイル", ext),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfInfo {
    pub file_size_bytes: u64,
    pub file_size_mb: f64,
    pub is_valid_pdf: bool,
    pub detected_format: DetectedFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResults {
    pub is_pdf_format: bool,
    pub has_content: bool,
    pub estimated_pages: u32,
    pub file_size_mb: f64,
    pub validation_status: String,
}

/// Everything learned from the raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSniff {
    pub pdf_info: PdfInfo,
    pub validation: ValidationResults,
    pub keywords_found: Vec<String>,
    pub comment: String,
}

/// Size in MiB rounded to two decimals.
pub fn size_mb(len: usize) -> f64 {
    (len as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}

fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    if needle.is_empty() || haystack.len() < needle.len() {
        return 0;
    }
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

/// Rough page count: `/Type /Page` markers (excluding `/Type /Pages`),
/// else one page per ten objects, never less than one.
pub fn estimate_pages(bytes: &[u8]) -> u32 {
    const MARKER: &[u8] = b"/Type /Page";
    let pages = bytes
        .windows(MARKER.len())
        .enumerate()
        .filter(|(i, w)| *w == MARKER && bytes.get(i + MARKER.len()) != Some(&b's'))
        .count();

    let estimate = if pages > 0 {
        pages
    } else {
        count_occurrences(bytes, b"endobj") / 10
    };
    u32::try_from(estimate.max(1)).unwrap_or(u32::MAX)
}

pub fn find_keywords(bytes: &[u8]) -> Vec<String> {
    BLUEPRINT_KEYWORDS
        .iter()
        .filter(|k| count_occurrences(bytes, k.as_bytes()) > 0)
        .map(|k| k.to_string())
        .collect()
}

fn size_label(mb: f64) -> &'static str {
    if mb < 1.0 {
        "軽量なファイル"
    } else if mb < 10.0 {
        "標準的なサイズ"
    } else if mb < 50.0 {
        "やや大きなファイル"
    } else {
        "大容量ファイル"
    }
}

pub fn sniff(bytes: &[u8], file_path: &str) -> FileSniff {
    let format = DetectedFormat::from_magic(bytes, file_path);
    let is_pdf = format == DetectedFormat::Pdf;
    let mb = size_mb(bytes.len());

    let (estimated_pages, keywords_found) = if is_pdf {
        (estimate_pages(bytes), find_keywords(bytes))
    } else {
        (1, Vec::new())
    };

    let mut lines = vec![format!("形式: {}", format)];
    if is_pdf {
        lines.push(format!("推定ページ数: {}ページ", estimated_pages));
        if !keywords_found.is_empty() {
            lines.push(format!("検出キーワード: {}", keywords_found.join(", ")));
        }
    }
    let label = size_label(mb);
    lines.push(format!("ファイルサイズ: {}MB ({})", mb, label));
    if bytes.len() > SUFFICIENT_CONTENT_BYTES {
        lines.push("十分な内容を含んでいると推定されます".to_string());
    } else {
        lines.push("内容が少ない可能性があります".to_string());
    }
    let drawing_related = keywords_found
        .iter()
        .any(|k| DRAWING_KEYWORDS.contains(&k.as_str()));
    lines.push(if drawing_related {
        "CADや設計図面関連の可能性が高いです".to_string()
    } else {
        "一般的な文書ファイルと推定されます".to_string()
    });

    FileSniff {
        pdf_info: PdfInfo {
            file_size_bytes: bytes.len() as u64,
            file_size_mb: mb,
            is_valid_pdf: is_pdf,
            detected_format: format,
        },
        validation: ValidationResults {
            is_pdf_format: is_pdf,
            has_content: mb > 0.01,
            estimated_pages,
            file_size_mb: mb,
            validation_status: if is_pdf { "valid" } else { "unknown" }.to_string(),
        },
        keywords_found,
        comment: lines.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    fn pdf_with(body: &str, padding: usize) -> Vec<u8> {
        let mut bytes = b"%PDF-1.7\n".to_vec();
        bytes.extend_from_slice(body.as_bytes());
        bytes.extend(std::iter::repeat(b' ').take(padding));
        bytes
    }

    #[parameterized(
        pdf = { b"%PDF-1.4".as_slice(), "a.pdf", DetectedFormat::Pdf },
        png = { b"\x89PNG\r\n".as_slice(), "a.png", DetectedFormat::Png },
        jpeg = { b"\xff\xd8\xff\xe0".as_slice(), "a.jpg", DetectedFormat::Jpeg },
        zip = { b"PK\x03\x04".as_slice(), "a.xlsx", DetectedFormat::ZipOrOffice },
        by_extension = { b"hello".as_slice(), "dir/notes.txt", DetectedFormat::Other("TXT".to_string()) },
        no_extension = { b"hello".as_slice(), "dir/notes", DetectedFormat::Other("UNKNOWN".to_string()) },
    )]
    fn test_magic_detection(bytes: &[u8], path: &str, expected: DetectedFormat) {
        assert_eq!(DetectedFormat::from_magic(bytes, path), expected);
    }

    #[test]
    fn test_page_markers_exclude_pages_tree() {
        let body = "<< /Type /Pages /Count 2 >>\n<< /Type /Page >>\n<< /Type /Page >>";
        assert_eq!(estimate_pages(&pdf_with(body, 0)), 2);
    }

    #[test]
    fn test_page_estimate_from_objects() {
        let body = "1 0 obj endobj\n".repeat(35);
        assert_eq!(estimate_pages(&pdf_with(&body, 0)), 3);
        assert_eq!(estimate_pages(b"%PDF-1.4"), 1);
    }

    #[test]
    fn test_keyword_scan_utf8() {
        let bytes = pdf_with("(製作図面) CAD drawing", 0);
        assert_eq!(find_keywords(&bytes), vec!["図面", "CAD", "drawing"]);
    }

    #[test]
    fn test_sniff_small_pdf() {
        let result = sniff(&pdf_with("<< /Type /Page >> 図面", 0), "blueprints/a.pdf");
        assert!(result.pdf_info.is_valid_pdf);
        assert_eq!(result.validation.validation_status, "valid");
        assert!(!result.validation.has_content);
        assert_eq!(result.validation.estimated_pages, 1);
        assert!(result.comment.contains("内容が少ない可能性があります"));
        assert!(result.comment.contains("CADや設計図面関連の可能性が高いです"));
    }

    #[test]
    fn test_sniff_large_enough_pdf() {
        let result = sniff(&pdf_with("<< /Type /Page >>", 20 * 1024), "a.pdf");
        assert!(result.validation.has_content);
        assert_eq!(result.validation.file_size_mb, 0.02);
        assert!(result.comment.contains("十分な内容を含んでいると推定されます"));
        assert!(result.comment.contains("軽量なファイル"));
    }

    #[test]
    fn test_sniff_non_pdf() {
        let result = sniff(b"\x89PNG....", "scan.png");
        assert!(!result.pdf_info.is_valid_pdf);
        assert_eq!(result.validation.validation_status, "unknown");
        assert!(result.keywords_found.is_empty());
        assert!(result.comment.contains("一般的な文書ファイルと推定されます"));
    }

    #[test]
    fn test_size_mb_rounding() {
        assert_eq!(size_mb(0), 0.0);
        assert_eq!(size_mb(1024 * 1024), 1.0);
        assert_eq!(size_mb(1_572_864), 1.5);
    }
}
