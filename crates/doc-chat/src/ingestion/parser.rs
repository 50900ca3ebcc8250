//! PDF text extraction

use regex::Regex;
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::FileType;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Glyph names some PDF fonts leak into extracted text, with their characters
const GLYPH_NAMES: &[(&str, char)] = &[
    ("uni2010", '\u{2010}'),
    ("uni2011", '\u{2011}'),
    ("uni2013", '\u{2013}'),
    ("uni2014", '\u{2014}'),
    ("uni2018", '\u{2018}'),
    ("uni2019", '\u{2019}'),
    ("uni201C", '\u{201C}'),
    ("uni201D", '\u{201D}'),
    ("uni2022", '\u{2022}'),
    ("uni2026", '\u{2026}'),
    ("uni00A0", '\u{00A0}'),
    ("f_f_i", '\u{FB03}'),
    ("f_f_l", '\u{FB04}'),
    ("f_i", '\u{FB01}'),
    ("f_l", '\u{FB02}'),
    ("f_f", '\u{FB00}'),
];

/// Typographic characters folded to plain ASCII so queries match
const ASCII_FOLDS: &[(char, &str)] = &[
    ('\u{2010}', "-"),
    ('\u{2011}', "-"),
    ('\u{2013}', "-"),
    ('\u{2014}', "--"),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2022}', "* "),
    ('\u{2026}', "..."),
    ('\u{00A0}', " "),
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

fn blank_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("static regex"))
}

/// Normalize raw extractor output
///
/// Paragraph breaks (single blank lines) survive so the chunker can split on them.
pub fn cleanup_pdf_text(text: &str) -> String {
    let mut result = text.replace('\0', "");

    for (glyph_name, ch) in GLYPH_NAMES {
        for pattern in [format!("({})", glyph_name), format!("<{}>", glyph_name)] {
            result = result.replace(&pattern, &ch.to_string());
        }
    }
    for (ch, ascii) in ASCII_FOLDS {
        result = result.replace(*ch, ascii);
    }

    let trimmed = result
        .lines()
        .map(|l| l.trim())
        .collect::<Vec<_>>()
        .join("\n");

    blank_runs().replace_all(&trimmed, "\n\n").trim().to_string()
}

/// Hex SHA-256 of extracted text
pub fn hash_content(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Parsed document with extracted text and metadata
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// File type
    pub file_type: FileType,
    /// Extracted text content
    pub content: String,
    /// Content hash
    pub content_hash: String,
    /// Total pages
    pub total_pages: u32,
}

/// PDF file parser
pub struct FileParser;

impl FileParser {
    /// Parse the file at `path`; `filename` is the name the user uploaded it under.
    ///
    /// Blocks the calling thread for up to `timeout`.
    pub fn parse_path(filename: &str, path: &Path, timeout: Duration) -> Result<ParsedDocument> {
        let file_type = FileType::from_filename(filename);
        if !file_type.is_supported() {
            return Err(Error::extraction(
                filename,
                format!("unsupported file type: {}", file_type.display_name()),
            ));
        }

        if !Self::has_pdf_magic(path)? {
            return Err(Error::extraction(filename, "file is not a valid PDF"));
        }

        let raw = Self::extract_pdf_with_timeout(filename, path, timeout)?;
        let content = cleanup_pdf_text(&raw);

        if content.is_empty() {
            return Err(Error::extraction(
                filename,
                "no text content could be extracted (image-only or encrypted PDF?)",
            ));
        }

        let total_pages = match lopdf::Document::load(path) {
            Ok(doc) => doc.get_pages().len().max(1) as u32,
            Err(_) => 1,
        };

        Ok(ParsedDocument {
            file_type,
            content_hash: hash_content(&content),
            content,
            total_pages,
        })
    }

    /// Parse an in-memory upload by spooling it to a scoped temp file
    pub fn parse(filename: &str, bytes: &[u8], timeout: Duration) -> Result<ParsedDocument> {
        if !bytes.starts_with(PDF_MAGIC) {
            let file_type = FileType::from_filename(filename);
            let message = if file_type.is_supported() {
                "file is not a valid PDF".to_string()
            } else {
                format!("unsupported file type: {}", file_type.display_name())
            };
            return Err(Error::extraction(filename, message));
        }

        let mut spool = tempfile::NamedTempFile::new()?;
        spool.write_all(bytes)?;
        spool.flush()?;
        Self::parse_path(filename, spool.path(), timeout)
    }

    fn has_pdf_magic(path: &Path) -> Result<bool> {
        let mut header = [0u8; 5];
        let mut file = std::fs::File::open(path)?;
        match file.read_exact(&mut header) {
            Ok(()) => Ok(header == PDF_MAGIC),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Run pdf-extract on a watchdog thread; panics and hangs in the extractor
    /// surface as a fallback attempt or an extraction error.
    fn extract_pdf_with_timeout(filename: &str, path: &Path, timeout: Duration) -> Result<String> {
        let owned: PathBuf = path.to_path_buf();

        match run_on_thread(timeout, move || pdf_extract::extract_text(&owned)) {
            ThreadOutcome::Finished(Ok(text)) if !text.trim().is_empty() => Ok(text),
            ThreadOutcome::Finished(Ok(_)) => {
                tracing::warn!("pdf-extract returned no text for '{}', trying fallback", filename);
                Self::extract_pdf_text_fallback(filename, path)
            }
            ThreadOutcome::Finished(Err(e)) => {
                tracing::warn!("pdf-extract failed for '{}': {}, trying fallback", filename, e);
                Self::extract_pdf_text_fallback(filename, path)
            }
            ThreadOutcome::TimedOut => {
                tracing::error!(
                    "PDF extraction of '{}' timed out after {:?}",
                    filename,
                    timeout
                );
                Err(Error::extraction(
                    filename,
                    format!("extraction timed out after {}s", timeout.as_secs()),
                ))
            }
            ThreadOutcome::Panicked => {
                tracing::error!("PDF extraction thread crashed on '{}'", filename);
                Self::extract_pdf_text_fallback(filename, path)
            }
        }
    }

    /// Fallback extraction through lopdf's content-stream decoder
    fn extract_pdf_text_fallback(filename: &str, path: &Path) -> Result<String> {
        let doc = lopdf::Document::load(path)
            .map_err(|e| Error::extraction(filename, format!("failed to load PDF: {}", e)))?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let mut all_text = String::new();

        for page in page_numbers {
            match doc.extract_text(&[page]) {
                Ok(text) if !text.trim().is_empty() => {
                    all_text.push_str(&text);
                    all_text.push_str("\n\n");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("Could not extract page {} of '{}': {}", page, filename, e)
                }
            }
        }

        if all_text.trim().is_empty() {
            return Err(Error::extraction(
                filename,
                "PDF appears to be image-based or has no extractable text",
            ));
        }

        Ok(all_text)
    }
}

/// How a job run on a watchdog thread ended
#[derive(Debug)]
enum ThreadOutcome<T> {
    Finished(T),
    TimedOut,
    Panicked,
}

/// Run `job` on its own thread and wait at most `timeout` for it
///
/// Relies on unwinding: a panic drops the sender and is reported as
/// `Panicked`. A timed-out thread is detached.
fn run_on_thread<T, F>(timeout: Duration, job: F) -> ThreadOutcome<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        let _ = tx.send(job());
    });

    match rx.recv_timeout(timeout) {
        Ok(value) => {
            let _ = handle.join();
            ThreadOutcome::Finished(value)
        }
        Err(RecvTimeoutError::Timeout) => ThreadOutcome::TimedOut,
        Err(RecvTimeoutError::Disconnected) => {
            let _ = handle.join();
            ThreadOutcome::Panicked
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_pdf;

    const TIMEOUT: Duration = Duration::from_secs(30);

    #[test]
    fn test_cleanup_pdf_text() {
        let raw = "  The candidate\u{2019}s profile \n\n\n\n\u{2022}Python\0 \u{FB01}ve years  ";
        let cleaned = cleanup_pdf_text(raw);
        assert_eq!(cleaned, "The candidate's profile\n\n* Python five years");
    }

    #[test]
    fn test_parse_generated_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.pdf");
        write_pdf(&path, &["The candidate has 5 years of Python experience."]);

        let parsed = FileParser::parse_path("resume.pdf", &path, TIMEOUT).unwrap();
        assert_eq!(parsed.file_type, FileType::Pdf);
        assert_eq!(parsed.total_pages, 1);
        assert!(parsed.content.contains("Python"));
        assert_eq!(parsed.content_hash, hash_content(&parsed.content));
    }

    #[test]
    fn test_parse_from_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.pdf");
        write_pdf(&path, &["Quarterly revenue grew by 12 percent."]);
        let bytes = std::fs::read(&path).unwrap();

        let parsed = FileParser::parse("memo.pdf", &bytes, TIMEOUT).unwrap();
        assert!(parsed.content.contains("revenue"));

        let err = FileParser::parse("memo.docx", b"PK\x03\x04", TIMEOUT).unwrap_err();
        assert!(err.to_string().contains("unsupported file type"));
    }

    #[test]
    fn test_rejects_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "plain text").unwrap();

        let err = FileParser::parse_path("notes.txt", &path, TIMEOUT).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn test_rejects_corrupt_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf at all").unwrap();

        let err = FileParser::parse_path("broken.pdf", &path, TIMEOUT).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));

        std::fs::write(&path, b"%PDF-1.4\ngarbage without objects").unwrap();
        let err = FileParser::parse_path("broken.pdf", &path, TIMEOUT).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn test_thread_result_is_returned() {
        let outcome = run_on_thread(Duration::from_secs(5), || 42);
        assert!(matches!(outcome, ThreadOutcome::Finished(42)));
    }

    #[test]
    fn test_thread_panic_is_contained() {
        let outcome = run_on_thread(Duration::from_secs(5), || -> String {
            panic!("broken xref table")
        });
        assert!(matches!(outcome, ThreadOutcome::Panicked));
    }

    #[test]
    fn test_thread_timeout() {
        let outcome = run_on_thread(Duration::from_millis(20), || {
            std::thread::sleep(Duration::from_millis(500));
        });
        assert!(matches!(outcome, ThreadOutcome::TimedOut));
    }
}
