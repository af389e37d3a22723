// Text extraction for uploaded files
// PDF goes through pdf-extract, DOCX is read straight from its zipped XML


use std::fmt;
use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;
use tracing::debug;
use zip::ZipArchive;

const DOCX_BODY: &str = "word/document.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Docx,
    Txt,
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type. Please upload PDF, DOCX, or TXT files.")]
    UnsupportedFileType(String),
    #[error("Error reading PDF: {0}")]
    Pdf(String),
    #[error("Error reading DOCX: {0}")]
    Docx(String),
    #[error("Error reading TXT: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl FileKind {
    /// Detect the kind from the file extension, ignoring case
    #[inline]
    pub fn from_filename(filename: &str) -> Result<Self, ExtractionError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        if extension.eq_ignore_ascii_case("pdf") {
            Ok(Self::Pdf)
        } else if extension.eq_ignore_ascii_case("docx") {
            Ok(Self::Docx)
        } else if extension.eq_ignore_ascii_case("txt") {
            Ok(Self::Txt)
        } else {
            Err(ExtractionError::UnsupportedFileType(filename.to_string()))
        }
    }
}

impl fmt::Display for FileKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
        })
    }
}

/// Extract plain text from raw file bytes
#[inline]
pub fn extract_text(kind: FileKind, bytes: &[u8]) -> Result<String, ExtractionError> {
    let text = match kind {
        FileKind::Txt => String::from_utf8(bytes.to_vec())?,
        FileKind::Pdf => extract_pdf(bytes)?,
        FileKind::Docx => extract_docx(bytes)?,
    };

    debug!(
        "Extracted {} bytes of text from {} bytes of {}",
        text.len(),
        bytes.len(),
        kind
    );
    Ok(text)
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    // pdf-extract panics on some malformed documents instead of returning an error
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| ExtractionError::Pdf("malformed PDF document".to_string()))?
        .map_err(|e| ExtractionError::Pdf(e.to_string()))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractionError::Docx(e.to_string()))?;

    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .map_err(|e| ExtractionError::Docx(format!("{}: {}", DOCX_BODY, e)))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Docx(e.to_string()))?;

    docx_xml_to_text(&xml)
}

/// One line per `w:p` paragraph, text taken from `w:t` runs
fn docx_xml_to_text(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"w:t" {
                    in_run_text = true;
                }
            }
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" => text.push('\n'),
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_run_text => {
                let unescaped = e
                    .unescape()
                    .map_err(|e| ExtractionError::Docx(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::Docx(format!(
                    "XML parse error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(text)
}
