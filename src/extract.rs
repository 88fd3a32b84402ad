use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

/// Declared kind of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Docx,
    Txt,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Option<FileKind> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(FileKind::Pdf),
            "docx" | "doc" => Some(FileKind::Docx),
            "txt" => Some(FileKind::Txt),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Txt => "txt",
        }
    }
}

/// Extraction failures. Surfaced to the caller as-is; never retried.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to extract text from PDF: {0}")]
    Pdf(String),
    #[error("failed to extract text from DOCX: {0}")]
    Docx(String),
    #[error("document contained no extractable text")]
    Empty,
}

/// Best-effort UTF-8 text from raw document bytes, preserving line breaks
/// where the source format allows it.
pub fn extract_text(bytes: &[u8], kind: FileKind) -> Result<String, ExtractError> {
    let text = match kind {
        FileKind::Pdf => extract_pdf(bytes)?,
        FileKind::Docx => extract_docx(bytes)?,
        // Plain text never fails: invalid sequences are replaced.
        FileKind::Txt => String::from_utf8_lossy(bytes).into_owned(),
    };
    if text.trim().is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(text)
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// Pull document text out of the DOCX zip container. Paragraphs become
/// lines; inside tables, cells are joined with tabs and rows with newlines so
/// tabular layouts survive into the layout detector.
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive =
        zip::ZipArchive::new(cursor).map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Docx(e.to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;

    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut out = String::new();
    let mut cell_depth = 0usize;
    let mut in_run_text = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:tc" => cell_depth += 1,
                b"w:t" => in_run_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => out.push('\t'),
                b"w:br" => out.push('\n'),
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                // Paragraphs inside a table cell stay on the row's line.
                b"w:p" => out.push(if cell_depth > 0 { ' ' } else { '\n' }),
                b"w:tc" => {
                    cell_depth = cell_depth.saturating_sub(1);
                    out.push('\t');
                }
                b"w:tr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_run_text => {
                let text = t.unescape().map_err(|e| ExtractError::Docx(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

// ── Tests ──
