//! Text extraction from statement files.
//!
//! Parsers never touch files; they receive the ordered text lines of a
//! statement with every page concatenated. A [`LineSource`] produces those
//! lines.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Produces the extracted text lines of one statement file.
pub trait LineSource {
    /// Return one entry per physical line, pages concatenated in order.
    ///
    /// `password` is used to decrypt protected files and ignored otherwise.
    fn extract_lines(&self, path: &Path, password: Option<&str>) -> Result<Vec<String>>;
}

/// Extracts text from (possibly encrypted) PDF statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfText;

impl LineSource for PdfText {
    fn extract_lines(&self, path: &Path, password: Option<&str>) -> Result<Vec<String>> {
        let text = match password {
            Some(password) => pdf_extract::extract_text_encrypted(path, password),
            None => pdf_extract::extract_text(path),
        }
        .map_err(|e| Error::Extraction {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(split_lines(&text))
    }
}

/// Reads statements that were already converted to plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl LineSource for PlainText {
    fn extract_lines(&self, path: &Path, _password: Option<&str>) -> Result<Vec<String>> {
        let text = fs::read_to_string(path)?;
        Ok(split_lines(&text))
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}
