use crate::error::ExtractError;
use lopdf::Document;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Pages of a loaded document, addressed by 1-based page number.
pub trait PageSource {
    fn page_count(&self) -> usize;

    fn page_text(&self, number: u32) -> Result<String, ExtractError>;
}

pub struct LopdfDocument {
    document: Document,
    pages: BTreeMap<u32, lopdf::ObjectId>,
    checksum: String,
}

impl LopdfDocument {
    /// Reads the file once. Unreadable or unparsable files fail here, before
    /// any page is processed.
    pub fn open(path: &Path) -> Result<Self, ExtractError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExtractError> {
        let document =
            Document::load_mem(bytes).map_err(|error| ExtractError::PdfParse(error.to_string()))?;
        let pages = document.get_pages();

        let mut hasher = Sha256::new();
        hasher.update(bytes);

        Ok(Self {
            document,
            pages,
            checksum: format!("{:x}", hasher.finalize()),
        })
    }

    /// SHA-256 of the source bytes, hex encoded.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }
}

impl PageSource for LopdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, number: u32) -> Result<String, ExtractError> {
        if !self.pages.contains_key(&number) {
            return Err(ExtractError::InvalidArgument(format!(
                "page {number} is out of range (document has {} pages)",
                self.pages.len()
            )));
        }

        let text = self
            .document
            .extract_text(&[number])
            .map_err(|error| ExtractError::PdfParse(error.to_string()))?;
        Ok(normalize_whitespace(&text))
    }
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
