use crate::source::{content_id_of, read_source_bytes, select_pages, split_pages};
use crate::{PageSource, SourceError};
use minutes_types::Page;

/// Reads pages from a UTF-8 text file, one form feed between pages
#[derive(Debug, Clone, Default)]
pub struct TextPageReader;

impl TextPageReader {
    pub fn new() -> Self {
        Self
    }
}

impl PageSource for TextPageReader {
    fn read_pages(
        &self,
        source_id: &str,
        pages: Option<&[u32]>,
    ) -> Result<Vec<Page>, SourceError> {
        let bytes = read_source_bytes(source_id)?;
        let text = String::from_utf8(bytes).map_err(|e| SourceError::Unreadable {
            source_id: source_id.to_string(),
            reason: format!("not UTF-8: {}", e),
        })?;
        select_pages(source_id, split_pages(&text), pages)
    }

    fn content_id(&self, source_id: &str) -> Result<String, SourceError> {
        Ok(content_id_of(&read_source_bytes(source_id)?))
    }
}
