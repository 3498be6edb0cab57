use sha2::{Digest, Sha256};

use super::ArticleRow;

/// Stable row id: hex SHA-256 of the URL's UTF-8 bytes.
pub fn assign_id(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn assign_source_id(row: ArticleRow, source_id: &str) -> ArticleRow {
    ArticleRow {
        source_id: Some(source_id.to_string()),
        ..row
    }
}
