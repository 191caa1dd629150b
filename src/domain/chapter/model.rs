use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Separator placed between paragraphs when a chapter is flattened for speech
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// A chapter as owned by the reading platform. Read-only from this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: Uuid,
    pub book_id: Uuid,
    pub title: String,
    pub chapter_number: i32,
    /// Ordered by `position`
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Paragraph {
    pub position: i32,
    pub content: String,
}

/// Chapter header without its paragraphs, used when listing a book
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChapterSummary {
    pub id: Uuid,
    pub book_id: Uuid,
    pub title: String,
    pub chapter_number: i32,
}

impl Chapter {
    /// Concatenate the paragraphs in stored order, separated by a blank line
    pub fn full_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join(PARAGRAPH_SEPARATOR)
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }
}
