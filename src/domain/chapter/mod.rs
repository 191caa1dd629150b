pub mod model;

pub use model::{Chapter, ChapterSummary, Paragraph, PARAGRAPH_SEPARATOR};
