use html2text::from_read;
use regex::Regex;
use std::sync::OnceLock;

/// Reading speed used to estimate audio length at speed 1.0
pub const CHARACTERS_PER_MINUTE: f64 = 1000.0;

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"https?://[^\s]+").expect("valid url regex"))
}

fn whitespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

fn sentence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"([.!?…]+\s+)").expect("valid sentence regex"))
}

/// Clean chapter text before it is sent to a vendor: strip markup and URLs,
/// normalize whitespace. The job keeps the original text.
pub fn prepare_speech_text(text: &str) -> String {
    let plain_text = if text.contains('<') {
        from_read(text.as_bytes(), usize::MAX)
    } else {
        text.to_string()
    };

    let without_urls = url_pattern().replace_all(&plain_text, "");
    let normalized = whitespace_pattern().replace_all(&without_urls, " ");

    normalized.trim().to_string()
}

/// Split text into batches that respect sentence boundaries.
/// Each batch is at most `max_chars` characters.
pub fn split_into_batches(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut batches = Vec::new();
    let mut current_batch = String::new();
    let mut current_len = 0usize;
    let mut last_end = 0;

    for mat in sentence_pattern().find_iter(text) {
        let sentence = &text[last_end..mat.end()];
        let sentence_len = sentence.chars().count();

        if !current_batch.is_empty() && current_len + sentence_len > max_chars {
            batches.push(current_batch.trim().to_string());
            current_batch.clear();
            current_len = 0;
        }

        if sentence_len > max_chars {
            push_by_chars(&mut batches, sentence, max_chars);
        } else {
            current_batch.push_str(sentence);
            current_len += sentence_len;
        }
        last_end = mat.end();
    }

    // Remaining text after the last sentence boundary
    if last_end < text.len() {
        let remaining = &text[last_end..];
        let remaining_len = remaining.chars().count();

        if !current_batch.is_empty() && current_len + remaining_len > max_chars {
            batches.push(current_batch.trim().to_string());
            current_batch.clear();
        }

        if remaining_len > max_chars {
            push_by_chars(&mut batches, remaining, max_chars);
        } else {
            current_batch.push_str(remaining);
        }
    }

    if !current_batch.trim().is_empty() {
        batches.push(current_batch.trim().to_string());
    }

    batches
}

fn push_by_chars(batches: &mut Vec<String>, text: &str, max_chars: usize) {
    let chars: Vec<char> = text.chars().collect();
    for chunk in chars.chunks(max_chars) {
        let chunk: String = chunk.iter().collect();
        if !chunk.trim().is_empty() {
            batches.push(chunk.trim().to_string());
        }
    }
}

/// Estimated playback length of `characters` read at `speed`
pub fn estimate_duration_seconds(characters: usize, speed: f32) -> f64 {
    let speed = if speed > 0.0 { speed as f64 } else { 1.0 };
    let minutes = characters as f64 / CHARACTERS_PER_MINUTE;
    (minutes * 60.0 / speed * 10.0).round() / 10.0
}
