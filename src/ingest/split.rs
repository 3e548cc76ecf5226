use crate::config::ChunkConfig;

/// One window of the source text. `start` is a character offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWindow {
    pub start: usize,
    pub text: String,
}

/// Fixed-size sliding window over characters. Every window except possibly the
/// last holds exactly `chunk_size` characters; starts advance by
/// `chunk_size - chunk_overlap`.
pub fn split_text(text: &str, chunking: ChunkConfig) -> Vec<TextWindow> {
    let mut boundaries: Vec<usize> = text.char_indices().map(|(idx, _)| idx).collect();
    boundaries.push(text.len());
    let char_count = boundaries.len() - 1;

    if char_count == 0 || chunking.chunk_size == 0 {
        return vec![];
    }

    let step = chunking.step();
    let mut windows = Vec::new();
    let mut start = 0;

    while start < char_count {
        let end = (start + chunking.chunk_size).min(char_count);
        windows.push(TextWindow {
            start,
            text: text[boundaries[start]..boundaries[end]].to_string(),
        });

        if end == char_count {
            break;
        }
        start += step;
    }

    windows
}
