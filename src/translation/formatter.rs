/*!
 * Reply assembly and splitting.
 *
 * A batch renders as one labeled segment per target language. Replies longer
 * than the platform limit are split at line boundaries first, then at word
 * boundaries, so every posted part fits.
 */

use crate::app_config::ReplyConfig;
use crate::language_utils::language_label;

use super::fanout::Batch;

/// Builds reply text from a batch and splits it into postable parts
#[derive(Debug, Clone)]
pub struct ReplyFormatter {
    /// Maximum characters per part
    max_length: usize,

    /// Shown in place of a failed translation
    failure_placeholder: String,
}

impl ReplyFormatter {
    pub fn new(max_length: usize, failure_placeholder: impl Into<String>) -> Self {
        Self {
            max_length: max_length.max(1),
            failure_placeholder: failure_placeholder.into(),
        }
    }

    pub fn from_config(config: &ReplyConfig) -> Self {
        Self::new(config.max_length, config.failure_placeholder.clone())
    }

    /// Render and split a batch into reply parts
    pub fn format(&self, batch: &Batch) -> Vec<String> {
        self.split(&self.render(batch))
    }

    /// One `<label> <text>` segment per outcome, in batch order
    pub fn render(&self, batch: &Batch) -> String {
        batch
            .outcomes
            .iter()
            .map(|outcome| {
                let body = if outcome.succeeded {
                    outcome.text.trim()
                } else {
                    self.failure_placeholder.as_str()
                };
                format!("{} {}", language_label(&outcome.target_language), body)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Split `text` into trimmed parts of at most `max_length` characters.
    ///
    /// Lines are packed greedily; a line that alone exceeds the limit is
    /// broken between words. A single word longer than the limit is cut.
    /// Every part is a slice of `text`, so whitespace inside a part is kept
    /// and only whitespace at part boundaries is dropped.
    pub fn split(&self, text: &str) -> Vec<String> {
        let max = self.max_length;
        let mut parts = Vec::new();

        if char_len(text) <= max {
            push_trimmed(&mut parts, text);
            return parts;
        }

        // Byte range of the part being packed
        let mut start: Option<usize> = None;
        let mut end = 0;
        let mut current_len = 0;
        let mut offset = 0;

        for line in text.split('\n') {
            let line_start = offset;
            let line_end = line_start + line.len();
            offset = line_end + 1;
            let line_len = char_len(line);

            if line_len > max {
                if let Some(s) = start.take() {
                    push_trimmed(&mut parts, &text[s..end]);
                }
                parts.extend(split_words(line, max));
                continue;
            }

            match start {
                Some(_) if current_len + 1 + line_len <= max => {
                    end = line_end;
                    current_len += 1 + line_len;
                }
                _ => {
                    if let Some(s) = start {
                        push_trimmed(&mut parts, &text[s..end]);
                    }
                    start = Some(line_start);
                    end = line_end;
                    current_len = line_len;
                }
            }
        }

        if let Some(s) = start {
            push_trimmed(&mut parts, &text[s..end]);
        }
        parts
    }
}

impl Default for ReplyFormatter {
    fn default() -> Self {
        Self::from_config(&ReplyConfig::default())
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn push_trimmed(parts: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        parts.push(trimmed.to_string());
    }
}

/// Pack the words of one line into chunks of at most `max` characters.
///
/// Chunks are slices of `line` that start and end on a word.
fn split_words(line: &str, max: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut current_len = 0;
    let mut offset = 0;

    for piece in line.split_inclusive(char::is_whitespace) {
        let word_start = offset;
        offset += piece.len();

        let word = piece.trim_end();
        if word.is_empty() {
            continue;
        }
        let word_end = word_start + word.len();

        if let Some(s) = start {
            let grown = current_len + char_len(&line[end..word_end]);
            if grown <= max {
                end = word_end;
                current_len = grown;
                continue;
            }
            chunks.push(line[s..end].to_string());
            start = None;
        }

        let word_len = char_len(word);
        if word_len > max {
            let mut cuts: Vec<usize> = word
                .char_indices()
                .map(|(index, _)| word_start + index)
                .step_by(max)
                .collect();
            cuts.push(word_end);
            chunks.extend(cuts.windows(2).map(|cut| line[cut[0]..cut[1]].to_string()));
            continue;
        }

        start = Some(word_start);
        end = word_end;
        current_len = word_len;
    }

    if let Some(s) = start {
        chunks.push(line[s..end].to_string());
    }
    chunks
}
