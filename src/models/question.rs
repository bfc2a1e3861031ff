use serde::{Deserialize, Serialize};

pub const OPTION_LETTERS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Level(u8);

impl Level {
    pub const MIN: Level = Level(1);
    pub const MAX: Level = Level(5);

    pub fn clamped(raw: i64) -> Self {
        Level(raw.clamp(Self::MIN.0 as i64, Self::MAX.0 as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::MIN
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sorted, de-duplicated indices of the correct options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerKey(Vec<usize>);

impl AnswerKey {
    pub fn new(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        if indices.is_empty() {
            indices.push(0);
        }
        Self(indices)
    }

    pub fn single(index: usize) -> Self {
        Self(vec![index])
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn is_multi(&self) -> bool {
        self.0.len() > 1
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.binary_search(&index).is_ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub level: Level,
    pub prompt: String,
    pub options: Vec<String>,
    pub answer: AnswerKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Question {
    /// Maps a letter, a 1-based number or the literal option text to an option index.
    pub fn resolve_option(&self, token: &str) -> Option<usize> {
        option_index(token, &self.options)
    }

    pub fn option_by_text(&self, token: &str) -> Option<usize> {
        let trimmed = token.trim();
        self.options
            .iter()
            .position(|opt| opt.trim().eq_ignore_ascii_case(trimmed))
    }

    pub fn correct_texts(&self) -> Vec<String> {
        self.answer
            .indices()
            .iter()
            .filter_map(|&idx| self.options.get(idx).cloned())
            .collect()
    }
}

pub fn option_index(token: &str, options: &[String]) -> Option<usize> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return None;
    }

    let upper = trimmed.to_uppercase();
    let mut chars = upper.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if let Some(idx) = OPTION_LETTERS.iter().position(|&l| l == c) {
            return (idx < options.len()).then_some(idx);
        }
    }

    if let Ok(number) = trimmed.parse::<usize>() {
        if number >= 1 && number <= options.len() {
            return Some(number - 1);
        }
    }

    options
        .iter()
        .position(|opt| opt.trim().eq_ignore_ascii_case(trimmed))
}
