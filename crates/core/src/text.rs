use serde::{Deserialize, Serialize};

/// A recognized word with its position and engine-reported confidence (0–100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextToken {
    pub text: String,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    pub confidence: f32,
}

/// Cleaned OCR output. `confidence` is only filled when the caller asked for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognizedText {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl RecognizedText {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Average confidence over tokens the engine scored above zero; 0.0 when there are none.
pub fn mean_confidence(tokens: &[TextToken]) -> f32 {
    let (sum, n) = tokens
        .iter()
        .filter(|t| t.confidence > 0.0)
        .fold((0.0f32, 0u32), |(s, n), t| (s + t.confidence, n + 1));
    if n == 0 { 0.0 } else { sum / n as f32 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, confidence: f32) -> TextToken {
        TextToken { text: text.into(), left: 0, top: 0, width: 1, height: 1, confidence }
    }

    #[test]
    fn mean_confidence_ignores_non_positive() {
        let tokens = [token("a", 90.0), token("", -1.0), token("b", 60.0), token("c", 0.0)];
        assert_eq!(mean_confidence(&tokens), 75.0);
    }

    #[test]
    fn mean_confidence_zero_when_empty() {
        assert_eq!(mean_confidence(&[]), 0.0);
        assert_eq!(mean_confidence(&[token("", -1.0)]), 0.0);
    }
}
