use pfpb_battle::CardAttributes;
use thiserror::Error;

use crate::parser::parse_stats_text;

/// Turns raw card image bytes into attributes.
///
/// Implementations never fail past this boundary: when a card cannot be
/// read they return [`CardAttributes::default`], and the host decides
/// how to tell the player.
pub trait AttributeExtractor: Send + Sync {
    fn extract(&self, image: &[u8]) -> CardAttributes;
}

/// The image-to-text collaborator (OCR, a vision model). Out of scope
/// here beyond its signature.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &[u8]) -> Result<String, RecognitionError>;
}

/// Why a recognizer could not produce text for an image.
#[derive(Debug, Clone, Error)]
pub enum RecognitionError {
    #[error("unreadable image: {0}")]
    UnreadableImage(String),
    #[error("recognition backend failed: {0}")]
    Backend(String),
}

/// Extractor that recognizes the text on a card and parses stats out of
/// it, degrading to the fallback record when recognition fails.
pub struct TextRecognitionExtractor<R> {
    recognizer: R,
}

impl<R: TextRecognizer> TextRecognitionExtractor<R> {
    pub fn new(recognizer: R) -> Self {
        Self { recognizer }
    }
}

impl<R: TextRecognizer> AttributeExtractor for TextRecognitionExtractor<R> {
    fn extract(&self, image: &[u8]) -> CardAttributes {
        match self.recognizer.recognize(image) {
            Ok(text) => parse_stats_text(&text),
            Err(err) => {
                log::warn!("card text recognition failed, using fallback stats: {err}");
                CardAttributes::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedText(&'static str);

    impl TextRecognizer for FixedText {
        fn recognize(&self, _image: &[u8]) -> Result<String, RecognitionError> {
            Ok(self.0.to_string())
        }
    }

    struct Broken;

    impl TextRecognizer for Broken {
        fn recognize(&self, _image: &[u8]) -> Result<String, RecognitionError> {
            Err(RecognitionError::UnreadableImage("not an image".into()))
        }
    }

    #[test]
    fn test_recognized_text_is_parsed() {
        let extractor = TextRecognitionExtractor::new(FixedText("Power: 200 Defense: 150 Rare #9"));
        let attrs = extractor.extract(b"card bytes");
        assert_eq!(attrs.power, 200);
        assert_eq!(attrs.defense, 150);
        assert_eq!(attrs.serial, 9);
    }

    #[test]
    fn test_recognition_failure_substitutes_fallback_record() {
        let extractor = TextRecognitionExtractor::new(Broken);
        assert_eq!(extractor.extract(b"junk"), CardAttributes::default());
    }
}
