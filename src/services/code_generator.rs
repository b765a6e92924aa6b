//! Short code generation and custom code validation

use crate::config::ShortenerSettings;
use crate::errors::{Result, ShortenerError};
use crate::utils::{MAX_SHORT_CODE_LEN, generate_random_code, is_valid_short_code};

/// Random base62 codes of a fixed length
///
/// Uniqueness is not checked here. The caller inserts with
/// `insert_if_absent` and asks for another code on collision, at most
/// `max_attempts` times.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    length: usize,
    max_attempts: u32,
}

impl CodeGenerator {
    pub fn new(length: usize, max_attempts: u32) -> Self {
        Self {
            length: length.clamp(1, MAX_SHORT_CODE_LEN),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_settings(settings: &ShortenerSettings) -> Self {
        Self::new(settings.code_length, settings.max_generation_attempts)
    }

    pub fn generate(&self) -> String {
        generate_random_code(self.length)
    }

    /// 校验用户自定义短码
    pub fn validate(candidate: &str) -> Result<()> {
        if is_valid_short_code(candidate) {
            Ok(())
        } else {
            Err(ShortenerError::invalid_format(format!(
                "Invalid short code '{}'. Use 1-{} characters from A-Z, a-z, 0-9, '_' and '-'",
                candidate, MAX_SHORT_CODE_LEN
            )))
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_uses_configured_length() {
        let generator = CodeGenerator::new(8, 5);
        for _ in 0..100 {
            let code = generator.generate();
            assert_eq!(code.len(), 8);
            assert!(CodeGenerator::validate(&code).is_ok());
        }
    }

    #[test]
    fn test_generated_codes_rarely_repeat() {
        let generator = CodeGenerator::new(6, 5);
        let codes: HashSet<String> = (0..1000).map(|_| generator.generate()).collect();
        // 62^6 种组合，1000 个里出现重复几乎不可能
        assert!(codes.len() >= 999);
    }

    #[test]
    fn test_settings_are_clamped() {
        let generator = CodeGenerator::new(0, 0);
        assert_eq!(generator.length(), 1);
        assert_eq!(generator.max_attempts(), 1);

        let generator = CodeGenerator::new(100, 3);
        assert_eq!(generator.length(), MAX_SHORT_CODE_LEN);
    }

    #[test]
    fn test_validate_rejects_bad_codes() {
        let too_long = "x".repeat(MAX_SHORT_CODE_LEN + 1);
        for bad in ["", "a b", "a/b", "a.b", "ä", too_long.as_str()] {
            assert!(matches!(
                CodeGenerator::validate(bad),
                Err(ShortenerError::InvalidFormat(_))
            ));
        }
        assert!(CodeGenerator::validate("my-custom_Code9").is_ok());
    }
}
