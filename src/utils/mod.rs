pub mod url_validator;

pub use url_validator::{normalize_url, validate_url};

/// 短码允许的最大长度
pub const MAX_SHORT_CODE_LEN: usize = 32;

/// Base62 字母表，随机短码只从这里取字符
pub const BASE62_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub fn generate_random_code(length: usize) -> String {
    use std::iter;

    iter::repeat_with(|| BASE62_ALPHABET[rand::random_range(0..BASE62_ALPHABET.len())] as char)
        .take(length)
        .collect()
}

/// 校验短码格式：1-32 个字符，只允许 `[A-Za-z0-9_-]`
pub fn is_valid_short_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_SHORT_CODE_LEN
        && code
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_random_code_length_and_alphabet() {
        for len in [1, 6, 12, 32] {
            let code = generate_random_code(len);
            assert_eq!(code.len(), len);
            assert!(code.bytes().all(|b| BASE62_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_valid_short_codes() {
        assert!(is_valid_short_code("a"));
        assert!(is_valid_short_code("abc123"));
        assert!(is_valid_short_code("my-link_2"));
        assert!(is_valid_short_code(&"x".repeat(MAX_SHORT_CODE_LEN)));
    }

    #[test]
    fn test_invalid_short_codes() {
        assert!(!is_valid_short_code(""));
        assert!(!is_valid_short_code(&"x".repeat(MAX_SHORT_CODE_LEN + 1)));
        assert!(!is_valid_short_code("has space"));
        assert!(!is_valid_short_code("slash/code"));
        assert!(!is_valid_short_code("dot.code"));
        assert!(!is_valid_short_code("ünïcode"));
        assert!(!is_valid_short_code("semi;colon"));
    }
}
