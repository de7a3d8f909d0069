//! Site API key helpers: generation, comparison, and display.

use rand::Rng;
use subtle::ConstantTimeEq;

/// Length of a generated API key.
pub const KEY_LENGTH: usize = 32;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random 32-character alphanumeric key from the thread-local CSPRNG.
pub fn generate_key() -> String {
    let mut rng = rand::thread_rng();
    (0..KEY_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Compare a presented credential with the stored key in constant time.
///
/// Length is not secret: keys of different lengths compare unequal
/// immediately.
pub fn constant_time_eq(presented: &str, stored: &str) -> bool {
    let (a, b) = (presented.as_bytes(), stored.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Strip everything but ASCII alphanumerics from an operator-supplied key.
pub fn sanitize_key(value: &str) -> String {
    value.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Mask a key for display, keeping the first and last four characters.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
