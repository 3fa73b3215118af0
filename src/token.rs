//! Random tokens
//!
//! Short random strings for session identifiers, cookie values and
//! confirmation codes.
//!
//! ```
//! use dispatch_server::token;
//!
//! let code = token::human(6);
//! assert_eq!(code.len(), 6);
//! ```

use rand::seq::IndexedRandom;

/// Digits and ASCII letters in both cases
pub const ALPHA_CHARSET: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Upper-case letters and digits that are hard to confuse when read aloud
/// or typed (no `0/O`, `1/I/L`, `5/S`, ...)
pub const HUMAN_CHARSET: &str = "ABCDEFGHJKMPRTWXY234789";

/// `length` characters drawn uniformly from `charset`. An empty charset
/// gives an empty token.
pub fn generate(charset: &str, length: usize) -> String {
    let chars: Vec<char> = charset.chars().collect();
    let mut rng = rand::rng();

    (0..length)
        .filter_map(|_| chars.choose(&mut rng).copied())
        .collect()
}

pub fn alpha(length: usize) -> String {
    generate(ALPHA_CHARSET, length)
}

pub fn human(length: usize) -> String {
    generate(HUMAN_CHARSET, length)
}
