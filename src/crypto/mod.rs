//! Temporary credential generation

use rand::seq::SliceRandom;
use rand::Rng;

const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"!@#$%^&*-_=+";

/// Length of generated temporary passwords.
pub const TEMP_PASSWORD_LEN: usize = 16;

/// Generate a random temporary password.
///
/// Guaranteed to contain at least one character from each class
/// (upper, lower, digit, symbol). The account is expected to force a
/// password change at next sign-in, so the value is never stored.
pub fn generate_temp_password() -> String {
    let mut rng = rand::thread_rng();
    let mut chars: Vec<u8> = Vec::with_capacity(TEMP_PASSWORD_LEN);

    for class in [UPPER, LOWER, DIGITS, SYMBOLS] {
        chars.push(class[rng.gen_range(0..class.len())]);
    }

    let all: Vec<u8> = [UPPER, LOWER, DIGITS, SYMBOLS].concat();
    while chars.len() < TEMP_PASSWORD_LEN {
        chars.push(all[rng.gen_range(0..all.len())]);
    }

    chars.shuffle(&mut rng);
    String::from_utf8(chars).expect("password characters are ASCII")
}
