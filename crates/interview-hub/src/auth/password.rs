//! PBKDF2-HMAC-SHA256 password hashes stored as
//! `pbkdf2_sha256$<iterations>$<salt>$<hex digest>`.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::http::FieldErrors;

const SCHEME: &str = "pbkdf2_sha256";
pub const PBKDF2_ITERATIONS: u32 = 600_000;
pub const MIN_PASSWORD_LENGTH: usize = 8;

const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "12345678", "123456789", "qwerty123", "iloveyou", "letmein1",
    "admin123", "welcome1", "11111111",
];

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn derive(password: &str, salt: &str, iterations: u32) -> String {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut key);
    to_hex(&key)
}

pub fn hash_password(password: &str) -> String {
    hash_password_with(password, PBKDF2_ITERATIONS)
}

/// Hashes with an explicit work factor; the count is stored in the hash so
/// raising [`PBKDF2_ITERATIONS`] keeps older hashes verifiable.
pub fn hash_password_with(password: &str, iterations: u32) -> String {
    let iterations = iterations.max(1);
    let salt = to_hex(&rand::random::<[u8; 16]>());
    let digest = derive(password, &salt, iterations);
    format!("{SCHEME}${iterations}${salt}${digest}")
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(4, '$');
    let (Some(SCHEME), Some(iterations), Some(salt), Some(expected)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let Some(iterations) = iterations.parse::<u32>().ok().filter(|count| *count > 0) else {
        return false;
    };
    constant_time_eq(derive(password, salt, iterations).as_bytes(), expected.as_bytes())
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Password strength rules applied at registration.
pub fn check_password_strength(errors: &mut FieldErrors, password: &str, username: &str) {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(
            "password",
            format!("This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."),
        );
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        errors.add("password", "This password is entirely numeric.");
    }
    if COMMON_PASSWORDS.contains(&password.to_lowercase().as_str()) {
        errors.add("password", "This password is too common.");
    }
    if !username.is_empty() && password.eq_ignore_ascii_case(username) {
        errors.add("password", "The password is too similar to the username.");
    }
}
