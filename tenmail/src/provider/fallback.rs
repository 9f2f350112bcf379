//! Local address synthesis used when the provider cannot hand one out.

use rand::prelude::IndexedRandom;
use rand::Rng;

/// Domains used when none are configured.
pub const DEFAULT_DOMAINS: &[&str] = &["1secmail.com", "1secmail.org", "1secmail.net"];

const TOKEN_LEN: usize = 8;
const TOKEN_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Random lowercase alphanumeric local part.
fn random_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LEN)
        .map(|_| char::from(TOKEN_CHARS[rng.random_range(0..TOKEN_CHARS.len())]))
        .collect()
}

/// Build `<token>@<domain>` with the domain picked from `domains`.
///
/// Never fails: an empty or blank candidate list falls back to the defaults.
pub fn synthesize_address(domains: &[String]) -> String {
    let mut rng = rand::rng();
    let candidates: Vec<&str> = domains
        .iter()
        .map(|d| d.trim())
        .filter(|d| !d.is_empty())
        .collect();

    let domain = candidates
        .choose(&mut rng)
        .copied()
        .unwrap_or(DEFAULT_DOMAINS[0]);

    format!("{}@{}", random_token(), domain)
}

/// Whether `address` looks like `local@domain`.
pub fn is_valid_address(address: &str) -> bool {
    split_address(address).is_some()
}

/// Split an address into local part and domain.
pub fn split_address(address: &str) -> Option<(&str, &str)> {
    let (login, domain) = address.trim().split_once('@')?;
    if login.is_empty() || domain.is_empty() || domain.contains('@') || domain.contains(' ') {
        return None;
    }
    Some((login, domain))
}
