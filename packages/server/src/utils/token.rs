/// Number of random bytes in a token key; the hex key is twice as long.
const TOKEN_BYTES: usize = 20;

/// Generate a fresh opaque token key (40 lowercase hex characters).
pub fn generate_key() -> String {
    hex::encode(rand::random::<[u8; TOKEN_BYTES]>())
}

/// Pull the token key out of an `Authorization` header value.
///
/// Accepts both `Bearer <key>` and the `Token <key>` scheme, case-insensitively.
pub fn parse_authorization(header: &str) -> Option<&str> {
    let (scheme, key) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") && !scheme.eq_ignore_ascii_case("token") {
        return None;
    }
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some(key)
}
