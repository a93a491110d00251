/// Normalize an email address by lowercasing its domain part.
///
/// The local part is left untouched; some mail providers treat it as case-sensitive.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Minimal structural check: exactly one non-empty local part and a non-empty domain.
pub fn is_valid_email(email: &str) -> bool {
    match email.rsplit_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !local.contains('@')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}
