use validator::ValidateEmail;

/// Validates that the input looks like `local@domain.tld`.
///
/// The crate-level check alone accepts dotless domains (`user@localhost`),
/// which the waitlist should not, so the domain must also contain a dot.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty() || !email.validate_email() {
        return false;
    }
    match email.rsplit_once('@') {
        Some((_, domain)) => domain.contains('.'),
        None => false,
    }
}
