//! Variable resolution for change actions.

use rand::Rng;

use crate::models::VariableDescriptor;

const DEFAULT_LENGTH: usize = 10;
/// Generated email local parts never go below this length.
const MIN_EMAIL_LOCAL_LENGTH: usize = 4;

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Resolve a variable descriptor to a concrete string.
///
/// Built-in generator names produce random values; any other name falls back
/// to the descriptor's stored value (empty when absent).
pub fn resolve_variable(descriptor: &VariableDescriptor) -> String {
    let length = descriptor.length.unwrap_or(DEFAULT_LENGTH);

    match descriptor.name.as_deref() {
        Some("randomName") => random_from(LOWERCASE, length),
        Some("randomNumber") => random_from(DIGITS, length),
        Some("randomAlphaNumeric") => random_from(ALPHANUMERIC, length),
        Some("randomEmail") => {
            let local = random_from(ALPHANUMERIC, length.max(MIN_EMAIL_LOCAL_LENGTH));
            format!("{local}@example.com")
        }
        _ => descriptor.value.clone().unwrap_or_default(),
    }
}

fn random_from(charset: &[u8], length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| charset[rng.gen_range(0..charset.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, length: Option<usize>) -> VariableDescriptor {
        VariableDescriptor {
            name: Some(name.to_string()),
            value: None,
            length,
        }
    }

    #[test]
    fn random_name_is_lowercase_ascii() {
        let value = resolve_variable(&descriptor("randomName", Some(16)));
        assert_eq!(value.len(), 16);
        assert!(value.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn random_number_is_digits() {
        let value = resolve_variable(&descriptor("randomNumber", Some(8)));
        assert_eq!(value.len(), 8);
        assert!(value.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn random_alphanumeric_is_letters_and_digits() {
        let value = resolve_variable(&descriptor("randomAlphaNumeric", None));
        assert_eq!(value.len(), DEFAULT_LENGTH);
        assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn random_email_has_minimum_local_part() {
        let value = resolve_variable(&descriptor("randomEmail", Some(2)));
        let (local, domain) = value.split_once('@').unwrap();
        assert_eq!(domain, "example.com");
        assert_eq!(local.len(), MIN_EMAIL_LOCAL_LENGTH);
        assert!(local.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn unknown_name_falls_back_to_stored_value() {
        let stored = VariableDescriptor {
            name: Some("customerId".to_string()),
            value: Some("C-1042".to_string()),
            length: None,
        };
        assert_eq!(resolve_variable(&stored), "C-1042");

        let empty = VariableDescriptor {
            name: Some("customerId".to_string()),
            value: None,
            length: None,
        };
        assert_eq!(resolve_variable(&empty), "");
    }
}
