//! Card data handling: validation, masking and AES-256-GCM sealing.
//!
//! Full card numbers never reach storage in clear text. With a sealing
//! key configured the number is stored as `base64(nonce || ciphertext)`;
//! otherwise only the last four digits survive.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

use crate::error::BookingError;

const NONCE_LEN: usize = 12;

/// Card details as submitted at checkout.
#[derive(Clone, Deserialize)]
pub struct CardDetails {
    pub number: String,
    pub cardholder_name: String,
    pub bank_name: String,
    /// `MM/YY`
    pub expiry: String,
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &mask(&self.number))
            .field("cardholder_name", &self.cardholder_name)
            .field("bank_name", &self.bank_name)
            .field("expiry", &self.expiry)
            .finish()
    }
}

fn mask(number: &str) -> String {
    let digits = digits_of(number);
    let tail = last4(&digits);
    format!("****{tail}")
}

fn digits_of(number: &str) -> String {
    number
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect()
}

fn last4(digits: &str) -> String {
    let n = digits.chars().count();
    digits.chars().skip(n.saturating_sub(4)).collect()
}

fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0;
    for (i, c) in digits.chars().rev().enumerate() {
        let Some(mut d) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    sum % 10 == 0
}

impl CardDetails {
    /// Normalized card number: digits only, checked for length and
    /// checksum. Spaces and dashes are accepted as separators.
    pub fn validated_number(&self) -> Result<String, BookingError> {
        let digits = digits_of(&self.number);
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(BookingError::InvalidCard("number must be digits".into()));
        }
        if !(12..=19).contains(&digits.len()) {
            return Err(BookingError::InvalidCard(
                "number must be 12 to 19 digits".into(),
            ));
        }
        if !luhn_valid(&digits) {
            return Err(BookingError::InvalidCard("checksum mismatch".into()));
        }
        Ok(digits)
    }

    /// Check the `MM/YY` expiry format.
    pub fn validate_expiry(&self) -> Result<(), BookingError> {
        let invalid = || BookingError::InvalidCard(format!("expiry {:?} is not MM/YY", self.expiry));
        let (month, year) = self.expiry.split_once('/').ok_or_else(invalid)?;
        if month.len() != 2 || year.len() != 2 || !year.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        match month.parse::<u8>() {
            Ok(1..=12) => Ok(()),
            _ => Err(invalid()),
        }
    }

    pub fn validate(&self) -> Result<String, BookingError> {
        if self.cardholder_name.trim().is_empty() {
            return Err(BookingError::InvalidCard("cardholder name is required".into()));
        }
        self.validate_expiry()?;
        self.validated_number()
    }

    pub fn last4(&self) -> String {
        last4(&digits_of(&self.number))
    }
}

/// Seal a card number with AES-256-GCM under a fresh random nonce.
pub fn seal(key: &[u8; 32], number: &str) -> Result<String, BookingError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, number.as_bytes())
        .map_err(|e| BookingError::Crypto(format!("AES-GCM encrypt: {e}")))?;

    let mut combined = nonce_bytes.to_vec();
    combined.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(combined))
}

/// Reverse of [`seal`].
pub fn open(key: &[u8; 32], sealed: &str) -> Result<String, BookingError> {
    let combined = STANDARD
        .decode(sealed)
        .map_err(|e| BookingError::Crypto(format!("base64 decode: {e}")))?;

    if combined.len() <= NONCE_LEN {
        return Err(BookingError::Crypto("ciphertext too short".into()));
    }

    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|e| BookingError::Crypto(format!("AES-GCM decrypt: {e}")))?;

    String::from_utf8(plaintext).map_err(|e| BookingError::Crypto(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(number: &str, expiry: &str) -> CardDetails {
        CardDetails {
            number: number.into(),
            cardholder_name: "Ada Lovelace".into(),
            bank_name: "Analytical Bank".into(),
            expiry: expiry.into(),
        }
    }

    #[test]
    fn accepts_spaced_valid_number() {
        let c = card("4111 1111 1111 1111", "12/29");
        assert_eq!(c.validate().unwrap(), "4111111111111111");
        assert_eq!(c.last4(), "1111");
    }

    #[test]
    fn rejects_bad_checksum() {
        let err = card("4111111111111112", "12/29").validate().unwrap_err();
        assert!(matches!(err, BookingError::InvalidCard(_)));
    }

    #[test]
    fn rejects_letters_and_short_numbers() {
        assert!(card("4111-abcd-1111-1111", "12/29").validate().is_err());
        assert!(card("42", "12/29").validate().is_err());
    }

    #[test]
    fn expiry_must_be_mm_yy() {
        assert!(card("4242424242424242", "13/29").validate().is_err());
        assert!(card("4242424242424242", "1/29").validate().is_err());
        assert!(card("4242424242424242", "12-29").validate().is_err());
        assert!(card("4242424242424242", "01/30").validate().is_ok());
    }

    #[test]
    fn debug_output_masks_the_number() {
        let shown = format!("{:?}", card("4242424242424242", "01/30"));
        assert!(shown.contains("****4242"));
        assert!(!shown.contains("4242424242424242"));
    }

    #[test]
    fn sealed_number_opens_with_same_key_only() {
        let key = [7u8; 32];
        let sealed = seal(&key, "4242424242424242").unwrap();
        assert!(!sealed.contains("4242"));
        assert_eq!(open(&key, &sealed).unwrap(), "4242424242424242");
        assert!(open(&[8u8; 32], &sealed).is_err());
    }

    #[test]
    fn sealing_twice_uses_fresh_nonces() {
        let key = [1u8; 32];
        assert_ne!(
            seal(&key, "4242424242424242").unwrap(),
            seal(&key, "4242424242424242").unwrap()
        );
    }

    #[test]
    fn truncated_ciphertext_is_rejected() {
        let err = open(&[0u8; 32], &STANDARD.encode([0u8; 5])).unwrap_err();
        assert!(matches!(err, BookingError::Crypto(_)));
    }
}
