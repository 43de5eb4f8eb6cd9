//! Account Number Allocator
//!
//! Generates bank-prefixed account numbers (`BANK-482951`). The random part
//! is six digits, so collisions are rare but real; callers retry against the
//! store's uniqueness constraint (see `AccountService::open_account`).

use rand::Rng;

use super::models::AccountNumber;
use crate::error::LedgerError;

/// Allocator bound to this bank's prefix
#[derive(Debug, Clone)]
pub struct AccountNumberAllocator {
    prefix: String,
}

impl AccountNumberAllocator {
    /// Create an allocator for the given bank prefix
    ///
    /// The prefix must be 2-8 uppercase letters or digits.
    pub fn new(prefix: &str) -> Result<Self, LedgerError> {
        let prefix = prefix.trim();
        let valid = (2..=8).contains(&prefix.len())
            && prefix
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
        if !valid {
            return Err(LedgerError::InvalidAccountNumber(format!(
                "bad bank prefix: {prefix}"
            )));
        }
        Ok(Self {
            prefix: prefix.to_string(),
        })
    }

    /// The bank prefix this allocator stamps on every number
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generate a candidate account number
    ///
    /// Uniqueness is NOT guaranteed here; the store's unique constraint is
    /// the authority and the caller retries on conflict.
    pub fn generate(&self) -> AccountNumber {
        let digits: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
        let raw = format!("{}-{}", self.prefix, digits);
        AccountNumber::new(&raw).expect("generated number matches validation rules")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_validation() {
        assert!(AccountNumberAllocator::new("BANK").is_ok());
        assert!(AccountNumberAllocator::new("A1").is_ok());
        assert!(AccountNumberAllocator::new("B").is_err()); // too short
        assert!(AccountNumberAllocator::new("TOOLONGBANK").is_err());
        assert!(AccountNumberAllocator::new("bank").is_err()); // lowercase
        assert!(AccountNumberAllocator::new("BA-NK").is_err()); // dash reserved
    }

    #[test]
    fn test_generated_shape() {
        let alloc = AccountNumberAllocator::new("BANK").unwrap();
        for _ in 0..100 {
            let n = alloc.generate();
            assert!(n.is_local("BANK"), "generated {n} must be local");
            let digits = n.as_str().strip_prefix("BANK-").unwrap();
            assert_eq!(digits.len(), 6);
            assert!(digits.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
