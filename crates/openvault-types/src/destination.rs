//! Payout destinations and their shape validation.
//!
//! Destination details are validated before any lock is taken or any
//! balance is touched — a malformed destination must never cost a row lock.

use serde::{Deserialize, Serialize};

use crate::{Result, VaultError, WithdrawalMethod};

/// Where an approved withdrawal is paid out to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoutDestination {
    /// UPI virtual payment address, e.g. `someone@okbank`.
    Upi { handle: String },
    /// Indian bank account identified by name, account number and IFSC.
    Bank {
        account_name: String,
        account_number: String,
        ifsc: String,
    },
}

impl PayoutDestination {
    /// The withdrawal method this destination corresponds to.
    #[must_use]
    pub fn method(&self) -> WithdrawalMethod {
        match self {
            Self::Upi { .. } => WithdrawalMethod::Upi,
            Self::Bank { .. } => WithdrawalMethod::Bank,
        }
    }

    /// Validate the destination shape.
    ///
    /// - UPI: exactly one `@` with non-empty local and domain parts.
    /// - Bank: non-empty account name, numeric account number, and an
    ///   IFSC-shaped code (four letters, a literal zero, six alphanumerics).
    ///
    /// # Errors
    /// Returns [`VaultError::InvalidDestination`] describing the first
    /// violation found.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Upi { handle } => validate_upi_handle(handle),
            Self::Bank {
                account_name,
                account_number,
                ifsc,
            } => {
                if account_name.trim().is_empty() {
                    return Err(VaultError::InvalidDestination {
                        reason: "account name must not be empty".into(),
                    });
                }
                if account_number.is_empty()
                    || !account_number.bytes().all(|b| b.is_ascii_digit())
                {
                    return Err(VaultError::InvalidDestination {
                        reason: "account number must be numeric".into(),
                    });
                }
                if !is_ifsc_shaped(ifsc) {
                    return Err(VaultError::InvalidDestination {
                        reason: format!("malformed IFSC code: {ifsc}"),
                    });
                }
                Ok(())
            }
        }
    }

    /// Masked representation safe for history listings and admin screens.
    /// Never exposes the full account number or UPI handle.
    #[must_use]
    pub fn masked(&self) -> String {
        match self {
            Self::Upi { handle } => match handle.split_once('@') {
                Some((local, domain)) => {
                    let visible: String = local.chars().take(2).collect();
                    format!("{visible}***@{domain}")
                }
                None => "***".to_string(),
            },
            Self::Bank { account_number, .. } => {
                let tail: String = account_number
                    .chars()
                    .rev()
                    .take(4)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .collect();
                format!("****{tail}")
            }
        }
    }
}

fn validate_upi_handle(handle: &str) -> Result<()> {
    let mut parts = handle.split('@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next();
    let extra = parts.next();

    match (domain, extra) {
        (Some(domain), None) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(VaultError::InvalidDestination {
            reason: format!("malformed UPI handle: {handle}"),
        }),
    }
}

/// IFSC shape: 4 ASCII letters (bank code), a literal `0`, 6 alphanumerics
/// (branch code). 11 characters total.
fn is_ifsc_shaped(code: &str) -> bool {
    let bytes = code.as_bytes();
    bytes.len() == 11
        && bytes[..4].iter().all(u8::is_ascii_alphabetic)
        && bytes[4] == b'0'
        && bytes[5..].iter().all(u8::is_ascii_alphanumeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank(name: &str, number: &str, ifsc: &str) -> PayoutDestination {
        PayoutDestination::Bank {
            account_name: name.into(),
            account_number: number.into(),
            ifsc: ifsc.into(),
        }
    }

    #[test]
    fn valid_upi_handle() {
        let dest = PayoutDestination::Upi {
            handle: "asha@okaxis".into(),
        };
        assert!(dest.validate().is_ok());
        assert_eq!(dest.method(), WithdrawalMethod::Upi);
    }

    #[test]
    fn upi_rejects_missing_at() {
        let dest = PayoutDestination::Upi {
            handle: "asha.okaxis".into(),
        };
        assert!(matches!(
            dest.validate().unwrap_err(),
            VaultError::InvalidDestination { .. }
        ));
    }

    #[test]
    fn upi_rejects_double_at_and_empty_parts() {
        for handle in ["a@b@c", "@okaxis", "asha@", "@"] {
            let dest = PayoutDestination::Upi {
                handle: handle.into(),
            };
            assert!(dest.validate().is_err(), "should reject {handle}");
        }
    }

    #[test]
    fn valid_bank_destination() {
        let dest = bank("Asha Rao", "001234567890", "HDFC0001234");
        assert!(dest.validate().is_ok());
        assert_eq!(dest.method(), WithdrawalMethod::Bank);
    }

    #[test]
    fn bank_rejects_empty_name() {
        let dest = bank("  ", "001234567890", "HDFC0001234");
        assert!(dest.validate().is_err());
    }

    #[test]
    fn bank_rejects_non_numeric_account() {
        let dest = bank("Asha Rao", "0012-3456", "HDFC0001234");
        assert!(dest.validate().is_err());
        let dest = bank("Asha Rao", "", "HDFC0001234");
        assert!(dest.validate().is_err());
    }

    #[test]
    fn ifsc_shape_matrix() {
        assert!(is_ifsc_shaped("HDFC0001234"));
        assert!(is_ifsc_shaped("ICIC0ABC123"));
        assert!(!is_ifsc_shaped("HDFC1001234")); // fifth char must be zero
        assert!(!is_ifsc_shaped("HDF00001234")); // only three letters
        assert!(!is_ifsc_shaped("HDFC000123")); // too short
        assert!(!is_ifsc_shaped("HDFC00012345")); // too long
        assert!(!is_ifsc_shaped("HDFC000123!")); // non-alphanumeric branch
    }

    #[test]
    fn masked_never_shows_full_details() {
        let upi = PayoutDestination::Upi {
            handle: "asha@okaxis".into(),
        };
        assert_eq!(upi.masked(), "as***@okaxis");

        let acct = bank("Asha Rao", "001234567890", "HDFC0001234");
        assert_eq!(acct.masked(), "****7890");
        assert!(!acct.masked().contains("00123456"));
    }
}
