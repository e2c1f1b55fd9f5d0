//! Domain Error Types
//!
//! Business-rule rejections that don't depend on infrastructure. Every
//! variant is detected before any state is mutated.

use thiserror::Error;

use super::ActionKind;

/// Domain-specific errors
///
/// These errors represent business rule violations. They are independent of
/// the web/infrastructure layer and never carry storage detail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Balance is not sufficient for the requested debit
    #[error("{}", insufficient_funds_message(.0))]
    InsufficientFunds(ActionKind),

    /// Transfer target account does not exist
    #[error("We couldn't find the recipient's account. Please double-check the account ID.")]
    TargetNotFound(String),

    /// Transfer where the target is the acting account
    #[error("You cannot transfer to your own account.")]
    SelfTransfer,

    /// Action kind not recognized by the mutation engine
    #[error("Unrecognized action '{0}'.")]
    UnknownAction(String),

    /// Registration with an account ID that is already taken
    #[error("This account ID is already in use. Please use a different account ID.")]
    DuplicateAccount(String),

    /// Crediting would push the balance past the representable maximum
    #[error("The resulting balance would exceed the maximum supported value.")]
    BalanceOverflow,
}

fn insufficient_funds_message(action: &ActionKind) -> &'static str {
    match action {
        ActionKind::Withdraw => {
            "Insufficient balance to complete the withdrawal. Please check your balance and try again."
        }
        ActionKind::Transfer => {
            "Your balance is not enough to complete the transfer. Please try a lower amount."
        }
        ActionKind::BillPayment => {
            "Your balance is not enough to complete the bill payment. Please try a lower amount."
        }
        ActionKind::Deposit => "Insufficient balance.",
    }
}

impl DomainError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientFunds(_) => "insufficient_funds",
            Self::TargetNotFound(_) => "target_not_found",
            Self::SelfTransfer => "self_transfer",
            Self::UnknownAction(_) => "unknown_action",
            Self::DuplicateAccount(_) => "duplicate_account",
            Self::BalanceOverflow => "balance_overflow",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_message_per_action() {
        let withdraw = DomainError::InsufficientFunds(ActionKind::Withdraw);
        assert!(withdraw.to_string().contains("withdrawal"));

        let transfer = DomainError::InsufficientFunds(ActionKind::Transfer);
        assert!(transfer.to_string().contains("transfer"));

        let bill = DomainError::InsufficientFunds(ActionKind::BillPayment);
        assert!(bill.to_string().contains("bill payment"));
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(
            DomainError::InsufficientFunds(ActionKind::Withdraw).code(),
            "insufficient_funds"
        );
        assert_eq!(DomainError::SelfTransfer.code(), "self_transfer");
        assert_eq!(
            DomainError::UnknownAction("refund".to_string()).code(),
            "unknown_action"
        );
    }
}
