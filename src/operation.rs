use rust_decimal::Decimal;
use serde::Deserialize;

use crate::account::AccountId;

/// The closed set of monetary operations the processor accepts.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Transfer,
    CardPayment,
    Withdrawal,
    ServicePayment,
    AirtimePayment,
    CreditSettlement,
}

impl OperationKind {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Transfer => "Transfer",
            Self::CardPayment => "Card Payment",
            Self::Withdrawal => "Cardless Withdrawal",
            Self::ServicePayment => "Service Payment",
            Self::AirtimePayment => "Airtime Top-Up",
            Self::CreditSettlement => "Card Settlement",
        }
    }
}

/// A monetary operation as submitted by the caller. `amount` is a positive
/// magnitude; the sign convention is applied by the store when the entry is
/// written. `reference` and `provider` only feed the entry description.
#[derive(Debug, Clone, Deserialize)]
pub struct Operation {
    #[serde(rename = "account")]
    pub source_account: AccountId,
    pub amount: Decimal,
    pub kind: OperationKind,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

impl Operation {
    /// Ledger entry description for the debited side. Stable for the same
    /// input. Settlement entries are labelled by the processor instead,
    /// since they need the target card's alias.
    pub fn description(&self) -> String {
        match &self.provider {
            Some(provider) if !provider.is_empty() => {
                format!("{} - {}", self.kind.title(), provider)
            }
            _ => self.kind.title().to_string(),
        }
    }
}
