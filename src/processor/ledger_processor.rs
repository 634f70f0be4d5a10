use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::warn;

use crate::{
    account::Transaction,
    operation::{Operation, OperationKind},
    store::LedgerStore,
};

use super::{OperationError, OperationProcessor};

/// Store-backed processor. Validation runs under the relevant account
/// lock(s), so a check and the commit it guards form one critical section;
/// two concurrent debits can never both pass the funds check against the
/// same balance.
pub struct LedgerProcessor {
    store: Arc<LedgerStore>,
}

impl LedgerProcessor {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    fn execute_debit(&self, operation: Operation) -> Result<Transaction, OperationError> {
        let mut source = self.store.lock_account(&operation.source_account)?;
        source.check_debit(operation.amount)?;
        let description = operation.description();
        Ok(self.store.commit_one(&mut source, operation.amount, description)?)
    }

    /// Dual posting: debit the funding account and credit the target card
    /// by the same magnitude, committed under both locks so readers see
    /// both entries or neither. The block check applies to the funding
    /// side only; a blocked card still receives the incoming credit.
    fn execute_settlement(&self, operation: Operation) -> Result<Transaction, OperationError> {
        let Some(target_id) = self.store.find_credit_account(&operation.source_account) else {
            // keep the error precedence: an unresolved, blocked or
            // underfunded source is reported before the missing target
            let source = self.store.lock_account(&operation.source_account)?;
            source.check_debit(operation.amount)?;
            return Err(OperationError::NoCreditAccount);
        };

        let (mut source, mut target) = self
            .store
            .lock_pair(&operation.source_account, &target_id)?;
        source.check_debit(operation.amount)?;

        let source_description = format!("Payment to Card {}", target.alias());
        let (debit, _credit) = self.store.commit_pair(
            &mut source,
            operation.amount,
            source_description,
            &mut target,
            -operation.amount,
            "Payment received".to_string(),
        )?;
        Ok(debit)
    }
}

impl OperationProcessor for LedgerProcessor {
    fn execute(&self, operation: Operation) -> Result<Transaction, OperationError> {
        if operation.amount <= Decimal::ZERO {
            return Err(OperationError::InvalidAmount);
        }
        let kind = operation.kind;
        let source = operation.source_account.clone();
        let result = match kind {
            OperationKind::CreditSettlement => self.execute_settlement(operation),
            _ => self.execute_debit(operation),
        };
        if let Err(err) = &result {
            warn!(account = %source, ?kind, %err, "operation rejected");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use crate::account::{Account, AccountKind};

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn seed_accounts() -> Vec<Account> {
        vec![
            Account::new("1", AccountKind::Debit, "Payroll", "**1234", dec("11692.00"), None),
            Account::new("2", AccountKind::Savings, "Goal", "**5678", dec("49612.50"), None),
            Account::new(
                "3",
                AccountKind::Credit,
                "Gold Card",
                "**9012",
                dec("-503500.00"),
                Some(dec("50000")),
            ),
        ]
    }

    fn processor_with(accounts: Vec<Account>) -> (Arc<LedgerStore>, LedgerProcessor) {
        let store = Arc::new(LedgerStore::new(accounts));
        let processor = LedgerProcessor::new(Arc::clone(&store));
        (store, processor)
    }

    fn operation(kind: OperationKind, account: &str, amount: &str) -> Operation {
        Operation {
            source_account: account.to_string(),
            amount: dec(amount),
            kind,
            reference: None,
            provider: None,
        }
    }

    fn balance_of(store: &LedgerStore, id: &str) -> Decimal {
        store
            .get_accounts()
            .into_iter()
            .find(|a| a.id() == id)
            .unwrap()
            .balance()
    }

    #[test]
    fn non_positive_amount_rejected() {
        let (store, processor) = processor_with(seed_accounts());
        for amount in ["0", "-10.00"] {
            let err = processor
                .execute(operation(OperationKind::Transfer, "1", amount))
                .unwrap_err();
            assert!(matches!(err, OperationError::InvalidAmount));
        }
        assert!(store.get_transactions(None).is_empty());
    }

    #[test]
    fn unknown_source_account_rejected() {
        let (_, processor) = processor_with(seed_accounts());
        let err = processor
            .execute(operation(OperationKind::Withdrawal, "9", "10.00"))
            .unwrap_err();
        assert!(matches!(
            err,
            OperationError::StoreErr(crate::store::StoreError::AccountNotFound(_))
        ));
    }

    #[test]
    fn insufficient_funds_leaves_no_trace() {
        let (store, processor) = processor_with(vec![Account::new(
            "1",
            AccountKind::Debit,
            "Payroll",
            "**1234",
            dec("100.00"),
            None,
        )]);
        let err = processor
            .execute(operation(OperationKind::Transfer, "1", "150.00"))
            .unwrap_err();
        assert!(matches!(
            err,
            OperationError::AccountErr(crate::account::AccountError::InsufficientFunds)
        ));
        assert!(store.get_transactions(None).is_empty());
        assert_eq!(balance_of(&store, "1"), dec("100.00"));
    }

    #[test]
    fn credit_account_bypasses_funds_check() {
        let (store, processor) = processor_with(seed_accounts());
        let tx = processor
            .execute(operation(OperationKind::CardPayment, "3", "1000.00"))
            .unwrap();
        assert_eq!(tx.amount, dec("-1000.00"));
        assert_eq!(balance_of(&store, "3"), dec("-504500.00"));
    }

    #[test]
    fn settlement_posts_to_both_accounts() {
        let (store, processor) = processor_with(seed_accounts());
        let debit = processor
            .execute(operation(OperationKind::CreditSettlement, "1", "500.00"))
            .unwrap();

        assert_eq!(balance_of(&store, "1"), dec("11192.00"));
        assert_eq!(balance_of(&store, "3"), dec("-503000.00"));
        assert_eq!(debit.description, "Payment to Card Gold Card");

        let entries = store.get_transactions(None);
        assert_eq!(entries.len(), 2);
        let credit = entries.iter().find(|tx| tx.account_id == "3").unwrap();
        assert_eq!(credit.description, "Payment received");
        assert_eq!(credit.amount, dec("500.00"));
        assert_eq!(credit.timestamp, debit.timestamp);
    }

    #[test]
    fn settlement_without_credit_account_rejected() {
        let (store, processor) = processor_with(vec![Account::new(
            "1",
            AccountKind::Debit,
            "Payroll",
            "**1234",
            dec("1000.00"),
            None,
        )]);
        let err = processor
            .execute(operation(OperationKind::CreditSettlement, "1", "100.00"))
            .unwrap_err();
        assert!(matches!(err, OperationError::NoCreditAccount));
        assert!(store.get_transactions(None).is_empty());
        assert_eq!(balance_of(&store, "1"), dec("1000.00"));
    }

    #[test]
    fn settlement_cannot_be_funded_by_the_card_itself() {
        let (store, processor) = processor_with(seed_accounts());
        let err = processor
            .execute(operation(OperationKind::CreditSettlement, "3", "100.00"))
            .unwrap_err();
        assert!(matches!(err, OperationError::NoCreditAccount));
        assert!(store.get_transactions(None).is_empty());
    }

    #[test]
    fn blocked_source_rejected_before_missing_target() {
        let (store, processor) = processor_with(vec![Account::new(
            "1",
            AccountKind::Debit,
            "Payroll",
            "**1234",
            dec("1000.00"),
            None,
        )]);
        store.lock_account(&"1".to_string()).unwrap().set_blocked(true);
        let err = processor
            .execute(operation(OperationKind::CreditSettlement, "1", "100.00"))
            .unwrap_err();
        assert!(matches!(
            err,
            OperationError::AccountErr(crate::account::AccountError::InstrumentBlocked)
        ));
    }

    #[test]
    fn blocked_account_rejects_outgoing_debits() {
        let (store, processor) = processor_with(seed_accounts());
        store.lock_account(&"1".to_string()).unwrap().set_blocked(true);
        for kind in [OperationKind::CardPayment, OperationKind::Withdrawal] {
            let err = processor
                .execute(operation(kind, "1", "10.00"))
                .unwrap_err();
            assert!(matches!(
                err,
                OperationError::AccountErr(crate::account::AccountError::InstrumentBlocked)
            ));
        }
        assert!(store.get_transactions(None).is_empty());
        assert_eq!(balance_of(&store, "1"), dec("11692.00"));
    }

    #[test]
    fn blocked_card_still_receives_settlement_credit() {
        let (store, processor) = processor_with(seed_accounts());
        store.lock_account(&"3".to_string()).unwrap().set_blocked(true);
        processor
            .execute(operation(OperationKind::CreditSettlement, "1", "500.00"))
            .unwrap();
        assert_eq!(balance_of(&store, "3"), dec("-503000.00"));
    }

    #[test]
    fn provider_lands_in_the_description() {
        let (store, processor) = processor_with(seed_accounts());
        let mut op = operation(OperationKind::ServicePayment, "1", "350.00");
        op.provider = Some("CFE".to_string());
        let tx = processor.execute(op).unwrap();
        assert_eq!(tx.description, "Service Payment - CFE");
        assert_eq!(store.get_transactions(None)[0].description, "Service Payment - CFE");
    }

    #[test]
    fn reconciliation_holds_after_a_mixed_sequence() {
        let (store, processor) = processor_with(seed_accounts());
        processor
            .execute(operation(OperationKind::Transfer, "1", "45.00"))
            .unwrap();
        processor
            .execute(operation(OperationKind::CardPayment, "3", "150.00"))
            .unwrap();
        processor
            .execute(operation(OperationKind::CreditSettlement, "2", "500.00"))
            .unwrap();
        processor
            .execute(operation(OperationKind::Transfer, "1", "999999.00"))
            .unwrap_err();

        for account in store.get_accounts() {
            let opening = seed_accounts()
                .into_iter()
                .find(|a| a.id() == account.id())
                .unwrap()
                .balance();
            let delta: Decimal = store
                .get_transactions(Some(account.id()))
                .iter()
                .map(|tx| tx.amount)
                .sum();
            assert_eq!(account.balance(), opening + delta);
        }
    }

    #[test]
    fn concurrent_debits_on_one_account_serialize() {
        let (store, processor) = processor_with(vec![Account::new(
            "1",
            AccountKind::Debit,
            "Payroll",
            "**1234",
            dec("1000.00"),
            None,
        )]);
        let threads: usize = 4;
        let per_thread: usize = 10;
        thread::scope(|scope| {
            for _ in 0..threads {
                scope.spawn(|| {
                    for _ in 0..per_thread {
                        processor
                            .execute(operation(OperationKind::Withdrawal, "1", "10.00"))
                            .unwrap();
                    }
                });
            }
        });
        let total = Decimal::from((threads * per_thread) as u64) * dec("10.00");
        assert_eq!(balance_of(&store, "1"), dec("1000.00") - total);
        assert_eq!(store.get_transactions(None).len(), threads * per_thread);
    }
}
