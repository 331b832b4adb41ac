//! Integration Tests - End-to-end Ledger Component Testing
//!
//! Tests the interaction between the ledger service, the repository port
//! and both mock and file-backed adapters.
//! Uses mockall for trait mocking and tokio::test for async tests.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use mockall::mock;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use bet_ledger::adapters::persistence::RepositoryImpl;
use bet_ledger::domain::account::{AccountId, AccountProfile, ClubSettings, NewAccount, Provider};
use bet_ledger::domain::operation::{
    Category, LegRequest, OperationStatus, PlaceOperationRequest, ResolveRequest, StakeRequest,
};
use bet_ledger::domain::transaction::TransactionKind;
use bet_ledger::ports::repository::{AuditAction, AuditEntry, LedgerSnapshot, Repository};
use bet_ledger::usecases::ledger::{Ledger, LedgerPolicy, TransferRequest};
use bet_ledger::usecases::service::{LedgerService, ServiceError};

// ---- Mock Definitions ----

mock! {
    pub Repo {}

    #[async_trait::async_trait]
    impl Repository for Repo {
        async fn save_state(&self, state: &LedgerSnapshot) -> anyhow::Result<()>;
        async fn load_latest_state(&self) -> anyhow::Result<Option<LedgerSnapshot>>;
        async fn append_audit(&self, entry: &AuditEntry) -> anyhow::Result<()>;
        async fn load_audit(&self) -> anyhow::Result<Vec<AuditEntry>>;
        async fn is_healthy(&self) -> bool;
    }
}

// ---- Helpers ----

fn house(name: &str, provider: Provider, cash: Decimal, freebet: Decimal) -> NewAccount {
    NewAccount {
        profile: AccountProfile {
            name: name.to_string(),
            provider,
            club: ClubSettings::default(),
            notes: None,
            last_code_date: None,
        },
        cash_balance: cash,
        freebet_balance: freebet,
    }
}

fn surebet(first: AccountId, second: AccountId) -> PlaceOperationRequest {
    PlaceOperationRequest {
        game_name: "Team A x Team B".to_string(),
        category: Category::Sports,
        match_id: Some("match-42".to_string()),
        legs: vec![
            LegRequest {
                odd: dec!(2.10),
                stakes: vec![StakeRequest {
                    account_id: first,
                    amount: dec!(100),
                    is_freebet: false,
                }],
            },
            LegRequest {
                odd: dec!(3.00),
                stakes: vec![StakeRequest {
                    account_id: second,
                    amount: dec!(50),
                    is_freebet: true,
                }],
            },
        ],
    }
}

/// Ledger with one house account (id 1, 200 cash, 50 freebet).
fn seeded_ledger() -> Ledger {
    let mut ledger = Ledger::default();
    ledger
        .create_account(
            house("Seed", Provider::Bet365, dec!(200), dec!(50)),
            Utc.with_ymd_and_hms(2026, 10, 1, 10, 0, 0).unwrap(),
        )
        .unwrap();
    ledger
}

fn temp_data_dir() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("bet-ledger-it-{}", uuid::Uuid::new_v4()))
}

// ---- Mocked repository ----

#[tokio::test]
async fn test_snapshot_failure_discards_the_change() {
    let mut repo = MockRepo::new();
    repo.expect_save_state()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("disk full")));
    repo.expect_append_audit().times(0);

    let service = LedgerService::new(seeded_ledger(), Arc::new(repo));
    let request = PlaceOperationRequest {
        game_name: "Roulette".to_string(),
        category: Category::Casino,
        match_id: None,
        legs: vec![LegRequest {
            odd: dec!(36),
            stakes: vec![StakeRequest {
                account_id: 1,
                amount: dec!(10),
                is_freebet: false,
            }],
        }],
    };

    let err = service.place_operation(request).await.unwrap_err();
    assert!(matches!(err, ServiceError::Persistence(_)));

    let account = service.account(1).await.unwrap();
    assert_eq!(account.cash_balance, dec!(200));
    assert!(service.operations(None).await.is_empty());
    assert_eq!(service.transactions(Some(1), None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_audit_failure_does_not_fail_the_commit() {
    let mut repo = MockRepo::new();
    repo.expect_save_state().times(1).returning(|_| Ok(()));
    repo.expect_append_audit()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("read-only filesystem")));

    let service = LedgerService::new(seeded_ledger(), Arc::new(repo));
    let tx = service
        .record_cash_movement(bet_ledger::usecases::ledger::CashMovement {
            account_id: 1,
            kind: TransactionKind::Withdrawal,
            amount: dec!(25),
            description: "payout to bank".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(tx.amount, dec!(-25));
    assert_eq!(service.account(1).await.unwrap().cash_balance, dec!(175));
}

#[tokio::test]
async fn test_rejected_request_never_touches_storage() {
    let mut repo = MockRepo::new();
    repo.expect_save_state().times(0);
    repo.expect_append_audit().times(0);

    let service = LedgerService::new(seeded_ledger(), Arc::new(repo));
    let err = service
        .transfer(TransferRequest {
            from_account_id: 1,
            to_account_id: 1,
            amount: dec!(10),
            description: String::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
}

#[tokio::test]
async fn test_load_restores_snapshot_from_repository() {
    let snapshot = seeded_ledger().snapshot(Utc::now());
    let mut repo = MockRepo::new();
    repo.expect_load_latest_state()
        .times(1)
        .returning(move || Ok(Some(snapshot.clone())));

    let service = LedgerService::load(Arc::new(repo), LedgerPolicy::default())
        .await
        .unwrap();
    let accounts = service.accounts(true).await;
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].freebet_balance, dec!(50));
}

#[tokio::test]
async fn test_load_rejects_invalid_snapshot() {
    let mut snapshot = seeded_ledger().snapshot(Utc::now());
    snapshot.transactions[0].account_id = 99;
    let mut repo = MockRepo::new();
    repo.expect_load_latest_state()
        .returning(move || Ok(Some(snapshot.clone())));

    let result = LedgerService::load(Arc::new(repo), LedgerPolicy::default()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_load_starts_empty_without_snapshot() {
    let mut repo = MockRepo::new();
    repo.expect_load_latest_state().returning(|| Ok(None));
    repo.expect_is_healthy().returning(|| true);

    let service = LedgerService::load(Arc::new(repo), LedgerPolicy::default())
        .await
        .unwrap();
    assert!(service.accounts(true).await.is_empty());
    assert!(service.storage_healthy().await);
}

// ---- File-backed repository ----

#[tokio::test]
async fn test_full_lifecycle_survives_restart() {
    let dir = temp_data_dir();
    let operation_id;
    {
        let repo = Arc::new(RepositoryImpl::from_data_dir(&dir).await.unwrap());
        let service = LedgerService::load(repo, LedgerPolicy::default())
            .await
            .unwrap();

        let (alpha, _) = service
            .create_account(house("Alpha", Provider::Bet365, dec!(500), dec!(0)))
            .await
            .unwrap();
        let (beta, _) = service
            .create_account(house("Beta", Provider::Betano, dec!(0), dec!(50)))
            .await
            .unwrap();

        let placement = service.place_operation(surebet(alpha.id, beta.id)).await.unwrap();
        operation_id = placement.operation.id;
        assert_eq!(placement.transactions.len(), 2);

        // Freebet leg wins: 3.00 × 50 − 50 = 100 in cash on Beta.
        let resolution = service
            .resolve_operation(operation_id, ResolveRequest::winner(1))
            .await
            .unwrap();
        assert_eq!(resolution.payouts.len(), 1);
        assert_eq!(resolution.payouts[0].amount, dec!(100.00));

        let again = service
            .resolve_operation(operation_id, ResolveRequest::lost())
            .await
            .unwrap_err();
        assert_eq!(again.kind(), "invalid_state");

        // Correct the payout by hand.
        service
            .reverse_transaction(resolution.payouts[0].id)
            .await
            .unwrap();
    }

    let repo = Arc::new(RepositoryImpl::from_data_dir(&dir).await.unwrap());
    let service = LedgerService::load(Arc::clone(&repo), LedgerPolicy::default())
        .await
        .unwrap();

    let accounts = service.accounts(false).await;
    assert_eq!(accounts[0].name, "Alpha");
    assert_eq!(accounts[0].cash_balance, dec!(400));
    assert_eq!(accounts[1].cash_balance, dec!(0));
    assert_eq!(accounts[1].freebet_balance, dec!(0));
    assert!(service.read(Ledger::reconcile).await.is_empty());

    let operation = service.operation(operation_id).await.unwrap();
    assert_eq!(operation.status, OperationStatus::Won);
    assert_eq!(operation.winning_leg, Some(1));

    let audit = repo.load_audit().await.unwrap();
    let recorded = audit.iter().filter(|e| e.action == AuditAction::Recorded).count();
    let reversed = audit.iter().filter(|e| e.action == AuditAction::Reversed).count();
    // 2 opening balances + 2 stakes + 1 payout
    assert_eq!(recorded, 5);
    assert_eq!(reversed, 1);

    let _ = tokio::fs::remove_dir_all(&dir).await;
}
