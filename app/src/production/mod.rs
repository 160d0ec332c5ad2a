use crate::{
    auth,
    database::Database,
    gateway::{PayoutGateway, PayoutId, PayoutStatus},
    ledger,
    money::Amount,
};

mod entities;

pub use entities::{Cycle, Error, ProductionRun, State};

pub const DEFAULT_AMOUNT_PER_CYCLE: Amount = Amount(1_000_000.0);
pub const DEFAULT_CYCLES: i64 = 5;

/// The outcome of a run that ended in a payout.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub payout_id: PayoutId,
    pub amount: Amount,
    pub status: PayoutStatus,
}

/// Accrues `cycles` increments of `amount_per_cycle` on the user's balance, then pays out the
/// whole balance.
///
/// Every cycle commits on its own, so an interrupted run keeps the cycles it completed. If the
/// payout is refused, the accrued balance stays in place. If the process dies after the gateway
/// accepted the payout but before the withdrawal is recorded, the balance is not cleared; the
/// payout id is logged before that write so the two can be matched up by hand.
pub async fn start(
    grant: &auth::Grant,
    db: &Database,
    gateway: &dyn PayoutGateway,
    amount_per_cycle: Amount,
    cycles: i64,
) -> Result<Settlement, Error> {
    let mut run = ProductionRun::new(grant, amount_per_cycle, cycles);
    log::info!(
        "starting production for {}: {} cycles of {}",
        grant.name,
        cycles,
        amount_per_cycle
    );

    while let Some(cycle) = run.next_cycle() {
        ledger::apply_delta(db, &grant.name, amount_per_cycle, &cycle.description()).await?;
    }

    let balance = ledger::get_balance(db, &grant.name)
        .await?
        .ok_or(ledger::Error::UnknownUser)?;
    let destination = ledger::get_payment_destination(db, &grant.name).await?;
    let request = run.request_payout(balance, destination)?;

    match gateway.create_instant_payout(&request).await {
        Ok(payout) => {
            log::info!(
                "payout {:?} issued for {} ({:?}), recording withdrawal",
                payout.id,
                grant.name,
                request.amount
            );
            ledger::record_withdrawal(db, &grant.name, balance, &payout.id).await?;
            let settlement = Settlement {
                payout_id: payout.id.clone(),
                amount: balance,
                status: payout.status.clone(),
            };
            run.settle(payout);
            Ok(settlement)
        }
        Err(e) => {
            log::warn!("payout for {} failed: {}", grant.name, e);
            run.fail();
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::PayoutMethod;
    use crate::money::Cents;
    use crate::testing::{file_database, memory_database, FakeGateway};
    use std::sync::Arc;
    use crate::user::PaymentDestination;
    use crate::QueryRange;

    const ALL: QueryRange = QueryRange {
        limit: 100,
        offset: 0,
    };

    async fn setup(destination: Option<&str>) -> (Database, auth::Grant) {
        let db = memory_database().await;
        let grant = auth::register(&db, "alice", "pw").await.unwrap();
        if let Some(destination) = destination {
            ledger::set_payment_destination(
                &db,
                &grant.name,
                &PaymentDestination(destination.to_owned()),
            )
            .await
            .unwrap();
        }
        (db, grant)
    }

    #[tokio::test]
    async fn without_destination_balance_is_kept() {
        let (db, grant) = setup(None).await;
        let gateway = FakeGateway::accepting();

        let result = start(&grant, &db, &gateway, DEFAULT_AMOUNT_PER_CYCLE, DEFAULT_CYCLES).await;

        assert!(matches!(result, Err(Error::NoPaymentDestination)));
        assert_eq!(
            ledger::get_balance(&db, &grant.name).await.unwrap(),
            Some(Amount(5_000_000.0))
        );
        assert_eq!(ledger::list_logs(&db, &grant.name, ALL).await.unwrap().len(), 5);
        assert!(gateway.requests().await.is_empty());
    }

    #[tokio::test]
    async fn accepted_payout_clears_balance() {
        let (db, grant) = setup(Some("pm_card")).await;
        let gateway = FakeGateway::accepting();

        let settlement = start(&grant, &db, &gateway, DEFAULT_AMOUNT_PER_CYCLE, DEFAULT_CYCLES)
            .await
            .unwrap();

        assert_eq!(settlement.amount, Amount(5_000_000.0));
        assert_eq!(
            ledger::get_balance(&db, &grant.name).await.unwrap(),
            Some(Amount::ZERO)
        );

        let logs = ledger::list_logs(&db, &grant.name, ALL).await.unwrap();
        assert_eq!(logs.len(), 6);
        let withdrawal = &logs[0];
        assert_eq!(withdrawal.payout_id, Some(settlement.payout_id.clone()));
        assert_eq!(withdrawal.amount, Amount(-5_000_000.0));
        assert_eq!(withdrawal.balance_before, Amount(5_000_000.0));
        assert_eq!(withdrawal.balance_after, Amount::ZERO);
        assert_eq!(logs[1].description, "Cycle 5/5");
        assert_eq!(logs[5].description, "Cycle 1/5");
        assert!(logs[1..].iter().all(|entry| entry.payout_id.is_none()));

        let requests = gateway.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].amount, Cents(500_000_000));
        assert_eq!(requests[0].destination.0, "pm_card");
        assert_eq!(requests[0].method, PayoutMethod::Instant);
        assert_eq!(
            requests[0].metadata.get("user").map(String::as_str),
            Some("alice")
        );
    }

    #[tokio::test]
    async fn rejected_payout_keeps_balance() {
        let (db, grant) = setup(Some("pm_card")).await;
        let gateway = FakeGateway::rejecting(Some("insufficient funds in platform account"));

        let result = start(&grant, &db, &gateway, DEFAULT_AMOUNT_PER_CYCLE, DEFAULT_CYCLES).await;

        match result {
            Err(Error::Gateway(e)) => {
                assert_eq!(e.to_string(), "insufficient funds in platform account")
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(
            ledger::get_balance(&db, &grant.name).await.unwrap(),
            Some(Amount(5_000_000.0))
        );
        let logs = ledger::list_logs(&db, &grant.name, ALL).await.unwrap();
        assert_eq!(logs.len(), 5);
        assert!(logs.iter().all(|entry| entry.payout_id.is_none()));
    }

    #[tokio::test]
    async fn zero_cycles_on_empty_balance_is_insufficient() {
        let (db, grant) = setup(Some("pm_card")).await;
        let gateway = FakeGateway::accepting();

        let result = start(&grant, &db, &gateway, DEFAULT_AMOUNT_PER_CYCLE, 0).await;

        assert!(matches!(result, Err(Error::InsufficientBalance)));
        assert!(gateway.requests().await.is_empty());
        assert!(ledger::list_logs(&db, &grant.name, ALL)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn negative_increments_can_leave_balance_insufficient() {
        let (db, grant) = setup(Some("pm_card")).await;
        let gateway = FakeGateway::accepting();

        let result = start(&grant, &db, &gateway, Amount(-10.0), 2).await;

        assert!(matches!(result, Err(Error::InsufficientBalance)));
        assert_eq!(
            ledger::get_balance(&db, &grant.name).await.unwrap(),
            Some(Amount(-20.0))
        );
        assert!(gateway.requests().await.is_empty());
    }

    #[tokio::test]
    async fn retry_after_rejection_pays_out_everything() {
        let (db, grant) = setup(Some("pm_card")).await;

        let rejecting = FakeGateway::rejecting(None);
        assert!(start(&grant, &db, &rejecting, Amount(100.0), 1).await.is_err());

        let accepting = FakeGateway::accepting();
        let settlement = start(&grant, &db, &accepting, Amount(100.0), 1)
            .await
            .unwrap();
        assert_eq!(settlement.amount, Amount(200.0));
        assert_eq!(accepting.requests().await[0].amount, Cents(20_000));
    }

    #[tokio::test]
    async fn balance_too_large_for_cents_is_not_paid_out() {
        let (db, grant) = setup(Some("pm_card")).await;
        let gateway = FakeGateway::accepting();

        let result = start(&grant, &db, &gateway, Amount(1e18), 1).await;

        assert!(matches!(result, Err(Error::AmountOutOfRange)));
        assert_eq!(
            ledger::get_balance(&db, &grant.name).await.unwrap(),
            Some(Amount(1e18))
        );
        assert!(gateway.requests().await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_runs_for_different_users_all_settle() {
        let (db, _dir) = file_database().await;
        let gateway = Arc::new(FakeGateway::accepting());
        let mut grants = Vec::new();
        for i in 0..4 {
            let grant = auth::register(&db, &format!("user-{}", i), "pw")
                .await
                .unwrap();
            ledger::set_payment_destination(
                &db,
                &grant.name,
                &PaymentDestination(format!("pm_{}", i)),
            )
            .await
            .unwrap();
            grants.push(grant);
        }

        let tasks: Vec<_> = grants
            .iter()
            .cloned()
            .map(|grant| {
                let db = db.clone();
                let gateway = gateway.clone();
                tokio::spawn(async move {
                    start(&grant, &db, gateway.as_ref(), Amount(10.0), 10).await
                })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap().amount, Amount(100.0));
        }

        assert_eq!(gateway.requests().await.len(), 4);
        for grant in &grants {
            assert_eq!(
                ledger::get_balance(&db, &grant.name).await.unwrap(),
                Some(Amount::ZERO)
            );
            assert_eq!(ledger::list_logs(&db, &grant.name, ALL).await.unwrap().len(), 11);
        }
    }
}
