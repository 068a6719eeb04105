mod common;

use checkrelay::application::lanes::SenderLanes;
use checkrelay::application::ledger::{ApprovalLedger, Decision};
use checkrelay::domain::event::{CallbackAction, PreviewChoice};
use checkrelay::domain::record::{Amount, CheckDate, DraftRecord, RecordId, Verdict};
use checkrelay::infrastructure::in_memory::{
    InMemoryDirectoryStore, InMemoryMessenger, InMemoryRecordSheet,
};
use common::*;
use rand::Rng;
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;

fn ledger() -> (ApprovalLedger, InMemoryRecordSheet) {
    let sheet = InMemoryRecordSheet::new();
    let ledger = ApprovalLedger::new(
        Arc::new(InMemoryDirectoryStore::with_directory(sample_directory())),
        Arc::new(sheet.clone()),
        Arc::new(InMemoryMessenger::new()),
        &[OPERATOR],
    );
    (ledger, sheet)
}

fn draft(recipient: &str, amount: u64) -> DraftRecord {
    DraftRecord {
        recipient: recipient.to_string(),
        date: CheckDate::new(fixed_today()),
        amount_primary: Amount::new(amount),
        amount_secondary: Amount::new(0),
        full_name: "Someone".to_string(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_decisions_apply_once() {
    let (ledger, sheet) = ledger();

    let mut ids: Vec<RecordId> = Vec::new();
    for amount in 0..50 {
        ids.push(ledger.dispatch(draft("alice", amount)).await.unwrap().record.id);
    }

    // two opposite verdicts per check, fired in random order with jitter
    let mut attempts: Vec<(RecordId, Verdict)> = ids
        .iter()
        .flat_map(|id| [(*id, Verdict::Accept), (*id, Verdict::Reject)])
        .collect();
    attempts.shuffle(&mut rand::thread_rng());

    let mut handles = Vec::new();
    for (id, verdict) in attempts {
        let ledger = ledger.clone();
        let jitter = rand::thread_rng().gen_range(0..3);
        handles.push(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(jitter)).await;
            (id, ledger.decide(id, verdict).await.unwrap())
        }));
    }

    let mut applied = std::collections::HashMap::new();
    let mut expired = 0;
    for handle in handles {
        match handle.await.unwrap() {
            (id, Decision::Applied(report)) => {
                assert!(applied.insert(id, report.record.status).is_none());
            }
            (_, Decision::Expired) => expired += 1,
        }
    }

    assert_eq!(applied.len(), ids.len());
    assert_eq!(expired, ids.len());
    assert_eq!(ledger.pending_count().await, 0);
    for (id, status) in applied {
        assert_eq!(
            sheet.status_of(id).await.as_deref(),
            Some(status.as_str())
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_dispatches_get_distinct_rows() {
    let (ledger, sheet) = ledger();

    let handles: Vec<_> = (0..40)
        .map(|n| {
            let ledger = ledger.clone();
            let recipient = if n % 2 == 0 { "alice" } else { "bob" };
            tokio::spawn(async move { ledger.dispatch(draft(recipient, n)).await.unwrap() })
        })
        .collect();

    let mut ids = std::collections::HashSet::new();
    for handle in handles {
        assert!(ids.insert(handle.await.unwrap().record.id));
    }

    assert_eq!(ledger.pending_count().await, 40);
    assert_eq!(sheet.rows().await.len(), 41);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_operators_keep_separate_drafts() {
    let h = harness();

    let first = {
        let h = Arc::clone(&h.workflow);
        tokio::spawn(async move {
            for input in ["/check", "alice", "📅 Today", "10", "11", "Alice Smith"] {
                h.handle(text(OPERATOR, input)).await;
            }
        })
    };
    let second = {
        let h = Arc::clone(&h.workflow);
        tokio::spawn(async move {
            for input in ["/check", "bob", "01.01.2024", "20", "21", "Robert Brown"] {
                h.handle(text(SECOND_OPERATOR, input)).await;
            }
        })
    };
    first.await.unwrap();
    second.await.unwrap();

    let send = CallbackAction::Preview(PreviewChoice::Send);
    h.press(OPERATOR, send).await;
    h.press(SECOND_OPERATOR, send).await;

    let rows = h.sheet.inner.rows().await;
    assert_eq!(rows.len(), 3);
    let mut drafted: Vec<(String, String)> = rows[1..]
        .iter()
        .map(|row| (row[1].clone(), row[3].clone()))
        .collect();
    drafted.sort();
    assert_eq!(
        drafted,
        vec![
            ("alice".to_string(), "10".to_string()),
            ("bob".to_string(), "20".to_string()),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_back_to_back_amounts_stay_in_place() {
    for _ in 0..100 {
        let h = harness();
        let mut lanes = SenderLanes::new(Arc::clone(&h.workflow));

        for input in ["/check", "alice", "today", "100", "50", "Alice Smith"] {
            lanes.submit(text(OPERATOR, input));
        }
        // a recipient's chat runs in its own lane alongside
        lanes.submit(text(ALICE, "hello"));
        lanes.submit(press(OPERATOR, CallbackAction::Preview(PreviewChoice::Send)));
        lanes.shutdown().await;

        let rows = h.sheet.inner.rows().await;
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[1][3].as_str(), rows[1][4].as_str()), ("100", "50"));
    }
}
