use mountainwatch_core::{ActionMode, ChangeEvent, NotificationEvent};
use tracing_test::traced_test;

use super::fakes::{Harness, LINK_BASE, condition};
use crate::message::TICKET_FAILURE_SUBJECT;
use crate::{DispatchResult, ServiceError, TicketOutcome};

fn stored_event(harness: &Harness, id: &str) -> NotificationEvent {
    let record = condition(id, "ACTIVE");
    harness.storage.insert_condition(&record).unwrap();
    NotificationEvent::NewCondition(record)
}

fn resolved(id: &str) -> NotificationEvent {
    NotificationEvent::StatusChanged(ChangeEvent {
        id: id.to_owned(),
        old_status: "ACTIVE".to_owned(),
        new_status: "RESOLVED".to_owned(),
        title: format!("Trail {id} closed"),
    })
}

fn delivered(result: DispatchResult) -> crate::Delivery {
    match result {
        DispatchResult::Dispatched(delivery) => delivery,
        other => panic!("expected a dispatch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_send_message_marks_new_conditions_processed() {
    let harness = Harness::new();
    let dispatcher = harness.dispatcher();

    for id in ["1001", "1002"] {
        let event = stored_event(&harness, id);
        let delivery = delivered(dispatcher.dispatch(&event, ActionMode::SendMessage).await.unwrap());
        assert!(delivery.message_sent);
        assert!(delivery.marked);
        assert_eq!(delivery.ticket, None);
    }

    assert_eq!(harness.messenger.sent().len(), 2);
    assert!(harness.tickets.created().is_empty());
    let stored = harness.storage.get_condition("1001").unwrap().unwrap();
    assert!(stored.processed);
    assert!(stored.date_processed.is_some());
}

#[tokio::test]
async fn test_message_text_and_addresses() {
    let harness = Harness::new();
    let event = stored_event(&harness, "1001");

    harness.dispatcher().dispatch(&event, ActionMode::SendMessage).await.unwrap();

    let sent = harness.messenger.sent();
    assert_eq!(sent[0].from, "watch@example.org");
    assert_eq!(sent[0].to, "rangers@example.org");
    assert_eq!(sent[0].subject, "NEW closure: Trail 1001 closed STATUS:ACTIVE DATE:2023-05-17");
    assert!(sent[0].body.contains(&format!("Condition: {LINK_BASE}1001")));
}

#[tokio::test]
async fn test_processed_condition_is_not_announced_twice() {
    let harness = Harness::new();
    let dispatcher = harness.dispatcher();
    let event = stored_event(&harness, "1001");

    dispatcher.dispatch(&event, ActionMode::SendMessage).await.unwrap();
    let second = dispatcher.dispatch(&event, ActionMode::SendMessage).await.unwrap();

    assert_eq!(second, DispatchResult::AlreadyProcessed);
    assert_eq!(harness.messenger.sent().len(), 1);
}

#[tokio::test]
async fn test_forced_dispatch_repeats_processed_condition() {
    let harness = Harness::new();
    let dispatcher = harness.dispatcher();
    let event = stored_event(&harness, "1001");

    dispatcher.dispatch(&event, ActionMode::SendMessage).await.unwrap();
    let forced = delivered(dispatcher.dispatch_forced(&event, ActionMode::SendMessage).await.unwrap());

    assert!(forced.message_sent);
    assert!(!forced.marked);
    assert_eq!(harness.messenger.sent().len(), 2);
}

#[tokio::test]
async fn test_both_sends_one_message_and_one_ticket() {
    let harness = Harness::new();
    let event = stored_event(&harness, "1001");

    let delivery =
        delivered(harness.dispatcher().dispatch(&event, ActionMode::Both).await.unwrap());

    assert!(delivery.message_sent);
    assert_eq!(delivery.ticket, Some(TicketOutcome::Created("MW-1".to_owned())));
    assert!(!delivery.fallback_sent);
    assert!(delivery.is_complete(ActionMode::Both));
    assert_eq!(harness.messenger.sent().len(), 1);

    let tickets = harness.tickets.created();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].project_id, "10001");
    assert_eq!(tickets[0].issue_type, "Task");
    assert_eq!(tickets[0].summary, harness.messenger.subjects()[0]);
}

#[tokio::test]
#[traced_test]
async fn test_ticket_failure_under_both_sends_fallback_and_marks() {
    let harness = Harness::new();
    harness.tickets.fail();
    let event = stored_event(&harness, "1001");

    let delivery =
        delivered(harness.dispatcher().dispatch(&event, ActionMode::Both).await.unwrap());

    assert!(delivery.message_sent);
    assert_eq!(delivery.ticket, Some(TicketOutcome::Failed));
    assert!(delivery.fallback_sent);
    assert!(delivery.marked);
    assert!(!delivery.is_complete(ActionMode::Both));

    let subjects = harness.messenger.subjects();
    assert_eq!(subjects.len(), 2);
    assert!(subjects[0].starts_with("NEW closure"));
    assert_eq!(subjects[1], TICKET_FAILURE_SUBJECT);
    assert_eq!(harness.storage.is_processed("1001").unwrap(), Some(true));

    logs_assert(|lines: &[&str]| {
        let errors: Vec<_> = lines.iter().filter(|line| line.contains(" ERROR ")).collect();
        match errors.as_slice() {
            [only] if only.contains("Creating ticket failed") => Ok(()),
            other => Err(format!("expected one ticket error, got {other:?}")),
        }
    });
}

#[tokio::test]
async fn test_ticket_failure_can_leave_condition_unprocessed() {
    let harness = Harness::new();
    harness.tickets.fail();
    let event = stored_event(&harness, "1001");
    let dispatcher = harness.dispatcher_with(Harness::settings(false));

    let delivery = delivered(dispatcher.dispatch(&event, ActionMode::CreateTicket).await.unwrap());

    assert!(!delivery.marked);
    assert!(delivery.fallback_sent);
    assert_eq!(harness.storage.is_processed("1001").unwrap(), Some(false));

    harness.tickets.recover();
    let retry = delivered(dispatcher.dispatch(&event, ActionMode::CreateTicket).await.unwrap());
    assert!(retry.marked);
    assert_eq!(harness.tickets.created().len(), 1);
}

#[tokio::test]
async fn test_create_ticket_sends_no_regular_message() {
    let harness = Harness::new();
    let event = stored_event(&harness, "1001");

    let delivery =
        delivered(harness.dispatcher().dispatch(&event, ActionMode::CreateTicket).await.unwrap());

    assert!(!delivery.message_sent);
    assert!(delivery.is_complete(ActionMode::CreateTicket));
    assert!(harness.messenger.sent().is_empty());
    assert_eq!(harness.tickets.created().len(), 1);
}

#[tokio::test]
async fn test_message_failure_is_not_retried_within_dispatch() {
    let harness = Harness::new();
    harness.messenger.fail();
    let event = stored_event(&harness, "1001");

    let delivery =
        delivered(harness.dispatcher().dispatch(&event, ActionMode::SendMessage).await.unwrap());

    assert!(!delivery.message_sent);
    assert!(!delivery.fallback_sent);
    assert!(delivery.marked);
}

#[tokio::test]
async fn test_status_change_is_announced_once() {
    let harness = Harness::new();
    stored_event(&harness, "1001");
    harness.storage.update_status("1001", "RESOLVED").unwrap();
    let dispatcher = harness.dispatcher();
    let event = resolved("1001");

    let delivery = delivered(dispatcher.dispatch(&event, ActionMode::SendMessage).await.unwrap());
    assert!(delivery.marked);
    assert_eq!(harness.storage.notified_status("1001").unwrap().as_deref(), Some("RESOLVED"));

    let again = dispatcher.dispatch(&event, ActionMode::SendMessage).await.unwrap();
    assert_eq!(again, DispatchResult::AlreadyNotified);

    let subjects = harness.messenger.subjects();
    assert_eq!(subjects, vec!["Status was updated Trail 1001 closed -> RESOLVED".to_owned()]);
}

#[tokio::test]
async fn test_ticket_mode_without_ticket_transport_has_no_side_effects() {
    let harness = Harness::new();
    let event = stored_event(&harness, "1001");

    let err = harness
        .message_only_dispatcher()
        .dispatch(&event, ActionMode::Both)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotConfigured(_)));
    assert!(harness.messenger.sent().is_empty());
    assert_eq!(harness.storage.is_processed("1001").unwrap(), Some(false));
}
