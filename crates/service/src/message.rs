//! Subject and body text for every notification kind.

use mountainwatch_core::{ChangeEvent, Condition};

const RULE: &str = "---------------------------------------------------------------------------";

pub const TICKET_FAILURE_SUBJECT: &str = "[ERROR] creating new ticket";

/// Subject line and plain-text body shared by the message and the ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composed {
    pub subject: String,
    pub body: String,
}

impl Composed {
    pub fn new_condition(condition: &Condition, link_base: &str) -> Self {
        let date = condition.inspection_date();
        let subject = format!(
            "NEW {}: {} STATUS:{} DATE:{date}",
            condition.frontend_type, condition.title, condition.status
        );
        let body = format!(
            "NEW {kind}:\n***{title}***\nDATE: {date} STATUS:{status}\n\
             Condition: {link_base}{id}\n{RULE}\nUser: {link_base}{user}\n",
            kind = condition.frontend_type,
            title = condition.title,
            status = condition.status,
            id = condition.id,
            user = condition.user_id,
        );
        Self { subject, body }
    }

    pub fn status_change(change: &ChangeEvent, link_base: &str) -> Self {
        Self {
            subject: format!("Status was updated {} -> {}", change.title, change.new_status),
            body: format!(
                "Status: {} -> {}\nCondition: {link_base}{}\n",
                change.old_status, change.new_status, change.id
            ),
        }
    }

    pub fn ticket_failure(failed: &Self, error: &anyhow::Error) -> Self {
        Self {
            subject: TICKET_FAILURE_SUBJECT.to_owned(),
            body: format!(
                "The ticket \"{}\" could not be created: {error:#}\n\n{}\n{RULE}\nCheck the application log.\n",
                failed.subject, failed.body
            ),
        }
    }
}
