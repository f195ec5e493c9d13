use chrono::NaiveDate;

use crate::UnknownActionMode;

/// ISO date format used for every date column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// An advisory/closure record as published by Outdooractive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// External identifier, primary key of the store
    pub id: String,
    /// Workflow state, opaque to us
    pub status: String,
    pub category_id: String,
    pub day_of_inspection: Option<NaiveDate>,
    pub date_from: Option<NaiveDate>,
    /// Kind of record ("closure", "condition", ...)
    pub frontend_type: String,
    pub ranking: String,
    pub title: String,
    pub lang: String,
    pub long_text: String,
    pub winter_activity: String,
    pub geometry: String,
    pub risk_description: String,
    pub weather_description: String,
    /// Author of the record
    pub user_id: String,
    /// Whether the new-record notification was handled
    pub processed: bool,
    pub date_processed: Option<NaiveDate>,
    /// `"{type}->{name} / "` per referenced region, computed once at ingestion
    pub geometry_description: String,
}

impl Condition {
    /// Inspection date as `YYYY-MM-DD`, empty when unknown.
    #[must_use]
    pub fn inspection_date(&self) -> String {
        format_date(self.day_of_inspection)
    }
}

/// Formats an optional date as `YYYY-MM-DD`, empty when absent.
#[must_use]
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default()
}

/// Parses the leading `YYYY-MM-DD` of a date or timestamp string.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
}

/// `processed` column encoding.
#[must_use]
pub const fn processed_flag(processed: bool) -> &'static str {
    if processed { "y" } else { "n" }
}

/// Detected difference between the stored and the freshly fetched status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub id: String,
    pub old_status: String,
    pub new_status: String,
    pub title: String,
}

/// Something the dispatcher notifies about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    NewCondition(Condition),
    StatusChanged(ChangeEvent),
}

impl NotificationEvent {
    #[must_use]
    pub fn condition_id(&self) -> &str {
        match self {
            Self::NewCondition(condition) => &condition.id,
            Self::StatusChanged(change) => &change.id,
        }
    }
}

/// Which notification channel(s) fire for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionMode {
    SendMessage,
    CreateTicket,
    Both,
}

impl ActionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SendMessage => "SendMessage",
            Self::CreateTicket => "CreateTicket",
            Self::Both => "Both",
        }
    }

    #[must_use]
    pub const fn sends_message(self) -> bool {
        matches!(self, Self::SendMessage | Self::Both)
    }

    #[must_use]
    pub const fn creates_ticket(self) -> bool {
        matches!(self, Self::CreateTicket | Self::Both)
    }
}

impl std::fmt::Display for ActionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionMode {
    type Err = UnknownActionMode;

    // The legacy spellings come from existing config files.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sendmessage" | "sendemail" => Ok(Self::SendMessage),
            "createticket" | "createjiraticket" => Ok(Self::CreateTicket),
            "both" | "jiraandsendemail" => Ok(Self::Both),
            _ => Err(UnknownActionMode(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_mode_accepts_legacy_spellings() {
        assert_eq!("SendEmail".parse::<ActionMode>().unwrap(), ActionMode::SendMessage);
        assert_eq!("CreateJiraTicket".parse::<ActionMode>().unwrap(), ActionMode::CreateTicket);
        assert_eq!("JiraAndSendEmail".parse::<ActionMode>().unwrap(), ActionMode::Both);
        assert_eq!(" both ".parse::<ActionMode>().unwrap(), ActionMode::Both);
    }

    #[test]
    fn test_action_mode_rejects_unknown() {
        let err = "Carrier pigeon".parse::<ActionMode>().unwrap_err();
        assert_eq!(err, UnknownActionMode("Carrier pigeon".to_owned()));
    }

    #[test]
    fn test_action_mode_channels() {
        assert!(ActionMode::Both.sends_message() && ActionMode::Both.creates_ticket());
        assert!(!ActionMode::SendMessage.creates_ticket());
        assert!(!ActionMode::CreateTicket.sends_message());
    }

    #[test]
    fn test_parse_date_takes_leading_day() {
        let date = parse_date("2023-05-17T08:00:00.000+02:00").unwrap();
        assert_eq!(format_date(Some(date)), "2023-05-17");
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
    }
}
