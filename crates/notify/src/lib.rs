//! Notification transports: SMTP mail and Jira issues

mod error;
mod jira;
mod mailer;

pub use error::NotifyError;
pub use jira::JiraClient;
pub use mailer::SmtpMailer;
