use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use mountainwatch_core::{JiraSettings, NewTicket, TicketTransport};
use serde::{Deserialize, Serialize};

use crate::NotifyError;

#[derive(Serialize)]
struct IssueRequest<'a> {
    fields: IssueFields<'a>,
}

#[derive(Serialize)]
struct IssueFields<'a> {
    project: ProjectRef<'a>,
    summary: &'a str,
    description: &'a str,
    #[serde(rename = "issuetype")]
    issue_type: IssueTypeRef<'a>,
}

#[derive(Serialize)]
struct ProjectRef<'a> {
    id: &'a str,
}

#[derive(Serialize)]
struct IssueTypeRef<'a> {
    name: &'a str,
}

#[derive(Deserialize)]
struct CreatedIssue {
    key: String,
}

/// Jira REST client (API v2) able to open issues.
///
/// No retry here: a failed creation is reported to the caller, which falls
/// back to a mail alert.
pub struct JiraClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    token: String,
}

impl std::fmt::Debug for JiraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("token", &"***")
            .finish_non_exhaustive()
    }
}

impl JiraClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(settings: &JiraSettings) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NotifyError::ClientInit(e.to_string()))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_owned(),
            username: settings.username.clone(),
            token: settings.token.clone(),
        })
    }

    /// Opens the issue and returns its key.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-success status, or a body without a key.
    pub async fn open_issue(&self, ticket: &NewTicket) -> Result<String, NotifyError> {
        let request = IssueRequest {
            fields: IssueFields {
                project: ProjectRef { id: &ticket.project_id },
                summary: &ticket.summary,
                description: &ticket.description,
                issue_type: IssueTypeRef { name: &ticket.issue_type },
            },
        };

        let response = self
            .client
            .post(format!("{}/rest/api/2/issue", self.base_url))
            .basic_auth(&self.username, Some(&self.token))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(NotifyError::HttpStatus { code: status.as_u16(), body });
        }

        let created: CreatedIssue =
            serde_json::from_str(&body).map_err(|e| NotifyError::InvalidResponse(e.to_string()))?;
        Ok(created.key)
    }
}

#[async_trait]
impl TicketTransport for JiraClient {
    async fn create_issue(&self, ticket: &NewTicket) -> Result<String> {
        Ok(self.open_issue(ticket).await?)
    }
}
