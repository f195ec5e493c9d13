//! Runtime settings, read from `MOUNTAINWATCH_*` environment variables.

use std::path::PathBuf;

use crate::ActionMode;
use crate::ConfigError;
use crate::env_config::Env;

pub const DEFAULT_API_BASE: &str = "https://www.outdooractive.com/api/project";
pub const DEFAULT_LINK_BASE: &str = "https://www.outdooractive.com/ro/r/";
pub const DEFAULT_LANG: &str = "ro";
pub const DEFAULT_SMTP_PORT: u16 = 465;
pub const DEFAULT_ISSUE_TYPE: &str = "Task";
pub const DEFAULT_WAIT_MIN_SECS: u64 = 1;
pub const DEFAULT_WAIT_MAX_SECS: u64 = 5;

/// Outdooractive project access.
#[derive(Clone)]
pub struct SourceSettings {
    pub api_base: String,
    pub project: String,
    pub api_key: String,
    pub lang: String,
}

impl std::fmt::Debug for SourceSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceSettings")
            .field("api_base", &self.api_base)
            .field("project", &self.project)
            .field("api_key", &"***")
            .field("lang", &self.lang)
            .finish()
    }
}

/// Random pause before every detail/region request, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingSettings {
    pub min_secs: u64,
    pub max_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub db_path: PathBuf,
}

impl StoreSettings {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        Self::load(&Env::new(lookup))
    }

    fn load<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Self {
        let db_path =
            env.optional("MOUNTAINWATCH_DB_PATH").map_or_else(default_db_path, PathBuf::from);
        Self { db_path }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mountainwatch")
        .join("conditions.db")
}

#[derive(Clone)]
pub struct MailSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub to: String,
}

impl std::fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

#[derive(Clone)]
pub struct JiraSettings {
    pub base_url: String,
    pub username: String,
    pub token: String,
    pub project_id: String,
    pub issue_type: String,
}

impl std::fmt::Debug for JiraSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraSettings")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("token", &"***")
            .field("project_id", &self.project_id)
            .field("issue_type", &self.issue_type)
            .finish()
    }
}

/// Everything a `run` or `process` invocation needs.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: SourceSettings,
    /// Base of the public links put into notifications
    pub link_base: String,
    pub store: StoreSettings,
    pub pacing: Option<PacingSettings>,
    pub action: ActionMode,
    pub mail: MailSettings,
    /// Present whenever `action` creates tickets
    pub jira: Option<JiraSettings>,
    /// Whether a new record whose ticket could not be created still counts as processed
    pub mark_processed_on_ticket_failure: bool,
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// # Errors
    /// Returns a `ConfigError` naming the first missing or invalid variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns a `ConfigError` naming the first missing or invalid variable.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, ConfigError> {
        let env = Env::new(lookup);

        let raw_action = env.required("MOUNTAINWATCH_ACTION")?;
        let action: ActionMode =
            raw_action.parse().map_err(|e: crate::UnknownActionMode| ConfigError::InvalidSetting {
                var: "MOUNTAINWATCH_ACTION",
                value: raw_action.clone(),
                reason: e.to_string(),
            })?;

        let source = SourceSettings {
            api_base: env
                .optional("MOUNTAINWATCH_OA_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            project: env.required("MOUNTAINWATCH_OA_PROJECT")?,
            api_key: env.required("MOUNTAINWATCH_OA_KEY")?,
            lang: env.optional("MOUNTAINWATCH_LANG").unwrap_or_else(|| DEFAULT_LANG.to_owned()),
        };
        let link_base =
            env.optional("MOUNTAINWATCH_LINK_BASE").unwrap_or_else(|| DEFAULT_LINK_BASE.to_owned());

        let pacing = if env.flag_or("MOUNTAINWATCH_PACING", true)? {
            let min_secs = env.parse_or("MOUNTAINWATCH_WAIT_MIN", DEFAULT_WAIT_MIN_SECS)?;
            let max_secs = env.parse_or("MOUNTAINWATCH_WAIT_MAX", DEFAULT_WAIT_MAX_SECS)?;
            if min_secs > max_secs {
                return Err(ConfigError::InvalidSetting {
                    var: "MOUNTAINWATCH_WAIT_MAX",
                    value: max_secs.to_string(),
                    reason: format!("must not be lower than MOUNTAINWATCH_WAIT_MIN ({min_secs})"),
                });
            }
            Some(PacingSettings { min_secs, max_secs })
        } else {
            None
        };

        let mail = MailSettings {
            host: env.required("MOUNTAINWATCH_SMTP_HOST")?,
            port: env.parse_or("MOUNTAINWATCH_SMTP_PORT", DEFAULT_SMTP_PORT)?,
            username: env.optional("MOUNTAINWATCH_SMTP_USER"),
            password: env.optional("MOUNTAINWATCH_SMTP_PASSWORD"),
            from: env.required("MOUNTAINWATCH_MAIL_FROM")?,
            to: env.required("MOUNTAINWATCH_MAIL_TO")?,
        };

        let jira = if action.creates_ticket() {
            Some(JiraSettings {
                base_url: env.required("MOUNTAINWATCH_JIRA_URL")?.trim_end_matches('/').to_owned(),
                username: env.required("MOUNTAINWATCH_JIRA_USER")?,
                token: env.required("MOUNTAINWATCH_JIRA_TOKEN")?,
                project_id: env.required("MOUNTAINWATCH_JIRA_PROJECT_ID")?,
                issue_type: env
                    .optional("MOUNTAINWATCH_JIRA_ISSUE_TYPE")
                    .unwrap_or_else(|| DEFAULT_ISSUE_TYPE.to_owned()),
            })
        } else {
            None
        };

        Ok(Self {
            source,
            link_base,
            store: StoreSettings::load(&env),
            pacing,
            action,
            mail,
            jira,
            mark_processed_on_ticket_failure: env
                .flag_or("MOUNTAINWATCH_MARK_PROCESSED_ON_TICKET_FAILURE", true)?,
        })
    }
}
