use std::time::Duration;

use mountainwatch_core::PacingSettings;
use rand::Rng as _;

/// Deliberate pause before each detail/region request, so the upstream
/// service never sees a burst of requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pacer {
    range: Option<PacingSettings>,
}

impl Pacer {
    #[must_use]
    pub const fn new(range: Option<PacingSettings>) -> Self {
        Self { range }
    }

    /// A pacer that never sleeps.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { range: None }
    }

    /// Next pause, drawn uniformly from the configured range.
    #[must_use]
    pub fn next_delay(&self) -> Duration {
        match self.range {
            None => Duration::ZERO,
            Some(PacingSettings { min_secs, max_secs }) => {
                let secs = rand::thread_rng().gen_range(min_secs..=max_secs.max(min_secs));
                Duration::from_secs(secs)
            },
        }
    }

    pub async fn wait(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tracing::debug!("Pacing: waiting {delay:?} before next request");
            tokio::time::sleep(delay).await;
        }
    }
}
