//! Post-insert side-effect hook
//!
//! A recorder runs after a bounce is stored, e.g. to count bounces per
//! subscriber and blocklist repeat offenders. It runs on a detached task: its
//! failure is logged and never reaches the webhook response.

use async_trait::async_trait;
use tracing::info;

use crate::types::Bounce;

#[async_trait]
pub trait BounceRecorder: Send + Sync {
    async fn record(&self, bounce: &Bounce) -> anyhow::Result<()>;
}

/// Default recorder: logs each stored bounce
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingRecorder;

#[async_trait]
impl BounceRecorder for LoggingRecorder {
    async fn record(&self, bounce: &Bounce) -> anyhow::Result<()> {
        info!(
            bounce_id = bounce.id,
            source = %bounce.source,
            campaign_id = ?bounce.campaign_id,
            "Recorded bounce"
        );
        Ok(())
    }
}
