//! Bounce handling for Mailroom
//!
//! Bounces reach the service through three webhook shapes:
//! - native JSON postbacks
//! - Amazon SES notifications delivered over SNS
//! - SendGrid event batches
//!
//! Every shape is normalized into [`types::BounceInput`], validated, stored,
//! and handed to a [`recorder::BounceRecorder`] on a detached task.

pub mod confirm;
pub mod errors;
pub mod handlers;
pub mod plugin;
pub mod query;
pub mod recorder;
pub mod selection;
pub mod services;
pub mod sources;
pub mod store;
pub mod types;
pub mod validation;

pub use confirm::{ReqwestSnsConfirmer, SnsConfirmer};
pub use errors::BounceError;
pub use plugin::BouncesPlugin;
pub use query::{BounceQuery, SortField, SortOrder};
pub use recorder::{BounceRecorder, LoggingRecorder};
pub use selection::BounceSelection;
pub use services::{BounceService, IngestOutcome};
pub use sources::{BounceSource, Normalized};
pub use store::{BounceStore, SeaOrmBounceStore};
pub use types::{Bounce, BounceInput, BounceListing, BounceResults, NewBounce};
