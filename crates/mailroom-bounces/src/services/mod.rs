mod bounce_service;

pub use bounce_service::{BounceService, IngestOutcome};
