//! Arca Sync - Registry Push/Pull Engine
//!
//! Moves artifacts between a [`arca_store::LocalStore`] and a remote registry
//! reached through a [`RegistryTransport`]. Provides:
//!
//! - Retry with fixed or exponential delays and an explicit attempt state machine
//! - Credential resolution and TLS policy per session
//! - Encryption on push and decryption on pull via [`arca_crypt`]
//! - Integrity checks of everything pulled
//! - Optional signing after upload
//!
//! # Example
//!
//! ```
//! use arca_sync::{parse_duration, RetryDefaults, RetryPolicy};
//! use std::time::Duration;
//!
//! assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
//!
//! let policy = RetryPolicy::resolve(None, Some("2s"), &RetryDefaults::default()).unwrap();
//! assert_eq!(policy.max_retries, 3);
//! assert_eq!(policy.delay_for(2), Duration::from_secs(2));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod attempt;
mod credentials;
mod engine;
mod error;
mod progress;
mod retry;
mod signing;
mod transport;

pub use attempt::{allowed_transitions, validate_transition, AttemptState, AttemptTracker};
pub use credentials::{
    AuthMaterial, CredentialError, CredentialRequest, CredentialSource, DefaultCredentialSource,
    DEFAULT_REGISTRY,
};
pub use engine::{PullOutcome, PullRequest, PushOutcome, PushRequest, SyncEngine};
pub use error::{SyncError, TransportError};
pub use progress::{MemorySink, ProgressSink, WriterSink};
pub use retry::{
    parse_duration, RetryDefaults, RetryDelay, RetryPolicy, DEFAULT_BACKOFF_BASE,
    DEFAULT_MAX_RETRIES,
};
pub use signing::{SignError, Signer, SigningRequest};
pub use transport::{RegistryTransport, RemoteArtifact, TlsPolicy, TransportContext, UploadBundle};

/// Re-exported so callers can build requests without a direct dependency
pub use tokio_util::sync::CancellationToken;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
