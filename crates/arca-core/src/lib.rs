//! Arca Core - Artifact Facade
//!
//! The public surface of Arca:
//! - Adds files to local artifacts and appends to them
//! - Lists, inspects, extracts and removes local artifacts
//! - Pushes to and pulls from registries with retries, encryption and signing
//! - Loads configuration and installs logging
//!
//! # Example
//!
//! ```
//! use arca_core::prelude::*;
//! use arca_test_utils::MemoryRegistry;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ArcaError> {
//! let dir = arca_test_utils::temp_dir();
//! let files = arca_test_utils::write_files(dir.path(), &[("notes.txt", &b"hello"[..])]);
//!
//! let engine = SyncEngine::new(Arc::new(MemoryRegistry::new()));
//! let arca = ArtifactFacade::new(engine, ArcaConfig::new());
//!
//! let added = arca.add("quay.io/team/notes:v1", &files, &ArtifactAddOptions::default()).await?;
//! let inspected = arca
//!     .inspect("quay.io/team/notes:v1", &ArtifactInspectOptions::default())
//!     .await?;
//! assert_eq!(inspected.digest, added.artifact_digest);
//!
//! let blob = arca.extract(
//!     "quay.io/team/notes:v1",
//!     &ArtifactExtractOptions::by_title("notes.txt"),
//! )?;
//! assert_eq!(&*blob.data, b"hello");
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod facade;
pub mod options;
pub mod reports;
pub mod telemetry;

pub use config::{ArcaConfig, ConfigError};
pub use error::{ArcaError, ErrorKind};
pub use facade::ArtifactFacade;
pub use options::{
    ArtifactAddOptions, ArtifactExtractOptions, ArtifactInspectOptions, ArtifactListOptions,
    ArtifactPullOptions, ArtifactPushOptions, ArtifactRemoveOptions,
};
pub use reports::{
    ArtifactAddReport, ArtifactInspectReport, ArtifactListReport, ArtifactPullReport,
    ArtifactPushReport, ArtifactRemoveReport,
};
pub use telemetry::{LogConfig, TelemetryError};

// Component types that appear in the facade's signatures
pub use arca_artifact::{Artifact, Blob, Digest};
pub use arca_crypt::{DecryptConfig, EncryptionCoordinator};
pub use arca_store::{ExtractedBlob, LocalStore};
pub use arca_sync::{CancellationToken, MemorySink, ProgressSink, SyncEngine, WriterSink};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Arca
    pub use crate::{
        ArcaConfig, ArcaError, ArtifactAddOptions, ArtifactExtractOptions, ArtifactFacade,
        ArtifactInspectOptions, ArtifactListOptions, ArtifactPullOptions, ArtifactPushOptions,
        ArtifactRemoveOptions, ErrorKind, SyncEngine,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
