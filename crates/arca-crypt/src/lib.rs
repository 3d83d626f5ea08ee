//! Arca Crypt - Envelope Encryption Coordination
//!
//! Decides which layers of an artifact are encrypted on push and opens them
//! again on pull. The cryptography lives behind the [`Encryptor`] and
//! [`Decryptor`] capabilities.
//!
//! # Example
//!
//! ```
//! use arca_crypt::{CryptError, EncryptionPlan};
//!
//! let err = EncryptionPlan::new(&[0], &[]).unwrap_err();
//! assert!(matches!(err, CryptError::MissingEncryptionKey));
//!
//! let plan = EncryptionPlan::new(&[-1], &["jwe:/keys/pub.pem".to_string()]).unwrap();
//! assert_eq!(plan.resolve(3).unwrap().into_iter().collect::<Vec<_>>(), vec![2]);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod config;
mod coordinator;
mod error;

pub use config::{DecryptConfig, EncryptionKey, EncryptionPlan};
pub use coordinator::{
    Decryptor, EncryptionCoordinator, Encryptor, PlaintextView, SealedLayer, TransmitView,
    ENCRYPTED_SUFFIX, ENC_ANNOTATION_PREFIX, ENC_DIGEST_ANNOTATION,
};
pub use error::CryptError;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
