//! Blob inputs accepted by create and append

use crate::error::StoreError;
use arca_artifact::{Blob, BlobPayload};

/// Turns caller input into a stored descriptor and its bytes
pub trait BlobInput {
    /// # Errors
    /// `StoreError::PayloadMismatch` if a supplied descriptor does not
    /// describe the bytes
    fn into_described(self) -> Result<(Blob, Vec<u8>), StoreError>;
}

/// Descriptor supplied by the caller; verified against the bytes
impl BlobInput for BlobPayload {
    fn into_described(self) -> Result<(Blob, Vec<u8>), StoreError> {
        if !self.blob.describes(&self.data) {
            return Err(StoreError::PayloadMismatch {
                digest: self.blob.digest,
            });
        }
        Ok((self.blob, self.data))
    }
}

/// Raw bytes the store describes itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBlob {
    pub media_type: String,
    pub title: Option<String>,
    pub data: Vec<u8>,
}

impl NewBlob {
    #[must_use]
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            title: None,
            data,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl BlobInput for NewBlob {
    fn into_described(self) -> Result<(Blob, Vec<u8>), StoreError> {
        let blob = Blob::from_bytes(self.media_type, &self.data);
        let blob = match self.title {
            Some(title) => blob.with_title(title),
            None => blob,
        };
        Ok((blob, self.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arca_artifact::Digest;

    #[test]
    fn new_blob_is_described_once() {
        let (blob, data) = NewBlob::new("text/plain", b"hi".to_vec())
            .with_title("hi.txt")
            .into_described()
            .unwrap();
        assert_eq!(blob.digest, Digest::compute(b"hi"));
        assert_eq!(blob.size, 2);
        assert_eq!(blob.title(), Some("hi.txt"));
        assert_eq!(data, b"hi");
    }

    #[test]
    fn payload_descriptor_is_checked() {
        let mut payload = BlobPayload::new("text/plain", b"hi".to_vec());
        payload.data = b"changed".to_vec();
        assert!(matches!(
            payload.into_described(),
            Err(StoreError::PayloadMismatch { .. })
        ));
    }
}
