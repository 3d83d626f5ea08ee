use arca_artifact::Blob;
use arca_crypt::{
    CryptError, DecryptConfig, Decryptor, EncryptionKey, Encryptor, SealedLayer,
    ENC_ANNOTATION_PREFIX,
};
use std::collections::BTreeMap;

/// Annotation carrying the "wrapped" key
pub const TOY_KEY_ANNOTATION: &str = "org.opencontainers.image.enc.keys.toy";

/// XOR cipher keyed by the first recipient's key value
///
/// Accepts only `toy:` keys. Decryption succeeds when the decrypt config
/// lists the same key value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToyCipher;

impl ToyCipher {
    fn xor(data: &[u8], key: &str) -> Vec<u8> {
        let key = key.as_bytes();
        data.iter()
            .zip(key.iter().cycle())
            .map(|(b, k)| b ^ k)
            .collect()
    }
}

impl Encryptor for ToyCipher {
    fn encrypt(
        &self,
        _layer: &Blob,
        plaintext: &[u8],
        keys: &[EncryptionKey],
    ) -> Result<SealedLayer, CryptError> {
        let key = keys.first().ok_or(CryptError::MissingEncryptionKey)?;
        if key.scheme() != "toy" {
            return Err(CryptError::EncryptionKeyInvalid {
                key: key.to_string(),
                reason: "toy cipher only accepts toy: keys".to_string(),
            });
        }
        let mut annotations = BTreeMap::new();
        annotations.insert(TOY_KEY_ANNOTATION.to_string(), key.value().to_string());
        annotations.insert(
            format!("{ENC_ANNOTATION_PREFIX}pubopts"),
            "toy".to_string(),
        );
        Ok(SealedLayer {
            ciphertext: Self::xor(plaintext, key.value()),
            annotations,
        })
    }
}

impl Decryptor for ToyCipher {
    fn decrypt(
        &self,
        layer: &Blob,
        ciphertext: &[u8],
        config: &DecryptConfig,
    ) -> Result<Vec<u8>, CryptError> {
        let failed = |reason: &str| CryptError::DecryptionFailed {
            digest: layer.digest.clone(),
            reason: reason.to_string(),
        };
        let wrapped = layer
            .annotations
            .get(TOY_KEY_ANNOTATION)
            .ok_or_else(|| failed("no toy key annotation"))?;
        if !config.keys.iter().any(|k| k == wrapped) {
            return Err(failed("no matching private key"));
        }
        Ok(Self::xor(ciphertext, wrapped))
    }
}
