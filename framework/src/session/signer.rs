use crate::error::FrameworkError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signs cookie payloads with HMAC-SHA256 keyed by the session mask
///
/// Signed values look like `<payload>.<signature>`, both URL-safe base64.
#[derive(Clone)]
pub struct Signer {
    key: Vec<u8>,
}

impl Signer {
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        Self {
            key: key.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> Result<HmacSha256, FrameworkError> {
        HmacSha256::new_from_slice(&self.key)
            .map_err(|e| FrameworkError::session(format!("Invalid session mask: {}", e)))
    }

    pub fn sign(&self, payload: &[u8]) -> Result<String, FrameworkError> {
        let mut mac = self.mac()?;
        mac.update(payload);
        let signature = mac.finalize().into_bytes();
        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload),
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Payload of a signed value, `None` when malformed or tampered with
    pub fn verify(&self, value: &str) -> Option<Vec<u8>> {
        let (payload, signature) = value.split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(payload).ok()?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let mut mac = self.mac().ok()?;
        mac.update(&payload);
        mac.verify_slice(&signature).ok()?;
        Some(payload)
    }
}
