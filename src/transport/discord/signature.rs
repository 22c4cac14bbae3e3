use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::error::WebhookError;

/// Parse the application's hex-encoded Ed25519 public key.
pub fn parse_public_key(hex_key: &str) -> Result<VerifyingKey, WebhookError> {
    let bytes = hex::decode(hex_key.trim()).map_err(|e| WebhookError::PublicKey(e.to_string()))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| WebhookError::PublicKey("expected 32 bytes".into()))?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| WebhookError::PublicKey(e.to_string()))
}

/// Verify a Discord interaction signature over `timestamp || body`.
/// See: <https://discord.com/developers/docs/interactions/overview#setting-up-an-endpoint-validating-security-request-headers>
pub fn verify_interaction_signature(
    key: &VerifyingKey,
    signature_hex: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<(), WebhookError> {
    let Ok(raw) = hex::decode(signature_hex) else {
        return Err(WebhookError::Signature);
    };
    let Ok(raw) = <[u8; 64]>::try_from(raw.as_slice()) else {
        return Err(WebhookError::Signature);
    };
    let signature = Signature::from_bytes(&raw);

    let mut message = Vec::with_capacity(timestamp.len() + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(body);

    key.verify(&message, &signature)
        .map_err(|_| WebhookError::Signature)
}
