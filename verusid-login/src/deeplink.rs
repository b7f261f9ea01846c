//! Deeplink and QR rendering for login-consent requests
//!
//! The canonical deeplink is the x-callback-url form consumed by wallet apps,
//! with the full signed request carried as a base64url payload. The QR form is
//! the same deeplink rendered as an SVG, wrapped in a data URL for direct use
//! in an `<img>` tag.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use qrcode::render::svg;
use qrcode::QrCode;

use crate::consent::LoginConsentRequest;
use crate::error::{ProtocolError, Result};

/// Deeplink scheme and action prefix
pub const DEEPLINK_PREFIX: &str = "verus://x-callback-url/loginconsent?request=";

/// Encode a signed request as its canonical deeplink
pub fn to_deeplink(request: &LoginConsentRequest) -> Result<String> {
    let payload = serde_json::to_vec(request)?;
    Ok(format!(
        "{DEEPLINK_PREFIX}{}",
        URL_SAFE_NO_PAD.encode(payload)
    ))
}

/// Decode a deeplink back into the signed request it carries
pub fn from_deeplink(deeplink: &str) -> Result<LoginConsentRequest> {
    let payload = deeplink
        .strip_prefix(DEEPLINK_PREFIX)
        .ok_or_else(|| ProtocolError::Malformed("not a loginconsent deeplink".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| ProtocolError::Malformed(format!("deeplink payload: {e}")))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Render a deeplink as an SVG QR code data URL
pub fn qr_data_url(deeplink: &str) -> Result<String> {
    let code = QrCode::new(deeplink.as_bytes())
        .map_err(|e| ProtocolError::Encoding(format!("qr: {e}")))?;
    let image = code
        .render::<svg::Color>()
        .min_dimensions(256, 256)
        .build();
    Ok(format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(image)
    ))
}

pub(crate) fn b64_encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub(crate) fn b64_decode(encoded: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consent::test_support::{service_keypair, signed_request};

    #[test]
    fn test_deeplink_round_trip() {
        let request = signed_request();
        let deeplink = to_deeplink(&request).unwrap();
        assert!(deeplink.starts_with(DEEPLINK_PREFIX));

        let decoded = from_deeplink(&deeplink).unwrap();
        assert_eq!(decoded.challenge.challenge_id, request.challenge.challenge_id);
        // The carried request is still verifiable
        assert!(decoded.verify(&service_keypair().pk).is_ok());
    }

    #[test]
    fn test_rejects_foreign_scheme() {
        assert!(from_deeplink("https://example.com/?request=abc").is_err());
    }

    #[test]
    fn test_rejects_corrupt_payload() {
        let deeplink = format!("{DEEPLINK_PREFIX}%%%not-base64%%%");
        assert!(from_deeplink(&deeplink).is_err());
    }

    #[test]
    fn test_qr_data_url_shape() {
        let request = signed_request();
        let deeplink = to_deeplink(&request).unwrap();
        let url = qr_data_url(&deeplink).unwrap();
        assert!(url.starts_with("data:image/svg+xml;base64,"));
        // Payload decodes back to an SVG document
        let svg_bytes = b64_decode(url.strip_prefix("data:image/svg+xml;base64,").unwrap()).unwrap();
        let svg = String::from_utf8(svg_bytes).unwrap();
        assert!(svg.contains("<svg"));
    }
}
