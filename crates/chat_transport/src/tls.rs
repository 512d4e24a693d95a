//! Process-wide rustls setup for `wss://` endpoints

use std::sync::OnceLock;

static CRYPTO_PROVIDER: OnceLock<()> = OnceLock::new();

/// Install the ring crypto provider unless one is already installed.
///
/// rustls 0.23 panics on the first TLS handshake when no process-level
/// provider was selected.
pub fn ensure_crypto_provider() {
    CRYPTO_PROVIDER.get_or_init(|| {
        if rustls::crypto::CryptoProvider::get_default().is_some() {
            return;
        }
        if let Err(e) = rustls::crypto::ring::default_provider().install_default() {
            tracing::debug!("rustls crypto provider already installed: {:?}", e);
        }
    });
}
