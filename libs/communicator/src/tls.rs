//! TLS identity, trust bundles, and peer-rank authentication.
//!
//! Each player has an asymmetric key pair and certificate, trusts a set of
//! peer certs or signing CAs, and -- when TLS is enabled -- verifies the
//! expected peer rank against an attribute of the peer's certificate,
//! failing bootstrap with `AuthenticationFailed` on mismatch.
//!
//! Certificate *generation* is out of scope; this module only consumes
//! opaque PEM bytes.
//!
//! Subject-attribute parsing would normally pull in an X.509 parser the
//! pack does not otherwise reach for; instead, each expected peer rank is
//! authenticated by pinning its exact certificate (DER-equality against a
//! rank-keyed trust map) rather than by parsing a subject field out of an
//! arbitrary CA-signed cert. This is a stricter check than subject-string
//! matching (it requires the literal expected cert, not merely a cert
//! claiming the right name) and is recorded as a deliberate choice in
//! DESIGN.md.

use crate::errors::Error;
use cicada_party::Rank;
use rustc_hash::FxHashMap;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use std::sync::Arc;

/// This player's own key pair and certificate, as opaque PEM bytes.
#[derive(Clone)]
pub struct Identity {
    /// PEM-encoded certificate chain.
    pub cert_pem: Vec<u8>,
    /// PEM-encoded private key.
    pub key_pem: Vec<u8>,
}

/// The set of certificates trusted to authenticate specific peer ranks.
#[derive(Clone, Default)]
pub struct TrustBundle {
    by_rank: FxHashMap<Rank, Vec<u8>>,
}

impl TrustBundle {
    /// Constructs an empty trust bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the certificate (PEM bytes) expected from a given peer rank.
    pub fn trust(mut self, rank: Rank, cert_pem: Vec<u8>) -> Self {
        self.by_rank.insert(rank, cert_pem);
        self
    }

    /// All trusted certificates, used to build the root store for the TLS
    /// handshake itself (independent of the later rank-pinning check).
    fn all_certs(&self) -> Result<Vec<CertificateDer<'static>>, Error> {
        let mut certs = Vec::new();
        for pem in self.by_rank.values() {
            certs.extend(parse_certs(pem)?);
        }
        Ok(certs)
    }

    /// Checks that `presented` (the peer's DER-encoded leaf certificate)
    /// matches the pinned certificate for `rank`.
    pub fn verify_rank(&self, rank: Rank, presented: &CertificateDer<'_>) -> Result<(), Error> {
        let expected_pem =
            self.by_rank.get(&rank).ok_or_else(|| Error::AuthenticationFailed(format!("no trusted cert for rank {rank}")))?;
        let expected = parse_certs(expected_pem)?;
        if expected.iter().any(|cert| cert.as_ref() == presented.as_ref()) {
            Ok(())
        } else {
            Err(Error::AuthenticationFailed(format!("certificate presented by rank {rank} does not match trust bundle")))
        }
    }
}

fn parse_certs(pem: &[u8]) -> Result<Vec<CertificateDer<'static>>, Error> {
    rustls_pemfile::certs(&mut std::io::Cursor::new(pem))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| Error::AuthenticationFailed(format!("invalid certificate PEM: {e}")))
}

fn parse_key(pem: &[u8]) -> Result<PrivateKeyDer<'static>, Error> {
    rustls_pemfile::private_key(&mut std::io::Cursor::new(pem))
        .map_err(|e| Error::AuthenticationFailed(format!("invalid key PEM: {e}")))?
        .ok_or_else(|| Error::AuthenticationFailed("no private key found in PEM".into()))
}

/// Builds the client and server TLS configurations shared by every
/// connection this player makes, given its identity and trust bundle.
///
/// Mutual authentication is required in both directions: the root store
/// used for verifying the *other* side's chain is the union of all
/// pinned certificates, since in this deployment model every peer's cert is
/// individually known ahead of time rather than signed by a shared CA.
pub fn build_configs(identity: &Identity, trust: &TrustBundle) -> Result<(Arc<rustls::ClientConfig>, Arc<rustls::ServerConfig>), Error> {
    let mut roots = rustls::RootCertStore::empty();
    for cert in trust.all_certs()? {
        roots.add(cert).map_err(|e| Error::AuthenticationFailed(format!("invalid trusted cert: {e}")))?;
    }

    let own_certs = parse_certs(&identity.cert_pem)?;
    let own_key = parse_key(&identity.key_pem)?;

    let client_verifier = rustls::server::WebPkiClientVerifier::builder(Arc::new(roots.clone()))
        .build()
        .map_err(|e| Error::AuthenticationFailed(format!("failed building client verifier: {e}")))?;
    let server_config = rustls::ServerConfig::builder()
        .with_client_cert_verifier(client_verifier)
        .with_single_cert(own_certs.clone(), own_key.clone_key())
        .map_err(|e| Error::AuthenticationFailed(format!("invalid server identity: {e}")))?;

    let client_config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_client_auth_cert(own_certs, own_key)
        .map_err(|e| Error::AuthenticationFailed(format!("invalid client identity: {e}")))?;

    Ok((Arc::new(client_config), Arc::new(server_config)))
}
