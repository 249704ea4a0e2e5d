//! Certificate production seam. PDF layout and digital-signature plumbing are out of
//! scope for this engine (see DESIGN.md); `CertificateProducer` is the trait the result
//! aggregator hands an [`crate::ErasureResult`] to once a run completes. The JSON-backed
//! implementation below is a minimal, honest stand-in: it records what happened without
//! claiming a cryptographic signature it doesn't verify against a real key store.

use crate::ErasureResult;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Anything that can turn a completed device result into a durable attestation record.
pub trait CertificateProducer {
    fn produce(&self, result: &ErasureResult) -> Result<WipeCertificate>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WipeCertificate {
    pub certificate_id: String,
    pub device_path: String,
    pub method: String,
    pub rounds: u32,
    pub success: bool,
    pub bytes_erased: u64,
    pub timestamp: DateTime<Utc>,
    /// SHA-256 digest of the certificate's other fields. Not a cryptographic signature --
    /// there is no key store backing this engine's certificate seam.
    pub content_hash: String,
}

#[derive(Default)]
pub struct JsonCertificateProducer;

impl CertificateProducer for JsonCertificateProducer {
    fn produce(&self, result: &ErasureResult) -> Result<WipeCertificate> {
        let mut cert = WipeCertificate {
            certificate_id: Uuid::new_v4().to_string(),
            device_path: result.device_path.clone(),
            method: result.method.clone(),
            rounds: result.rounds,
            success: result.success,
            bytes_erased: result.bytes_erased,
            timestamp: Utc::now(),
            content_hash: String::new(),
        };
        cert.content_hash = Self::hash(&cert)?;
        Ok(cert)
    }
}

impl JsonCertificateProducer {
    fn hash(cert: &WipeCertificate) -> Result<String> {
        let mut unhashed = cert.clone();
        unhashed.content_hash = String::new();
        let json = serde_json::to_string(&unhashed)?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }

    pub fn save(&self, certificate: &WipeCertificate, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(certificate)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
