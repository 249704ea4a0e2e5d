pub mod certificates;
pub mod entropy_gate;
pub mod prng;
pub mod secure_rng; // Made public for testing

#[cfg(test)]
mod secure_rng_tests;

// Re-export
pub use certificates::{CertificateProducer, JsonCertificateProducer, WipeCertificate};
pub use entropy_gate::{entropy_gate, entropy_stats, EntropyStats};
pub use prng::{PrngAlgorithm, WipePrng};
pub use secure_rng::secure_random_bytes; // Export for compliance tests
