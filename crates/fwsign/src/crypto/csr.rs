//! PKCS#10 certificate signing requests.
//!
//! A certificate key requests the certificate that later travels in the
//! image trailer next to its public key.

use super::key::Key;
use crate::{Error, Result};
use ed25519_dalek::Signer as _;
use pkcs8::LineEnding;
use rand::rngs::OsRng;
use sha2::Sha256;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use x509_cert::builder::{Builder, RequestBuilder};
use x509_cert::der::asn1::{BitString, Ia5String};
use x509_cert::der::EncodePem;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::SubjectAltName;
use x509_cert::name::Name;
use x509_cert::request::CertReq;

impl Key {
    /// Build a CSR for this key.
    ///
    /// `subject` is an RFC 4514 distinguished name such as
    /// `CN=device.example.com,O=Example`. Each entry of `dns_names` lands in
    /// a subjectAltName extension.
    pub fn csr(&self, subject: &str, dns_names: &[String]) -> Result<CertReq> {
        let subject = Name::from_str(subject)
            .map_err(|e| Error::Config(format!("Invalid subject \"{}\": {}", subject, e)))?;
        let san = subject_alt_name(dns_names)?;

        match self {
            Key::Ed25519(key) => {
                let mut builder = RequestBuilder::new(subject, key).map_err(csr_error)?;
                if let Some(san) = &san {
                    builder.add_extension(san).map_err(csr_error)?;
                }
                // Ed25519 signatures carry no BitString encoding of their own
                let tbs = builder.finalize().map_err(csr_error)?;
                let signature = key.sign(&tbs).to_bytes();
                let signature = BitString::from_bytes(&signature).map_err(csr_error)?;
                builder.assemble(signature).map_err(csr_error)
            }
            Key::EcdsaP256(key) => {
                let mut builder = RequestBuilder::new(subject, key).map_err(csr_error)?;
                if let Some(san) = &san {
                    builder.add_extension(san).map_err(csr_error)?;
                }
                builder
                    .build::<p256::ecdsa::DerSignature>()
                    .map_err(csr_error)
            }
            Key::Rsa2048(key) => {
                let signer = rsa::pss::BlindedSigningKey::<Sha256>::new(key.clone());
                let mut builder = RequestBuilder::new(subject, &signer).map_err(csr_error)?;
                if let Some(san) = &san {
                    builder.add_extension(san).map_err(csr_error)?;
                }
                builder
                    .build_with_rng::<rsa::pss::Signature>(&mut OsRng)
                    .map_err(csr_error)
            }
            Key::Ed25519Public(_) | Key::EcdsaP256Public(_) | Key::Rsa2048Public(_) => {
                Err(Error::Usage(format!(
                    "Operation create_csr requires a private {} key",
                    self.algorithm()
                )))
            }
        }
    }

    /// Write a PEM CSR for this key to `path`.
    pub fn create_csr(
        &self,
        path: impl AsRef<Path>,
        subject: &str,
        dns_names: &[String],
    ) -> Result<()> {
        let path = path.as_ref();
        let pem = self
            .csr(subject, dns_names)?
            .to_pem(LineEnding::LF)
            .map_err(csr_error)?;
        fs::write(path, pem)?;
        tracing::info!(path = %path.display(), algorithm = %self.algorithm(), subject, "wrote CSR");
        Ok(())
    }
}

fn subject_alt_name(dns_names: &[String]) -> Result<Option<SubjectAltName>> {
    if dns_names.is_empty() {
        return Ok(None);
    }
    let names = dns_names
        .iter()
        .map(|name| {
            Ia5String::new(name)
                .map(GeneralName::DnsName)
                .map_err(|e| Error::Config(format!("Invalid DNS name \"{}\": {}", name, e)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(SubjectAltName(names)))
}

fn csr_error(e: impl std::fmt::Display) -> Error {
    Error::Signing(format!("CSR creation failed: {}", e))
}
