//! Signing keys for firmware images.
//!
//! A [`Key`] is either a private key, able to sign, or a public-only key that
//! can still export its public half and verify signatures. Three algorithms
//! are supported:
//!
//! | Algorithm | Public bytes in trailer | Signature | Signs |
//! |-----------|-------------------------|-----------|-------|
//! | Ed25519 | raw 32-byte point | 64 bytes | the precomputed digest |
//! | ECDSA P-256 | uncompressed SEC1 point (65 bytes) | 64-byte `r \|\| s` | the precomputed digest |
//! | RSA-2048 | PKCS#1 `RSAPublicKey` DER | 256 bytes, PSS/SHA-256, salt 32 | the full content |
//!
//! Keys are loaded from PKCS#8 (optionally passphrase-encrypted) or
//! SubjectPublicKeyInfo files, PEM or DER.
//!
//! # Examples
//!
//! ```no_run
//! use fwsign::crypto::{Key, KeyAlgorithm};
//!
//! let key = Key::generate(KeyAlgorithm::Ed25519)?;
//! key.export_private("signing.pem", None)?;
//! key.export_public("signing-pub.pem")?;
//!
//! let public = Key::load("signing-pub.pem", None)?;
//! assert!(!public.can_export_private());
//! # Ok::<(), fwsign::Error>(())
//! ```

use crate::format::SignatureAlgorithm;
use crate::{Error, Result};
use ed25519_dalek::Signer as _;
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use pkcs8::{
    DecodePrivateKey, DecodePublicKey, Document, EncodePrivateKey, EncodePublicKey,
    EncryptedPrivateKeyInfo, LineEnding,
};
use rand::rngs::OsRng;
use rsa::pkcs1::EncodeRsaPublicKey;
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::fmt;
use std::fs;
use std::path::Path;

/// RSA modulus size accepted for signing, in bits
const RSA_KEY_BITS: usize = 2048;

/// PSS salt length the verifier accepts (equal to the SHA-256 output size)
const RSA_PSS_SALT_LEN: usize = 32;

const PEM_LABEL_PRIVATE: &str = "PRIVATE KEY";
const PEM_LABEL_ENCRYPTED: &str = "ENCRYPTED PRIVATE KEY";
const PEM_LABEL_PUBLIC: &str = "PUBLIC KEY";

/// Signature scheme of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    Ed25519,
    EcdsaP256,
    Rsa2048,
}

impl KeyAlgorithm {
    /// All key algorithms.
    pub const ALL: [KeyAlgorithm; 3] = [
        KeyAlgorithm::Ed25519,
        KeyAlgorithm::EcdsaP256,
        KeyAlgorithm::Rsa2048,
    ];

    /// What the signing primitive expects as input.
    pub fn signing_mode(self) -> SigningMode {
        match self {
            KeyAlgorithm::Ed25519 | KeyAlgorithm::EcdsaP256 => SigningMode::Digest,
            KeyAlgorithm::Rsa2048 => SigningMode::FullContent,
        }
    }

    /// Fixed length of a signature in bytes.
    pub fn signature_len(self) -> usize {
        match self {
            KeyAlgorithm::Ed25519 => 64,
            KeyAlgorithm::EcdsaP256 => 64,
            KeyAlgorithm::Rsa2048 => RSA_KEY_BITS / 8,
        }
    }

    /// Header signature algorithm this key maps to, if it has a wire code.
    pub fn header_algorithm(self) -> Option<SignatureAlgorithm> {
        match self {
            KeyAlgorithm::Ed25519 => Some(SignatureAlgorithm::Ed25519),
            KeyAlgorithm::EcdsaP256 => Some(SignatureAlgorithm::EcdsaP256),
            KeyAlgorithm::Rsa2048 => None,
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAlgorithm::Ed25519 => f.write_str("ed25519"),
            KeyAlgorithm::EcdsaP256 => f.write_str("ecdsa-p256"),
            KeyAlgorithm::Rsa2048 => f.write_str("rsa-2048"),
        }
    }
}

/// Input a signing primitive consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningMode {
    /// The primitive hashes the whole signed region itself.
    FullContent,
    /// The primitive signs a digest computed by the caller.
    Digest,
}

/// Data handed to [`Key::sign`] or [`Key::verify`].
///
/// The variant must agree with the key's [`SigningMode`].
#[derive(Debug, Clone, Copy)]
pub enum SignInput<'a> {
    /// The full signed region
    Content(&'a [u8]),
    /// A precomputed digest of the signed region
    Digest(&'a [u8]),
}

impl SignInput<'_> {
    fn mode(&self) -> SigningMode {
        match self {
            SignInput::Content(_) => SigningMode::FullContent,
            SignInput::Digest(_) => SigningMode::Digest,
        }
    }

    fn bytes(&self) -> &[u8] {
        match self {
            SignInput::Content(data) | SignInput::Digest(data) => data,
        }
    }
}

/// A signing or verification key.
///
/// Private variants hold secret material and can sign and export it.
/// Public variants fail those operations with [`Error::Usage`].
///
/// # Security
///
/// The `Debug` output never includes key material.
#[allow(clippy::large_enum_variant)]
pub enum Key {
    /// Ed25519 private key
    Ed25519(ed25519_dalek::SigningKey),
    /// Ed25519 public key
    Ed25519Public(ed25519_dalek::VerifyingKey),
    /// ECDSA P-256 private key
    EcdsaP256(p256::ecdsa::SigningKey),
    /// ECDSA P-256 public key
    EcdsaP256Public(p256::ecdsa::VerifyingKey),
    /// RSA-2048 private key
    Rsa2048(RsaPrivateKey),
    /// RSA-2048 public key
    Rsa2048Public(RsaPublicKey),
}

impl Key {
    /// Generate a fresh private key.
    ///
    /// Blocks while the OS random source and, for RSA, prime generation run.
    pub fn generate(algorithm: KeyAlgorithm) -> Result<Self> {
        let key = match algorithm {
            KeyAlgorithm::Ed25519 => Key::Ed25519(ed25519_dalek::SigningKey::generate(&mut OsRng)),
            KeyAlgorithm::EcdsaP256 => Key::EcdsaP256(p256::ecdsa::SigningKey::random(&mut OsRng)),
            KeyAlgorithm::Rsa2048 => {
                let key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
                    .map_err(|e| Error::Key(format!("RSA key generation failed: {}", e)))?;
                Key::Rsa2048(key)
            }
        };
        tracing::info!(algorithm = %algorithm, "generated key");
        Ok(key)
    }

    /// Load a key file.
    ///
    /// Accepts PKCS#8 private keys (plain or encrypted) and SubjectPublicKeyInfo
    /// public keys, PEM or DER. An encrypted key requires `passphrase`.
    pub fn load(path: impl AsRef<Path>, passphrase: Option<&SecretString>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let key = Self::from_encoded(&data, passphrase)?;
        tracing::debug!(
            path = %path.display(),
            algorithm = %key.algorithm(),
            private = key.can_export_private(),
            "loaded key"
        );
        Ok(key)
    }

    /// Parse a key from PEM or DER bytes.
    pub fn from_encoded(data: &[u8], passphrase: Option<&SecretString>) -> Result<Self> {
        let pem_text = std::str::from_utf8(data)
            .ok()
            .filter(|text| text.contains("-----BEGIN "));

        let Some(text) = pem_text else {
            // Not PEM; try DER in each container.
            return Self::from_private_der(data)
                .or_else(|_| Self::from_public_der(data))
                .or_else(|err| match passphrase {
                    Some(_) => Self::from_encrypted_der(data, passphrase),
                    None => Err(err),
                });
        };

        let (label, document) = Document::from_pem(text.trim())
            .map_err(|e| Error::Key(format!("Malformed PEM: {}", e)))?;
        match label {
            PEM_LABEL_PRIVATE => Self::from_private_der(document.as_bytes()),
            PEM_LABEL_ENCRYPTED => Self::from_encrypted_der(document.as_bytes(), passphrase),
            PEM_LABEL_PUBLIC => Self::from_public_der(document.as_bytes()),
            other => Err(Error::Key(format!("Unsupported PEM label \"{}\"", other))),
        }
    }

    fn from_encrypted_der(der: &[u8], passphrase: Option<&SecretString>) -> Result<Self> {
        let passphrase = passphrase
            .ok_or_else(|| Error::Key("Key is encrypted but no passphrase was given".into()))?;
        let info = EncryptedPrivateKeyInfo::try_from(der)
            .map_err(|e| Error::Key(format!("Malformed encrypted key: {}", e)))?;
        let document = info
            .decrypt(passphrase.expose_secret().as_bytes())
            .map_err(|e| Error::Key(format!("Failed to decrypt key: {}", e)))?;
        Self::from_private_der(document.as_bytes())
    }

    fn from_private_der(der: &[u8]) -> Result<Self> {
        if let Ok(key) = ed25519_dalek::SigningKey::from_pkcs8_der(der) {
            return Ok(Key::Ed25519(key));
        }
        if let Ok(key) = p256::ecdsa::SigningKey::from_pkcs8_der(der) {
            return Ok(Key::EcdsaP256(key));
        }
        if let Ok(key) = RsaPrivateKey::from_pkcs8_der(der) {
            check_rsa_size(key.size())?;
            return Ok(Key::Rsa2048(key));
        }
        Err(Error::Key(
            "Failed to parse private key as Ed25519, ECDSA P-256 or RSA".into(),
        ))
    }

    fn from_public_der(der: &[u8]) -> Result<Self> {
        if let Ok(key) = ed25519_dalek::VerifyingKey::from_public_key_der(der) {
            return Ok(Key::Ed25519Public(key));
        }
        if let Ok(key) = p256::ecdsa::VerifyingKey::from_public_key_der(der) {
            return Ok(Key::EcdsaP256Public(key));
        }
        if let Ok(key) = RsaPublicKey::from_public_key_der(der) {
            check_rsa_size(key.size())?;
            return Ok(Key::Rsa2048Public(key));
        }
        Err(Error::Key(
            "Failed to parse public key as Ed25519, ECDSA P-256 or RSA".into(),
        ))
    }

    /// The key's signature scheme.
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            Key::Ed25519(_) | Key::Ed25519Public(_) => KeyAlgorithm::Ed25519,
            Key::EcdsaP256(_) | Key::EcdsaP256Public(_) => KeyAlgorithm::EcdsaP256,
            Key::Rsa2048(_) | Key::Rsa2048Public(_) => KeyAlgorithm::Rsa2048,
        }
    }

    /// What [`Key::sign`] expects as input.
    pub fn signing_mode(&self) -> SigningMode {
        self.algorithm().signing_mode()
    }

    /// Whether the key holds private material.
    pub fn can_export_private(&self) -> bool {
        match self {
            Key::Ed25519(_) | Key::EcdsaP256(_) | Key::Rsa2048(_) => true,
            Key::Ed25519Public(_) | Key::EcdsaP256Public(_) | Key::Rsa2048Public(_) => false,
        }
    }

    /// Fixed byte length of a signature made with this key.
    pub fn signature_len(&self) -> usize {
        self.algorithm().signature_len()
    }

    fn public_half(&self) -> PublicHalf {
        match self {
            Key::Ed25519(key) => PublicHalf::Ed25519(key.verifying_key()),
            Key::Ed25519Public(key) => PublicHalf::Ed25519(*key),
            Key::EcdsaP256(key) => PublicHalf::EcdsaP256(p256::ecdsa::VerifyingKey::from(key)),
            Key::EcdsaP256Public(key) => PublicHalf::EcdsaP256(key.clone()),
            Key::Rsa2048(key) => PublicHalf::Rsa2048(key.to_public_key()),
            Key::Rsa2048Public(key) => PublicHalf::Rsa2048(key.clone()),
        }
    }

    /// Public-only copy of this key.
    pub fn to_public(&self) -> Key {
        match self.public_half() {
            PublicHalf::Ed25519(key) => Key::Ed25519Public(key),
            PublicHalf::EcdsaP256(key) => Key::EcdsaP256Public(key),
            PublicHalf::Rsa2048(key) => Key::Rsa2048Public(key),
        }
    }

    /// Public key bytes as embedded in the image trailer.
    pub fn public_bytes(&self) -> Result<Vec<u8>> {
        match self.public_half() {
            PublicHalf::Ed25519(key) => Ok(key.to_bytes().to_vec()),
            PublicHalf::EcdsaP256(key) => Ok(key.to_encoded_point(false).as_bytes().to_vec()),
            PublicHalf::Rsa2048(key) => key
                .to_pkcs1_der()
                .map(|doc| doc.as_bytes().to_vec())
                .map_err(|e| Error::Key(format!("Failed to encode RSA public key: {}", e))),
        }
    }

    /// SubjectPublicKeyInfo PEM of the public half.
    pub fn public_pem(&self) -> Result<String> {
        let pem = match self.public_half() {
            PublicHalf::Ed25519(key) => key.to_public_key_pem(LineEnding::LF),
            PublicHalf::EcdsaP256(key) => key.to_public_key_pem(LineEnding::LF),
            PublicHalf::Rsa2048(key) => key.to_public_key_pem(LineEnding::LF),
        };
        pem.map_err(|e| Error::Key(format!("Failed to encode public key: {}", e)))
    }

    /// Write the public key to `path` as SubjectPublicKeyInfo PEM.
    pub fn export_public(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.public_pem()?)?;
        tracing::info!(path = %path.display(), algorithm = %self.algorithm(), "exported public key");
        Ok(())
    }

    /// Write the private key to `path` as PKCS#8 PEM.
    ///
    /// With a passphrase the key is written encrypted. Public-only keys
    /// fail with [`Error::Usage`].
    pub fn export_private(
        &self,
        path: impl AsRef<Path>,
        passphrase: Option<&SecretString>,
    ) -> Result<()> {
        let path = path.as_ref();
        let pem = match passphrase {
            Some(pass) => {
                let pass = pass.expose_secret().as_bytes();
                match self {
                    Key::Ed25519(key) => key.to_pkcs8_encrypted_pem(OsRng, pass, LineEnding::LF),
                    Key::EcdsaP256(key) => key.to_pkcs8_encrypted_pem(OsRng, pass, LineEnding::LF),
                    Key::Rsa2048(key) => key.to_pkcs8_encrypted_pem(OsRng, pass, LineEnding::LF),
                    _ => return Err(self.unsupported("export_private")),
                }
            }
            None => match self {
                Key::Ed25519(key) => key.to_pkcs8_pem(LineEnding::LF),
                Key::EcdsaP256(key) => key.to_pkcs8_pem(LineEnding::LF),
                Key::Rsa2048(key) => key.to_pkcs8_pem(LineEnding::LF),
                _ => return Err(self.unsupported("export_private")),
            },
        }
        .map_err(|e| Error::Key(format!("Failed to encode private key: {}", e)))?;

        fs::write(path, pem.as_bytes())?;
        tracing::info!(
            path = %path.display(),
            algorithm = %self.algorithm(),
            encrypted = passphrase.is_some(),
            "exported private key"
        );
        Ok(())
    }

    /// Sign content or a digest, as this key's [`SigningMode`] requires.
    ///
    /// # Errors
    ///
    /// - [`Error::Usage`] for public-only keys
    /// - [`Error::Config`] if `input` does not match the signing mode
    /// - [`Error::Signing`] if the primitive fails
    pub fn sign(&self, input: SignInput<'_>) -> Result<Vec<u8>> {
        if !self.can_export_private() {
            return Err(self.unsupported("sign"));
        }
        self.check_mode(&input)?;
        let data = input.bytes();

        match self {
            Key::Ed25519(key) => Ok(key.sign(data).to_bytes().to_vec()),
            Key::EcdsaP256(key) => {
                let signature: p256::ecdsa::Signature = key
                    .sign_prehash(data)
                    .map_err(|e| Error::Signing(format!("ECDSA signing failed: {}", e)))?;
                Ok(signature.to_bytes().to_vec())
            }
            Key::Rsa2048(key) => {
                let signer = rsa::pss::BlindedSigningKey::<Sha256>::new_with_salt_len(
                    key.clone(),
                    RSA_PSS_SALT_LEN,
                );
                let signature = signer
                    .try_sign_with_rng(&mut OsRng, data)
                    .map_err(|e| Error::Signing(format!("RSA-PSS signing failed: {}", e)))?;
                Ok(signature.to_vec())
            }
            Key::Ed25519Public(_) | Key::EcdsaP256Public(_) | Key::Rsa2048Public(_) => {
                Err(self.unsupported("sign"))
            }
        }
    }

    /// Check `signature` over content or a digest with the public half.
    ///
    /// Returns [`Error::InvalidSignature`] when the signature does not verify.
    pub fn verify(&self, signature: &[u8], input: SignInput<'_>) -> Result<()> {
        self.check_mode(&input)?;
        let data = input.bytes();
        let invalid = |e: String| Error::InvalidSignature(format!("{}: {}", self.algorithm(), e));

        match self.public_half() {
            PublicHalf::Ed25519(key) => {
                let signature = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|e| invalid(e.to_string()))?;
                key.verify(data, &signature).map_err(|e| invalid(e.to_string()))
            }
            PublicHalf::EcdsaP256(key) => {
                let signature = p256::ecdsa::Signature::from_slice(signature)
                    .map_err(|e| invalid(e.to_string()))?;
                key.verify_prehash(data, &signature)
                    .map_err(|e| invalid(e.to_string()))
            }
            PublicHalf::Rsa2048(key) => {
                let signature = rsa::pss::Signature::try_from(signature)
                    .map_err(|e| invalid(e.to_string()))?;
                rsa::pss::VerifyingKey::<Sha256>::new_with_salt_len(key, RSA_PSS_SALT_LEN)
                    .verify(data, &signature)
                    .map_err(|e| invalid(e.to_string()))
            }
        }
    }

    fn check_mode(&self, input: &SignInput<'_>) -> Result<()> {
        let expected = self.signing_mode();
        if input.mode() != expected {
            return Err(Error::Config(format!(
                "{} keys expect {:?} input, got {:?}",
                self.algorithm(),
                expected,
                input.mode()
            )));
        }
        Ok(())
    }

    fn unsupported(&self, operation: &str) -> Error {
        Error::Usage(format!(
            "Operation {} requires a private {} key",
            operation,
            self.algorithm()
        ))
    }
}

/// Public half of any key variant.
enum PublicHalf {
    Ed25519(ed25519_dalek::VerifyingKey),
    EcdsaP256(p256::ecdsa::VerifyingKey),
    Rsa2048(RsaPublicKey),
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("algorithm", &self.algorithm())
            .field("private", &self.can_export_private())
            .finish()
    }
}

fn check_rsa_size(modulus_bytes: usize) -> Result<()> {
    if modulus_bytes * 8 != RSA_KEY_BITS {
        return Err(Error::Key(format!(
            "Unsupported RSA key size {} bits, expected {}",
            modulus_bytes * 8,
            RSA_KEY_BITS
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::digest::compute_digest;
    use crate::format::HashAlgorithm;

    fn secret(s: &str) -> SecretString {
        SecretString::new(s.to_string())
    }

    fn sign_and_verify(key: &Key, message: &[u8]) -> Vec<u8> {
        let digest = compute_digest(HashAlgorithm::Sha256, message);
        let input = match key.signing_mode() {
            SigningMode::FullContent => SignInput::Content(message),
            SigningMode::Digest => SignInput::Digest(&digest),
        };
        let signature = key.sign(input).unwrap();
        key.verify(&signature, input).unwrap();
        signature
    }

    #[test]
    fn test_signature_lengths_are_fixed() {
        for alg in [KeyAlgorithm::Ed25519, KeyAlgorithm::EcdsaP256] {
            let key = Key::generate(alg).unwrap();
            let sig = sign_and_verify(&key, b"This is the message");
            assert_eq!(sig.len(), key.signature_len());
        }
    }

    #[test]
    fn test_rsa_pss_sign_and_tamper() {
        let key = Key::generate(KeyAlgorithm::Rsa2048).unwrap();
        let sig = sign_and_verify(&key, b"This is the message");
        assert_eq!(sig.len(), 256);

        let public = key.to_public();
        let result = public.verify(&sig, SignInput::Content(b"This is thE message"));
        assert!(matches!(result, Err(Error::InvalidSignature(_))));
    }

    #[test]
    fn test_public_bytes_formats() {
        let ed = Key::generate(KeyAlgorithm::Ed25519).unwrap();
        assert_eq!(ed.public_bytes().unwrap().len(), 32);

        let ec = Key::generate(KeyAlgorithm::EcdsaP256).unwrap();
        let point = ec.public_bytes().unwrap();
        assert_eq!(point.len(), 65);
        assert_eq!(point[0], 0x04);
    }

    #[test]
    fn test_public_only_key_cannot_sign_or_export_private() {
        let key = Key::generate(KeyAlgorithm::Ed25519).unwrap().to_public();
        assert!(!key.can_export_private());

        let result = key.sign(SignInput::Digest(&[0u8; 32]));
        assert!(matches!(result, Err(Error::Usage(_))));

        let dir = tempfile::tempdir().unwrap();
        let result = key.export_private(dir.path().join("priv.pem"), None);
        assert!(matches!(result, Err(Error::Usage(_))));
    }

    #[test]
    fn test_wrong_input_mode_is_rejected() {
        let key = Key::generate(KeyAlgorithm::EcdsaP256).unwrap();
        let result = key.sign(SignInput::Content(b"payload"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_keygen_export_load_with_passphrase() {
        let dir = tempfile::tempdir().unwrap();
        let priv_path = dir.path().join("keygen.pem");
        let pub_path = dir.path().join("keygen-pub.pem");

        let key = Key::generate(KeyAlgorithm::EcdsaP256).unwrap();
        key.export_private(&priv_path, Some(&secret("secret"))).unwrap();

        // Encrypted keys need the passphrase
        let result = Key::load(&priv_path, None);
        assert!(matches!(result, Err(Error::Key(_))));

        let loaded = Key::load(&priv_path, Some(&secret("secret"))).unwrap();
        assert!(loaded.can_export_private());
        assert_eq!(loaded.public_bytes().unwrap(), key.public_bytes().unwrap());

        loaded.export_public(&pub_path).unwrap();
        let public = Key::load(&pub_path, None).unwrap();
        assert_eq!(public.algorithm(), KeyAlgorithm::EcdsaP256);
        assert!(!public.can_export_private());
        public.export_public(dir.path().join("keygen-pub2.pem")).unwrap();
    }

    #[test]
    fn test_wrong_passphrase() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.pem");
        Key::generate(KeyAlgorithm::Ed25519)
            .unwrap()
            .export_private(&path, Some(&secret("right")))
            .unwrap();

        let result = Key::load(&path, Some(&secret("wrong")));
        assert!(matches!(result, Err(Error::Key(_))));
    }

    #[test]
    fn test_plain_pem_round_trip_each_algorithm() {
        let dir = tempfile::tempdir().unwrap();
        for alg in KeyAlgorithm::ALL {
            let path = dir.path().join(format!("{alg}.pem"));
            let key = Key::generate(alg).unwrap();
            key.export_private(&path, None).unwrap();

            let loaded = Key::load(&path, None).unwrap();
            assert_eq!(loaded.algorithm(), alg);
            assert_eq!(loaded.public_bytes().unwrap(), key.public_bytes().unwrap());
        }
    }

    #[test]
    fn test_garbage_is_key_error() {
        let result = Key::from_encoded(b"not a key", None);
        assert!(matches!(result, Err(Error::Key(_))));
    }

    #[test]
    fn test_debug_hides_material() {
        let key = Key::generate(KeyAlgorithm::Ed25519).unwrap();
        let debug = format!("{:?}", key);
        assert!(debug.contains("Ed25519"));
        assert!(debug.contains("private: true"));
    }

    #[test]
    fn test_header_algorithm_mapping() {
        assert_eq!(
            KeyAlgorithm::Ed25519.header_algorithm(),
            Some(SignatureAlgorithm::Ed25519)
        );
        assert_eq!(KeyAlgorithm::Rsa2048.header_algorithm(), None);
        assert_eq!(KeyAlgorithm::Rsa2048.signing_mode(), SigningMode::FullContent);
    }
}
