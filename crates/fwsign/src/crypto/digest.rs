//! Digest computation dispatched on [`HashAlgorithm`].

use crate::format::HashAlgorithm;
use sha2::{Digest, Sha256, Sha512};

/// Hash `data` with the given algorithm.
///
/// The returned vector is always [`HashAlgorithm::digest_len`] bytes long.
pub fn compute_digest(algorithm: HashAlgorithm, data: &[u8]) -> Vec<u8> {
    match algorithm {
        HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_answer() {
        let digest = compute_digest(HashAlgorithm::Sha256, b"abc");
        assert_eq!(
            hex::encode(digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_lengths_follow_algorithm() {
        for alg in HashAlgorithm::ALL {
            assert_eq!(compute_digest(alg, &[0u8; 100]).len(), alg.digest_len());
        }
    }
}
