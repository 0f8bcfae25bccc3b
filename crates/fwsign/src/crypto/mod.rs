pub mod cert;
pub mod csr;
pub mod digest;
pub mod key;

pub use cert::Certificate;
pub use digest::compute_digest;
pub use key::{Key, KeyAlgorithm, SignInput, SigningMode};
