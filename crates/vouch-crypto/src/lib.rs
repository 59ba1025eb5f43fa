pub mod canonical;
pub mod error;
pub mod hashing;
pub mod keys;
pub mod selective_disclosure;
pub mod signing;

pub use canonical::{canonical_bytes, canonicalize};
pub use error::CryptoError;
pub use hashing::{
    b64url_decode, b64url_encode, digest_b64url, random_challenge, random_salt, sha256,
};
pub use keys::{KeyPair, PublicKey};
pub use selective_disclosure::{Disclosure, SelectiveDisclosure};
pub use signing::{sign, verify, Signature};
