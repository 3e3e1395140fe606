#![warn(clippy::all, clippy::pedantic)]

//! Decryption engines for encrypted asset containers.
//!
//! Two container revisions carry an encrypted body. Which engine applies is a
//! pure function of the container's version byte:
//!
//! - [`SIMPLE_VERSION`] uses the running-key XOR map-file cipher ([`Engine::Simple`]).
//! - [`BLOCK_VERSION`] uses LEA-256 in ECB mode ([`Engine::Block`]).
//!
//! Every other version is plaintext. Engines never fail and always return a
//! buffer of the same length as their input.

mod block;
mod simple;

use std::borrow::Cow;

use mu_binary::{Reader, Result};
use tracing::debug;

pub const SIMPLE_VERSION: u8 = 0x0C;
pub const BLOCK_VERSION: u8 = 0x0F;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    Simple,
    Block,
}

impl Engine {
    /// Returns the engine a container `version` is encrypted with, if any.
    #[must_use]
    pub fn for_version(version: u8) -> Option<Self> {
        match version {
            SIMPLE_VERSION => Some(Self::Simple),
            BLOCK_VERSION => Some(Self::Block),
            _ => None,
        }
    }

    #[must_use]
    pub fn version(self) -> u8 {
        match self {
            Self::Simple => SIMPLE_VERSION,
            Self::Block => BLOCK_VERSION,
        }
    }

    #[must_use]
    pub fn decrypt(self, bytes: &[u8]) -> Vec<u8> {
        match self {
            Self::Simple => simple::decrypt(bytes),
            Self::Block => block::decrypt(bytes),
        }
    }

    #[must_use]
    pub fn encrypt(self, bytes: &[u8]) -> Vec<u8> {
        match self {
            Self::Simple => simple::encrypt(bytes),
            Self::Block => block::encrypt(bytes),
        }
    }
}

/// Returns the plaintext body of a container that starts at `offset`.
///
/// For an encrypted `version` the body is a u32 payload length followed by that
/// many bytes of ciphertext, which are decrypted into a fresh buffer.
/// Otherwise the body is everything from `offset` on and is borrowed as is.
/// `bytes` itself is never modified.
///
/// # Errors
///
/// Returns `Err` if the declared payload runs past the end of `bytes`.
pub fn open_body(bytes: &[u8], version: u8, offset: usize) -> Result<Cow<'_, [u8]>> {
    let mut reader = Reader::new(bytes);
    reader.skip(offset)?;

    let Some(engine) = Engine::for_version(version) else {
        return Ok(Cow::Borrowed(reader.remaining_bytes()));
    };

    let length = reader.read_u32()? as usize;
    let ciphertext = reader.read_bytes(length)?;

    debug!(?engine, length, "decrypting container body");

    Ok(Cow::Owned(engine.decrypt(ciphertext)))
}

/// Builds a container from `header` and a plaintext `body`, the inverse of [`open_body`].
///
/// `header` must end with the version byte's position already filled in; the
/// body is encrypted when `version` selects an engine.
///
/// # Panics
///
/// Panics if `body` is longer than `u32::MAX` bytes.
#[must_use]
pub fn seal_body(header: &[u8], version: u8, body: &[u8]) -> Vec<u8> {
    let mut out = header.to_vec();

    match Engine::for_version(version) {
        Some(engine) => {
            let length = u32::try_from(body.len()).expect("container body exceeds u32 range");
            out.extend_from_slice(&length.to_le_bytes());
            out.extend_from_slice(&engine.encrypt(body));
        }
        None => out.extend_from_slice(body),
    }

    out
}

#[cfg(test)]
mod tests {
    use mu_binary::Error;

    use super::*;

    #[test]
    fn version_selects_engine() {
        assert_eq!(Engine::for_version(0x0C), Some(Engine::Simple));
        assert_eq!(Engine::for_version(0x0F), Some(Engine::Block));
        assert_eq!(Engine::for_version(0x0A), None);
        assert_eq!(Engine::for_version(0), None);
    }

    #[test]
    fn decrypt_preserves_length() {
        for engine in [Engine::Simple, Engine::Block] {
            for len in [0, 1, 15, 16, 17, 31, 32, 100, 4096] {
                let bytes: Vec<u8> = (0..len).map(|i| (i * 7 + 3) as u8).collect();
                assert_eq!(engine.decrypt(&bytes).len(), len, "{engine:?} len {len}");
            }
        }
    }

    #[test]
    fn plaintext_body_is_borrowed() {
        let bytes = b"BMD\x0aplain body";
        let body = open_body(bytes, 0x0a, 4).unwrap();
        assert!(matches!(body, Cow::Borrowed(_)));
        assert_eq!(&*body, b"plain body");
    }

    #[test]
    fn sealed_body_opens() {
        let body: Vec<u8> = (0..=255).collect();
        for engine in [Engine::Simple, Engine::Block] {
            let version = engine.version();
            let sealed = seal_body(&[b'B', b'M', b'D', version], version, &body);
            assert_ne!(&sealed[8..], body.as_slice());

            let opened = open_body(&sealed, version, 4).unwrap();
            assert_eq!(&*opened, body.as_slice());
        }
    }

    #[test]
    fn declared_length_past_end_is_truncated() {
        let mut bytes = vec![b'B', b'M', b'D', SIMPLE_VERSION];
        bytes.extend_from_slice(&100_u32.to_le_bytes());
        bytes.extend_from_slice(&[0; 10]);

        assert!(matches!(
            open_body(&bytes, SIMPLE_VERSION, 4),
            Err(Error::TruncatedInput { needed: 100, .. })
        ));
    }
}
