//! Frame encryption for the IP control protocol.
//!
//! Every frame on the wire is `ECB(iv) || CBC(iv, pkcs7(command + "\r"))`:
//! the random IV travels as a single AES block encrypted on its own, and
//! the command body is chained from the *unencrypted* IV. Replies use the
//! same framing.
//!
//! The AES-128 key is derived once from the pairing key shown on the TV,
//! using PBKDF2-HMAC-SHA256 with a salt fixed by the protocol.

use crate::error::codec::CodecError;

use common::{ErrorLocation, RedactedKey};

use std::fmt;
use std::panic::Location;

use aes::Aes128;
use aes::cipher::block_padding::{NoPadding, Pkcs7};
use aes::cipher::{
    BlockDecrypt, BlockDecryptMut, BlockEncrypt, BlockEncryptMut, InnerIvInit, KeyInit,
};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use zeroize::Zeroize;

pub const BLOCK_SIZE: usize = 16;

/// Salt mandated by the protocol. Must match byte for byte.
pub const KEY_SALT: [u8; BLOCK_SIZE] = [
    0x63, 0x61, 0xb8, 0x0e, 0x9b, 0xdc, 0xa6, 0x63, 0x8d, 0x07, 0x20, 0xf2, 0xcc, 0x56, 0x8f, 0xb9,
];

pub const KEY_ITERATIONS: u32 = 16_384;

const COMMAND_TERMINATOR: u8 = b'\r';

type CbcEncryptor = cbc::Encryptor<Aes128>;
type CbcDecryptor = cbc::Decryptor<Aes128>;

/// Encrypts commands and decrypts replies for one pairing key.
#[derive(Clone)]
pub struct Codec {
    cipher: Aes128,
}

impl Codec {
    /// Derive the session key from a pairing key.
    #[track_caller]
    pub fn new(pairing_key: &RedactedKey) -> Result<Self, CodecError> {
        let mut derived = [0u8; BLOCK_SIZE];
        pbkdf2::pbkdf2_hmac::<Sha256>(
            pairing_key.as_str().as_bytes(),
            &KEY_SALT,
            KEY_ITERATIONS,
            &mut derived,
        );

        let cipher = Aes128::new_from_slice(&derived).map_err(|e| CodecError::KeyDerivation {
            message: format!("derived key rejected by AES-128: {e}"),
            location: ErrorLocation::from(Location::caller()),
        });
        derived.zeroize();

        Ok(Self { cipher: cipher? })
    }

    /// Encrypt a command into a wire frame.
    ///
    /// Draws a fresh IV from the OS RNG for every frame, so encoding the same
    /// command twice yields different bytes.
    ///
    /// # Panics
    ///
    /// Panics if the operating system cannot provide randomness. Without
    /// entropy no valid frame can be produced at all.
    pub fn encode(&self, command: &[u8]) -> Vec<u8> {
        let mut iv = [0u8; BLOCK_SIZE];
        OsRng.fill_bytes(&mut iv);
        self.encode_with_iv(command, iv)
    }

    pub(crate) fn encode_with_iv(&self, command: &[u8], iv: [u8; BLOCK_SIZE]) -> Vec<u8> {
        let mut plaintext = Vec::with_capacity(command.len() + 1);
        plaintext.extend_from_slice(command);
        plaintext.push(COMMAND_TERMINATOR);

        let body = CbcEncryptor::inner_iv_init(self.cipher.clone(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(&plaintext);

        let mut hidden_iv = iv;
        self.cipher.encrypt_block((&mut hidden_iv).into());

        let mut frame = Vec::with_capacity(BLOCK_SIZE + body.len());
        frame.extend_from_slice(&hidden_iv);
        frame.extend_from_slice(&body);
        frame
    }

    /// Decrypt a wire frame into its plaintext.
    ///
    /// Padding is stripped leniently (see [`strip_padding`]); the returned
    /// bytes still carry the command terminator if the peer sent one.
    #[track_caller]
    pub fn decode(&self, frame: &[u8]) -> Result<Vec<u8>, CodecError> {
        if frame.len() < BLOCK_SIZE {
            return Err(CodecError::Frame {
                message: format!(
                    "frame of {} bytes is shorter than one {BLOCK_SIZE}-byte block",
                    frame.len()
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let (hidden_iv, body) = frame.split_at(BLOCK_SIZE);
        if body.len() % BLOCK_SIZE != 0 {
            return Err(CodecError::Frame {
                message: format!(
                    "frame body of {} bytes is not a multiple of {BLOCK_SIZE}",
                    body.len()
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut iv = [0u8; BLOCK_SIZE];
        iv.copy_from_slice(hidden_iv);
        self.cipher.decrypt_block((&mut iv).into());

        let mut plaintext = CbcDecryptor::inner_iv_init(self.cipher.clone(), &iv.into())
            .decrypt_padded_vec_mut::<NoPadding>(body)
            .map_err(|e| CodecError::Frame {
                message: format!("cannot decrypt frame body: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let kept = strip_padding(&plaintext).len();
        plaintext.truncate(kept);
        Ok(plaintext)
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec").finish_non_exhaustive()
    }
}

/// Remove PKCS#7-style padding by trusting the trailing byte.
///
/// When the claimed pad length is longer than the data the input is
/// returned unchanged.
pub fn strip_padding(data: &[u8]) -> &[u8] {
    let Some(&pad) = data.last() else {
        return data;
    };
    match data.len().checked_sub(pad as usize) {
        Some(kept) => &data[..kept],
        None => data,
    }
}
