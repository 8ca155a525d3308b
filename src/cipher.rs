use crate::*;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::Aes256Gcm;
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

const AES_IV_LENGTH: usize = 12;

type AesKey = [u8; 32];

/// Symmetric at-rest cipher for ballot plaintexts.
///
/// Keyed by a single process-wide secret, not per voter: it hides stored
/// ballot content, not voter identity. The AES key is derived through
/// HKDF-SHA256 with a fixed info string, so it is independent of any
/// signature key material.
pub struct BallotCipher {
    key: AesKey,
}

impl BallotCipher {
    pub fn new(secret: &[u8]) -> Self {
        let h = Hkdf::<Sha256>::new(None, secret);
        let mut key = [0u8; 32];
        h.expand(b"urna_ballot_cipher_v1", &mut key)
            .expect("urna: hkdf expand failure");
        BallotCipher { key }
    }

    /// Encrypt a canonical ballot plaintext. Output layout is nonce || ciphertext.
    pub fn encrypt(&self, msg: &[u8]) -> Vec<u8> {
        let aead = Aes256Gcm::new(GenericArray::from_slice(&self.key));

        let mut nonce = [0u8; AES_IV_LENGTH];
        OsRng.fill_bytes(&mut nonce);
        let nonce = GenericArray::from_slice(&nonce);

        let ciphertext = aead
            .encrypt(nonce, msg)
            .expect("urna: ballot encryption failure");

        let mut output = Vec::with_capacity(AES_IV_LENGTH + ciphertext.len());
        output.extend(nonce);
        output.extend(ciphertext);

        output
    }

    /// Decrypt a stored payload.
    ///
    /// Truncation or any byte of corruption fails GCM authentication and
    /// returns `Error::Tampered` rather than garbage plaintext.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, Error> {
        if ciphertext.len() < AES_IV_LENGTH {
            return Err(Error::Tampered);
        }
        let aead = Aes256Gcm::new(GenericArray::from_slice(&self.key));

        let nonce = GenericArray::from_slice(&ciphertext[..AES_IV_LENGTH]);
        let encrypted = &ciphertext[AES_IV_LENGTH..];

        aead.decrypt(nonce, encrypted).map_err(|_| Error::Tampered)
    }
}
