use crate::*;
use std::env::var;

/// Process-wide configuration for the ballot pipeline.
pub struct Config {
    /// Symmetric secret for ballot at-rest encryption. Process-wide by
    /// design: it hides stored content, it is not per-voter key material.
    pub cipher_secret: Vec<u8>,
}

impl Config {
    pub fn from_env() -> Self {
        let cipher_secret = match var("URNA_CIPHER_SECRET") {
            Ok(val) => match hex::decode(val) {
                Ok(bytes) => bytes,
                Err(_e) => {
                    panic!("URNA_CIPHER_SECRET must be hex-encoded")
                }
            },
            Err(_e) => {
                panic!("URNA_CIPHER_SECRET environment variable must be set")
            }
        };

        Config { cipher_secret }
    }

    pub fn cipher(&self) -> BallotCipher {
        BallotCipher::new(&self.cipher_secret)
    }
}
