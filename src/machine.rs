use crate::*;
use chrono::Utc;
use log::{info, warn};
use rsa::RsaPublicKey;
use std::sync::Mutex;
use uuid::Uuid;

/// The five possible outcomes of a key check.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeyStatus {
    /// The voter has no public key on record yet.
    NoKeyRegistered,
    /// The uploaded file is not a parseable private key.
    InvalidFormat,
    /// A valid key, but it belongs to a different key pair than the one on record.
    Mismatch,
    /// The registered key, not yet used to cast a ballot.
    ValidUnused,
    /// The registered key, already used to cast a ballot.
    ValidAlreadyUsed,
}

/// Orchestrates key generation and vote casting over a record store.
///
/// The store sits behind a single lock, and every state transition for a
/// voter runs its whole read-modify-write under it: two concurrent cast
/// attempts for the same voter cannot both pass the eligibility check.
/// All cryptographic calls are pure, so readers never contend on anything
/// but the store itself.
pub struct VotingStateMachine<S: Store> {
    store: Mutex<S>,
    cipher: BallotCipher,
}

impl<S: Store> VotingStateMachine<S> {
    pub fn new(store: S, cipher: BallotCipher) -> Self {
        VotingStateMachine {
            store: Mutex::new(store),
            cipher,
        }
    }

    /// Register a voter under a unique identifier. No key material yet.
    pub fn register_voter(&self, identifier: &str) -> Result<Voter, VoteError> {
        let voter = Voter::new(identifier);
        let mut store = self.store.lock().unwrap();
        store.insert_voter(voter.clone())?;

        info!("voter {} registered", voter.id);
        Ok(voter)
    }

    /// Generate a key pair for a voter and store the public half.
    ///
    /// Allowed from `NoKey` and `Keyed` (regeneration replaces the stored
    /// public key), refused once a ballot has been cast. The private half
    /// is returned to the caller for one-time delivery and is never
    /// persisted or logged.
    pub fn generate_key(&self, voter_id: Uuid) -> Result<KeyPair, VoteError> {
        let mut store = self.store.lock().unwrap();
        let voter = store
            .get_voter(voter_id)
            .ok_or(VoteError::VoterNotFound(voter_id))?;

        if voter.state() == VoterState::Voted {
            warn!("refused key generation for voter {}: ballot already cast", voter_id);
            return Err(VoteError::AlreadyVoted);
        }

        let keypair = generate_keypair().map_err(VoteError::Crypto)?;
        store.set_public_key(voter_id, &keypair.public_pem)?;

        info!("public key registered for voter {}", voter_id);
        Ok(keypair)
    }

    /// Cast a ballot: canonicalize, sign, verify, encrypt, persist, all as
    /// one atomic unit. Any failing step leaves no ballot row and no state
    /// flip.
    pub fn cast_vote(
        &self,
        voter_id: Uuid,
        answers: &BallotAnswers,
        supplied_private_key_pem: &str,
    ) -> Result<Ballot, VoteError> {
        let mut store = self.store.lock().unwrap();
        let voter = store
            .get_voter(voter_id)
            .ok_or(VoteError::VoterNotFound(voter_id))?;

        if voter.state() == VoterState::Voted {
            warn!("refused cast for voter {}: ballot already cast", voter_id);
            return Err(VoteError::AlreadyVoted);
        }
        let public_key_pem = match voter.public_key_pem.as_deref() {
            Some(pem) => pem,
            None => return Err(VoteError::NoKeyRegistered),
        };

        let plaintext =
            canonical_plaintext(&voter.identifier, answers).map_err(|_| VoteError::Encoding)?;

        let signature = sign(&plaintext, supplied_private_key_pem)
            .map_err(|_| VoteError::KeyFormat)?;

        // A stored public key that no longer parses is a server-side fault,
        // not the voter's; it surfaces as Crypto, not KeyFormat.
        let verified = verify(&plaintext, &signature, public_key_pem)
            .map_err(VoteError::Crypto)?;
        if !verified {
            warn!("refused cast for voter {}: private key does not match registered public key", voter_id);
            return Err(VoteError::KeyMismatch);
        }

        let encrypted = self.cipher.encrypt(plaintext.as_bytes());

        let ballot = Ballot {
            id: Uuid::new_v4(),
            voter_id,
            plaintext,
            signature,
            encrypted,
            cast_at: Utc::now(),
        };
        store.commit_ballot(ballot.clone())?;

        info!("ballot {} committed for voter {}", ballot.id, voter_id);
        Ok(ballot)
    }

    /// Classify an uploaded private key against the voter's record.
    /// Read-only diagnostic; mutates nothing.
    pub fn check_key_status(
        &self,
        voter_id: Uuid,
        supplied_private_key_pem: &str,
    ) -> Result<KeyStatus, VoteError> {
        let store = self.store.lock().unwrap();
        let voter = store
            .get_voter(voter_id)
            .ok_or(VoteError::VoterNotFound(voter_id))?;

        let private = match parse_private_key(supplied_private_key_pem) {
            Ok(key) => key,
            Err(_) => return Ok(KeyStatus::InvalidFormat),
        };

        let stored_pem = match &voter.public_key_pem {
            Some(pem) => pem,
            None => return Ok(KeyStatus::NoKeyRegistered),
        };
        let stored = parse_public_key(stored_pem).map_err(VoteError::Crypto)?;

        if RsaPublicKey::from(&private) != stored {
            return Ok(KeyStatus::Mismatch);
        }

        if voter.has_voted {
            Ok(KeyStatus::ValidAlreadyUsed)
        } else {
            Ok(KeyStatus::ValidUnused)
        }
    }

    pub fn voter(&self, voter_id: Uuid) -> Option<Voter> {
        self.store.lock().unwrap().get_voter(voter_id)
    }

    pub fn find_voter(&self, identifier: &str) -> Option<Voter> {
        self.store.lock().unwrap().find_voter(identifier)
    }

    pub fn ballot_for(&self, voter_id: Uuid) -> Option<Ballot> {
        self.store.lock().unwrap().get_ballot(voter_id)
    }

    /// All committed ballots, for results and audit surfaces. Read-only.
    pub fn ballots(&self) -> Vec<Ballot> {
        self.store.lock().unwrap().ballots()
    }

    /// Decrypt a stored ballot payload (audit side).
    pub fn open_ballot(&self, ballot: &Ballot) -> Result<String, Error> {
        let decrypted = self.cipher.decrypt(&ballot.encrypted)?;
        String::from_utf8(decrypted)
            .map_err(|_| Error::Encoding("decrypted payload is not UTF-8".to_owned()))
    }
}
