use crate::*;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Record store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("urna store: voter {0} not found")]
    VoterNotFound(Uuid),

    #[error("urna store: identifier already registered")]
    DuplicateIdentifier,

    #[error("urna store: a ballot already exists for voter {0}")]
    DuplicateBallot(Uuid),
}

impl From<StoreError> for VoteError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VoterNotFound(id) => VoteError::VoterNotFound(id),
            StoreError::DuplicateIdentifier => VoteError::DuplicateIdentifier,
            StoreError::DuplicateBallot(_) => VoteError::AlreadyVoted,
        }
    }
}

/// A voter and ballot record store.
///
/// `commit_ballot` is the store's transaction boundary: the ballot insert
/// and the voter's `has_voted` flip happen together or not at all, and the
/// one-ballot-per-voter constraint is enforced here, not just by callers.
pub trait Store {
    fn get_voter(&self, id: Uuid) -> Option<Voter>;

    fn find_voter(&self, identifier: &str) -> Option<Voter>;

    /// Insert a newly registered voter. Identifiers are unique.
    fn insert_voter(&mut self, voter: Voter) -> Result<(), StoreError>;

    /// Overwrite the stored public key for a voter.
    fn set_public_key(&mut self, voter_id: Uuid, public_key_pem: &str) -> Result<(), StoreError>;

    fn get_ballot(&self, voter_id: Uuid) -> Option<Ballot>;

    fn ballots(&self) -> Vec<Ballot>;

    /// Persist a ballot and mark its voter as having voted, atomically.
    fn commit_ballot(&mut self, ballot: Ballot) -> Result<(), StoreError>;
}

/// A simple store that uses in-memory BTreeMaps
#[derive(Default, Clone)]
pub struct MemStore {
    voters: BTreeMap<Uuid, Voter>,
    by_identifier: BTreeMap<String, Uuid>,

    // Keyed by voter id: the uniqueness constraint is the map key itself
    ballots: BTreeMap<Uuid, Ballot>,
}

impl Store for MemStore {
    fn get_voter(&self, id: Uuid) -> Option<Voter> {
        self.voters.get(&id).cloned()
    }

    fn find_voter(&self, identifier: &str) -> Option<Voter> {
        let id = self.by_identifier.get(identifier)?;
        self.voters.get(id).cloned()
    }

    fn insert_voter(&mut self, voter: Voter) -> Result<(), StoreError> {
        if self.by_identifier.contains_key(&voter.identifier) {
            return Err(StoreError::DuplicateIdentifier);
        }
        self.by_identifier.insert(voter.identifier.clone(), voter.id);
        self.voters.insert(voter.id, voter);
        Ok(())
    }

    fn set_public_key(&mut self, voter_id: Uuid, public_key_pem: &str) -> Result<(), StoreError> {
        let voter = self
            .voters
            .get_mut(&voter_id)
            .ok_or(StoreError::VoterNotFound(voter_id))?;
        voter.public_key_pem = Some(public_key_pem.to_owned());
        Ok(())
    }

    fn get_ballot(&self, voter_id: Uuid) -> Option<Ballot> {
        self.ballots.get(&voter_id).cloned()
    }

    fn ballots(&self) -> Vec<Ballot> {
        self.ballots.values().cloned().collect()
    }

    fn commit_ballot(&mut self, ballot: Ballot) -> Result<(), StoreError> {
        let voter_id = ballot.voter_id;
        let voter = self
            .voters
            .get_mut(&voter_id)
            .ok_or(StoreError::VoterNotFound(voter_id))?;

        if voter.has_voted || self.ballots.contains_key(&voter_id) {
            return Err(StoreError::DuplicateBallot(voter_id));
        }

        // All checks passed: now mutate, both records at once
        voter.has_voted = true;
        self.ballots.insert(voter_id, ballot);
        Ok(())
    }
}
