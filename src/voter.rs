use uuid::Uuid;

/// Per-voter key/vote lifecycle state.
///
/// `Voted` is terminal: once reached it never reverts, and the public key
/// that signed the cast ballot can no longer be replaced.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VoterState {
    NoKey,
    Keyed,
    Voted,
}

/// A registered voter.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Voter {
    pub id: Uuid,

    /// Unique, email-equivalent identifier supplied at registration.
    pub identifier: String,

    /// PEM public key, set by key generation. None until the first key is
    /// generated; overwritten on regeneration, frozen once a ballot is cast.
    pub public_key_pem: Option<String>,

    pub has_voted: bool,
}

impl Voter {
    pub fn new(identifier: &str) -> Self {
        Voter {
            id: Uuid::new_v4(),
            identifier: identifier.to_owned(),
            public_key_pem: None,
            has_voted: false,
        }
    }

    pub fn state(&self) -> VoterState {
        match (&self.public_key_pem, self.has_voted) {
            (_, true) => VoterState::Voted,
            (Some(_), false) => VoterState::Keyed,
            (None, false) => VoterState::NoKey,
        }
    }
}
