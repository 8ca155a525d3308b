use crate::*;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use uuid::Uuid;

/// Structured answers for the fixed question set, kept in ballot order.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BallotAnswers(IndexMap<String, String>);

impl BallotAnswers {
    pub fn new() -> Self {
        BallotAnswers(IndexMap::new())
    }

    /// Record the chosen option for a question. Answering the same question
    /// twice keeps the last choice.
    pub fn answer(&mut self, question: &str, option: &str) {
        self.0.insert(question.to_owned(), option.to_owned());
    }

    pub fn get(&self, question: &str) -> Option<&str> {
        self.0.get(question).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(q, a)| (q.as_str(), a.as_str()))
    }
}

// Question ids and option codes are uppercase alphanumeric codes with
// hyphens (e.g. "P1", "TAL-VEZ"); anything else cannot round-trip through
// the canonical wire format.
fn valid_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
}

/// Build the canonical plaintext for a ballot:
/// `USUARIO:<identifier>|Q1:A1|Q2:A2|...`
///
/// This exact string is the input to both signing and encryption, so the
/// encoding must be deterministic and unambiguous. Malformed content is an
/// `Encoding` error; with well-formed collaborator input it never occurs.
pub fn canonical_plaintext(identifier: &str, answers: &BallotAnswers) -> Result<String, Error> {
    if identifier.is_empty() || identifier.contains('|') || identifier.chars().any(char::is_control)
    {
        return Err(Error::Encoding(format!(
            "invalid voter identifier {:?}",
            identifier
        )));
    }
    if answers.is_empty() {
        return Err(Error::Encoding("ballot has no answers".to_owned()));
    }

    let mut plaintext = format!("USUARIO:{}", identifier);
    for (question, option) in answers.iter() {
        if !valid_token(question) || !valid_token(option) {
            return Err(Error::Encoding(format!(
                "invalid answer pair {:?}:{:?}",
                question, option
            )));
        }
        plaintext.push('|');
        plaintext.push_str(question);
        plaintext.push(':');
        plaintext.push_str(option);
    }

    Ok(plaintext)
}

/// One voter's signed, encrypted ballot.
///
/// Created exclusively by the voting state machine and immutable once
/// committed: no updates, no deletes.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Ballot {
    pub id: Uuid,
    pub voter_id: Uuid,

    /// Canonical plaintext the signature was computed over.
    pub plaintext: String,

    #[serde(with = "hex_serde")]
    pub signature: Vec<u8>,

    /// At-rest encrypted copy of the plaintext (nonce || AES-GCM ciphertext).
    #[serde(with = "hex_serde")]
    pub encrypted: Vec<u8>,

    pub cast_at: DateTime<Utc>,
}

impl Ballot {
    /// Pack into bytes
    pub fn as_bytes(&self) -> Vec<u8> {
        serde_cbor::to_vec(self).expect("urna: unexpected error packing ballot")
    }

    /// Unpack from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        // If it starts with `{` then it's JSON
        if bytes.first() == Some(&b'{') {
            Ok(serde_json::from_slice(bytes)?)
        } else {
            Ok(serde_cbor::from_slice(bytes)?)
        }
    }

    /// The voter identifier embedded in the canonical plaintext.
    pub fn voter_identifier(&self) -> Option<&str> {
        self.plaintext.split('|').next()?.strip_prefix("USUARIO:")
    }

    /// Parse the question/option pairs back out of the canonical plaintext.
    pub fn answers(&self) -> BallotAnswers {
        let mut answers = BallotAnswers::new();
        for segment in self.plaintext.split('|').skip(1) {
            if let Some((question, option)) = segment.split_once(':') {
                answers.answer(question, option);
            }
        }
        answers
    }
}

/// Count how often each option was chosen for one question, in first-seen
/// order. Ballots that skipped the question are not counted.
pub fn tally_question<'a, I>(ballots: I, question: &str) -> IndexMap<String, usize>
where
    I: IntoIterator<Item = &'a Ballot>,
{
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for ballot in ballots {
        if let Some(option) = ballot.answers().get(question) {
            *counts.entry(option.to_owned()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers() -> BallotAnswers {
        let mut answers = BallotAnswers::new();
        answers.answer("P1", "ALTO");
        answers.answer("P2", "FACIL");
        answers.answer("P3", "MUCHO");
        answers.answer("P4", "RAPIDO");
        answers
    }

    #[test]
    fn canonical_format() {
        let plaintext = canonical_plaintext("ivan@example.com", &answers()).unwrap();
        assert_eq!(
            plaintext,
            "USUARIO:ivan@example.com|P1:ALTO|P2:FACIL|P3:MUCHO|P4:RAPIDO"
        );
    }

    #[test]
    fn encoding_rejects_malformed_content() {
        assert!(matches!(
            canonical_plaintext("", &answers()),
            Err(Error::Encoding(_))
        ));
        assert!(matches!(
            canonical_plaintext("a|b", &answers()),
            Err(Error::Encoding(_))
        ));
        assert!(matches!(
            canonical_plaintext("ivan@example.com", &BallotAnswers::new()),
            Err(Error::Encoding(_))
        ));

        let mut bad = answers();
        bad.answer("P5", "lower case");
        assert!(matches!(
            canonical_plaintext("ivan@example.com", &bad),
            Err(Error::Encoding(_))
        ));

        let mut separator = BallotAnswers::new();
        separator.answer("P1:X", "ALTO");
        assert!(matches!(
            canonical_plaintext("ivan@example.com", &separator),
            Err(Error::Encoding(_))
        ));
    }

    fn test_ballot(plaintext: &str) -> Ballot {
        Ballot {
            id: Uuid::new_v4(),
            voter_id: Uuid::new_v4(),
            plaintext: plaintext.to_owned(),
            signature: vec![1, 2, 3],
            encrypted: vec![4, 5, 6],
            cast_at: Utc::now(),
        }
    }

    #[test]
    fn answers_roundtrip_through_plaintext() {
        let plaintext = canonical_plaintext("ivan@example.com", &answers()).unwrap();
        let ballot = test_ballot(&plaintext);

        assert_eq!(ballot.voter_identifier(), Some("ivan@example.com"));
        assert_eq!(ballot.answers(), answers());
    }

    #[test]
    fn byte_roundtrip_json_and_cbor() {
        let plaintext = canonical_plaintext("ivan@example.com", &answers()).unwrap();
        let ballot = test_ballot(&plaintext);

        let unpacked = Ballot::from_bytes(&ballot.as_bytes()).unwrap();
        assert_eq!(unpacked.id, ballot.id);
        assert_eq!(unpacked.signature, ballot.signature);

        let json = serde_json::to_vec(&ballot).unwrap();
        let unpacked = Ballot::from_bytes(&json).unwrap();
        assert_eq!(unpacked.id, ballot.id);
        assert_eq!(unpacked.encrypted, ballot.encrypted);
    }

    #[test]
    fn tally_counts_per_question() {
        let b1 = test_ballot("USUARIO:a@x.com|P1:ALTO|P2:FACIL");
        let b2 = test_ballot("USUARIO:b@x.com|P1:ALTO|P2:DIFICIL");
        let b3 = test_ballot("USUARIO:c@x.com|P1:BAJO");

        let counts = tally_question([&b1, &b2, &b3], "P1");
        assert_eq!(counts.get("ALTO"), Some(&2));
        assert_eq!(counts.get("BAJO"), Some(&1));

        let counts = tally_question([&b1, &b2, &b3], "P2");
        assert_eq!(counts.len(), 2);

        assert!(tally_question([&b1, &b2, &b3], "P9").is_empty());
    }
}
