/// Strikes-and-balls rules: the hidden number, how it is drawn and how guesses are scored
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::SessionError;

/// Number of digits in a secret and in a well-formed guess.
pub const SECRET_LEN: usize = 3;

/// A hidden number: three pairwise-distinct digits in 0..=9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Secret([u8; SECRET_LEN]);

impl Secret {
    /// Returns `None` unless every digit is below 10 and no digit repeats.
    pub fn new(digits: [u8; SECRET_LEN]) -> Option<Self> {
        let in_range = digits.iter().all(|d| *d < 10);
        let distinct = digits[0] != digits[1] && digits[0] != digits[2] && digits[1] != digits[2];
        (in_range && distinct).then_some(Self(digits))
    }

    pub fn digits(&self) -> [u8; SECRET_LEN] {
        self.0
    }

    fn chars(&self) -> [char; SECRET_LEN] {
        self.0.map(|d| char::from(b'0' + d))
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.chars() {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Source of secrets for new rooms
pub trait SecretGenerator: Send + 'static {
    fn generate(&mut self) -> Secret;
}

/// Draws three digits without replacement from a shrinking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSecret;

impl SecretGenerator for RandomSecret {
    fn generate(&mut self) -> Secret {
        let mut rng = rand::rng();
        let mut pool: Vec<u8> = (0..10).collect();
        let mut digits = [0u8; SECRET_LEN];
        for slot in digits.iter_mut() {
            let index = rng.random_range(0..pool.len());
            *slot = pool.remove(index);
        }
        Secret(digits)
    }
}

/// Always hands out the same secret. Useful for deterministic games.
#[derive(Debug, Clone, Copy)]
pub struct FixedSecret(pub Secret);

impl SecretGenerator for FixedSecret {
    fn generate(&mut self) -> Secret {
        self.0
    }
}

/// Outcome of one guess.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub strikes: u8,
    pub balls: u8,
}

impl Score {
    pub fn is_win(&self) -> bool {
        usize::from(self.strikes) == SECRET_LEN
    }
}

/// Scores `guess` against `secret` position by position.
///
/// A position is a strike when the digits match, otherwise a ball when the
/// guessed character appears anywhere in the secret. Membership is not
/// counted down, so a guess that repeats a digit can collect a ball for a
/// digit that already scored a strike elsewhere. Only the first three
/// characters are looked at; missing positions score nothing.
pub fn score(secret: &Secret, guess: &str) -> Score {
    let target = secret.chars();
    let mut result = Score::default();
    for (i, c) in guess.chars().take(SECRET_LEN).enumerate() {
        if target[i] == c {
            result.strikes += 1;
        } else if target.contains(&c) {
            result.balls += 1;
        }
    }
    result
}

/// A guess that passed shape validation: exactly three ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guess(String);

impl Guess {
    pub fn parse(input: &str) -> Result<Self, SessionError> {
        if input.len() == SECRET_LEN && input.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(input.to_string()))
        } else {
            Err(SessionError::InvalidGuess)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}
