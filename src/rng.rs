//! Seeded random streams for one game session.

use std::collections::HashMap;
use std::fmt;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Who draws from a stream. Dealing and every player get separate streams,
/// whatever the players are called.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StreamKey {
    Deal,
    Player(String),
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKey::Deal => write!(f, "deal"),
            StreamKey::Player(name) => write!(f, "player/{name}"),
        }
    }
}

/// Hands out one `ChaCha8Rng` per [`StreamKey`].
///
/// A stream is seeded from the master generator the first time its key is
/// requested, so the same seed and request order replay the same session.
pub struct RngManager {
    master: ChaCha8Rng,
    streams: HashMap<StreamKey, ChaCha8Rng>,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self {
            master: ChaCha8Rng::seed_from_u64(seed),
            streams: HashMap::new(),
        }
    }

    pub fn deal(&mut self) -> &mut ChaCha8Rng {
        self.stream(StreamKey::Deal)
    }

    pub fn player(&mut self, name: &str) -> &mut ChaCha8Rng {
        self.stream(StreamKey::Player(name.to_string()))
    }

    pub fn stream(&mut self, key: StreamKey) -> &mut ChaCha8Rng {
        let master = &mut self.master;
        self.streams
            .entry(key)
            .or_insert_with(|| ChaCha8Rng::seed_from_u64(master.next_u64()))
    }
}
