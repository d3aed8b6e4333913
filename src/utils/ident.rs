use rand::Rng;
use rand::rngs::OsRng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of the public identifiers handed out for stored files.
pub const ID_LENGTH: usize = 5;

/// Source of candidate identifiers for stored files.
///
/// Kept behind a trait so tests can inject a deterministic sequence and
/// exercise the collision-retry path.
pub trait IdGenerator: Send + Sync {
    fn generate(&self, length: usize) -> String;
}

/// Default generator backed by the operating system CSPRNG.
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn generate(&self, length: usize) -> String {
        let mut rng = OsRng;
        (0..length)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }
}
