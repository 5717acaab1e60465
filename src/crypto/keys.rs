use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

pub const KEY_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 32;

/// Stored password verifier: PBKDF2-SHA256 output plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    pub hash: [u8; KEY_LENGTH],
    pub salt: [u8; SALT_LENGTH],
    pub iterations: u32,
}

impl PasswordHash {
    /// Hash a new password with a fresh random salt.
    pub fn new(password: &str, iterations: u32) -> Self {
        let salt = generate_salt();
        Self::derive(password, salt, iterations)
    }

    /// Derive from password + salt using PBKDF2-SHA256
    pub fn derive(password: &str, salt: [u8; SALT_LENGTH], iterations: u32) -> Self {
        let mut hash = [0u8; KEY_LENGTH];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut hash);
        Self {
            hash,
            salt,
            iterations,
        }
    }

    /// Constant-time check of a candidate password.
    pub fn verify(&self, password: &str) -> bool {
        let candidate = Self::derive(password, self.salt, self.iterations);
        candidate.hash.ct_eq(&self.hash).into()
    }
}

/// Generate a cryptographically random salt
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}
