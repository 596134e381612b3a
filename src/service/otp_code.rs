use rand::Rng;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;

pub const CODE_LENGTH: usize = 6;

/// Source of one-time codes. Injected so tests can pin the code.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Uniform decimal digits drawn from the operating system's CSPRNG.
pub struct RandomDigits {
    length: usize,
}

impl RandomDigits {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomDigits {
    fn default() -> Self {
        Self::new(CODE_LENGTH)
    }
}

impl CodeGenerator for RandomDigits {
    fn generate(&self) -> String {
        let mut rng = OsRng;
        (0..self.length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }
}

/// Compares two codes in constant time. Only the length check may exit early.
pub fn codes_match(stored: &str, submitted: &str) -> bool {
    let (a, b) = (stored.as_bytes(), submitted.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
