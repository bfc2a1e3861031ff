use rand::{thread_rng, Rng};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Uppercase code without look-alike characters (0/O, 1/I).
pub fn generate_access_code(length: usize) -> String {
    let mut rng = thread_rng();
    (0..length)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}
