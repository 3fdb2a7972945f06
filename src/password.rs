use rand::RngCore;

const SALT_LEN: usize = 16;

/// Argon2 hash in PHC string form, with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::Error> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    argon2::hash_encoded(password.as_bytes(), &salt, &argon2::Config::default())
}

pub fn verify_password(encoded: &str, password: &str) -> Result<bool, argon2::Error> {
    argon2::verify_encoded(encoded, password.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifiable() {
        let first = hash_password("2L6KZG").unwrap();
        let second = hash_password("2L6KZG").unwrap();
        assert_ne!(first, second);
        assert!(!first.contains("2L6KZG"));
        assert!(verify_password(&first, "2L6KZG").unwrap());
        assert!(!verify_password(&first, "wrong").unwrap());
    }
}
