use rand::Rng;
use rand::distributions::Alphanumeric;

/// Length of generated session and cookie secrets.
pub const SECRET_LENGTH: usize = 32;

/// Random alphanumeric secret.
pub fn secret(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
