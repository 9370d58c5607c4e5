use std::fmt;

/// Decides whether a submitted secret grants access to the analyzer.
pub trait CredentialCheck: Send + Sync {
    fn verify(&self, secret: &str) -> bool;
}

/// Single shared password, compared verbatim.
pub struct PasswordGate {
    password: String,
}

impl PasswordGate {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }
}

impl CredentialCheck for PasswordGate {
    fn verify(&self, secret: &str) -> bool {
        secret == self.password
    }
}

impl fmt::Debug for PasswordGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordGate").finish_non_exhaustive()
    }
}
