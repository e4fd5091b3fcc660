/// Authenticated caller identity for a request.
///
/// Inserted by the auth middleware after the bearer token checks out; the
/// value is the token's subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    username: String,
}

impl CurrentUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}
