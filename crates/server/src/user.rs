//! The user resolved from the request credentials.

use engine::{EngineError, User};

use crate::ServerError;

/// Set by the auth middleware on every request. `None` for anonymous callers.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    pub fn require(self) -> Result<User, ServerError> {
        self.0.ok_or(ServerError::Unauthorized)
    }

    pub fn require_superuser(self) -> Result<User, ServerError> {
        let user = self.require()?;
        if !user.is_superuser {
            return Err(EngineError::Forbidden("superuser required".to_string()).into());
        }
        Ok(user)
    }
}
