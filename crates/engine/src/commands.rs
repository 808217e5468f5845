//! Command structs for engine operations.
//!
//! These types group the parameters of write operations, keeping call sites
//! readable and avoiding long argument lists.

/// Create a project.
#[derive(Clone, Debug)]
pub struct ProjectNew {
    pub name: String,
    pub description: String,
    pub target_amount: i64,
}

impl ProjectNew {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        target_amount: i64,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            target_amount,
        }
    }
}

/// Edit a project. `None` fields are left unchanged.
#[derive(Clone, Debug, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_amount: Option<i64>,
}

impl ProjectUpdate {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn target_amount(mut self, target_amount: i64) -> Self {
        self.target_amount = Some(target_amount);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.target_amount.is_none()
    }
}

/// Create a donation.
#[derive(Clone, Debug)]
pub struct DonationNew {
    pub pledged_amount: i64,
    pub comment: Option<String>,
    /// Pledging user, `None` for anonymous or system donations.
    pub owner_id: Option<i64>,
}

impl DonationNew {
    #[must_use]
    pub fn new(pledged_amount: i64) -> Self {
        Self {
            pledged_amount,
            comment: None,
            owner_id: None,
        }
    }

    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    #[must_use]
    pub fn owner(mut self, owner_id: i64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }
}

/// Register a user.
#[derive(Clone, Debug)]
pub struct UserNew {
    pub username: String,
    pub password: String,
    pub is_superuser: bool,
}
