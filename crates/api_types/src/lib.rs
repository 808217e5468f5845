use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod project {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct ProjectNew {
        pub name: String,
        pub description: String,
        /// Amount to raise, in minor units.
        pub target_amount: i64,
    }

    /// Partial edit. Missing fields are left unchanged.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct ProjectUpdate {
        pub name: Option<String>,
        pub description: Option<String>,
        pub target_amount: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProjectView {
        pub id: i64,
        pub name: String,
        pub description: String,
        pub target_amount: i64,
        pub invested_amount: i64,
        pub fully_funded: bool,
        pub created_at: DateTime<Utc>,
        pub closed_at: Option<DateTime<Utc>>,
    }
}

pub mod donation {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct DonationNew {
        /// Amount pledged, in minor units.
        pub pledged_amount: i64,
        pub comment: Option<String>,
    }

    /// What the donor sees after pledging.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct DonationCreated {
        pub id: i64,
        pub pledged_amount: i64,
        pub comment: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    /// Full donation state, including how much was already allocated.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct DonationView {
        pub id: i64,
        pub pledged_amount: i64,
        pub invested_amount: i64,
        pub fully_allocated: bool,
        pub comment: Option<String>,
        pub owner_id: Option<i64>,
        pub created_at: DateTime<Utc>,
        pub closed_at: Option<DateTime<Utc>>,
    }
}

pub mod allocation {
    use super::*;

    /// One transfer from a donation to a project.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AllocationView {
        pub id: Option<i64>,
        /// Shared by every row written in the same allocation pass.
        pub pass_id: Uuid,
        pub donation_id: i64,
        pub project_id: i64,
        pub amount: i64,
        pub created_at: DateTime<Utc>,
    }
}

pub mod report {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FundingReportRow {
        pub project_id: i64,
        pub name: String,
        pub description: String,
        pub created_at: DateTime<Utc>,
        pub closed_at: DateTime<Utc>,
        /// Whole days between creation and closing.
        pub days_to_close: i64,
        /// Exact duration in seconds.
        pub seconds_to_close: i64,
    }
}
