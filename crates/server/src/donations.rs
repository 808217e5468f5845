//! Donation API endpoints

use api_types::{
    allocation::AllocationView,
    donation::{DonationCreated, DonationNew, DonationView},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use engine::EngineError;

use crate::{ServerError, projects::map_allocation, server::ServerState, user::CurrentUser};

fn map_donation(donation: engine::Donation) -> DonationView {
    DonationView {
        id: donation.id,
        pledged_amount: donation.pledged_amount,
        invested_amount: donation.invested_amount,
        fully_allocated: donation.fully_allocated,
        comment: donation.comment,
        owner_id: donation.owner_id,
        created_at: donation.created_at,
        closed_at: donation.closed_at,
    }
}

pub async fn list(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<DonationView>>, ServerError> {
    user.require_superuser()?;
    let donations = state.engine.donations().await?;
    Ok(Json(donations.into_iter().map(map_donation).collect()))
}

/// Pledge a donation as the authenticated user.
///
/// The donor only gets the pledge back, not how it was spread.
pub async fn create(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): WithRejection<Json<DonationNew>, ServerError>,
) -> Result<(StatusCode, Json<DonationCreated>), ServerError> {
    let user = user.require()?;
    let mut cmd = engine::DonationNew::new(payload.pledged_amount).owner(user.id);
    if let Some(comment) = payload.comment {
        cmd = cmd.comment(comment);
    }
    let donation = state.engine.create_donation(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(DonationCreated {
            id: donation.id,
            pledged_amount: donation.pledged_amount,
            comment: donation.comment,
            created_at: donation.created_at,
        }),
    ))
}

pub async fn mine(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<DonationView>>, ServerError> {
    let user = user.require()?;
    let donations = state.engine.donations_by_owner(user.id).await?;
    Ok(Json(donations.into_iter().map(map_donation).collect()))
}

/// Where a donation went. Visible to its owner and to superusers.
pub async fn allocations(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<AllocationView>>, ServerError> {
    let user = user.require()?;
    let donation = state.engine.donation(id).await?;
    if !user.is_superuser && donation.owner_id != Some(user.id) {
        return Err(EngineError::Forbidden("not the owner of this donation".to_string()).into());
    }
    let rows = state.engine.allocations_for_donation(id).await?;
    Ok(Json(rows.into_iter().map(map_allocation).collect()))
}
