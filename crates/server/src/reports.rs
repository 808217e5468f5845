use api_types::report::FundingReportRow;
use axum::{Extension, Json, extract::State};

use crate::{ServerError, server::ServerState, user::CurrentUser};

/// Fully funded projects, fastest to close first.
pub async fn funding(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<FundingReportRow>>, ServerError> {
    user.require_superuser()?;
    let rows = state.engine.funding_report().await?;
    Ok(Json(
        rows.into_iter()
            .map(|row| FundingReportRow {
                project_id: row.project_id,
                days_to_close: row.days(),
                seconds_to_close: row.time_to_close.num_seconds(),
                name: row.name,
                description: row.description,
                created_at: row.created_at,
                closed_at: row.closed_at,
            })
            .collect(),
    ))
}
