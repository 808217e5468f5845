//! Project API endpoints

use api_types::{
    allocation::AllocationView,
    project::{ProjectNew, ProjectUpdate, ProjectView},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;

use crate::{ServerError, server::ServerState, user::CurrentUser};

pub(crate) fn map_project(project: engine::Project) -> ProjectView {
    ProjectView {
        id: project.id,
        name: project.name,
        description: project.description,
        target_amount: project.target_amount,
        invested_amount: project.invested_amount,
        fully_funded: project.fully_funded,
        created_at: project.created_at,
        closed_at: project.closed_at,
    }
}

pub(crate) fn map_allocation(allocation: engine::Allocation) -> AllocationView {
    AllocationView {
        id: allocation.id,
        pass_id: allocation.pass_id,
        donation_id: allocation.donation_id,
        project_id: allocation.project_id,
        amount: allocation.amount,
        created_at: allocation.created_at,
    }
}

/// List every project, open and closed.
pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<ProjectView>>, ServerError> {
    let projects = state.engine.projects().await?;
    Ok(Json(projects.into_iter().map(map_project).collect()))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<ProjectView>, ServerError> {
    let project = state.engine.project(id).await?;
    Ok(Json(map_project(project)))
}

/// Create a project. Open donations are allocated to it right away.
pub async fn create(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): WithRejection<Json<ProjectNew>, ServerError>,
) -> Result<(StatusCode, Json<ProjectView>), ServerError> {
    user.require_superuser()?;
    let project = state
        .engine
        .create_project(engine::ProjectNew::new(
            payload.name,
            payload.description,
            payload.target_amount,
        ))
        .await?;
    Ok((StatusCode::CREATED, Json(map_project(project))))
}

pub async fn update(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    WithRejection(Json(payload), _): WithRejection<Json<ProjectUpdate>, ServerError>,
) -> Result<Json<ProjectView>, ServerError> {
    user.require_superuser()?;
    let project = state
        .engine
        .update_project(
            id,
            engine::ProjectUpdate {
                name: payload.name,
                description: payload.description,
                target_amount: payload.target_amount,
            },
        )
        .await?;
    Ok(Json(map_project(project)))
}

pub async fn delete(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<ProjectView>, ServerError> {
    user.require_superuser()?;
    let project = state.engine.delete_project(id).await?;
    Ok(Json(map_project(project)))
}

pub async fn allocations(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<AllocationView>>, ServerError> {
    user.require_superuser()?;
    let rows = state.engine.allocations_for_project(id).await?;
    Ok(Json(rows.into_iter().map(map_allocation).collect()))
}
