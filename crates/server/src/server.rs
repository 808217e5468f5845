use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use std::sync::Arc;

use crate::{ServerError, donations, projects, reports, user::CurrentUser};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Resolve basic-auth credentials into a [`CurrentUser`].
///
/// Requests without an `Authorization` header go through as anonymous; wrong
/// credentials are rejected here.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let user = match auth_header {
        None => None,
        Some(TypedHeader(header)) => {
            if header.username().is_empty() || header.password().is_empty() {
                return Err(ServerError::Unauthorized.into_response());
            }
            let user = state
                .engine
                .authenticate(header.username(), header.password())
                .await
                .map_err(|err| ServerError::from(err).into_response())?;
            match user {
                Some(user) => Some(user),
                None => return Err(ServerError::Unauthorized.into_response()),
            }
        }
    };

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/projects", get(projects::list).post(projects::create))
        .route(
            "/projects/{id}",
            get(projects::get)
                .patch(projects::update)
                .delete(projects::delete),
        )
        .route("/projects/{id}/allocations", get(projects::allocations))
        .route("/donations", get(donations::list).post(donations::create))
        .route("/donations/my", get(donations::mine))
        .route("/donations/{id}/allocations", get(donations::allocations))
        .route("/report", get(reports::funding))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}
