use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::info;

use crate::{
    web::{
        auth::UserSession,
        types::{DeserPrayer, MessageBody, ValidPrayer},
        Error, WebResult,
    },
    AppState,
};

const PRAYER_SUBMITTED: &str = "Prayer request submitted successfully";

/// Stores one prayer request for the signed-in user.
/// The session is extracted before the body, so anonymous requests never reach validation or the store.
#[tracing::instrument(
    name = "Saving new prayer request",
    skip_all,
    fields(user = %user_session.email())
)]
pub async fn prayer_submit(
    State(app_state): State<AppState>,
    user_session: UserSession,
    body: Result<Json<DeserPrayer>, JsonRejection>,
) -> WebResult<Json<MessageBody>> {
    let Json(prayer) = body.map_err(|rej| Error::JsonRejected(rej.body_text()))?;
    let prayer = ValidPrayer::try_from(prayer)?;

    let record = prayer.into_record(user_session.user());
    app_state.prayer_store.insert(&record).await?;

    info!("SUCCESS");
    Ok(Json(MessageBody::new(PRAYER_SUBMITTED)))
}

pub async fn method_not_allowed() -> WebResult<()> {
    Err(Error::MethodNotAllowed)
}
