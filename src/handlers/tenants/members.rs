use axum::extract::{Extension, State};
use serde::Serialize;

use crate::db::{queries, AppState};
use crate::error::Result;
use crate::extractors::{Json, Path};
use crate::middleware::{resolve_tenant_branch, TenantContext};
use crate::models::{Capability, Member};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    #[serde(flatten)]
    pub member: Member,
    /// Latest subscription end date (ISO), if the member has ever had one.
    pub subscription_end: Option<String>,
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(branch_id): Path<String>,
) -> Result<Json<Vec<MemberView>>> {
    ctx.require_any(&[Capability::ManageMembers], None, Some(&branch_id))?;

    let conn = state.db.get()?;
    resolve_tenant_branch(&conn, &ctx, &branch_id)?;

    let members = queries::list_members(&conn, &branch_id)?;
    let mut views = Vec::with_capacity(members.len());
    for member in members {
        let subscription_end = queries::latest_subscription_end(&conn, &member.id)?;
        views.push(MemberView {
            member,
            subscription_end,
        });
    }

    Ok(Json(views))
}
