//! String encodings of domain enums and ids as stored in SurrealDB.

use threadline_core::models::feed::{FeedCapability, FeedPrivacy};
use threadline_core::models::user::OrgRole;
use uuid::Uuid;

use crate::error::DbError;

pub(crate) fn parse_uuid(field: &str, s: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
}

pub(crate) fn parse_role(s: &str) -> Result<OrgRole, DbError> {
    match s {
        "admin" => Ok(OrgRole::Admin),
        "user" => Ok(OrgRole::User),
        other => Err(DbError::Decode(format!("unknown org role: {other}"))),
    }
}

pub(crate) fn parse_privacy(s: &str) -> Result<FeedPrivacy, DbError> {
    match s {
        "public" => Ok(FeedPrivacy::Public),
        "open" => Ok(FeedPrivacy::Open),
        "private" => Ok(FeedPrivacy::Private),
        other => Err(DbError::Decode(format!("unknown feed privacy: {other}"))),
    }
}

pub(crate) fn parse_capabilities(values: &[String]) -> Result<Vec<FeedCapability>, DbError> {
    values
        .iter()
        .map(|s| match s.as_str() {
            "post" => Ok(FeedCapability::Post),
            "message" => Ok(FeedCapability::Message),
            other => Err(DbError::Decode(format!("unknown feed capability: {other}"))),
        })
        .collect()
}

pub(crate) fn capabilities_to_strings(caps: &[FeedCapability]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(caps.len());
    for cap in caps {
        let s = cap.as_str().to_string();
        if !out.contains(&s) {
            out.push(s);
        }
    }
    out
}
