//! API endpoint URL builders.

use import_common::EntityKind;

pub fn check_url(base_url: &str, pool_id: i64) -> String {
    format!("{}/api/imports/check/{}", base_url, pool_id)
}

pub fn run_url(base_url: &str, pool_id: i64) -> String {
    format!("{}/api/imports/run/{}", base_url, pool_id)
}

/// List (GET) and create (POST) endpoint for one entity kind.
pub fn collection_url(base_url: &str, kind: EntityKind, pool_id: i64) -> String {
    format!("{}/api/{}/{}", base_url, kind.collection(), pool_id)
}

pub fn lookup_url(base_url: &str, kind: EntityKind, pool_id: i64) -> String {
    format!("{}/api/{}/{}", base_url, kind.lookup_collection(), pool_id)
}
