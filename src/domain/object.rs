//! Facility object model
//!
//! Canonical-side facility metadata (objects, groups, responsible parties,
//! phone numbers) plus the raw snapshot row shapes pulled from the agency
//! MSSQL database. The reconciler consumes a full [`ObjectSnapshot`] and
//! replaces each object's children from it.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical facility object (the parent row)
///
/// `id` is the upstream panel identifier. The row is upserted in place:
/// other records reference it by id, so the primary key is never replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityObject {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub client_name: Option<String>,
    pub disabled: bool,
    pub remarks: Option<String>,
    pub additional_info: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Canonical group row, owned by exactly one facility object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectGroup {
    pub object_id: String,
    pub group_no: i32,
    pub name: String,
    pub is_open: Option<bool>,
    pub time_event: Option<DateTime<Utc>>,
}

/// Canonical responsible-party row, owned by exactly one facility object
///
/// The store assigns a generated id on insert; phone rows reference it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Responsible {
    pub object_id: String,
    pub group_no: Option<i32>,
    pub order_no: Option<i32>,
    pub name: String,
    pub address: Option<String>,
}

/// Canonical phone row, owned by exactly one responsible party
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsiblePhone {
    pub phone: String,
    pub type_name: Option<String>,
}

/// Full upstream snapshot of facility metadata
///
/// Flat row lists exactly as fetched; the reconciler indexes and joins them
/// by panel id / responsibles-list id.
#[derive(Debug, Clone, Default)]
pub struct ObjectSnapshot {
    pub objects: Vec<SnapshotObject>,
    pub groups: Vec<SnapshotGroup>,
    pub responsibles: Vec<SnapshotResponsible>,
    pub phones: Vec<SnapshotPhone>,
}

/// Raw Panel row joined with its Company record
#[derive(Debug, Clone)]
pub struct SnapshotObject {
    pub panel_id: String,
    pub company_name: Option<String>,
    pub company_address: Option<String>,
    pub company_memo: Option<String>,
    pub disabled: bool,
    pub remarks: Option<String>,
    pub additional_info: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

/// Raw Groups row
#[derive(Debug, Clone)]
pub struct SnapshotGroup {
    pub panel_id: String,
    pub group_no: i32,
    pub name: String,
    pub is_open: Option<bool>,
    pub time_event: Option<NaiveDateTime>,
}

/// Raw Responsibles row joined with ResponsiblesList
#[derive(Debug, Clone)]
pub struct SnapshotResponsible {
    pub panel_id: String,
    pub group_no: Option<i32>,
    pub order_no: Option<i32>,
    /// ResponsiblesList id linking to phone rows
    pub list_id: Option<i64>,
    pub name: String,
    pub address: Option<String>,
}

/// Raw ResponsibleTel row
#[derive(Debug, Clone)]
pub struct SnapshotPhone {
    pub list_id: i64,
    pub phone: String,
    pub type_id: Option<i32>,
}
