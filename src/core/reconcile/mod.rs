//! Facility object reconciliation
//!
//! Turns a full upstream snapshot into canonical facility rows, one atomic
//! replace per object. A failing object is logged and skipped so the rest
//! of the snapshot still lands.

use crate::adapters::store::CanonicalStore;
use crate::domain::{
    FacilityObject, ObjectGroup, ObjectSnapshot, Responsible, ResponsiblePhone, SnapshotObject,
};
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Result of reconciling one snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOutcome {
    /// Objects replaced in the canonical store
    pub reconciled: u64,
    /// Objects skipped because their replace failed
    pub failed: u64,
}

/// Replaces canonical facility metadata from upstream snapshots
pub struct ObjectReconciler {
    store: Arc<dyn CanonicalStore>,
}

impl ObjectReconciler {
    pub fn new(store: Arc<dyn CanonicalStore>) -> Self {
        Self { store }
    }

    /// Reconcile the canonical store against one full snapshot
    pub async fn reconcile(&self, snapshot: &ObjectSnapshot) -> ReconcileOutcome {
        let mut groups_by_panel: HashMap<&str, Vec<ObjectGroup>> = HashMap::new();
        for group in &snapshot.groups {
            groups_by_panel
                .entry(group.panel_id.as_str())
                .or_default()
                .push(ObjectGroup {
                    object_id: group.panel_id.clone(),
                    group_no: group.group_no,
                    name: group.name.clone(),
                    is_open: group.is_open,
                    time_event: group.time_event.map(|t| Utc.from_utc_datetime(&t)),
                });
        }

        let mut phones_by_list: HashMap<i64, Vec<ResponsiblePhone>> = HashMap::new();
        for phone in &snapshot.phones {
            let number = phone.phone.trim();
            if number.is_empty() {
                continue;
            }
            phones_by_list
                .entry(phone.list_id)
                .or_default()
                .push(ResponsiblePhone {
                    phone: number.to_string(),
                    type_name: phone.type_id.map(|id| format!("type:{id}")),
                });
        }

        let mut responsibles_by_panel: HashMap<&str, Vec<(Responsible, Vec<ResponsiblePhone>)>> =
            HashMap::new();
        for resp in &snapshot.responsibles {
            let phones = resp
                .list_id
                .and_then(|id| phones_by_list.get(&id).cloned())
                .unwrap_or_default();
            responsibles_by_panel
                .entry(resp.panel_id.as_str())
                .or_default()
                .push((
                    Responsible {
                        object_id: resp.panel_id.clone(),
                        group_no: resp.group_no,
                        order_no: resp.order_no,
                        name: resp.name.clone(),
                        address: resp.address.clone(),
                    },
                    phones,
                ));
        }

        let mut outcome = ReconcileOutcome::default();
        for row in &snapshot.objects {
            let panel_id = row.panel_id.trim();
            if panel_id.is_empty() {
                continue;
            }

            let object = map_object(panel_id, row);
            let groups = groups_by_panel.remove(panel_id).unwrap_or_default();
            let responsibles = responsibles_by_panel.remove(panel_id).unwrap_or_default();

            match self
                .store
                .replace_object(&object, &groups, &responsibles)
                .await
            {
                Ok(()) => outcome.reconciled += 1,
                Err(error) => {
                    warn!(object_id = panel_id, %error, "Object reconciliation failed, skipping");
                    outcome.failed += 1;
                }
            }
        }
        outcome
    }
}

fn map_object(panel_id: &str, row: &SnapshotObject) -> FacilityObject {
    let company_name = non_blank(row.company_name.as_deref());
    FacilityObject {
        id: panel_id.to_string(),
        name: company_name
            .clone()
            .unwrap_or_else(|| panel_id.to_string()),
        address: non_blank(row.company_address.as_deref()),
        client_name: company_name,
        disabled: row.disabled,
        remarks: non_blank(row.remarks.as_deref()),
        additional_info: non_blank(row.additional_info.as_deref())
            .or_else(|| non_blank(row.company_memo.as_deref())),
        latitude: non_blank(row.latitude.as_deref()),
        longitude: non_blank(row.longitude.as_deref()),
        created_at: row.created_at.map(|t| Utc.from_utc_datetime(&t)),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::UpsertCapability;
    use crate::domain::{CanonicalEvent, Result, SyncCursorRecord};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    type ReplacedObject = (FacilityObject, Vec<ObjectGroup>, Vec<(Responsible, Vec<ResponsiblePhone>)>);

    #[derive(Default)]
    struct ReplaceRecorder {
        replaced: Mutex<Vec<ReplacedObject>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl CanonicalStore for ReplaceRecorder {
        async fn test_connection(&self) -> Result<()> {
            Ok(())
        }

        async fn ensure_schema(&self) -> Result<()> {
            Ok(())
        }

        fn upsert_capability(&self) -> UpsertCapability {
            UpsertCapability::BulkConflictSkip
        }

        async fn insert_events_skip_conflicts(&self, _events: &[CanonicalEvent]) -> Result<u64> {
            Ok(0)
        }

        async fn existing_event_ids(&self, _ids: &[String]) -> Result<HashSet<String>> {
            Ok(HashSet::new())
        }

        async fn insert_event(&self, _event: &CanonicalEvent) -> Result<bool> {
            Ok(true)
        }

        async fn get_cursor(&self, _key: &str) -> Result<Option<SyncCursorRecord>> {
            Ok(None)
        }

        async fn set_cursor(&self, _key: &str, _value: &str) -> Result<()> {
            Ok(())
        }

        async fn all_cursors(&self) -> Result<Vec<SyncCursorRecord>> {
            Ok(Vec::new())
        }

        async fn replace_object(
            &self,
            object: &FacilityObject,
            groups: &[ObjectGroup],
            responsibles: &[(Responsible, Vec<ResponsiblePhone>)],
        ) -> Result<()> {
            if self.fail_for.as_deref() == Some(object.id.as_str()) {
                return Err(crate::domain::SvodError::Store("induced failure".to_string()));
            }
            self.replaced.lock().unwrap().push((
                object.clone(),
                groups.to_vec(),
                responsibles.to_vec(),
            ));
            Ok(())
        }
    }

    fn snapshot_object(panel_id: &str) -> crate::domain::SnapshotObject {
        crate::domain::SnapshotObject {
            panel_id: panel_id.to_string(),
            company_name: None,
            company_address: None,
            company_memo: None,
            disabled: false,
            remarks: None,
            additional_info: None,
            latitude: None,
            longitude: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_joins_children_by_panel_and_list() {
        let mut snapshot = ObjectSnapshot::default();
        let mut obj = snapshot_object("P1");
        obj.company_name = Some("ООО Ромашка".to_string());
        obj.company_memo = Some("memo".to_string());
        snapshot.objects.push(obj);
        snapshot.groups.push(crate::domain::SnapshotGroup {
            panel_id: "P1".to_string(),
            group_no: 2,
            name: "Периметр".to_string(),
            is_open: Some(false),
            time_event: None,
        });
        snapshot.responsibles.push(crate::domain::SnapshotResponsible {
            panel_id: "P1".to_string(),
            group_no: Some(2),
            order_no: Some(1),
            list_id: Some(10),
            name: "Иванов".to_string(),
            address: None,
        });
        snapshot.phones.push(crate::domain::SnapshotPhone {
            list_id: 10,
            phone: " +7 900 000-00-00 ".to_string(),
            type_id: Some(3),
        });
        snapshot.phones.push(crate::domain::SnapshotPhone {
            list_id: 10,
            phone: "   ".to_string(),
            type_id: None,
        });

        let store = Arc::new(ReplaceRecorder::default());
        let outcome = ObjectReconciler::new(store.clone()).reconcile(&snapshot).await;

        assert_eq!(outcome.reconciled, 1);
        assert_eq!(outcome.failed, 0);

        let replaced = store.replaced.lock().unwrap();
        let (object, groups, responsibles) = &replaced[0];
        assert_eq!(object.name, "ООО Ромашка");
        assert_eq!(object.client_name.as_deref(), Some("ООО Ромашка"));
        assert_eq!(object.additional_info.as_deref(), Some("memo"));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group_no, 2);
        assert_eq!(responsibles.len(), 1);
        let (resp, phones) = &responsibles[0];
        assert_eq!(resp.name, "Иванов");
        assert_eq!(phones.len(), 1);
        assert_eq!(phones[0].phone, "+7 900 000-00-00");
        assert_eq!(phones[0].type_name.as_deref(), Some("type:3"));
    }

    #[tokio::test]
    async fn test_object_name_falls_back_to_panel_id() {
        let mut snapshot = ObjectSnapshot::default();
        snapshot.objects.push(snapshot_object("P2"));

        let store = Arc::new(ReplaceRecorder::default());
        ObjectReconciler::new(store.clone()).reconcile(&snapshot).await;

        let replaced = store.replaced.lock().unwrap();
        assert_eq!(replaced[0].0.name, "P2");
        assert_eq!(replaced[0].0.client_name, None);
    }

    #[tokio::test]
    async fn test_failed_object_is_skipped_not_fatal() {
        let mut snapshot = ObjectSnapshot::default();
        snapshot.objects.push(snapshot_object("P1"));
        snapshot.objects.push(snapshot_object("P2"));
        snapshot.objects.push(snapshot_object("P3"));

        let store = Arc::new(ReplaceRecorder {
            fail_for: Some("P2".to_string()),
            ..Default::default()
        });
        let outcome = ObjectReconciler::new(store.clone()).reconcile(&snapshot).await;

        assert_eq!(outcome.reconciled, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(store.replaced.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_panel_id_is_skipped() {
        let mut snapshot = ObjectSnapshot::default();
        snapshot.objects.push(snapshot_object("  "));

        let store = Arc::new(ReplaceRecorder::default());
        let outcome = ObjectReconciler::new(store.clone()).reconcile(&snapshot).await;

        assert_eq!(outcome.reconciled, 0);
        assert!(store.replaced.lock().unwrap().is_empty());
    }
}
