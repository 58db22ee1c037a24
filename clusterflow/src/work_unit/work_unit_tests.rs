//! Behavioral tests for pipeline expansion and progress.

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    use crate::core::{get_str, ResourceKind};
    use crate::errors::StoreError;
    use crate::store::{MemoryStore, MockRecordStore, RecordStore};
    use crate::testing::{fixture_uuid, job_component, snapshot, RecordBuilder};
    use crate::work_unit::{
        PipelineInstanceWorkUnit, WorkUnit, WorkUnitRef, WorkUnitResolver, WorkUnitVariant,
    };

    fn job_uuid(n: u64) -> String {
        fixture_uuid(ResourceKind::Job, n)
    }

    fn pipeline(store: Arc<dyn RecordStore>, builder: RecordBuilder) -> PipelineInstanceWorkUnit {
        WorkUnitResolver::new(store).pipeline_instance(builder.build(), None)
    }

    fn labels(children: &[WorkUnitRef]) -> Vec<&str> {
        children.iter().filter_map(|c| c.label()).collect()
    }

    #[test]
    fn test_complete_pipeline_ignores_children() {
        let store = Arc::new(MemoryStore::with_records([
            RecordBuilder::job(1).with_state("Running").build(),
            RecordBuilder::job(2).with_state("Queued").build(),
        ]));
        let unit = pipeline(
            store.clone(),
            RecordBuilder::pipeline(1)
                .with_state("Complete")
                .with_component("a", job_component(&job_uuid(1), "Running"))
                .with_component("b", job_component(&job_uuid(2), "Queued")),
        );

        assert_eq!(unit.progress().unwrap(), 1.0);
        assert!(!unit.is_resolved());
        assert_eq!(store.fetch_many_calls(), 0);
    }

    #[test]
    fn test_complete_pipeline_progress_survives_store_outage() {
        let mut store = MockRecordStore::new();
        store
            .expect_fetch_many()
            .never()
            .returning(|_| Err(StoreError::Unavailable("down".into())));
        let unit = pipeline(
            Arc::new(store),
            RecordBuilder::pipeline(1)
                .with_state("Complete")
                .with_component("a", job_component(&job_uuid(1), "Running")),
        );

        assert_eq!(unit.progress().unwrap(), 1.0);
    }

    #[test]
    fn test_pipeline_without_children_is_zero() {
        let store = Arc::new(MemoryStore::new());
        let running = pipeline(
            store.clone(),
            RecordBuilder::pipeline(1).with_state("RunningOnServer"),
        );
        assert_eq!(running.progress().unwrap(), 0.0);
        assert!(running.children().unwrap().is_empty());
        assert!(!running.has_unreadable_children());

        let empty_map = pipeline(
            store.clone(),
            RecordBuilder::pipeline(2)
                .with_state("Failed")
                .with_field("components", json!({})),
        );
        assert_eq!(empty_map.progress().unwrap(), 0.0);
        assert_eq!(store.fetch_many_calls(), 0);
    }

    #[test]
    fn test_progress_counts_finished_children() {
        let store = Arc::new(MemoryStore::with_records([
            RecordBuilder::job(1).with_state("Complete").build(),
            RecordBuilder::job(2).with_state("Failed").build(),
            RecordBuilder::job(3).with_state("Running").build(),
            RecordBuilder::job(4).with_state("Queued").build(),
        ]));
        let unit = pipeline(
            store,
            RecordBuilder::pipeline(1)
                .with_state("RunningOnServer")
                .with_component("ok", job_component(&job_uuid(1), "Queued"))
                .with_component("bad", job_component(&job_uuid(2), "Queued"))
                .with_component("busy", job_component(&job_uuid(3), "Queued"))
                .with_component("idle", job_component(&job_uuid(4), "Queued")),
        );

        assert_eq!(unit.progress().unwrap(), 0.5);
    }

    #[test]
    fn test_all_failed_children_is_full_progress() {
        let store = Arc::new(MemoryStore::with_records([
            RecordBuilder::job(1).with_state("Failed").build(),
            RecordBuilder::job(2).with_state("Cancelled").build(),
        ]));
        let unit = pipeline(
            store,
            RecordBuilder::pipeline(1)
                .with_state("Failed")
                .with_component("a", job_component(&job_uuid(1), "Running"))
                .with_component("b", job_component(&job_uuid(2), "Running")),
        );

        assert_eq!(unit.progress().unwrap(), 1.0);
        assert!(unit.children().unwrap().iter().all(|c| c.success() == Some(false)));
    }

    #[test]
    fn test_progress_is_independent_of_component_order() {
        let records = [
            RecordBuilder::job(1).with_state("Complete").build(),
            RecordBuilder::job(2).with_state("Failed").build(),
            RecordBuilder::job(3).with_state("Running").build(),
        ];
        let forward = pipeline(
            Arc::new(MemoryStore::with_records(records.clone())),
            RecordBuilder::pipeline(1)
                .with_component("a", job_component(&job_uuid(1), "New"))
                .with_component("b", job_component(&job_uuid(2), "New"))
                .with_component("c", job_component(&job_uuid(3), "New")),
        );
        let reversed = pipeline(
            Arc::new(MemoryStore::with_records(records)),
            RecordBuilder::pipeline(1)
                .with_component("c", job_component(&job_uuid(3), "New"))
                .with_component("b", job_component(&job_uuid(2), "New"))
                .with_component("a", job_component(&job_uuid(1), "New")),
        );

        let expected = 2.0 / 3.0;
        assert!((forward.progress().unwrap() - expected).abs() < f64::EPSILON);
        assert!((reversed.progress().unwrap() - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn test_component_without_job_is_raw_proxy() {
        let raw = json!({"script": "run-it", "script_version": "master", "state": "Complete"});
        let unit = pipeline(
            Arc::new(MemoryStore::new()),
            RecordBuilder::pipeline(1).with_component("step", raw.clone()),
        );

        let children = unit.children().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].variant(), WorkUnitVariant::Proxy);
        assert_eq!(children[0].snapshot(), &snapshot(raw));
        assert_eq!(children[0].label(), Some("step"));
        assert_eq!(children[0].success(), Some(true));
    }

    #[test]
    fn test_fetched_record_wins_over_embedded_copy() {
        let store = Arc::new(MemoryStore::with_records([RecordBuilder::job(1)
            .with_state("Complete")
            .with_field("output", json!("fa7aeb5140e2848d39b416daeef4ffc5+45"))
            .build()]));
        let unit = pipeline(
            store,
            RecordBuilder::pipeline(1)
                .with_component("align", job_component(&job_uuid(1), "Running")),
        );

        let children = unit.children().unwrap();
        let job = &children[0];
        assert_eq!(job.variant(), WorkUnitVariant::Job);
        assert_eq!(job.state(), Some("Complete"));
        assert_eq!(job.success(), Some(true));
        assert_eq!(
            get_str(job.snapshot(), "output"),
            Some("fa7aeb5140e2848d39b416daeef4ffc5+45")
        );
    }

    #[test]
    fn test_unfetchable_job_falls_back_to_embedded_copy() {
        let store = Arc::new(MemoryStore::new());
        store.insert_hidden(RecordBuilder::job(1).with_state("Complete").build());
        let unit = pipeline(
            store,
            RecordBuilder::pipeline(1)
                .with_component("hidden", job_component(&job_uuid(1), "Running"))
                .with_component("embedded", json!({"job": {"state": "Queued"}})),
        );

        let children = unit.children().unwrap();
        assert_eq!(labels(&children), vec!["hidden", "embedded"]);
        assert!(children.iter().all(|c| c.variant() == WorkUnitVariant::Job));
        assert_eq!(children[0].state(), Some("Running"));
        assert_eq!(children[1].state(), Some("Queued"));
        assert!(!unit.has_unreadable_children());
    }

    #[test]
    fn test_first_unrecognized_component_stops_enumeration() {
        let store = Arc::new(MemoryStore::with_records([
            RecordBuilder::job(1).with_state("Running").build(),
            RecordBuilder::job(2).with_state("Complete").build(),
        ]));
        let unit = pipeline(
            store,
            RecordBuilder::pipeline(1)
                .with_component("a", job_component(&job_uuid(1), "Running"))
                .with_component("b", json!("not-a-map"))
                .with_component("c", job_component(&job_uuid(2), "Complete")),
        );

        let children = unit.children().unwrap();
        assert_eq!(labels(&children), vec!["a"]);
        assert!(unit.has_unreadable_children());
        assert_eq!(unit.progress().unwrap(), 0.0);
    }

    #[test]
    fn test_unreadable_flag_unknown_before_resolution() {
        let unit = pipeline(
            Arc::new(MemoryStore::new()),
            RecordBuilder::pipeline(1).with_component("x", json!(42)),
        );

        assert!(!unit.has_unreadable_children());
        unit.children().unwrap();
        assert!(unit.has_unreadable_children());
    }

    #[test]
    fn test_children_fetch_once_with_referenced_uuids_only() {
        let mut store = MockRecordStore::new();
        store
            .expect_fetch_many()
            .withf(|uuids: &[String]| {
                uuids == [fixture_uuid(ResourceKind::Job, 1), fixture_uuid(ResourceKind::Job, 2)]
            })
            .times(1)
            .returning(|_| Ok(vec![RecordBuilder::job(1).with_state("Complete").build()]));
        store.expect_list().never();
        store.expect_fetch().never();

        let unit = pipeline(
            Arc::new(store),
            RecordBuilder::pipeline(1)
                .with_component("a", job_component(&job_uuid(1), "Running"))
                .with_component("b", job_component(&job_uuid(2), "Running"))
                .with_component("c", job_component(&job_uuid(1), "Running"))
                .with_component("d", json!({"script": "noop"})),
        );

        let first = unit.children().unwrap();
        let second = unit.children().unwrap();
        assert_eq!(first.len(), 4);
        assert!(Arc::ptr_eq(&first[0], &second[0]));
        assert_eq!(unit.progress().unwrap(), 0.5);
    }

    #[test]
    fn test_store_error_propagates_and_is_not_memoized() {
        let mut store = MockRecordStore::new();
        let mut seq = mockall::Sequence::new();
        store
            .expect_fetch_many()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(StoreError::Unavailable("db down".into())));
        store
            .expect_fetch_many()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Vec::new()));

        let unit = pipeline(
            Arc::new(store),
            RecordBuilder::pipeline(1).with_component("a", job_component(&job_uuid(1), "Queued")),
        );

        assert_eq!(
            unit.children().unwrap_err(),
            StoreError::Unavailable("db down".into())
        );
        assert!(!unit.is_resolved());
        assert_eq!(unit.children().unwrap().len(), 1);
        assert!(unit.is_resolved());
    }

    #[test]
    fn test_concurrent_callers_resolve_once() {
        let store = Arc::new(MemoryStore::with_records([
            RecordBuilder::job(1).with_state("Complete").build()
        ]));
        let unit = Arc::new(pipeline(
            store.clone(),
            RecordBuilder::pipeline(1).with_component("a", job_component(&job_uuid(1), "Queued")),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let unit = Arc::clone(&unit);
                std::thread::spawn(move || unit.progress().unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1.0);
        }
        assert_eq!(store.fetch_many_calls(), 1);
    }

    #[test]
    fn test_load_resolves_nested_tree() {
        let store = Arc::new(MemoryStore::with_records([
            RecordBuilder::job(1).with_state("Complete").build(),
            RecordBuilder::pipeline(1)
                .with_state("RunningOnServer")
                .with_component("a", job_component(&job_uuid(1), "Running"))
                .with_component("b", json!({"state": "Running"}))
                .build(),
        ]));
        let resolver = WorkUnitResolver::new(store);

        let unit = resolver
            .load(&fixture_uuid(ResourceKind::PipelineInstance, 1))
            .unwrap()
            .unwrap();
        assert_eq!(unit.variant(), WorkUnitVariant::PipelineInstance);
        assert_eq!(unit.title(), "pipeline");
        assert_eq!(
            unit.uri().as_deref(),
            Some("/pipeline_instances/zzzzz-d1hrv-000000000000001")
        );
        assert_eq!(unit.progress().unwrap(), 0.5);

        assert!(resolver.load(&job_uuid(9)).unwrap().is_none());
    }
}
