//! Local tracker tests
mod common;
use common::*;
use kiroku::prelude::*;
use kiroku::tracker::{EvaluationScore, RunDescriptor};
use std::collections::BTreeMap;
use tempfile::tempdir;

#[cfg(test)]
mod tracker_tests {
    use super::*;

    fn registered(serializer: &FlowSerializer, tracker: &mut LocalTracker, spec: &str) -> FlowNode {
        let component = serializer.registry().create_from_spec(spec).unwrap();
        let flow = serializer.serialize(component.as_ref(), &[]).unwrap();
        let id = register_flow(tracker, &flow).unwrap();
        tracker.flow_get(id).unwrap()
    }

    #[test]
    fn test_uploaded_flows_carry_ids() {
        let serializer = FlowSerializer::default();
        let mut tracker = LocalTracker::new();
        let stored = registered(&serializer, &mut tracker, "FilteredClassifier -W REPTree");

        assert!(stored.has_ids());
        assert_eq!(stored.count_components(), 3);
        assert_eq!(tracker.flow_count(), 3);
        let child_id = stored.component("W_0").unwrap().id.unwrap();
        assert_eq!(stored.find(child_id).unwrap().class_name, "REPTree");

        // Apart from ids, the stored tree is the serialized one.
        let component = serializer
            .registry()
            .create_from_spec("FilteredClassifier -W REPTree")
            .unwrap();
        let mut without_ids = stored.clone();
        without_ids.strip_ids();
        assert_eq!(without_ids, serializer.serialize(component.as_ref(), &[]).unwrap());
    }

    #[test]
    fn test_duplicate_upload_fails() {
        let serializer = FlowSerializer::default();
        let mut tracker = LocalTracker::new();
        let j48 = configure(&serializer, "J48", &[]);
        let flow = serializer.serialize(j48.as_ref(), &[]).unwrap();

        tracker.flow_upload(&flow).unwrap();
        assert!(matches!(
            tracker.flow_upload(&flow),
            Err(TrackerError::Storage(_))
        ));
    }

    #[test]
    fn test_missing_flows() {
        let tracker = LocalTracker::new();
        assert!(matches!(tracker.flow_get(3), Err(TrackerError::FlowNotFound(3))));
        assert_eq!(tracker.flow_exists("J48", "Weka_3.9.6_15519").unwrap(), None);
    }

    #[test]
    fn test_run_requires_known_flow() {
        let mut tracker = LocalTracker::new();
        let run = RunDescriptor {
            task_id: 1,
            flow_id: 99,
            setup_string: "J48 -C 0.25 -M 2".to_string(),
            settings: Vec::new(),
            tags: Vec::new(),
            evaluations: Vec::new(),
            error_message: None,
        };
        assert!(matches!(
            tracker.run_upload(&run, &BTreeMap::new()),
            Err(TrackerError::FlowNotFound(99))
        ));
        assert_eq!(tracker.run_count(), 0);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let serializer = FlowSerializer::default();
        let mut tracker = LocalTracker::new();
        let stored = registered(&serializer, &mut tracker, "Bagging -I 25 -W REPTree -- -M 4");

        let run = RunDescriptor {
            task_id: 59,
            flow_id: stored.id.unwrap(),
            setup_string: "Bagging -I 25".to_string(),
            settings: Vec::new(),
            tags: tokens(&["Weka_3.9.6"]),
            evaluations: vec![
                EvaluationScore::for_split("predictive_accuracy", 0.9, 0, 1, None),
                EvaluationScore::total("usercpu_time_millis", 12.5),
            ],
            error_message: None,
        };
        let mut files = BTreeMap::new();
        files.insert("predictions".to_string(), "repeat,fold\n0,1\n".to_string());
        let run_id = tracker.run_upload(&run, &files).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("store.bin");
        tracker.save(&path).unwrap();
        let loaded = LocalTracker::load(&path).unwrap();

        assert_eq!(loaded.flow_count(), tracker.flow_count());
        assert_eq!(loaded.setup_count(), 1);
        assert_eq!(loaded.flow_get(stored.id.unwrap()).unwrap(), stored);

        let (loaded_run, loaded_files) = loaded.run(run_id).unwrap();
        assert_eq!(loaded_run, run);
        assert_eq!(loaded_files, &files);
    }

    #[test]
    fn test_loading_missing_snapshot_fails() {
        let dir = tempdir().unwrap();
        let result = LocalTracker::load(dir.path().join("absent.bin"));
        assert!(matches!(result, Err(TrackerError::Storage(_))));
    }

    #[test]
    fn test_flow_markup_round_trip() {
        let serializer = FlowSerializer::default();
        let mut tracker = LocalTracker::new();
        let stored = registered(&serializer, &mut tracker, "SMO -K \"RBFKernel -G 0.5 -C 0\"");

        let markup = to_markup(&stored).unwrap();
        let parsed: FlowNode = from_markup(&markup).unwrap();
        assert_eq!(parsed, stored);
    }
}
