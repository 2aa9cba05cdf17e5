//! Flow serialization tests
//!
//! Serializes catalog components of every nesting shape and checks the resulting flows and
//! their reconstruction.
mod common;
use common::*;
use kiroku::config::SerializationConfig;
use kiroku::options::embed_component;
use kiroku::prelude::*;

#[cfg(test)]
mod flow_tests {
    use super::*;

    #[test]
    fn test_j48_options_and_setup_values() {
        let serializer = FlowSerializer::default();
        let mut tracker = LocalTracker::new();
        let j48 = configure(&serializer, "J48", &["-C", "0.03", "-M", "10"]);

        let (flow, settings, rebuilt) = round_trip(&serializer, &mut tracker, j48.as_ref());

        let options: Vec<&FlowParameter> = flow
            .parameters
            .values()
            .filter(|p| p.kind == ParameterKind::Option)
            .collect();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].name, "C");
        assert_eq!(options[0].default_value.as_deref(), Some(r#"["0.25"]"#));
        assert_eq!(options[1].name, "M");
        assert_eq!(options[1].default_value.as_deref(), Some(r#"["2"]"#));

        let id = flow.id.unwrap();
        assert_eq!(setting_value(&settings, id, "C"), Some(r#"["0.03"]"#));
        assert_eq!(setting_value(&settings, id, "M"), Some(r#"["10"]"#));
        assert_eq!(setting_value(&settings, id, "U"), Some(r#"["false"]"#));

        assert_eq!(rebuilt.get_options(), tokens(&["-C", "0.03", "-M", "10"]));
    }

    #[test]
    fn test_flag_values_follow_configuration() {
        let serializer = FlowSerializer::default();
        let mut tracker = LocalTracker::new();
        let j48 = configure(&serializer, "J48", &["-U", "-B"]);

        let (flow, settings, rebuilt) = round_trip(&serializer, &mut tracker, j48.as_ref());
        let id = flow.id.unwrap();

        for flag in ["U", "O", "R", "B", "S", "L", "A", "J"] {
            let parameter = flow.parameter(flag).unwrap();
            assert_eq!(parameter.kind, ParameterKind::Flag);
            assert_eq!(parameter.default_value.as_deref(), Some(r#"["false"]"#));
        }
        assert_eq!(setting_value(&settings, id, "U"), Some(r#"["true"]"#));
        assert_eq!(setting_value(&settings, id, "B"), Some(r#"["true"]"#));
        assert_eq!(setting_value(&settings, id, "O"), Some(r#"["false"]"#));
        assert_eq!(rebuilt.get_options(), j48.get_options());
    }

    #[test]
    fn test_bagging_wraps_reptree() {
        let serializer = FlowSerializer::default();
        let mut tracker = LocalTracker::new();
        let bagging = configure(&serializer, "Bagging", &["-I", "25", "-W", "REPTree", "--", "-M", "4"]);

        let (flow, settings, rebuilt) = round_trip(&serializer, &mut tracker, bagging.as_ref());

        assert_eq!(flow.name, "Bagging(REPTree)");
        assert_eq!(flow.base_name(), "Bagging");
        let learner = flow.parameter("W").unwrap();
        assert_eq!(learner.kind, ParameterKind::Classifier);
        assert_eq!(learner.default_value.as_deref(), Some(r#"["REPTree"]"#));
        assert_eq!(flow.components.keys().collect::<Vec<_>>(), vec!["W_0"]);

        let child_id = flow.component("W_0").unwrap().id.unwrap();
        assert_eq!(setting_value(&settings, child_id, "M"), Some(r#"["4"]"#));
        assert_eq!(setting_value(&settings, flow.id.unwrap(), "I"), Some(r#"["25"]"#));

        // Nested settings precede every setting of their parent.
        let first_parent = settings
            .iter()
            .position(|s| s.component_id == flow.id.unwrap())
            .unwrap();
        let last_child = settings
            .iter()
            .rposition(|s| s.component_id == child_id)
            .unwrap();
        assert!(last_child < first_parent);

        assert_eq!(rebuilt.get_options(), bagging.get_options());
    }

    #[test]
    fn test_smo_kernel_and_calibrator_are_option_handlers() {
        let serializer = FlowSerializer::default();
        let mut tracker = LocalTracker::new();
        let smo = configure(&serializer, "SMO", &["-C", "2.0", "-K", "RBFKernel -G 0.5 -C 0"]);

        let (flow, _, rebuilt) = round_trip(&serializer, &mut tracker, smo.as_ref());

        assert_eq!(flow.name, "SMO(RBFKernel,Logistic)");
        assert_eq!(flow.parameter("K").unwrap().kind, ParameterKind::OptionHandler);
        assert_eq!(
            flow.parameter("calibrator").unwrap().kind,
            ParameterKind::OptionHandler
        );
        assert_eq!(flow.component("K_0").unwrap().class_name, "RBFKernel");
        assert_eq!(flow.component("calibrator_0").unwrap().class_name, "Logistic");
        assert_eq!(rebuilt.get_options(), smo.get_options());
        assert!(rebuilt.get_options().contains(&"RBFKernel -G 0.5 -C 0".to_string()));
    }

    #[test]
    fn test_filtered_classifier_with_filter_chain() {
        let serializer = FlowSerializer::default();
        let mut tracker = LocalTracker::new();
        let chain = embed_component(
            "MultiFilter",
            &["-F", "Normalize -S 2.0 -T -1.0", "-F", "RemoveUseless -M 50.0"],
        );
        let filtered = configure(
            &serializer,
            "FilteredClassifier",
            &["-F", chain.as_str(), "-W", "J48", "--", "-C", "0.1"],
        );

        let (flow, _, rebuilt) = round_trip(&serializer, &mut tracker, filtered.as_ref());

        assert_eq!(
            flow.name,
            "FilteredClassifier(MultiFilter(Normalize,RemoveUseless),J48)"
        );
        assert_eq!(flow.count_components(), 5);
        let multi_filter = flow.component("F_0").unwrap();
        assert_eq!(
            multi_filter.components.keys().collect::<Vec<_>>(),
            vec!["F_0", "F_1"]
        );
        assert!(flow.has_ids());
        assert_eq!(rebuilt.get_options(), filtered.get_options());
    }

    #[test]
    fn test_multisearch_sweeps_are_arrays() {
        let serializer = FlowSerializer::default();
        let mut tracker = LocalTracker::new();
        let search = configure(&serializer, "MultiSearch", &[]);

        let (flow, settings, rebuilt) = round_trip(&serializer, &mut tracker, search.as_ref());

        let sweeps = flow.parameter("search").unwrap();
        assert_eq!(sweeps.kind, ParameterKind::Array);
        assert_eq!(sweeps.default_value, None);
        assert!(flow.component("search_0").is_none());
        assert_eq!(flow.name, "MultiSearch(DefaultSearch,J48)");

        let value = setting_value(&settings, flow.id.unwrap(), "search").unwrap();
        let values: Vec<String> = serde_json::from_str(value).unwrap();
        assert_eq!(values.len(), 2);
        assert!(values[0].starts_with("MathParameter -property classifier.confidenceFactor"));

        assert_eq!(rebuilt.get_options(), search.get_options());
    }

    #[test]
    fn test_repeated_plain_values_are_arrays() {
        let serializer = FlowSerializer::default();
        let mut tracker = LocalTracker::new();
        let selection = configure(
            &serializer,
            "CVParameterSelection",
            &["-P", "C 0.1 0.5 5", "-P", "M 1 10 10", "-W", "J48", "--", "-U"],
        );

        let (flow, settings, rebuilt) = round_trip(&serializer, &mut tracker, selection.as_ref());

        assert_eq!(flow.name, "CVParameterSelection(J48)");
        let ranges = flow.parameter("P").unwrap();
        assert_eq!(ranges.kind, ParameterKind::Array);
        assert_eq!(ranges.default_value, None);
        assert_eq!(
            setting_value(&settings, flow.id.unwrap(), "P"),
            Some(r#"["C 0.1 0.5 5","M 1 10 10"]"#)
        );
        assert_eq!(rebuilt.get_options(), selection.get_options());

        // The kind does not depend on how many values are set.
        for options in [&["-P", "C 0.1 0.5 5"][..], &[][..]] {
            let component = configure(&serializer, "CVParameterSelection", options);
            let flow = serializer.serialize(component.as_ref(), &[]).unwrap();
            assert_eq!(flow.parameter("P").unwrap().kind, ParameterKind::Array);
        }
    }

    #[test]
    fn test_kind_precedence_changes_learner_kind() {
        let bagging_flow = |serializer: &FlowSerializer| {
            let bagging = configure(serializer, "Bagging", &["-W", "REPTree"]);
            serializer.serialize(bagging.as_ref(), &[]).unwrap()
        };

        let default_flow = bagging_flow(&FlowSerializer::default());
        assert_eq!(default_flow.parameter("W").unwrap().kind, ParameterKind::Classifier);

        let config = Config::from_config_string(
            "kind_precedence=optionhandler,classifier,array,parameterfree_class",
        )
        .unwrap();
        let reordered = bagging_flow(&FlowSerializer::builder().with_config(&config).build());
        let learner = reordered.parameter("W").unwrap();
        assert_eq!(learner.kind, ParameterKind::OptionHandler);
        assert_eq!(learner.default_value.as_deref(), Some(r#"["REPTree"]"#));
        assert_eq!(reordered.component("W_0").unwrap().class_name, "REPTree");
        assert_eq!(reordered.name, default_flow.name);
        assert_ne!(reordered, default_flow);
    }

    #[test]
    fn test_parameter_free_estimator() {
        let serializer = FlowSerializer::default();
        let mut tracker = LocalTracker::new();
        let bayes = configure(&serializer, "EstimatorNaiveBayes", &["-E", "KernelEstimator"]);

        let (flow, settings, rebuilt) = round_trip(&serializer, &mut tracker, bayes.as_ref());

        assert_eq!(flow.name, "EstimatorNaiveBayes(KernelEstimator)");
        let estimator = flow.parameter("E").unwrap();
        assert_eq!(estimator.kind, ParameterKind::ParameterFreeClass);
        assert_eq!(estimator.default_value.as_deref(), Some(r#"["KernelEstimator"]"#));
        assert_eq!(flow.components.keys().collect::<Vec<_>>(), vec!["E"]);
        assert_eq!(
            setting_value(&settings, flow.id.unwrap(), "E"),
            Some(r#"["KernelEstimator"]"#)
        );
        assert_eq!(rebuilt.get_options(), tokens(&["-E", "KernelEstimator"]));
    }

    #[test]
    fn test_serialization_is_idempotent() {
        let serializer = FlowSerializer::default();
        let smo = configure(&serializer, "SMO", &["-K", "PolyKernel -E 2.0 -C 250007"]);
        let first = serializer.serialize(smo.as_ref(), &[]).unwrap();
        let second = serializer.serialize(smo.as_ref(), &[]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_leaf_values_do_not_change_names() {
        let serializer = FlowSerializer::default();
        let plain = configure(&serializer, "Bagging", &[]);
        let tuned = configure(&serializer, "Bagging", &["-P", "50", "-W", "REPTree", "--", "-M", "7", "-P"]);
        let plain_flow = serializer.serialize(plain.as_ref(), &[]).unwrap();
        let tuned_flow = serializer.serialize(tuned.as_ref(), &[]).unwrap();
        assert_eq!(plain_flow.name, tuned_flow.name);
        assert_eq!(
            plain_flow.parameters.keys().collect::<Vec<_>>(),
            tuned_flow.parameters.keys().collect::<Vec<_>>()
        );

        let boosted = configure(&serializer, "Bagging", &["-W", "J48"]);
        let boosted_flow = serializer.serialize(boosted.as_ref(), &[]).unwrap();
        assert_eq!(boosted_flow.name, "Bagging(J48)");
    }

    #[test]
    fn test_flow_defaults_rebuild_default_component() {
        let serializer = FlowSerializer::default();
        let configured = configure(&serializer, "Bagging", &["-I", "50", "-O"]);
        let flow = serializer.serialize(configured.as_ref(), &[]).unwrap();

        let rebuilt = serializer.deserialize_flow(&flow).unwrap();
        let fresh = serializer.registry().create("Bagging").unwrap();
        assert_eq!(rebuilt.get_options(), fresh.get_options());
    }

    #[test]
    fn test_setup_requires_flow_ids() {
        let serializer = FlowSerializer::default();
        let j48 = configure(&serializer, "J48", &[]);
        let flow = serializer.serialize(j48.as_ref(), &[]).unwrap();
        let result = serializer.extract_setup(&j48.get_options(), &flow);
        assert!(matches!(result, Err(ReconstructionError::MissingFlowId(_))));
    }

    #[test]
    fn test_repeated_filters_need_matching_settings() {
        let serializer = FlowSerializer::default();
        let mut tracker = LocalTracker::new();
        let chain = embed_component(
            "MultiFilter",
            &["-F", "Normalize -S 2.0 -T 0.0", "-F", "Normalize -S 3.0 -T 0.0"],
        );
        let filtered = configure(&serializer, "FilteredClassifier", &["-F", chain.as_str(), "-W", "J48"]);
        let flow = serializer.serialize(filtered.as_ref(), &[]).unwrap();
        let flow_id = register_flow(&mut tracker, &flow).unwrap();
        let stored = tracker.flow_get(flow_id).unwrap();

        // Both filters are the same sub-flow.
        let multi_filter = stored.component("F_0").unwrap();
        let normalize_id = multi_filter.component("F_0").unwrap().id.unwrap();
        assert_eq!(multi_filter.component("F_1").unwrap().id, Some(normalize_id));

        let result = serializer.extract_setup(&filtered.get_options(), &stored);
        assert!(matches!(
            result,
            Err(ReconstructionError::ConflictingSettings { component_id, ref parameter })
                if component_id == normalize_id && parameter == "S"
        ));

        // Identically configured filters share their settings.
        let twin = embed_component(
            "MultiFilter",
            &["-F", "Normalize -S 2.0 -T 0.0", "-F", "Normalize -S 2.0 -T 0.0"],
        );
        let twins = configure(&serializer, "FilteredClassifier", &["-F", twin.as_str(), "-W", "J48"]);
        let (twin_flow, settings, rebuilt) = round_trip(&serializer, &mut tracker, twins.as_ref());
        assert_eq!(twin_flow.id, Some(flow_id));
        assert_eq!(
            settings
                .iter()
                .filter(|s| s.component_id == normalize_id && s.name == "S")
                .count(),
            1
        );
        assert_eq!(rebuilt.get_options(), twins.get_options());

        let mut conflicting = settings.clone();
        conflicting.insert(0, ParameterSetting::new(normalize_id, "S", r#"["3.0"]"#));
        assert!(matches!(
            serializer.setup_to_options(&conflicting, &twin_flow),
            Err(ReconstructionError::ConflictingSettings { .. })
        ));
    }

    #[test]
    fn test_setup_values_respect_length_limit() {
        let serializer = FlowSerializer::builder()
            .with_serialization_config(SerializationConfig {
                max_value_length: 60,
                ..SerializationConfig::default()
            })
            .build();
        let mut tracker = LocalTracker::new();
        let confidence = format!("0.1{}", "0".repeat(70));
        let j48 = configure(&serializer, "J48", &["-C", confidence.as_str()]);

        // The flow only carries the short default.
        let flow = serializer.serialize(j48.as_ref(), &[]).unwrap();
        let flow_id = register_flow(&mut tracker, &flow).unwrap();
        let stored = tracker.flow_get(flow_id).unwrap();

        let result = serializer.extract_setup(&j48.get_options(), &stored);
        assert!(matches!(
            result,
            Err(ReconstructionError::ValueTooLong { ref parameter, length: 77, limit: 60, .. })
                if parameter == "C"
        ));
    }

    #[test]
    fn test_flow_tags_and_metadata() {
        let serializer = FlowSerializer::default();
        let bagging = configure(&serializer, "Bagging", &[]);
        let flow = serializer
            .serialize(bagging.as_ref(), &tokens(&["study_14", "Weka_3.9.6"]))
            .unwrap();
        assert_eq!(flow.tags, tokens(&["Weka_3.9.6", "study_14"]));
        assert_eq!(flow.language, "English");
        assert!(flow.description.starts_with("Leo Breiman"));
        assert_eq!(flow.component("W_0").unwrap().tags, flow.tags);
    }
}
