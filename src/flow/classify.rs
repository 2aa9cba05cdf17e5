use super::ParameterKind;
use crate::component::{Capability, ComponentEntry, ComponentRegistry, OptionDescriptor};
use crate::error::SerializationError;
use crate::options::split_component;

/// Assigns a [`ParameterKind`] to one declared parameter.
///
/// A value names a component when its first token is a registered type. Simple parameters are
/// recognized from their default values, or from the descriptor for repeatable ones; nested ones are classified from their current values by
/// trying the nested kinds in precedence order.
pub struct ParameterClassifier<'a> {
    registry: &'a ComponentRegistry,
    precedence: &'a [ParameterKind],
}

impl<'a> ParameterClassifier<'a> {
    pub fn new(registry: &'a ComponentRegistry, precedence: &'a [ParameterKind]) -> Self {
        Self {
            registry,
            precedence,
        }
    }

    pub fn classify(
        &self,
        component: &str,
        descriptor: &OptionDescriptor,
        defaults: &[String],
        current: &[String],
    ) -> Result<ParameterKind, SerializationError> {
        if descriptor.num_arguments == 0 {
            return Ok(ParameterKind::Flag);
        }

        let ambiguous = |message: &str| SerializationError::AmbiguousParameter {
            component: component.to_string(),
            parameter: descriptor.name.clone(),
            message: message.to_string(),
        };

        let resolved = defaults
            .iter()
            .map(|value| self.resolve(value))
            .collect::<Result<Vec<_>, _>>()?;
        let named = resolved.iter().filter(|entry| entry.is_some()).count();

        if named == 0 {
            if descriptor.repeatable || defaults.len() > 1 {
                return Ok(ParameterKind::Array);
            }
            if current.len() > 1 {
                return Err(ambiguous(
                    "several values set for a parameter whose default holds one",
                ));
            }
            return Ok(ParameterKind::Option);
        }
        if named < defaults.len() {
            return Err(ambiguous(
                "default values mix component types and plain values",
            ));
        }

        if current.is_empty() {
            return Err(SerializationError::MissingNestedValues {
                component: component.to_string(),
                parameter: descriptor.name.clone(),
            });
        }

        let entries = current
            .iter()
            .map(|value| self.resolve(value))
            .collect::<Result<Vec<_>, _>>()?;

        for kind in self.precedence {
            let matching = current
                .iter()
                .zip(&entries)
                .filter(|(value, entry)| {
                    entry.is_some_and(|entry| Self::matches(*kind, entry, value, current.len()))
                })
                .count();

            if matching == current.len() {
                return Ok(*kind);
            }
            if matching > 0 {
                return Err(ambiguous(&format!(
                    "only {} of {} values qualify as {}",
                    matching,
                    current.len(),
                    kind
                )));
            }
        }

        Err(SerializationError::UnsupportedParameter {
            component: component.to_string(),
            parameter: descriptor.name.clone(),
        })
    }

    fn resolve(&self, value: &str) -> Result<Option<&'a ComponentEntry>, SerializationError> {
        Ok(split_component(value)?.and_then(|(type_name, _)| self.registry.resolve(&type_name)))
    }

    fn matches(kind: ParameterKind, entry: &ComponentEntry, value: &str, count: usize) -> bool {
        match kind {
            ParameterKind::Array => entry.has(Capability::SweepDescriptor),
            ParameterKind::Classifier => {
                count == 1
                    && !value.contains(char::is_whitespace)
                    && entry.has(Capability::Classifier)
            }
            ParameterKind::OptionHandler => entry.has(Capability::OptionHandling),
            ParameterKind::ParameterFreeClass => entry.has(Capability::ParameterFree),
            ParameterKind::Flag | ParameterKind::Option => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SerializationConfig;

    fn classify(
        descriptor: OptionDescriptor,
        defaults: &[&str],
        current: &[&str],
    ) -> Result<ParameterKind, SerializationError> {
        let registry = ComponentRegistry::with_default_components();
        let precedence = SerializationConfig::default().kind_precedence;
        let to_vec = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        ParameterClassifier::new(&registry, &precedence).classify(
            "Test",
            &descriptor,
            &to_vec(defaults),
            &to_vec(current),
        )
    }

    fn option(name: &str) -> OptionDescriptor {
        OptionDescriptor::new(name, 1, format!("-{} <value>", name), "")
    }

    fn classify_with(
        precedence: &[ParameterKind],
        defaults: &[&str],
        current: &[&str],
    ) -> Result<ParameterKind, SerializationError> {
        let registry = ComponentRegistry::with_default_components();
        let to_vec = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        ParameterClassifier::new(&registry, precedence).classify(
            "Test",
            &option("W"),
            &to_vec(defaults),
            &to_vec(current),
        )
    }

    #[test]
    fn zero_arity_is_a_flag() {
        let flag = OptionDescriptor::new("U", 0, "-U", "");
        assert_eq!(classify(flag, &["false"], &["false"]).unwrap(), ParameterKind::Flag);
    }

    #[test]
    fn plain_defaults_are_options() {
        assert_eq!(classify(option("C"), &["0.25"], &["0.03"]).unwrap(), ParameterKind::Option);
        assert_eq!(classify(option("depth"), &[], &[]).unwrap(), ParameterKind::Option);
    }

    #[test]
    fn several_plain_defaults_are_an_array() {
        assert_eq!(
            classify(option("R"), &["1", "2"], &["3"]).unwrap(),
            ParameterKind::Array
        );
    }

    #[test]
    fn repeatable_plain_option_is_an_array() {
        let repeated = || option("P").repeatable();
        assert_eq!(
            classify(repeated(), &[], &["C 0.1 0.5 5", "M 1 10 10"]).unwrap(),
            ParameterKind::Array
        );
        assert_eq!(classify(repeated(), &[], &["C 0.1 0.5 5"]).unwrap(), ParameterKind::Array);
        assert_eq!(classify(repeated(), &[], &[]).unwrap(), ParameterKind::Array);
    }

    #[test]
    fn several_values_for_single_valued_option_are_rejected() {
        let result = classify(option("P"), &[], &["a", "b"]);
        assert!(matches!(
            result,
            Err(SerializationError::AmbiguousParameter { .. })
        ));
    }

    #[test]
    fn precedence_decides_between_qualifying_kinds() {
        use ParameterKind as K;
        let classifier_first = [K::Array, K::Classifier, K::OptionHandler, K::ParameterFreeClass];
        let handler_first = [K::OptionHandler, K::Classifier, K::Array, K::ParameterFreeClass];

        assert_eq!(
            classify_with(&classifier_first, &["REPTree"], &["J48"]).unwrap(),
            K::Classifier
        );
        assert_eq!(
            classify_with(&handler_first, &["REPTree"], &["J48"]).unwrap(),
            K::OptionHandler
        );
        // Kinds left out of the precedence are never chosen.
        assert!(matches!(
            classify_with(&[K::Array, K::ParameterFreeClass], &["REPTree"], &["J48"]),
            Err(SerializationError::UnsupportedParameter { .. })
        ));
    }

    #[test]
    fn bare_classifier_is_classifier_kind() {
        assert_eq!(
            classify(option("W"), &["REPTree"], &["J48"]).unwrap(),
            ParameterKind::Classifier
        );
    }

    #[test]
    fn configured_classifier_token_is_an_option_handler() {
        assert_eq!(
            classify(option("calibrator"), &["Logistic"], &["Logistic -R 1.0E-4"]).unwrap(),
            ParameterKind::OptionHandler
        );
    }

    #[test]
    fn sweep_descriptors_take_precedence() {
        assert_eq!(
            classify(
                option("search"),
                &["MathParameter"],
                &["MathParameter -min 1.0", "MathParameter -min 2.0"]
            )
            .unwrap(),
            ParameterKind::Array
        );
    }

    #[test]
    fn parameter_free_marker() {
        assert_eq!(
            classify(option("E"), &["NormalEstimator"], &["KernelEstimator"]).unwrap(),
            ParameterKind::ParameterFreeClass
        );
    }

    #[test]
    fn mixed_current_values_are_rejected() {
        let result = classify(
            option("F"),
            &["AllFilter"],
            &["MathParameter -min 1.0", "Normalize"],
        );
        assert!(matches!(
            result,
            Err(SerializationError::AmbiguousParameter { .. })
        ));
    }

    #[test]
    fn mixed_defaults_are_rejected() {
        let result = classify(option("F"), &["AllFilter", "0.5"], &["AllFilter"]);
        assert!(matches!(
            result,
            Err(SerializationError::AmbiguousParameter { .. })
        ));
    }

    #[test]
    fn unresolvable_current_value_is_unsupported() {
        let result = classify(option("K"), &["PolyKernel"], &["StringKernel"]);
        assert!(matches!(
            result,
            Err(SerializationError::UnsupportedParameter { .. })
        ));
    }

    #[test]
    fn nested_default_without_current_values_is_an_error() {
        let result = classify(option("K"), &["PolyKernel"], &[]);
        assert!(matches!(
            result,
            Err(SerializationError::MissingNestedValues { .. })
        ));
    }
}
