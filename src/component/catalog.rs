//! Reference catalog of toolkit components.
//!
//! Each entry is a static [`ComponentSchema`]; the defaults mirror the toolkit's own default
//! option strings so flows built from these components carry realistic default values.

use super::{Capability, ComponentEntry, ComponentRegistry, ComponentSchema, OptionSpec};

macro_rules! define_components {
    ( $(
        $static_name:ident {
            type_name: $type_name:literal,
            revision: $revision:expr,
            capabilities: [ $( $capability:ident ),* $(,)? ],
            info: $info:expr,
            options: [ $( $option:expr ),* $(,)? ] $(,)?
        }
    ),* $(,)? ) => {
        // 1. One static schema per component type
        $(
            pub static $static_name: ComponentSchema = ComponentSchema {
                type_name: $type_name,
                revision: $revision,
                capabilities: &[ $( Capability::$capability ),* ],
                technical_information: $info,
                options: &[ $( $option ),* ],
            };
        )*

        // 2. Registration of the whole catalog
        /// Registers every catalog component with `registry`.
        pub fn register_default_components(registry: &mut ComponentRegistry) {
            $( registry.register(ComponentEntry::from_schema(&$static_name)); )*
        }

        // 3. Schema lookup by type name
        pub fn schema_by_name(type_name: &str) -> Option<&'static ComponentSchema> {
            match type_name {
                $( $type_name => Some(&$static_name), )*
                _ => None,
            }
        }

        /// Type names of every catalog component, in definition order.
        pub const DEFAULT_COMPONENTS: &[&str] = &[ $( $type_name ),* ];
    };
}

define_components! {
    // Trees
    J48 {
        type_name: "J48",
        revision: Some("15519"),
        capabilities: [Classifier, OptionHandling],
        info: Some("Ross Quinlan (1993). C4.5: Programs for Machine Learning. Morgan Kaufmann Publishers, San Mateo, CA."),
        options: [
            OptionSpec::flag("U", "Use unpruned tree."),
            OptionSpec::flag("O", "Do not collapse tree."),
            OptionSpec::value("C", "0.25", "Set confidence threshold for pruning."),
            OptionSpec::value("M", "2", "Set minimum number of instances per leaf."),
            OptionSpec::flag("R", "Use reduced error pruning."),
            OptionSpec::flag("B", "Use binary splits only."),
            OptionSpec::flag("S", "Do not perform subtree raising."),
            OptionSpec::flag("L", "Do not clean up after the tree has been built."),
            OptionSpec::flag("A", "Laplace smoothing for predicted probabilities."),
            OptionSpec::flag("J", "Do not use MDL correction for info gain on numeric attributes."),
        ],
    },
    REP_TREE {
        type_name: "REPTree",
        revision: Some("15519"),
        capabilities: [Classifier, OptionHandling],
        info: None,
        options: [
            OptionSpec::value("M", "2", "Set minimum number of instances per leaf."),
            OptionSpec::value("V", "0.001", "Set minimum numeric class variance proportion of train variance for split."),
            OptionSpec::value("N", "3", "Number of folds for reduced error pruning."),
            OptionSpec::value("S", "1", "Seed for random data shuffling."),
            OptionSpec::flag("P", "No pruning."),
            OptionSpec::value("L", "-1", "Maximum tree depth (-1 for no restriction)."),
            OptionSpec::value("I", "0.0", "Initial class value count."),
        ],
    },
    RANDOM_TREE {
        type_name: "RandomTree",
        revision: Some("15519"),
        capabilities: [Classifier, OptionHandling],
        info: None,
        options: [
            OptionSpec::value("K", "0", "Number of attributes to randomly investigate."),
            OptionSpec::value("M", "1.0", "Set minimum total weight of instances per leaf."),
            OptionSpec::value("V", "0.001", "Set minimum numeric class variance proportion of train variance for split."),
            OptionSpec::value("S", "1", "Seed for random number generator."),
            OptionSpec::unset("depth", "The maximum depth of the tree, 0 for unlimited."),
            OptionSpec::flag("U", "Allow unclassified instances."),
        ],
    },
    DECISION_STUMP {
        type_name: "DecisionStump",
        revision: Some("10141"),
        capabilities: [Classifier, OptionHandling],
        info: None,
        options: [],
    },

    // Other classifiers
    NAIVE_BAYES {
        type_name: "NaiveBayes",
        revision: Some("15519"),
        capabilities: [Classifier, OptionHandling],
        info: Some("George H. John, Pat Langley: Estimating Continuous Distributions in Bayesian Classifiers. In: Eleventh Conference on Uncertainty in Artificial Intelligence, 338-345, 1995."),
        options: [
            OptionSpec::flag("K", "Use kernel density estimator rather than normal distribution for numeric attributes."),
            OptionSpec::flag("D", "Use supervised discretization to process numeric attributes."),
            OptionSpec::flag("O", "Display model in old format."),
        ],
    },
    ESTIMATOR_NAIVE_BAYES {
        type_name: "EstimatorNaiveBayes",
        revision: Some("1"),
        capabilities: [Classifier, OptionHandling],
        info: None,
        options: [
            OptionSpec::embedded("E", &["NormalEstimator"], "The estimator used for numeric attributes."),
        ],
    },
    ZERO_R {
        type_name: "ZeroR",
        revision: Some("10141"),
        capabilities: [Classifier, OptionHandling],
        info: None,
        options: [],
    },
    ONE_R {
        type_name: "OneR",
        revision: Some("10141"),
        capabilities: [Classifier, OptionHandling],
        info: Some("R.C. Holte (1993). Very simple classification rules perform well on most commonly used datasets. Machine Learning. 11:63-91."),
        options: [
            OptionSpec::value("B", "6", "The minimum number of objects in a bucket."),
        ],
    },
    LOGISTIC {
        type_name: "Logistic",
        revision: Some("15519"),
        capabilities: [Classifier, OptionHandling],
        info: None,
        options: [
            OptionSpec::flag("C", "Use conjugate gradient descent rather than BFGS updates."),
            OptionSpec::value("R", "1.0E-8", "Set the ridge in the log-likelihood."),
            OptionSpec::value("M", "-1", "Set the maximum number of iterations (default -1, until convergence)."),
            OptionSpec::value("num-decimal-places", "4", "The number of decimal places for the output of numbers in the model."),
        ],
    },
    SMO {
        type_name: "SMO",
        revision: Some("15519"),
        capabilities: [Classifier, OptionHandling],
        info: Some("J. Platt: Fast Training of Support Vector Machines using Sequential Minimal Optimization. In B. Schoelkopf and C. Burges and A. Smola, editors, Advances in Kernel Methods - Support Vector Learning, 1998."),
        options: [
            OptionSpec::value("C", "1.0", "The complexity constant C."),
            OptionSpec::value("L", "0.001", "The tolerance parameter."),
            OptionSpec::value("P", "1.0E-12", "The epsilon for round-off error."),
            OptionSpec::value("N", "0", "Whether to 0=normalize/1=standardize/2=neither."),
            OptionSpec::flag("M", "Fit calibration models to SVM outputs."),
            OptionSpec::value("V", "-1", "The number of folds for the internal cross-validation."),
            OptionSpec::value("W", "1", "The random number seed."),
            OptionSpec::embedded("K", &["PolyKernel -E 1.0 -C 250007"], "The Kernel to use."),
            OptionSpec::embedded("calibrator", &["Logistic -R 1.0E-8 -M -1 -num-decimal-places 4"], "The calibration method to use."),
        ],
    },

    // Ensembles and wrappers
    BAGGING {
        type_name: "Bagging",
        revision: Some("15519"),
        capabilities: [Classifier, OptionHandling],
        info: Some("Leo Breiman (1996). Bagging predictors. Machine Learning. 24(2):123-140."),
        options: [
            OptionSpec::value("P", "100", "Size of each bag, as a percentage of the training set size."),
            OptionSpec::flag("O", "Calculate the out of bag error."),
            OptionSpec::value("S", "1", "Random number seed."),
            OptionSpec::value("num-slots", "1", "Number of execution slots."),
            OptionSpec::value("I", "10", "Number of iterations."),
            OptionSpec::learner("W", "REPTree", "Full name of base classifier."),
        ],
    },
    ADA_BOOST_M1 {
        type_name: "AdaBoostM1",
        revision: Some("15519"),
        capabilities: [Classifier, OptionHandling],
        info: Some("Yoav Freund, Robert E. Schapire: Experiments with a new boosting algorithm. In: Thirteenth International Conference on Machine Learning, San Francisco, 148-156, 1996."),
        options: [
            OptionSpec::value("P", "100", "Percentage of weight mass to base training on."),
            OptionSpec::flag("Q", "Use resampling for boosting."),
            OptionSpec::value("S", "1", "Random number seed."),
            OptionSpec::value("I", "10", "Number of iterations."),
            OptionSpec::learner("W", "DecisionStump", "Full name of base classifier."),
        ],
    },
    FILTERED_CLASSIFIER {
        type_name: "FilteredClassifier",
        revision: Some("15519"),
        capabilities: [Classifier, OptionHandling],
        info: None,
        options: [
            OptionSpec::embedded("F", &["Discretize -B 10 -M -1.0 -R first-last -precision 6"], "Full class name of filter to use, followed by filter options."),
            OptionSpec::value("S", "1", "Random number seed."),
            OptionSpec::learner("W", "J48", "Full name of base classifier."),
        ],
    },
    CV_PARAMETER_SELECTION {
        type_name: "CVParameterSelection",
        revision: Some("15519"),
        capabilities: [Classifier, OptionHandling],
        info: Some("R. Kohavi (1995). Wrappers for Performance Enhancement and Oblivious Decision Graphs. Department of Computer Science, Stanford University."),
        options: [
            OptionSpec::value("X", "10", "Number of folds used for cross validation."),
            OptionSpec::repeated("P", &[], "Classifier parameter options, e.g. \"N 1 5 10\" sets N from 1 to 5 in 10 steps."),
            OptionSpec::value("S", "1", "Random number seed."),
            OptionSpec::learner("W", "ZeroR", "Full name of base classifier."),
        ],
    },
    MULTI_SEARCH {
        type_name: "MultiSearch",
        revision: Some("4521"),
        capabilities: [Classifier, OptionHandling],
        info: None,
        options: [
            OptionSpec::value("E", "CC", "Determines the parameter used for evaluation."),
            OptionSpec::embedded_list(
                "search",
                &[
                    "MathParameter -property classifier.confidenceFactor -min 0.05 -max 0.5 -step 0.05 -base 10.0 -expression I",
                    "MathParameter -property classifier.minNumObj -min 1.0 -max 10.0 -step 1.0 -base 10.0 -expression I",
                ],
                "A property search setup.",
            ),
            OptionSpec::value("class-label", "1", "The class label index to retrieve the metric for."),
            OptionSpec::embedded("algorithm", &["DefaultSearch -sample-size 100.0 -initial-folds 2 -subsequent-folds 10 -num-slots 1"], "The search algorithm."),
            OptionSpec::value("S", "1", "Random number seed."),
            OptionSpec::learner("W", "J48", "Full name of base classifier."),
        ],
    },

    // Kernels
    POLY_KERNEL {
        type_name: "PolyKernel",
        revision: Some("10169"),
        capabilities: [OptionHandling],
        info: None,
        options: [
            OptionSpec::value("E", "1.0", "The Exponent to use."),
            OptionSpec::flag("L", "Use lower-order terms."),
            OptionSpec::value("C", "250007", "The size of the cache (a prime number), 0 for full cache."),
        ],
    },
    RBF_KERNEL {
        type_name: "RBFKernel",
        revision: Some("10169"),
        capabilities: [OptionHandling],
        info: None,
        options: [
            OptionSpec::value("G", "0.01", "The Gamma parameter."),
            OptionSpec::value("C", "250007", "The size of the cache (a prime number), 0 for full cache."),
        ],
    },

    // Filters
    MULTI_FILTER {
        type_name: "MultiFilter",
        revision: Some("14508"),
        capabilities: [OptionHandling],
        info: None,
        options: [
            OptionSpec::embedded_list("F", &["AllFilter"], "A filter to apply (can be specified multiple times)."),
        ],
    },
    ALL_FILTER {
        type_name: "AllFilter",
        revision: Some("14508"),
        capabilities: [OptionHandling],
        info: None,
        options: [],
    },
    DISCRETIZE {
        type_name: "Discretize",
        revision: Some("14508"),
        capabilities: [OptionHandling],
        info: None,
        options: [
            OptionSpec::value("B", "10", "Specifies the (maximum) number of bins to divide numeric attributes into."),
            OptionSpec::value("M", "-1.0", "Specifies the desired weight of instances per bin for equal-frequency binning."),
            OptionSpec::flag("F", "Use equal-frequency instead of equal-width discretization."),
            OptionSpec::value("R", "first-last", "Specifies list of columns to discretize."),
            OptionSpec::value("precision", "6", "Precision for bin boundary labels."),
        ],
    },
    NORMALIZE {
        type_name: "Normalize",
        revision: Some("14508"),
        capabilities: [OptionHandling],
        info: None,
        options: [
            OptionSpec::value("S", "1.0", "The scaling factor for the output range."),
            OptionSpec::value("T", "0.0", "The translation of the output range."),
        ],
    },
    REPLACE_MISSING_VALUES {
        type_name: "ReplaceMissingValues",
        revision: Some("14508"),
        capabilities: [OptionHandling],
        info: None,
        options: [],
    },
    REMOVE_USELESS {
        type_name: "RemoveUseless",
        revision: Some("14508"),
        capabilities: [OptionHandling],
        info: None,
        options: [
            OptionSpec::value("M", "99.0", "Set the maximum variance as a percentage of all values."),
        ],
    },

    // Parameter search
    DEFAULT_SEARCH {
        type_name: "DefaultSearch",
        revision: Some("4521"),
        capabilities: [OptionHandling],
        info: None,
        options: [
            OptionSpec::value("sample-size", "100.0", "The size of the data sample in percent."),
            OptionSpec::value("initial-folds", "2", "The number of cross-validation folds for the initial space."),
            OptionSpec::value("subsequent-folds", "10", "The number of cross-validation folds for the subsequent sub-spaces."),
            OptionSpec::value("num-slots", "1", "Number of execution slots."),
        ],
    },
    RANDOM_SEARCH {
        type_name: "RandomSearch",
        revision: Some("4521"),
        capabilities: [OptionHandling],
        info: None,
        options: [
            OptionSpec::value("sample-size", "100.0", "The size of the data sample in percent."),
            OptionSpec::value("initial-folds", "2", "The number of cross-validation folds for the initial space."),
            OptionSpec::value("subsequent-folds", "10", "The number of cross-validation folds for the subsequent sub-spaces."),
            OptionSpec::value("num-slots", "1", "Number of execution slots."),
            OptionSpec::value("num-iterations", "100", "The number of random configurations to evaluate."),
            OptionSpec::value("S", "1", "Random number seed."),
        ],
    },
    MATH_PARAMETER {
        type_name: "MathParameter",
        revision: Some("4521"),
        capabilities: [SweepDescriptor, OptionHandling],
        info: None,
        options: [
            OptionSpec::value("property", "classifier", "The property to explore."),
            OptionSpec::value("min", "-10.0", "The minimum."),
            OptionSpec::value("max", "10.0", "The maximum."),
            OptionSpec::value("step", "1.0", "The step size."),
            OptionSpec::value("base", "10.0", "The base."),
            OptionSpec::value("expression", "I", "The expression to compute the actual value from the counter."),
        ],
    },

    // Parameter-free markers
    NORMAL_ESTIMATOR {
        type_name: "NormalEstimator",
        revision: None,
        capabilities: [ParameterFree],
        info: None,
        options: [],
    },
    KERNEL_ESTIMATOR {
        type_name: "KernelEstimator",
        revision: None,
        capabilities: [ParameterFree],
        info: None,
        options: [],
    },
}
