use hiermeasure_registry::Projection;
use serde::{Deserialize, Serialize};

use crate::errors::CatalogError;

/// Declarative description of one measure: identifier, placement and the
/// configured algorithm it binds to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MeasureManifest {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub measure: MeasureKind,
    /// Overrides the family default (external measures need class labels).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_ground_truth: Option<bool>,
    #[serde(default)]
    pub auto_compute: bool,
    #[serde(default)]
    pub projection: Projection,
}

impl MeasureManifest {
    pub fn new(id: impl Into<String>, measure: MeasureKind) -> Self {
        Self {
            id: id.into(),
            group: None,
            measure,
            requires_ground_truth: None,
            auto_compute: false,
            projection: Projection::Raw,
        }
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn auto(mut self) -> Self {
        self.auto_compute = true;
        self
    }

    pub fn text(mut self) -> Self {
        self.projection = Projection::Text;
        self
    }

    pub fn requires_ground_truth(&self) -> bool {
        self.requires_ground_truth
            .unwrap_or_else(|| self.measure.family().needs_ground_truth())
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.id.trim().is_empty() {
            return Err(CatalogError::configuration("", "id must not be empty"));
        }
        if let Some(group) = &self.group {
            if !group.is_empty() && !group.starts_with('/') {
                return Err(CatalogError::configuration(
                    &self.id,
                    format!("group '{}' must start with '/'", group),
                ));
            }
        }
        self.measure
            .validate()
            .map_err(|reason| CatalogError::configuration(&self.id, reason))
    }

    /// Stable YAML rendering used to tell equivalent registrations apart
    /// from conflicting ones.
    pub fn canonical(&self) -> Result<String, CatalogError> {
        serde_yaml::to_string(self)
            .map_err(|err| CatalogError::configuration(&self.id, format!("{}", err)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureFamily {
    Statistics,
    Information,
    Hypothesis,
    Purity,
    Internal,
}

impl MeasureFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            MeasureFamily::Statistics => "statistics",
            MeasureFamily::Information => "information",
            MeasureFamily::Hypothesis => "hypothesis",
            MeasureFamily::Purity => "purity",
            MeasureFamily::Internal => "internal",
        }
    }

    /// External families compare against ground-truth classes.
    pub fn needs_ground_truth(self) -> bool {
        matches!(
            self,
            MeasureFamily::Information | MeasureFamily::Hypothesis | MeasureFamily::Purity
        )
    }
}

/// Measure algorithm together with its configuration, tagged by `name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum MeasureKind {
    NumberOfNodes,
    NumberOfLeaves,
    Height,
    AveragePathLength,
    NodesPerLevel,
    LeavesPerLevel,
    InstancesPerLevel,
    ChildrenPerNodePerLevel,
    NumberOfChildren,

    FlatEntropy(EntropyOptions),
    FlatInformationGain(InformationGainOptions),
    FlatMutualInformation(LogBaseOptions),
    FlatNormalizedMutualInformation(LogBaseOptions),

    FMeasure(FMeasureOptions),
    RandIndex(PairingOptions),
    JaccardIndex(PairingOptions),
    FowlkesMallowsIndex(PairingOptions),
    HypothesisCounts(PairingOptions),

    FlatClusterPurity,
    HierarchicalClassPurity,
    AdaptedFMeasure(InheritanceOptions),

    FlatDunn(DunnOptions),
    FlatReversedDunn(DunnOptions),
    FlatDaviesBouldin(DistanceOptions),
    FlatCalinskiHarabasz(DistanceOptions),
    FlatWithinBetween(DistanceOptions),
    VarianceDeviation(VarianceOptions),
    VarianceDeviation2,
    HierarchicalInternal(HierarchicalInternalOptions),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EntropyOptions {
    pub variant: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct InformationGainOptions {
    pub log_base: f64,
    pub entropy: u8,
}

impl Default for InformationGainOptions {
    fn default() -> Self {
        Self {
            log_base: 2.0,
            entropy: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LogBaseOptions {
    pub log_base: f64,
}

impl Default for LogBaseOptions {
    fn default() -> Self {
        Self { log_base: 2.0 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FMeasureOptions {
    pub beta: f64,
    pub pairing: Pairing,
}

impl Default for FMeasureOptions {
    fn default() -> Self {
        Self {
            beta: 1.0,
            pairing: Pairing::Flat,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PairingOptions {
    pub pairing: Pairing,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct InheritanceOptions {
    pub with_instance_inheritance: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DunnOptions {
    pub variant: u8,
    #[serde(default)]
    pub distance: Distance,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DistanceOptions {
    pub distance: Distance,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct VarianceOptions {
    pub alpha: f64,
}

impl Default for VarianceOptions {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HierarchicalInternalOptions {
    pub inner: Box<MeasureKind>,
}

/// How instance pairs are classified into TP/FP/TN/FN.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Pairing {
    #[default]
    Flat,
    PartialOrder,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Distance {
    #[default]
    Euclidean,
}

impl MeasureKind {
    /// Name under which the kind appears in manifests.
    pub fn name(&self) -> &'static str {
        match self {
            MeasureKind::NumberOfNodes => "number_of_nodes",
            MeasureKind::NumberOfLeaves => "number_of_leaves",
            MeasureKind::Height => "height",
            MeasureKind::AveragePathLength => "average_path_length",
            MeasureKind::NodesPerLevel => "nodes_per_level",
            MeasureKind::LeavesPerLevel => "leaves_per_level",
            MeasureKind::InstancesPerLevel => "instances_per_level",
            MeasureKind::ChildrenPerNodePerLevel => "children_per_node_per_level",
            MeasureKind::NumberOfChildren => "number_of_children",
            MeasureKind::FlatEntropy(_) => "flat_entropy",
            MeasureKind::FlatInformationGain(_) => "flat_information_gain",
            MeasureKind::FlatMutualInformation(_) => "flat_mutual_information",
            MeasureKind::FlatNormalizedMutualInformation(_) => "flat_normalized_mutual_information",
            MeasureKind::FMeasure(_) => "f_measure",
            MeasureKind::RandIndex(_) => "rand_index",
            MeasureKind::JaccardIndex(_) => "jaccard_index",
            MeasureKind::FowlkesMallowsIndex(_) => "fowlkes_mallows_index",
            MeasureKind::HypothesisCounts(_) => "hypothesis_counts",
            MeasureKind::FlatClusterPurity => "flat_cluster_purity",
            MeasureKind::HierarchicalClassPurity => "hierarchical_class_purity",
            MeasureKind::AdaptedFMeasure(_) => "adapted_f_measure",
            MeasureKind::FlatDunn(_) => "flat_dunn",
            MeasureKind::FlatReversedDunn(_) => "flat_reversed_dunn",
            MeasureKind::FlatDaviesBouldin(_) => "flat_davies_bouldin",
            MeasureKind::FlatCalinskiHarabasz(_) => "flat_calinski_harabasz",
            MeasureKind::FlatWithinBetween(_) => "flat_within_between",
            MeasureKind::VarianceDeviation(_) => "variance_deviation",
            MeasureKind::VarianceDeviation2 => "variance_deviation2",
            MeasureKind::HierarchicalInternal(_) => "hierarchical_internal",
        }
    }

    pub fn family(&self) -> MeasureFamily {
        match self {
            MeasureKind::NumberOfNodes
            | MeasureKind::NumberOfLeaves
            | MeasureKind::Height
            | MeasureKind::AveragePathLength
            | MeasureKind::NodesPerLevel
            | MeasureKind::LeavesPerLevel
            | MeasureKind::InstancesPerLevel
            | MeasureKind::ChildrenPerNodePerLevel
            | MeasureKind::NumberOfChildren => MeasureFamily::Statistics,
            MeasureKind::FlatEntropy(_)
            | MeasureKind::FlatInformationGain(_)
            | MeasureKind::FlatMutualInformation(_)
            | MeasureKind::FlatNormalizedMutualInformation(_) => MeasureFamily::Information,
            MeasureKind::FMeasure(_)
            | MeasureKind::RandIndex(_)
            | MeasureKind::JaccardIndex(_)
            | MeasureKind::FowlkesMallowsIndex(_)
            | MeasureKind::HypothesisCounts(_) => MeasureFamily::Hypothesis,
            MeasureKind::FlatClusterPurity
            | MeasureKind::HierarchicalClassPurity
            | MeasureKind::AdaptedFMeasure(_) => MeasureFamily::Purity,
            MeasureKind::FlatDunn(_)
            | MeasureKind::FlatReversedDunn(_)
            | MeasureKind::FlatDaviesBouldin(_)
            | MeasureKind::FlatCalinskiHarabasz(_)
            | MeasureKind::FlatWithinBetween(_)
            | MeasureKind::VarianceDeviation(_)
            | MeasureKind::VarianceDeviation2
            | MeasureKind::HierarchicalInternal(_) => MeasureFamily::Internal,
        }
    }

    /// Flat internal indices, the only kinds a hierarchical internal measure can wrap.
    pub fn is_flat_internal(&self) -> bool {
        matches!(
            self,
            MeasureKind::FlatDunn(_)
                | MeasureKind::FlatReversedDunn(_)
                | MeasureKind::FlatDaviesBouldin(_)
                | MeasureKind::FlatCalinskiHarabasz(_)
                | MeasureKind::FlatWithinBetween(_)
        )
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            MeasureKind::FlatEntropy(options) => check_variant("variant", options.variant, 1..=2),
            MeasureKind::FlatInformationGain(options) => {
                check_log_base(options.log_base)?;
                check_variant("entropy", options.entropy, 1..=2)
            }
            MeasureKind::FlatMutualInformation(options)
            | MeasureKind::FlatNormalizedMutualInformation(options) => {
                check_log_base(options.log_base)
            }
            MeasureKind::FMeasure(options) => {
                if options.beta.is_finite() && options.beta > 0.0 {
                    Ok(())
                } else {
                    Err(format!("beta must be positive, got {}", options.beta))
                }
            }
            MeasureKind::FlatDunn(options) => check_variant("variant", options.variant, 1..=4),
            MeasureKind::FlatReversedDunn(options) => {
                check_variant("variant", options.variant, 2..=4)
            }
            MeasureKind::VarianceDeviation(options) => {
                if options.alpha.is_finite() && options.alpha > 0.0 {
                    Ok(())
                } else {
                    Err(format!("alpha must be positive, got {}", options.alpha))
                }
            }
            MeasureKind::HierarchicalInternal(options) => {
                if !options.inner.is_flat_internal() {
                    return Err(format!(
                        "'{}' cannot be used as a hierarchical internal index",
                        options.inner.name()
                    ));
                }
                options.inner.validate()
            }
            _ => Ok(()),
        }
    }
}

fn check_variant(field: &str, value: u8, range: std::ops::RangeInclusive<u8>) -> Result<(), String> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(format!(
            "{} must be between {} and {}, got {}",
            field,
            range.start(),
            range.end(),
            value
        ))
    }
}

fn check_log_base(base: f64) -> Result<(), String> {
    if base.is_finite() && base > 0.0 && base != 1.0 {
        Ok(())
    } else {
        Err(format!("log_base must be positive and not 1, got {}", base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<MeasureManifest, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    #[test]
    fn parses_unit_and_configured_kinds() {
        let manifest = parse("id: Height\nmeasure:\n  name: height\nauto_compute: true\n").unwrap();
        assert_eq!(manifest.measure, MeasureKind::Height);
        assert!(manifest.auto_compute);
        assert!(!manifest.requires_ground_truth());

        let manifest = parse(
            "id: F-Measure (1.0, Partial Order)\nmeasure:\n  name: f_measure\n  pairing: partial_order\n",
        )
        .unwrap();
        assert_eq!(
            manifest.measure,
            MeasureKind::FMeasure(FMeasureOptions {
                beta: 1.0,
                pairing: Pairing::PartialOrder,
            })
        );
        assert!(manifest.requires_ground_truth());
    }

    #[test]
    fn parses_nested_hierarchical_internal() {
        let manifest = parse(
            "id: nested\nmeasure:\n  name: hierarchical_internal\n  inner:\n    name: flat_reversed_dunn\n    variant: 3\n",
        )
        .unwrap();
        manifest.validate().unwrap();
        let MeasureKind::HierarchicalInternal(options) = &manifest.measure else {
            panic!("unexpected kind: {:?}", manifest.measure);
        };
        assert_eq!(
            *options.inner,
            MeasureKind::FlatReversedDunn(DunnOptions {
                variant: 3,
                distance: Distance::Euclidean,
            })
        );
    }

    #[test]
    fn unknown_names_and_options_do_not_parse() {
        assert!(parse("id: x\nmeasure:\n  name: silhouette\n").is_err());
        assert!(parse("id: x\nmeasure:\n  name: flat_entropy\n  variant: 1\n  smoothing: 2\n").is_err());
        assert!(parse("id: x\nmeasure:\n  name: height\ncolour: red\n").is_err());
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        let cases = [
            MeasureKind::FlatEntropy(EntropyOptions { variant: 3 }),
            MeasureKind::FlatReversedDunn(DunnOptions {
                variant: 1,
                distance: Distance::Euclidean,
            }),
            MeasureKind::FlatMutualInformation(LogBaseOptions { log_base: 1.0 }),
            MeasureKind::FMeasure(FMeasureOptions {
                beta: 0.0,
                pairing: Pairing::Flat,
            }),
            MeasureKind::HierarchicalInternal(HierarchicalInternalOptions {
                inner: Box::new(MeasureKind::Height),
            }),
        ];
        for kind in cases {
            let manifest = MeasureManifest::new("bad", kind);
            assert!(matches!(
                manifest.validate(),
                Err(CatalogError::Configuration { .. })
            ));
        }
    }

    #[test]
    fn validation_checks_identifier_and_group() {
        assert!(MeasureManifest::new(" ", MeasureKind::Height).validate().is_err());
        assert!(MeasureManifest::new("Height", MeasureKind::Height)
            .in_group("internal")
            .validate()
            .is_err());
        MeasureManifest::new("Height", MeasureKind::Height)
            .in_group("/internal/statistics")
            .validate()
            .unwrap();
    }

    #[test]
    fn canonical_form_is_stable_and_parses_back() {
        let manifest = MeasureManifest::new("Partial Order Hypothesis", MeasureKind::HypothesisCounts(PairingOptions {
            pairing: Pairing::PartialOrder,
        }))
        .text();
        let canonical = manifest.canonical().unwrap();
        assert_eq!(canonical, manifest.clone().canonical().unwrap());
        assert_eq!(parse(&canonical).unwrap(), manifest);
    }
}
