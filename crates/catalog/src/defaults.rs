use crate::manifest::{
    DistanceOptions, DunnOptions, EntropyOptions, FMeasureOptions, HierarchicalInternalOptions,
    InformationGainOptions, InheritanceOptions, LogBaseOptions, MeasureKind, MeasureManifest,
    Pairing, PairingOptions, VarianceOptions,
};

const INFORMATION: &str = "/external/information_based";
const PURITY: &str = "/external/purity";
const HYPOTHESIS: &str = "/external/statistical_hypothesis";
const INTERNAL: &str = "/internal";
const HIERARCHICAL_INTERNAL: &str = "/internal/hierarchical_internal_measure";
const STATISTICS: &str = "/internal/statistics";
const HISTOGRAMS: &str = "/internal/statistics/histogram";

/// The measure set shipped with the tool, in registration order.
pub fn default_manifests() -> Vec<MeasureManifest> {
    let mut manifests = Vec::new();

    manifests.extend([
        measure(INFORMATION, "Flat Entropy 1", MeasureKind::FlatEntropy(EntropyOptions { variant: 1 })),
        measure(INFORMATION, "Flat Entropy 2", MeasureKind::FlatEntropy(EntropyOptions { variant: 2 })),
        measure(
            INFORMATION,
            "Flat Information Gain (2, FlatEntropy1)",
            MeasureKind::FlatInformationGain(InformationGainOptions { log_base: 2.0, entropy: 1 }),
        ),
        measure(
            INFORMATION,
            "Flat Information Gain (2, FlatEntropy2)",
            MeasureKind::FlatInformationGain(InformationGainOptions { log_base: 2.0, entropy: 2 }),
        ),
        measure(
            INFORMATION,
            "Flat Mutual Information",
            MeasureKind::FlatMutualInformation(LogBaseOptions::default()),
        ),
        measure(
            INFORMATION,
            "Flat Normalized Mutual Information",
            MeasureKind::FlatNormalizedMutualInformation(LogBaseOptions::default()),
        ),
    ]);

    manifests.extend([
        measure(
            PURITY,
            "Hierarchical F-Measure (No Inheritance)",
            MeasureKind::AdaptedFMeasure(InheritanceOptions { with_instance_inheritance: false }),
        ),
        measure(
            PURITY,
            "Hierarchical F-Measure (With Inheritance)",
            MeasureKind::AdaptedFMeasure(InheritanceOptions { with_instance_inheritance: true }),
        ),
        measure(PURITY, "Flat Cluster Purity", MeasureKind::FlatClusterPurity),
        measure(PURITY, "Hierarchical Class Purity", MeasureKind::HierarchicalClassPurity),
    ]);

    manifests.extend([
        measure(HYPOTHESIS, "F-Measure (1.0, Flat)", f_measure(Pairing::Flat)),
        measure(HYPOTHESIS, "F-Measure (1.0, Partial Order)", f_measure(Pairing::PartialOrder)),
        measure(
            HYPOTHESIS,
            "Fowlkes-Mallows Index (Flat)",
            MeasureKind::FowlkesMallowsIndex(PairingOptions::default()),
        ),
        measure(
            HYPOTHESIS,
            "Jaccard Index (Flat)",
            MeasureKind::JaccardIndex(PairingOptions::default()),
        ),
        measure(
            HYPOTHESIS,
            "Partial Order Hypothesis",
            MeasureKind::HypothesisCounts(PairingOptions { pairing: Pairing::PartialOrder }),
        )
        .text(),
        measure(HYPOTHESIS, "Rand Index (Flat)", MeasureKind::RandIndex(PairingOptions::default())),
    ]);

    manifests.extend([
        measure(
            INTERNAL,
            "Flat Calinski-Harabasz (Euclidean)",
            MeasureKind::FlatCalinskiHarabasz(DistanceOptions::default()),
        ),
        measure(
            INTERNAL,
            "Flat Davies-Bouldin (Euclidean)",
            MeasureKind::FlatDaviesBouldin(DistanceOptions::default()),
        ),
    ]);
    for variant in 1..=4 {
        manifests.push(measure(
            INTERNAL,
            &format!("Flat Dunn {} (Euclidean)", variant),
            MeasureKind::FlatDunn(dunn(variant)),
        ));
    }
    for variant in 2..=4 {
        manifests.push(measure(
            INTERNAL,
            &format!("Flat Reversed Dunn {} (Euclidean)", variant),
            MeasureKind::FlatReversedDunn(dunn(variant)),
        ));
    }
    manifests.extend([
        measure(
            INTERNAL,
            "Flat Within-Between Index (Euclidean)",
            MeasureKind::FlatWithinBetween(DistanceOptions::default()),
        ),
        measure(
            INTERNAL,
            "Variance Deviation (1.0)",
            MeasureKind::VarianceDeviation(VarianceOptions { alpha: 1.0 }),
        ),
    ]);

    manifests.push(hierarchical(
        "Flat Davies-Bouldin",
        MeasureKind::FlatDaviesBouldin(DistanceOptions::default()),
    ));
    for variant in 2..=4 {
        manifests.push(hierarchical(
            &format!("Flat Reversed Dunn {}", variant),
            MeasureKind::FlatReversedDunn(dunn(variant)),
        ));
    }
    manifests.push(hierarchical(
        "Flat Within-Between Index",
        MeasureKind::FlatWithinBetween(DistanceOptions::default()),
    ));

    manifests.extend([
        measure(STATISTICS, "Average Path Length", MeasureKind::AveragePathLength).auto(),
        measure(STATISTICS, "Height", MeasureKind::Height).auto(),
        measure(STATISTICS, "Number of Leaves", MeasureKind::NumberOfLeaves).auto(),
        measure(STATISTICS, "Number of Nodes", MeasureKind::NumberOfNodes).auto(),
    ]);

    manifests.extend([
        measure(HISTOGRAMS, "Children Per Node Per Level", MeasureKind::ChildrenPerNodePerLevel),
        measure(HISTOGRAMS, "Instances Per Level", MeasureKind::InstancesPerLevel),
        measure(HISTOGRAMS, "Leaves Per Level", MeasureKind::LeavesPerLevel),
        measure(HISTOGRAMS, "Nodes Per Level", MeasureKind::NodesPerLevel),
        measure(HISTOGRAMS, "Number Of Children", MeasureKind::NumberOfChildren),
    ]);

    manifests
}

fn measure(group: &str, id: &str, kind: MeasureKind) -> MeasureManifest {
    MeasureManifest::new(id, kind).in_group(group)
}

fn f_measure(pairing: Pairing) -> MeasureKind {
    MeasureKind::FMeasure(FMeasureOptions { beta: 1.0, pairing })
}

fn dunn(variant: u8) -> DunnOptions {
    DunnOptions {
        variant,
        distance: Default::default(),
    }
}

fn hierarchical(inner_label: &str, inner: MeasureKind) -> MeasureManifest {
    measure(
        HIERARCHICAL_INTERNAL,
        &format!("Hierarchical Internal Measure ({}, Euclidean)", inner_label),
        MeasureKind::HierarchicalInternal(HierarchicalInternalOptions { inner: Box::new(inner) }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MeasureFamily;
    use std::collections::HashSet;

    #[test]
    fn defaults_are_valid_and_unique() {
        let manifests = default_manifests();
        assert_eq!(manifests.len(), 41);
        let mut ids = HashSet::new();
        for manifest in &manifests {
            manifest.validate().unwrap();
            assert!(ids.insert(manifest.id.clone()), "duplicate id {}", manifest.id);
        }
    }

    #[test]
    fn only_basic_statistics_auto_compute() {
        let auto: Vec<_> = default_manifests()
            .into_iter()
            .filter(|manifest| manifest.auto_compute)
            .map(|manifest| manifest.id)
            .collect();
        assert_eq!(
            auto,
            ["Average Path Length", "Height", "Number of Leaves", "Number of Nodes"]
        );
    }

    #[test]
    fn external_measures_require_ground_truth() {
        for manifest in default_manifests() {
            let external = manifest
                .group
                .as_deref()
                .is_some_and(|group| group.starts_with("/external"));
            assert_eq!(manifest.requires_ground_truth(), external, "{}", manifest.id);
            if manifest.measure.family() == MeasureFamily::Statistics {
                assert!(manifest.group.as_deref().unwrap_or("").starts_with(STATISTICS));
            }
        }
    }

    #[test]
    fn reference_identifiers_are_present() {
        let ids: HashSet<String> = default_manifests().into_iter().map(|m| m.id).collect();
        for id in [
            "Flat Entropy 1",
            "Hierarchical F-Measure (With Inheritance)",
            "Partial Order Hypothesis",
            "Hierarchical Internal Measure (Flat Reversed Dunn 2, Euclidean)",
            "Variance Deviation (1.0)",
            "Number Of Children",
        ] {
            assert!(ids.contains(id), "missing {}", id);
        }
    }
}
