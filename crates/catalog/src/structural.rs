use std::collections::BTreeMap;
use std::sync::Arc;

use hiermeasure_core_types::{Hierarchy, MeasureError, MeasureValue};
use hiermeasure_registry::MeasureImplementation;

use crate::library::MeasureLibrary;
use crate::manifest::{MeasureFamily, MeasureKind};

/// Native implementation of the structural statistics family.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralLibrary;

impl StructuralLibrary {
    pub fn new() -> Self {
        Self
    }
}

impl MeasureLibrary for StructuralLibrary {
    fn name(&self) -> &str {
        "structural"
    }

    fn supports(&self, kind: &MeasureKind) -> bool {
        kind.family() == MeasureFamily::Statistics
    }

    fn instantiate(&self, kind: &MeasureKind) -> Result<Arc<dyn MeasureImplementation>, MeasureError> {
        let statistic = Statistic::from_kind(kind).ok_or_else(|| {
            MeasureError::new(format!("'{}' is not a structural statistic", kind.name()))
        })?;
        Ok(Arc::new(statistic))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Statistic {
    Nodes,
    Leaves,
    Height,
    AveragePathLength,
    NodesPerLevel,
    LeavesPerLevel,
    InstancesPerLevel,
    ChildrenPerNodePerLevel,
    NumberOfChildren,
}

impl Statistic {
    fn from_kind(kind: &MeasureKind) -> Option<Self> {
        let statistic = match kind {
            MeasureKind::NumberOfNodes => Statistic::Nodes,
            MeasureKind::NumberOfLeaves => Statistic::Leaves,
            MeasureKind::Height => Statistic::Height,
            MeasureKind::AveragePathLength => Statistic::AveragePathLength,
            MeasureKind::NodesPerLevel => Statistic::NodesPerLevel,
            MeasureKind::LeavesPerLevel => Statistic::LeavesPerLevel,
            MeasureKind::InstancesPerLevel => Statistic::InstancesPerLevel,
            MeasureKind::ChildrenPerNodePerLevel => Statistic::ChildrenPerNodePerLevel,
            MeasureKind::NumberOfChildren => Statistic::NumberOfChildren,
            _ => return None,
        };
        Some(statistic)
    }
}

impl MeasureImplementation for Statistic {
    fn compute(&self, hierarchy: &dyn Hierarchy) -> Result<MeasureValue, MeasureError> {
        let profile = Profile::collect(hierarchy)?;
        let value = match self {
            Statistic::Nodes => MeasureValue::Scalar(profile.nodes as f64),
            Statistic::Leaves => MeasureValue::Scalar(profile.leaf_depths.len() as f64),
            Statistic::Height => MeasureValue::Scalar(profile.height() as f64),
            Statistic::AveragePathLength => {
                let (avg, stdev) = mean_and_sample_stdev(&profile.leaf_depths);
                MeasureValue::AvgWithStdev { avg, stdev }
            }
            Statistic::NodesPerLevel => MeasureValue::Histogram(profile.widths.clone()),
            Statistic::LeavesPerLevel => MeasureValue::Histogram(profile.leaves_per_level.clone()),
            Statistic::InstancesPerLevel => {
                MeasureValue::Histogram(profile.instances_per_level.clone())
            }
            Statistic::ChildrenPerNodePerLevel => MeasureValue::Histogram(
                profile
                    .children_per_level
                    .iter()
                    .zip(&profile.widths)
                    .map(|(children, width)| children / width)
                    .collect(),
            ),
            Statistic::NumberOfChildren => MeasureValue::Histogram(profile.branching_histogram()),
        };
        Ok(value)
    }
}

/// Per-level shape of a hierarchy gathered in one depth-first pass. Level 0
/// holds the root.
#[derive(Debug, Default)]
struct Profile {
    nodes: usize,
    leaf_depths: Vec<f64>,
    widths: Vec<f64>,
    leaves_per_level: Vec<f64>,
    instances_per_level: Vec<f64>,
    children_per_level: Vec<f64>,
    branching: BTreeMap<usize, usize>,
}

impl Profile {
    fn collect(hierarchy: &dyn Hierarchy) -> Result<Self, MeasureError> {
        let root = hierarchy
            .groups()
            .iter()
            .position(|group| group.parent.is_none())
            .ok_or_else(|| MeasureError::new("hierarchy has no root group"))?;

        let mut profile = Profile::default();
        let mut stack = vec![(root, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            let group = hierarchy
                .group(index)
                .ok_or_else(|| MeasureError::new(format!("dangling group index {}", index)))?;
            for &child in &group.children {
                stack.push((child, depth + 1));
            }
            profile.visit(depth, group.children.len(), group.instances.len());
        }
        Ok(profile)
    }

    fn visit(&mut self, depth: usize, children: usize, instances: usize) {
        if self.widths.len() <= depth {
            let levels = depth + 1;
            self.widths.resize(levels, 0.0);
            self.leaves_per_level.resize(levels, 0.0);
            self.instances_per_level.resize(levels, 0.0);
            self.children_per_level.resize(levels, 0.0);
        }
        self.nodes += 1;
        self.widths[depth] += 1.0;
        self.instances_per_level[depth] += instances as f64;
        self.children_per_level[depth] += children as f64;
        if children == 0 {
            self.leaves_per_level[depth] += 1.0;
            self.leaf_depths.push(depth as f64);
        }
        *self.branching.entry(children).or_insert(0) += 1;
    }

    fn height(&self) -> usize {
        self.widths.len().saturating_sub(1)
    }

    /// Node counts indexed by number of children, from zero up to the largest
    /// branching factor present.
    fn branching_histogram(&self) -> Vec<f64> {
        let max = self.branching.keys().next_back().copied().unwrap_or(0);
        (0..=max)
            .map(|children| self.branching.get(&children).copied().unwrap_or(0) as f64)
            .collect()
    }
}

fn mean_and_sample_stdev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() == 1 {
        return (mean, 0.0);
    }
    let squares: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();
    (mean, (squares / (n - 1.0)).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hiermeasure_core_types::{BasicHierarchy, Instance};

    // gen.0
    // ├── gen.0.0 (2 instances)
    // │   ├── gen.0.0.0
    // │   └── gen.0.0.1
    // ├── gen.0.1
    // └── gen.0.2
    fn sample() -> BasicHierarchy {
        let mut builder = BasicHierarchy::builder();
        builder.group("gen.0", None).unwrap();
        builder.group("gen.0.0", Some("gen.0")).unwrap();
        builder.group("gen.0.1", Some("gen.0")).unwrap();
        builder.group("gen.0.2", Some("gen.0")).unwrap();
        builder.group("gen.0.0.0", Some("gen.0.0")).unwrap();
        builder.group("gen.0.0.1", Some("gen.0.0")).unwrap();
        builder.instance("gen.0", Instance::new("r", vec![0.0]));
        builder.instance("gen.0.0", Instance::new("a", vec![1.0]));
        builder.instance("gen.0.0", Instance::new("b", vec![2.0]));
        builder.instance("gen.0.0.1", Instance::new("c", vec![3.0]));
        builder.build().unwrap()
    }

    fn compute(kind: MeasureKind) -> MeasureValue {
        StructuralLibrary
            .instantiate(&kind)
            .unwrap()
            .compute(&sample())
            .unwrap()
    }

    #[test]
    fn scalar_statistics() {
        assert_eq!(compute(MeasureKind::NumberOfNodes), MeasureValue::Scalar(6.0));
        assert_eq!(compute(MeasureKind::NumberOfLeaves), MeasureValue::Scalar(4.0));
        assert_eq!(compute(MeasureKind::Height), MeasureValue::Scalar(2.0));
    }

    #[test]
    fn average_path_length_uses_sample_deviation() {
        // leaf depths 1, 1, 2, 2
        let MeasureValue::AvgWithStdev { avg, stdev } = compute(MeasureKind::AveragePathLength)
        else {
            panic!("expected an average");
        };
        assert!((avg - 1.5).abs() < 1e-12);
        assert!((stdev - (1.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn per_level_histograms() {
        assert_eq!(
            compute(MeasureKind::NodesPerLevel),
            MeasureValue::Histogram(vec![1.0, 3.0, 2.0])
        );
        assert_eq!(
            compute(MeasureKind::LeavesPerLevel),
            MeasureValue::Histogram(vec![0.0, 2.0, 2.0])
        );
        assert_eq!(
            compute(MeasureKind::InstancesPerLevel),
            MeasureValue::Histogram(vec![1.0, 2.0, 1.0])
        );
        assert_eq!(
            compute(MeasureKind::ChildrenPerNodePerLevel),
            MeasureValue::Histogram(vec![3.0, 2.0 / 3.0, 0.0])
        );
    }

    #[test]
    fn branching_histogram_fills_gaps() {
        // four leaves, no node with one child, one with two, one with three
        assert_eq!(
            compute(MeasureKind::NumberOfChildren),
            MeasureValue::Histogram(vec![4.0, 0.0, 1.0, 1.0])
        );
    }

    #[test]
    fn single_node_hierarchy() {
        let mut builder = BasicHierarchy::builder();
        builder.group("gen.0", None).unwrap();
        let hierarchy = builder.build().unwrap();
        let value = StructuralLibrary
            .instantiate(&MeasureKind::AveragePathLength)
            .unwrap()
            .compute(&hierarchy)
            .unwrap();
        assert_eq!(value, MeasureValue::AvgWithStdev { avg: 0.0, stdev: 0.0 });
    }

    #[test]
    fn only_statistics_are_supported() {
        assert!(StructuralLibrary.supports(&MeasureKind::Height));
        assert!(!StructuralLibrary.supports(&MeasureKind::FlatClusterPurity));
        assert!(StructuralLibrary
            .instantiate(&MeasureKind::FlatClusterPurity)
            .is_err());
    }
}
