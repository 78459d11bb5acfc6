use dashmap::DashMap;
use hiermeasure_core_types::{HierarchyId, MeasureId, MeasureValue};

use crate::model::MeasureKey;

/// Thread-safe store of computed measure values per hierarchy.
#[derive(Debug, Default)]
pub struct ResultHolder {
    results: DashMap<MeasureKey, MeasureValue>,
}

impl ResultHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, hierarchy: &HierarchyId, measure: &MeasureId, value: MeasureValue) {
        self.results
            .insert(MeasureKey::new(hierarchy.clone(), measure.clone()), value);
    }

    pub fn get(&self, hierarchy: &HierarchyId, measure: &MeasureId) -> Option<MeasureValue> {
        self.results
            .get(&MeasureKey::new(hierarchy.clone(), measure.clone()))
            .map(|entry| entry.value().clone())
    }

    pub fn get_or(
        &self,
        hierarchy: &HierarchyId,
        measure: &MeasureId,
        default: MeasureValue,
    ) -> MeasureValue {
        self.get(hierarchy, measure).unwrap_or(default)
    }

    pub fn is_computed(&self, hierarchy: &HierarchyId, measure: &MeasureId) -> bool {
        self.results
            .contains_key(&MeasureKey::new(hierarchy.clone(), measure.clone()))
    }

    /// Every value stored for `hierarchy`, sorted by measure id.
    pub fn computed_for(&self, hierarchy: &HierarchyId) -> Vec<(MeasureId, MeasureValue)> {
        let mut values: Vec<(MeasureId, MeasureValue)> = self
            .results
            .iter()
            .filter(|entry| &entry.key().hierarchy == hierarchy)
            .map(|entry| (entry.key().measure.clone(), entry.value().clone()))
            .collect();
        values.sort_by(|left, right| left.0.cmp(&right.0));
        values
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn clear(&self) {
        self.results.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_values_per_hierarchy() {
        let holder = ResultHolder::new();
        let first = HierarchyId::new();
        let second = HierarchyId::new();
        let height = MeasureId::from("Height");
        let nodes = MeasureId::from("Number of Nodes");

        holder.put(&first, &nodes, MeasureValue::Scalar(7.0));
        holder.put(&first, &height, MeasureValue::Scalar(2.0));
        holder.put(&second, &height, MeasureValue::Scalar(4.0));

        assert!(holder.is_computed(&first, &height));
        assert!(!holder.is_computed(&second, &nodes));
        assert_eq!(
            holder.get_or(&second, &nodes, MeasureValue::Histogram(Vec::new())),
            MeasureValue::Histogram(Vec::new())
        );
        let ids: Vec<String> = holder
            .computed_for(&first)
            .into_iter()
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(ids, vec!["Height", "Number of Nodes"]);

        holder.clear();
        assert!(holder.is_empty());
    }
}
