use hiermeasure_core_types::Hierarchy;
use hiermeasure_registry::MeasureDescriptor;
use tracing::debug;

/// Applies the descriptor's applicability rule. Only the rule runs; the
/// measure implementation is never touched.
pub fn admits(descriptor: &MeasureDescriptor, hierarchy: &dyn Hierarchy) -> bool {
    let applicable = descriptor.is_applicable(hierarchy);
    if !applicable {
        debug!(
            target: "dispatcher",
            measure = %descriptor.id(),
            hierarchy = %hierarchy.id(),
            "measure not applicable"
        );
    }
    applicable
}

