use std::io::Write;

use csv::WriterBuilder;
use hiermeasure_core_types::{HierarchyId, MeasureValue};
use hiermeasure_registry::Registry;

use crate::error::SchedulerError;
use crate::holder::ResultHolder;

/// Writes the values stored for `hierarchy` as a semicolon separated report.
///
/// Layout, in registry order:
/// - a header row of `<id>;stdev;` pairs followed by one value row, for
///   scalar and average-with-deviation results;
/// - one block per histogram: the id, a row of bin indices, a row of values
///   and a row of zero deviations;
/// - one block per textual or contingency-count result: the id and its text.
///
/// Blocks are separated by an empty line. Measures without a stored value
/// are left out.
pub fn dump_measures<W, R>(
    mut writer: W,
    holder: &ResultHolder,
    hierarchy: &HierarchyId,
    registry: &R,
) -> Result<(), SchedulerError>
where
    W: Write,
    R: Registry + ?Sized,
{
    let values: Vec<(String, MeasureValue)> = registry
        .all()
        .iter()
        .filter_map(|descriptor| {
            holder
                .get(hierarchy, descriptor.id())
                .map(|value| (descriptor.id().to_string(), value))
        })
        .collect();

    let mut header = Vec::new();
    let mut row = Vec::new();
    for (id, value) in &values {
        let (avg, stdev) = match value {
            MeasureValue::Scalar(value) => (*value, 0.0),
            MeasureValue::AvgWithStdev { avg, stdev } => (*avg, *stdev),
            _ => continue,
        };
        header.push(id.clone());
        header.push("stdev".to_string());
        row.push(number(avg));
        row.push(number(stdev));
    }
    if header.is_empty() {
        writer.write_all(b"\n\n")?;
    } else {
        header.push(String::new());
        row.push(String::new());
        write_rows(&mut writer, [header, row])?;
    }
    writer.write_all(b"\n")?;

    for (id, value) in &values {
        let MeasureValue::Histogram(bins) = value else {
            continue;
        };
        if bins.is_empty() {
            continue;
        }
        write_rows(
            &mut writer,
            [
                vec![id.clone()],
                trailing((0..bins.len()).map(|index| index.to_string())),
                trailing(bins.iter().map(|bin| number(*bin))),
                trailing(bins.iter().map(|_| number(0.0))),
            ],
        )?;
        writer.write_all(b"\n")?;
    }

    for (id, value) in &values {
        let text = match value {
            MeasureValue::Text(text) => text.clone(),
            MeasureValue::Counts(counts) => counts.render(),
            _ => continue,
        };
        write_rows(&mut writer, [vec![id.clone()]])?;
        writer.write_all(text.as_bytes())?;
        writer.write_all(b"\n\n")?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes one block of `;` separated records and releases the writer.
fn write_rows<W, I>(writer: &mut W, rows: I) -> Result<(), SchedulerError>
where
    W: Write,
    I: IntoIterator<Item = Vec<String>>,
{
    let mut out = WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_writer(writer);
    for row in rows {
        out.write_record(&row)?;
    }
    out.flush()?;
    Ok(())
}

/// Row fields followed by an empty field, which renders the trailing `;`.
fn trailing(fields: impl Iterator<Item = String>) -> Vec<String> {
    let mut row: Vec<String> = fields.collect();
    row.push(String::new());
    row
}

/// Whole numbers keep one decimal so every cell reads as a real value.
fn number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hiermeasure_core_types::{Hierarchy, HypothesisCounts, MeasureError, MeasureId};
    use hiermeasure_registry::{MeasureDescriptor, MeasureImplementation, RegistryImpl};
    use std::sync::Arc;

    fn register(registry: &RegistryImpl, id: &str) {
        let implementation: Arc<dyn MeasureImplementation> =
            Arc::new(|_: &dyn Hierarchy| -> Result<MeasureValue, MeasureError> {
                Ok(MeasureValue::Scalar(0.0))
            });
        registry
            .register(
                MeasureDescriptor::builder(id)
                    .implementation(implementation)
                    .build()
                    .unwrap(),
            )
            .unwrap();
    }

    #[test]
    fn writes_scalars_histograms_and_text() {
        let registry = RegistryImpl::new();
        for id in ["Height", "Average Path Length", "Nodes Per Level", "Partial Order Hypothesis", "Unset"] {
            register(&registry, id);
        }
        let holder = ResultHolder::new();
        let hierarchy = HierarchyId::new();
        holder.put(&hierarchy, &MeasureId::from("Height"), MeasureValue::Scalar(3.0));
        holder.put(
            &hierarchy,
            &MeasureId::from("Average Path Length"),
            MeasureValue::AvgWithStdev { avg: 2.5, stdev: 0.5 },
        );
        holder.put(
            &hierarchy,
            &MeasureId::from("Nodes Per Level"),
            MeasureValue::Histogram(vec![1.0, 2.0]),
        );
        holder.put(
            &hierarchy,
            &MeasureId::from("Partial Order Hypothesis"),
            MeasureValue::Counts(HypothesisCounts::new(1, 2, 3, 4)),
        );

        let mut buffer = Vec::new();
        dump_measures(&mut buffer, &holder, &hierarchy, &registry).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let expected = "Height;stdev;Average Path Length;stdev;\n\
                        3.0;0.0;2.5;0.5;\n\
                        \n\
                        Nodes Per Level\n\
                        0;1;\n\
                        1.0;2.0;\n\
                        0.0;0.0;\n\
                        \n\
                        Partial Order Hypothesis\n\
                        TP: 1\nFP: 2\nTN: 3\nFN: 4\n\
                        \n";
        assert_eq!(text, expected);
    }

    #[test]
    fn text_only_report_keeps_empty_scalar_block() {
        let registry = RegistryImpl::new();
        register(&registry, "Label");
        let holder = ResultHolder::new();
        let hierarchy = HierarchyId::new();
        holder.put(
            &hierarchy,
            &MeasureId::from("Label"),
            MeasureValue::Text("flat".to_string()),
        );

        let mut buffer = Vec::new();
        dump_measures(&mut buffer, &holder, &hierarchy, &registry).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "\n\n\nLabel\nflat\n\n");
    }
}
