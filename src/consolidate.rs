use crate::convert::{coerce_numeric_lenient, convert_dtypes};
use crate::error::{FdError, Result};
use crate::frame::{Cell, Frame};
use crate::join::{left_outer_join, validate_reference};
use crate::loader::{load_table, stream_chunks};
use crate::registry::DatasetSpec;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::{info, warn};

/// Driver lifecycle. `Failed` is terminal and reachable from any
/// state; partially-written output is left on disk, so a retry needs a
/// fresh `data.csv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Uninitialized,
    ReferenceLoaded,
    Streaming,
    Finalized,
    Failed,
}

/// Single-pass, single-threaded consolidation of one dataset.
///
/// Reference tables are loaded once and held for the whole run; the
/// fact table streams through in bounded fragments, each enriched,
/// coerced and appended before the next is read. Peak memory is the
/// sum of the reference tables plus one fragment, independent of the
/// fact table's total size.
pub struct Consolidator<'a> {
    spec: &'a DatasetSpec,
    dir: PathBuf,
    chunk_size: usize,
    state: RunState,
    references: HashMap<&'static str, Frame>,
}

impl<'a> Consolidator<'a> {
    pub fn new(spec: &'a DatasetSpec, dir: impl Into<PathBuf>) -> Self {
        Self {
            spec,
            dir: dir.into(),
            chunk_size: spec.consolidate.chunk_size,
            state: RunState::Uninitialized,
            references: HashMap::new(),
        }
    }

    /// Overrides the dataset's default fragment size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Runs the full consolidation: load references, stream fragments,
    /// finalize. Any error leaves the driver in `Failed` with whatever
    /// output was already appended still on disk.
    pub fn run(&mut self) -> Result<()> {
        if self.state != RunState::Uninitialized {
            return Err(FdError::State(format!(
                "consolidation of {} already ran",
                self.spec.id
            )));
        }
        let result = self.load_references().and_then(|_| self.stream());
        match result {
            Ok(()) => {
                self.state = RunState::Finalized;
                info!(dataset = self.spec.id, "consolidation finalized");
                Ok(())
            }
            Err(e) => {
                self.state = RunState::Failed;
                Err(e)
            }
        }
    }

    /// `Uninitialized -> ReferenceLoaded`: materialize every reference
    /// table, apply declared renames, run the reference-building joins
    /// in order, then fail fast if any table a fact join needs is
    /// empty, missing its key columns, or duplicated on its key.
    fn load_references(&mut self) -> Result<()> {
        for plan in &self.spec.consolidate.references {
            let mut frame = load_table(&plan.base, &self.dir)?;
            for (from, to) in plan.renames {
                frame.rename_if_present(from, to);
            }
            for join in &plan.joins {
                let lookup = load_table(&join.source, &self.dir)?;
                frame = left_outer_join(&frame, &lookup, join.on)?;
            }
            info!(
                dataset = self.spec.id,
                reference = plan.name,
                rows = frame.len(),
                "reference table loaded"
            );
            self.references.insert(plan.name, frame);
        }

        for fact in &self.spec.consolidate.facts {
            for join in &fact.joins {
                let frame = self.references.get(join.reference).ok_or_else(|| {
                    FdError::SchemaMismatch(format!(
                        "fact join names unknown reference '{}'",
                        join.reference
                    ))
                })?;
                validate_reference(frame, join.on, join.reference)?;
            }
        }
        self.state = RunState::ReferenceLoaded;
        Ok(())
    }

    /// `ReferenceLoaded -> Streaming`: enrich, coerce and append each
    /// fragment in read order. The header is written exactly once,
    /// before the first fragment's rows.
    fn stream(&mut self) -> Result<()> {
        self.state = RunState::Streaming;
        let plan = &self.spec.consolidate;
        let groups = self.spec.schema.partition();
        let references = &self.references;

        let out_path = self.dir.join("data.csv");
        if out_path.exists() {
            warn!(
                path = %out_path.display(),
                "output file already exists; rows will be appended after the existing content"
            );
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&out_path)?;
        let mut writer = csv::Writer::from_writer(file);

        let mut header_written = false;
        let mut expected_columns: Option<Vec<String>> = None;
        let mut rows_written = 0usize;

        for fact in &plan.facts {
            stream_chunks(&fact.source, &self.dir, self.chunk_size, |mut frame| {
                for (from, to) in fact.renames {
                    frame.rename_if_present(from, to);
                }
                for column in fact.lenient_numeric {
                    coerce_numeric_lenient(&mut frame, column)?;
                }
                for join in &fact.joins {
                    let reference = references.get(join.reference).ok_or_else(|| {
                        FdError::SchemaMismatch(format!(
                            "unknown reference '{}'",
                            join.reference
                        ))
                    })?;
                    frame = left_outer_join(&frame, reference, join.on)?;
                }

                let mut frame = match plan.output_columns {
                    Some(columns) => frame.project(columns),
                    None => {
                        match &expected_columns {
                            None => expected_columns = Some(frame.columns().to_vec()),
                            Some(expected) => {
                                if frame.columns() != expected.as_slice() {
                                    return Err(FdError::SchemaMismatch(format!(
                                        "fragment columns diverge from first fragment: {:?} vs {:?}",
                                        frame.columns(),
                                        expected
                                    )));
                                }
                            }
                        }
                        frame
                    }
                };

                convert_dtypes(&mut frame, &groups)?;
                append_frame(&mut writer, &frame, &mut header_written)?;
                rows_written += frame.len();
                Ok(())
            })?;
        }
        writer.flush()?;
        info!(
            dataset = self.spec.id,
            rows = rows_written,
            output = %out_path.display(),
            "fact stream exhausted"
        );
        Ok(())
    }
}

fn append_frame(
    writer: &mut csv::Writer<std::fs::File>,
    frame: &Frame,
    header_written: &mut bool,
) -> Result<()> {
    if !*header_written {
        writer.write_record(frame.columns())?;
        *header_written = true;
    }
    for row in frame.rows() {
        writer.write_record(row.iter().map(format_cell))?;
    }
    Ok(())
}

/// Output formatting: floats always carry two decimal digits, missing
/// values are empty fields.
fn format_cell(cell: &Cell) -> String {
    match cell {
        Cell::Null => String::new(),
        Cell::Int(i) => i.to_string(),
        Cell::Float(f) => format!("{:.2}", f),
        Cell::Text(s) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_are_formatted_with_two_decimals() {
        assert_eq!(format_cell(&Cell::Float(3.0)), "3.00");
        assert_eq!(format_cell(&Cell::Float(12.345)), "12.35");
        assert_eq!(format_cell(&Cell::Int(7)), "7");
        assert_eq!(format_cell(&Cell::Null), "");
    }
}
