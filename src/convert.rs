use crate::error::{FdError, Result};
use crate::frame::{Cell, Frame};
use crate::schema::{DtypeGroups, IntWidth};

/// Casts a frame's columns to their declared types in place. Empty
/// groups are a no-op; columns outside the schema are never touched.
/// A value that cannot be represented in its target type is an error,
/// never a silent truncation.
pub fn convert_dtypes(frame: &mut Frame, groups: &DtypeGroups) -> Result<()> {
    for (name, width) in &groups.integer {
        convert_column(frame, name, Target::Int(*width))?;
    }
    for name in &groups.float {
        convert_column(frame, name, Target::Float)?;
    }
    for name in &groups.text {
        convert_column(frame, name, Target::Text)?;
    }
    Ok(())
}

/// The forgiving parse applied to known-dirty numeric columns before
/// joining (BLS SM's `value`): unparseable text becomes `Null` instead
/// of failing the fragment.
pub fn coerce_numeric_lenient(frame: &mut Frame, column: &str) -> Result<()> {
    let idx = frame.column_index(column).ok_or_else(|| {
        FdError::SchemaMismatch(format!("lenient numeric column '{}' not found", column))
    })?;
    frame.map_column(idx, |cell| {
        *cell = match &*cell {
            Cell::Text(s) => match s.trim().parse::<f32>() {
                Ok(v) => Cell::Float(v),
                Err(_) => Cell::Null,
            },
            Cell::Int(i) => Cell::Float(*i as f32),
            other => other.clone(),
        };
        Ok(())
    })
}

#[derive(Clone, Copy)]
enum Target {
    Int(IntWidth),
    Float,
    Text,
}

impl Target {
    fn name(&self) -> &'static str {
        match self {
            Target::Int(width) => width.name(),
            Target::Float => "float32",
            Target::Text => "text",
        }
    }
}

fn convert_column(frame: &mut Frame, column: &str, target: Target) -> Result<()> {
    let idx = frame.column_index(column).ok_or_else(|| {
        FdError::SchemaMismatch(format!("declared column '{}' not found in data", column))
    })?;
    frame.map_column(idx, |cell| {
        *cell = convert_cell(cell, column, target)?;
        Ok(())
    })
}

fn convert_cell(cell: &Cell, column: &str, target: Target) -> Result<Cell> {
    // Missing values stay missing under every target type.
    if cell.is_null() {
        return Ok(Cell::Null);
    }
    match target {
        Target::Int(width) => {
            let value = match cell {
                Cell::Int(i) => *i,
                Cell::Text(s) => s
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| conversion_error(column, s, target))?,
                Cell::Float(f) => {
                    // Only exactly-integral floats survive an integer cast.
                    if f.fract() == 0.0 {
                        *f as i64
                    } else {
                        return Err(conversion_error(column, &f.to_string(), target));
                    }
                }
                Cell::Null => unreachable!(),
            };
            if !width.contains(value) {
                return Err(conversion_error(column, &value.to_string(), target));
            }
            Ok(Cell::Int(value))
        }
        Target::Float => {
            let value = match cell {
                Cell::Float(f) => *f,
                Cell::Int(i) => *i as f32,
                Cell::Text(s) => s
                    .trim()
                    .parse::<f32>()
                    .map_err(|_| conversion_error(column, s, target))?,
                Cell::Null => unreachable!(),
            };
            Ok(Cell::Float(value))
        }
        Target::Text => {
            let value = match cell {
                Cell::Text(s) => s.clone(),
                Cell::Int(i) => i.to_string(),
                Cell::Float(f) => f.to_string(),
                Cell::Null => unreachable!(),
            };
            Ok(Cell::Text(value))
        }
    }
}

fn conversion_error(column: &str, value: &str, target: Target) -> FdError {
    FdError::Conversion {
        column: column.to_string(),
        value: value.to_string(),
        target: target.name().to_string(),
    }
}
