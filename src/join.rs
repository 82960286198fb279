use crate::error::{FdError, Result};
use crate::frame::{Cell, Frame};
use std::collections::HashMap;

/// Left-outer join preserving the left side's row order and count.
///
/// The right side must be cardinality-1 on the key tuple; duplicate
/// keys fail fast instead of silently multiplying rows. Right-side key
/// columns are dropped from the result (the left side keeps its own),
/// and every right-side descriptive column is appended, `Null`-filled
/// where no match exists. Rows whose key contains a missing value
/// never match.
pub fn left_outer_join(left: &Frame, right: &Frame, keys: &[&str]) -> Result<Frame> {
    let left_key_idx = key_indices(left, keys, "left")?;
    let right_key_idx = key_indices(right, keys, "right")?;

    // Right-side columns carried into the result.
    let keep: Vec<usize> = (0..right.columns().len())
        .filter(|i| !right_key_idx.contains(i))
        .collect();
    for &i in &keep {
        let name = &right.columns()[i];
        if left.has_column(name) {
            return Err(FdError::SchemaMismatch(format!(
                "join would duplicate column '{}'; declare a rename before this join",
                name
            )));
        }
    }

    let index = unique_key_index(right, &right_key_idx, keys)?;

    let mut columns: Vec<String> = left.columns().to_vec();
    columns.extend(keep.iter().map(|&i| right.columns()[i].clone()));
    let mut out = Frame::new(columns);

    for row in left.rows() {
        let mut enriched = row.clone();
        let matched = key_of(row, &left_key_idx).and_then(|k| index.get(&k));
        match matched {
            Some(&ri) => {
                let right_row = &right.rows()[ri];
                enriched.extend(keep.iter().map(|&i| right_row[i].clone()));
            }
            None => enriched.extend(keep.iter().map(|_| Cell::Null)),
        }
        out.push_row(enriched);
    }
    Ok(out)
}

/// Checks that a reference table is usable for joining on `keys`:
/// non-empty, keys present, and unique on the key tuple. Run once at
/// reference-load time so bad inputs fail before any fragment streams.
pub fn validate_reference(frame: &Frame, keys: &[&str], name: &str) -> Result<()> {
    if frame.is_empty() {
        return Err(FdError::SchemaMismatch(format!(
            "reference table '{}' is empty",
            name
        )));
    }
    let key_idx = key_indices(frame, keys, name)?;
    unique_key_index(frame, &key_idx, keys)?;
    Ok(())
}

fn key_indices(frame: &Frame, keys: &[&str], side: &str) -> Result<Vec<usize>> {
    keys.iter()
        .map(|key| {
            frame.column_index(key).ok_or_else(|| {
                FdError::SchemaMismatch(format!("join key '{}' missing from {} side", key, side))
            })
        })
        .collect()
}

fn key_of(row: &[Cell], key_idx: &[usize]) -> Option<Vec<String>> {
    key_idx.iter().map(|&i| row[i].key_text()).collect()
}

fn unique_key_index(
    frame: &Frame,
    key_idx: &[usize],
    keys: &[&str],
) -> Result<HashMap<Vec<String>, usize>> {
    let mut index = HashMap::with_capacity(frame.len());
    for (ri, row) in frame.rows().iter().enumerate() {
        if let Some(key) = key_of(row, key_idx) {
            if index.insert(key.clone(), ri).is_some() {
                return Err(FdError::SchemaMismatch(format!(
                    "duplicate key {:?} on {:?} in reference table",
                    key, keys
                )));
            }
        }
    }
    Ok(index)
}
