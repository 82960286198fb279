/// Storage width for integer columns. The narrow widths only suit
/// genuinely small-range columns (short codes encoded numerically);
/// year columns need `I16` or wider, so the width is part of each
/// dataset's schema rather than a global constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    I8,
    I16,
    I32,
}

impl IntWidth {
    pub fn contains(&self, value: i64) -> bool {
        match self {
            IntWidth::I8 => i8::try_from(value).is_ok(),
            IntWidth::I16 => i16::try_from(value).is_ok(),
            IntWidth::I32 => i32::try_from(value).is_ok(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IntWidth::I8 => "int8",
            IntWidth::I16 => "int16",
            IntWidth::I32 => "int32",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer(IntWidth),
    Float,
    Text,
}

/// Declared column types for one dataset's consolidated output.
/// Immutable after construction; columns not listed here are left
/// untouched by coercion.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<(&'static str, ColumnType)>,
}

/// Column names partitioned by declared type, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct DtypeGroups {
    pub integer: Vec<(&'static str, IntWidth)>,
    pub float: Vec<&'static str>,
    pub text: Vec<&'static str>,
}

impl Schema {
    pub fn new(columns: Vec<(&'static str, ColumnType)>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[(&'static str, ColumnType)] {
        &self.columns
    }

    /// Splits the declared columns into three disjoint groups by type.
    /// Pure function over static configuration; a type with no columns
    /// yields an empty group.
    pub fn partition(&self) -> DtypeGroups {
        let mut groups = DtypeGroups::default();
        for (name, ty) in &self.columns {
            match ty {
                ColumnType::Integer(width) => groups.integer.push((*name, *width)),
                ColumnType::Float => groups.float.push(*name),
                ColumnType::Text => groups.text.push(*name),
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_preserves_declaration_order() {
        let schema = Schema::new(vec![
            ("year", ColumnType::Integer(IntWidth::I16)),
            ("value", ColumnType::Float),
            ("series_id", ColumnType::Text),
            ("period", ColumnType::Text),
            ("begin_year", ColumnType::Integer(IntWidth::I16)),
        ]);
        let groups = schema.partition();
        assert_eq!(
            groups.integer,
            vec![("year", IntWidth::I16), ("begin_year", IntWidth::I16)]
        );
        assert_eq!(groups.float, vec!["value"]);
        assert_eq!(groups.text, vec!["series_id", "period"]);
    }

    #[test]
    fn partition_allows_empty_groups() {
        let schema = Schema::new(vec![("area_fips", ColumnType::Text)]);
        let groups = schema.partition();
        assert!(groups.integer.is_empty());
        assert!(groups.float.is_empty());
        assert_eq!(groups.text, vec!["area_fips"]);
    }

    #[test]
    fn widths_check_ranges() {
        assert!(IntWidth::I8.contains(127));
        assert!(!IntWidth::I8.contains(128));
        assert!(IntWidth::I16.contains(2024));
        assert!(!IntWidth::I16.contains(40000));
        assert!(IntWidth::I32.contains(40000));
    }
}
