//! Row normalization against the destination table schema
//!
//! Applies per-row transformations (whitespace trimming, empty-to-default
//! coercion, type coercion) and produces a row ready for submission, or a
//! rejection with a reason. Rejections are row-local data; normalization
//! never fails the run and never stops processing of subsequent lines.

use std::sync::Arc;

use crate::app::models::{
    Column, ColumnType, FieldValue, NormalizedRow, RawLine, RejectReason, Rejection,
};

/// Normalizes raw records into typed rows for one destination table
#[derive(Debug, Clone)]
pub struct RowNormalizer {
    schema: Arc<crate::app::models::TableSchema>,
    trim_whitespace: bool,
}

impl RowNormalizer {
    pub fn new(schema: Arc<crate::app::models::TableSchema>, trim_whitespace: bool) -> Self {
        Self {
            schema,
            trim_whitespace,
        }
    }

    /// Normalize one raw record, consuming it.
    ///
    /// Trimming, when enabled, is applied to every field before any other
    /// processing, so `" 5 "` and `"5"` normalize identically.
    pub fn normalize(&self, raw: RawLine) -> Result<NormalizedRow, Rejection> {
        let line_number = raw.line_number;

        if raw.fields.len() != self.schema.column_count() {
            return Err(Rejection::new(
                line_number,
                raw.fields.join(","),
                RejectReason::FieldCountMismatch {
                    expected: self.schema.column_count(),
                    found: raw.fields.len(),
                },
            ));
        }

        let mut values = Vec::with_capacity(raw.fields.len());
        for (field, column) in raw.fields.iter().zip(&self.schema.columns) {
            let field = if self.trim_whitespace {
                field.trim()
            } else {
                field.as_str()
            };

            match self.coerce(field, column) {
                Ok(value) => values.push(value),
                Err(reason) => {
                    return Err(Rejection::new(line_number, raw.fields.join(","), reason));
                }
            }
        }

        Ok(NormalizedRow {
            line_number,
            values,
        })
    }

    /// Coerce one field to the column's declared type.
    ///
    /// An empty field takes the column default if declared, NULL if the
    /// column is nullable, and is otherwise a missing required value.
    fn coerce(&self, field: &str, column: &Column) -> Result<FieldValue, RejectReason> {
        if field.is_empty() {
            if let Some(default) = &column.default {
                return Ok(default.clone());
            }
            if column.nullable {
                return Ok(FieldValue::Null);
            }
            return Err(RejectReason::MissingRequiredValue {
                column: column.name.clone(),
            });
        }

        match column.column_type {
            ColumnType::Integer => field
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| RejectReason::TypeMismatch {
                    column: column.name.clone(),
                    value: field.to_string(),
                }),
            ColumnType::Float => field
                .parse::<f64>()
                .map(FieldValue::Float)
                .map_err(|_| RejectReason::TypeMismatch {
                    column: column.name.clone(),
                    value: field.to_string(),
                }),
            ColumnType::Text => Ok(FieldValue::Text(field.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::TableSchema;

    fn schema() -> Arc<TableSchema> {
        Arc::new(TableSchema::new(
            "blah",
            vec![
                Column::with_default("clm_integer", ColumnType::Integer, FieldValue::Integer(0)),
                Column::nullable("clm_name", ColumnType::Text),
                Column::required("clm_value", ColumnType::Float),
            ],
        ))
    }

    fn raw(fields: &[&str]) -> RawLine {
        RawLine {
            line_number: 7,
            fields: fields.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn normalizes_typed_fields() {
        let normalizer = RowNormalizer::new(schema(), false);
        let row = normalizer.normalize(raw(&["5", "foo", "1.5"])).unwrap();

        assert_eq!(row.line_number, 7);
        assert_eq!(
            row.values,
            vec![
                FieldValue::Integer(5),
                FieldValue::Text("foo".to_string()),
                FieldValue::Float(1.5),
            ]
        );
    }

    #[test]
    fn trimming_strips_surrounding_whitespace() {
        let normalizer = RowNormalizer::new(schema(), true);
        let trimmed = normalizer.normalize(raw(&[" 5 ", " foo ", "1.5"])).unwrap();
        let plain = normalizer.normalize(raw(&["5", "foo", "1.5"])).unwrap();
        assert_eq!(trimmed.values, plain.values);
    }

    #[test]
    fn untrimmed_numeric_field_with_whitespace_is_a_type_mismatch() {
        let normalizer = RowNormalizer::new(schema(), false);
        let rejection = normalizer.normalize(raw(&[" 5 ", "foo", "1.5"])).unwrap_err();
        assert!(matches!(
            rejection.reason,
            RejectReason::TypeMismatch { .. }
        ));
    }

    #[test]
    fn empty_field_takes_declared_default() {
        let normalizer = RowNormalizer::new(schema(), false);
        let row = normalizer.normalize(raw(&["", "foo", "1.5"])).unwrap();
        assert_eq!(row.values[0], FieldValue::Integer(0));
    }

    #[test]
    fn empty_field_becomes_null_for_nullable_column() {
        let normalizer = RowNormalizer::new(schema(), false);
        let row = normalizer.normalize(raw(&["5", "", "1.5"])).unwrap();
        assert_eq!(row.values[1], FieldValue::Null);
    }

    #[test]
    fn empty_required_field_is_rejected() {
        let normalizer = RowNormalizer::new(schema(), false);
        let rejection = normalizer.normalize(raw(&["5", "foo", ""])).unwrap_err();
        assert_eq!(rejection.line_number, 7);
        assert_eq!(
            rejection.reason,
            RejectReason::MissingRequiredValue {
                column: "clm_value".to_string()
            }
        );
    }

    #[test]
    fn whitespace_only_required_field_is_rejected_when_trimming() {
        let normalizer = RowNormalizer::new(schema(), true);
        let rejection = normalizer.normalize(raw(&["5", "foo", "  "])).unwrap_err();
        assert!(matches!(
            rejection.reason,
            RejectReason::MissingRequiredValue { .. }
        ));
    }

    #[test]
    fn non_numeric_text_for_numeric_column_is_rejected() {
        let normalizer = RowNormalizer::new(schema(), false);
        let rejection = normalizer.normalize(raw(&["abc", "foo", "1.5"])).unwrap_err();
        assert_eq!(
            rejection.reason,
            RejectReason::TypeMismatch {
                column: "clm_integer".to_string(),
                value: "abc".to_string()
            }
        );
    }
}
