//! Raw records and their coercion into a typed [`DatasetFrame`].
//!
//! Input arrives as a [`RawTable`] of untyped cells (text, numbers, booleans
//! or nulls). [`DatasetFrame::coerce`] validates it once against a list of
//! [`FieldSpec`]s and produces typed columns:
//!
//! - **Numeric** fields parse to `f64`; unparsable or blank cells become
//!   missing (`None`), never zero.
//! - **Categorical** fields keep their text form; missing cells are replaced
//!   by a sentinel label so that "not recorded" stays visible as a category.
//! - The single **outcome** field becomes a boolean. A cell is positive when
//!   its text *contains* the configured marker, so encodings such as
//!   `"是(已完成)"` still count as positive. Rows with a missing outcome are
//!   dropped.
//!
//! After coercion the frame is immutable; filters such as
//! [`DatasetFrame::complete_cases`] return new frames.

use std::{borrow::Cow, collections::HashSet};

use serde::{Deserialize, Serialize};

/// Label used for missing categorical cells unless overridden.
pub const DEFAULT_SENTINEL: &str = "未标注";
/// Substring marking a positive outcome unless overridden.
pub const DEFAULT_POSITIVE_MARKER: &str = "是";

/// Category labels of the outcome when it is treated as a categorical column.
pub const OUTCOME_POSITIVE_LABEL: &str = "1";
pub const OUTCOME_NEGATIVE_LABEL: &str = "0";

/// A single untyped cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Text form of the cell, or `None` for nulls and blank text.
    #[must_use]
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            RawValue::Null => None,
            RawValue::Bool(b) => Some(Cow::Owned(b.to_string())),
            RawValue::Number(n) => Some(Cow::Owned(n.to_string())),
            RawValue::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then_some(Cow::Borrowed(trimmed))
            }
        }
    }

    /// Numeric value of the cell, or `None` when it cannot be parsed.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            RawValue::Null => return None,
            RawValue::Bool(b) => f64::from(u8::from(*b)),
            RawValue::Number(n) => *n,
            RawValue::Text(s) => s.trim().parse().ok()?,
        };
        n.is_finite().then_some(n)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_owned())
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

/// Untyped rows sharing one column set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<RawValue>>,
}

impl RawTable {
    /// Builds a table from record-shaped rows (`field name → value`).
    ///
    /// Field names are trimmed. Columns appear in first-seen order and a field
    /// absent from a record reads as [`RawValue::Null`].
    ///
    /// # Examples
    ///
    /// ```
    /// use trainsight_analysis::frame::{RawTable, RawValue};
    ///
    /// let table = RawTable::from_records([
    ///     vec![(" 是否学习 ".to_owned(), RawValue::from("是"))],
    ///     vec![("年龄".to_owned(), RawValue::from(31.0))],
    /// ]);
    /// assert_eq!(table.columns(), ["是否学习", "年龄"]);
    /// assert_eq!(table.rows()[1][0], RawValue::Null);
    /// ```
    pub fn from_records<R, F>(records: R) -> Self
    where
        R: IntoIterator<Item = F>,
        F: IntoIterator<Item = (String, RawValue)>,
    {
        let mut columns: Vec<String> = vec![];
        let mut sparse_rows = vec![];
        for record in records {
            let mut cells = vec![];
            for (name, value) in record {
                let name = name.trim();
                let index = match columns.iter().position(|c| c == name) {
                    Some(index) => index,
                    None => {
                        columns.push(name.to_owned());
                        columns.len() - 1
                    }
                };
                cells.push((index, value));
            }
            sparse_rows.push(cells);
        }

        let rows = sparse_rows
            .into_iter()
            .map(|cells| {
                let mut row = vec![RawValue::Null; columns.len()];
                for (index, value) in cells {
                    row[index] = value;
                }
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Builds a table from a header and positional rows.
    ///
    /// Short rows are padded with nulls and long rows truncated.
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<RawValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, RawValue::Null);
                row
            })
            .collect();
        let columns = columns.into_iter().map(|c| c.trim().to_owned()).collect();
        Self { columns, rows }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<RawValue>] {
        &self.rows
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Numeric,
    Categorical,
    Outcome,
}

/// What to do with a missing cell.
///
/// The outcome field always drops rows regardless of this setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Keep the row: numeric cells become `None`, categorical cells the sentinel.
    #[default]
    Retain,
    /// Drop the whole row.
    DropRow,
}

/// Declared type of one input column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub missing: MissingPolicy,
    /// Overrides [`CoercionOptions::sentinel`] for this categorical field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentinel: Option<String>,
}

impl FieldSpec {
    #[must_use]
    pub fn numeric(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Numeric)
    }

    #[must_use]
    pub fn categorical(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Categorical)
    }

    #[must_use]
    pub fn outcome(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Outcome)
    }

    fn with_kind(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            missing: MissingPolicy::Retain,
            sentinel: None,
        }
    }

    #[must_use]
    pub fn drop_missing(mut self) -> Self {
        self.missing = MissingPolicy::DropRow;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoercionOptions {
    /// Substring whose presence marks a positive outcome.
    pub positive_marker: String,
    /// Label substituted for missing categorical cells.
    pub sentinel: String,
}

impl Default for CoercionOptions {
    fn default() -> Self {
        Self {
            positive_marker: DEFAULT_POSITIVE_MARKER.to_owned(),
            sentinel: DEFAULT_SENTINEL.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SchemaError {
    #[display("field '{name}' is declared but not present in the input")]
    MissingField { name: String },
    #[display("no field is declared as the outcome")]
    NoOutcomeField,
    #[display("fields '{first}' and '{second}' are both declared as the outcome")]
    MultipleOutcomeFields { first: String, second: String },
    #[display("field '{name}' is declared more than once")]
    DuplicateField { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum FrameError {
    #[display("unknown column '{name}'")]
    UnknownColumn { name: String },
    #[display("column '{name}' is {actual}, expected {expected}")]
    WrongKind {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Typed values of one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<String>),
}

impl ColumnData {
    fn kind_name(&self) -> &'static str {
        match self {
            ColumnData::Numeric(_) => "numeric",
            ColumnData::Categorical(_) => "categorical",
        }
    }

    fn select(&self, rows: &[usize]) -> Self {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Categorical(v) => {
                ColumnData::Categorical(rows.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Column {
    name: String,
    data: ColumnData,
}

/// An immutable table of typed columns plus a binary outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetFrame {
    outcome_name: String,
    outcome: Vec<bool>,
    columns: Vec<Column>,
    dropped_rows: usize,
}

impl DatasetFrame {
    /// Coerces raw rows into typed columns according to `specs`.
    ///
    /// Exactly one spec must be of kind [`FieldKind::Outcome`]. Columns of the
    /// raw table that no spec mentions are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use trainsight_analysis::frame::{CoercionOptions, DatasetFrame, FieldSpec, RawTable, RawValue};
    ///
    /// let raw = RawTable::new(
    ///     vec!["是否学习".into(), "年龄".into(), "性别".into()],
    ///     vec![
    ///         vec!["是".into(), 30.0.into(), "女".into()],
    ///         vec!["否".into(), "n/a".into(), RawValue::Null],
    ///         vec![RawValue::Null, 41.0.into(), "男".into()],
    ///     ],
    /// );
    /// let specs = [
    ///     FieldSpec::outcome("是否学习"),
    ///     FieldSpec::numeric("年龄"),
    ///     FieldSpec::categorical("性别"),
    /// ];
    /// let frame = DatasetFrame::coerce(&raw, &specs, &CoercionOptions::default()).unwrap();
    ///
    /// assert_eq!(frame.len(), 2);
    /// assert_eq!(frame.outcome(), [true, false]);
    /// assert_eq!(frame.numeric("年龄").unwrap(), [Some(30.0), None]);
    /// assert_eq!(frame.categorical("性别").unwrap(), ["女", "未标注"]);
    /// assert_eq!(frame.dropped_outcome_rows(), 1);
    /// ```
    pub fn coerce(
        raw: &RawTable,
        specs: &[FieldSpec],
        options: &CoercionOptions,
    ) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        let mut outcome_spec: Option<&FieldSpec> = None;
        let mut indices = Vec::with_capacity(specs.len());
        for spec in specs {
            if !seen.insert(spec.name.trim()) {
                return Err(SchemaError::DuplicateField {
                    name: spec.name.clone(),
                });
            }
            let index = raw
                .column_index(spec.name.trim())
                .ok_or_else(|| SchemaError::MissingField {
                    name: spec.name.clone(),
                })?;
            if spec.kind == FieldKind::Outcome {
                if let Some(first) = outcome_spec {
                    return Err(SchemaError::MultipleOutcomeFields {
                        first: first.name.clone(),
                        second: spec.name.clone(),
                    });
                }
                outcome_spec = Some(spec);
            }
            indices.push(index);
        }
        let outcome_spec = outcome_spec.ok_or(SchemaError::NoOutcomeField)?;

        let mut outcome = vec![];
        let mut cells: Vec<Vec<&RawValue>> = vec![vec![]; specs.len()];
        let mut dropped_rows = 0;
        for row in raw.rows() {
            let mut label = None;
            let mut keep = true;
            for (spec, &index) in specs.iter().zip(&indices) {
                let value = &row[index];
                match spec.kind {
                    FieldKind::Outcome => {
                        label = value.as_text();
                        keep &= label.is_some();
                    }
                    FieldKind::Numeric if spec.missing == MissingPolicy::DropRow => {
                        keep &= value.as_number().is_some();
                    }
                    FieldKind::Categorical if spec.missing == MissingPolicy::DropRow => {
                        keep &= value.as_text().is_some();
                    }
                    FieldKind::Numeric | FieldKind::Categorical => {}
                }
            }
            let Some(label) = label.filter(|_| keep) else {
                dropped_rows += 1;
                continue;
            };
            outcome.push(label.contains(options.positive_marker.as_str()));
            for (column, &index) in cells.iter_mut().zip(&indices) {
                column.push(&row[index]);
            }
        }

        let columns = specs
            .iter()
            .zip(cells)
            .filter(|(spec, _)| spec.kind != FieldKind::Outcome)
            .map(|(spec, values)| {
                let data = match spec.kind {
                    FieldKind::Numeric => {
                        ColumnData::Numeric(values.iter().map(|v| v.as_number()).collect())
                    }
                    _ => {
                        let sentinel = spec.sentinel.as_deref().unwrap_or(&options.sentinel);
                        ColumnData::Categorical(
                            values
                                .iter()
                                .map(|v| v.as_text().map_or_else(|| sentinel.to_owned(), Cow::into_owned))
                                .collect(),
                        )
                    }
                };
                Column {
                    name: spec.name.trim().to_owned(),
                    data,
                }
            })
            .collect();

        if dropped_rows > 0 {
            log::warn!(
                "dropped {dropped_rows} of {} rows with a missing outcome or a required field",
                raw.rows().len()
            );
        }
        log::debug!(
            "coerced {} rows into {} columns",
            outcome.len(),
            specs.len()
        );

        Ok(Self {
            outcome_name: outcome_spec.name.trim().to_owned(),
            outcome,
            columns,
            dropped_rows,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcome.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcome.is_empty()
    }

    #[must_use]
    pub fn outcome_name(&self) -> &str {
        &self.outcome_name
    }

    /// Outcome of every row; `true` is positive.
    #[must_use]
    pub fn outcome(&self) -> &[bool] {
        &self.outcome
    }

    /// Outcome as `0.0` / `1.0`, as the regression engine expects it.
    #[must_use]
    pub fn outcome_values(&self) -> Vec<f64> {
        self.outcome.iter().map(|&y| f64::from(u8::from(y))).collect()
    }

    #[must_use]
    pub fn positive_count(&self) -> usize {
        self.outcome.iter().filter(|y| **y).count()
    }

    /// Rows removed during coercion.
    #[must_use]
    pub fn dropped_outcome_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Names of all non-outcome columns in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Kind of a column; the outcome column reports [`FieldKind::Outcome`].
    pub fn kind(&self, name: &str) -> Result<FieldKind, FrameError> {
        if name == self.outcome_name {
            return Ok(FieldKind::Outcome);
        }
        Ok(match self.column(name)? {
            ColumnData::Numeric(_) => FieldKind::Numeric,
            ColumnData::Categorical(_) => FieldKind::Categorical,
        })
    }

    pub fn column(&self, name: &str) -> Result<&ColumnData, FrameError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.data)
            .ok_or_else(|| FrameError::UnknownColumn {
                name: name.to_owned(),
            })
    }

    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>], FrameError> {
        match self.column(name)? {
            ColumnData::Numeric(values) => Ok(values),
            other => Err(wrong_kind(name, "numeric", other.kind_name())),
        }
    }

    pub fn categorical(&self, name: &str) -> Result<&[String], FrameError> {
        match self.column(name)? {
            ColumnData::Categorical(values) => Ok(values),
            other => Err(wrong_kind(name, "categorical", other.kind_name())),
        }
    }

    /// Category labels of a categorical column or of the outcome.
    ///
    /// The outcome reads as [`OUTCOME_POSITIVE_LABEL`] / [`OUTCOME_NEGATIVE_LABEL`].
    pub fn category_labels(&self, name: &str) -> Result<Cow<'_, [String]>, FrameError> {
        if name == self.outcome_name {
            let labels = self
                .outcome
                .iter()
                .map(|&y| {
                    if y {
                        OUTCOME_POSITIVE_LABEL
                    } else {
                        OUTCOME_NEGATIVE_LABEL
                    }
                    .to_owned()
                })
                .collect();
            return Ok(Cow::Owned(labels));
        }
        self.categorical(name).map(Cow::Borrowed)
    }

    /// A new frame keeping only rows where every named numeric column has a value.
    ///
    /// Categorical columns never contain missing cells, so naming them is
    /// allowed but filters nothing.
    pub fn complete_cases(&self, columns: &[&str]) -> Result<DatasetFrame, FrameError> {
        let mut numeric = vec![];
        for &name in columns {
            match self.kind(name)? {
                FieldKind::Numeric => numeric.push(self.numeric(name)?),
                FieldKind::Categorical | FieldKind::Outcome => {}
            }
        }
        let rows: Vec<usize> = (0..self.len())
            .filter(|&i| numeric.iter().all(|values| values[i].is_some()))
            .collect();
        if rows.len() < self.len() {
            log::debug!(
                "complete cases over {columns:?}: kept {} of {} rows",
                rows.len(),
                self.len()
            );
        }
        Ok(self.select_rows(&rows))
    }

    /// A new frame keeping the rows at `rows`, in that order.
    #[must_use]
    pub fn select_rows(&self, rows: &[usize]) -> DatasetFrame {
        DatasetFrame {
            outcome_name: self.outcome_name.clone(),
            outcome: rows.iter().map(|&i| self.outcome[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.select(rows),
                })
                .collect(),
            dropped_rows: self.dropped_rows,
        }
    }
}

fn wrong_kind(name: &str, expected: &'static str, actual: &'static str) -> FrameError {
    FrameError::WrongKind {
        name: name.to_owned(),
        expected,
        actual,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a frame from `(outcome label, numeric, category)` triples.
    pub(crate) fn sample_frame(rows: &[(&str, Option<f64>, &str)]) -> DatasetFrame {
        let raw = RawTable::new(
            vec!["outcome".into(), "x".into(), "group".into()],
            rows.iter()
                .map(|&(y, x, g)| {
                    vec![
                        y.into(),
                        x.map_or(RawValue::Null, RawValue::Number),
                        g.into(),
                    ]
                })
                .collect(),
        );
        let specs = [
            FieldSpec::outcome("outcome"),
            FieldSpec::numeric("x"),
            FieldSpec::categorical("group"),
        ];
        DatasetFrame::coerce(&raw, &specs, &CoercionOptions::default()).unwrap()
    }

    #[test]
    fn test_outcome_marker_is_substring_match() {
        let frame = sample_frame(&[
            ("是", None, "a"),
            ("否", None, "a"),
            ("是(补录)", None, "a"),
            ("不是", None, "a"),
            ("yes", None, "a"),
        ]);
        // "不是" contains the marker and is therefore positive
        assert_eq!(frame.outcome(), [true, false, true, true, false]);
        assert_eq!(frame.positive_count(), 3);
    }

    #[test]
    fn test_numeric_parsing() {
        let raw = RawTable::new(
            vec!["y".into(), "n".into()],
            vec![
                vec!["是".into(), " 12.5 ".into()],
                vec!["是".into(), "".into()],
                vec!["是".into(), "abc".into()],
                vec!["是".into(), RawValue::Number(3.0)],
                vec!["是".into(), RawValue::Bool(true)],
                vec!["是".into(), "NaN".into()],
            ],
        );
        let specs = [FieldSpec::outcome("y"), FieldSpec::numeric("n")];
        let frame = DatasetFrame::coerce(&raw, &specs, &CoercionOptions::default()).unwrap();
        assert_eq!(
            frame.numeric("n").unwrap(),
            [Some(12.5), None, None, Some(3.0), Some(1.0), None]
        );
    }

    #[test]
    fn test_categorical_sentinel_and_override() {
        let raw = RawTable::new(
            vec!["y".into(), "a".into(), "b".into()],
            vec![
                vec!["否".into(), RawValue::Null, "  ".into()],
                vec!["否".into(), RawValue::Number(2.0), "x".into()],
            ],
        );
        let mut b = FieldSpec::categorical("b");
        b.sentinel = Some("unknown".into());
        let specs = [FieldSpec::outcome("y"), FieldSpec::categorical("a"), b];
        let frame = DatasetFrame::coerce(&raw, &specs, &CoercionOptions::default()).unwrap();
        assert_eq!(frame.categorical("a").unwrap(), [DEFAULT_SENTINEL, "2"]);
        assert_eq!(frame.categorical("b").unwrap(), ["unknown", "x"]);
    }

    #[test]
    fn test_drop_row_policy() {
        let raw = RawTable::new(
            vec!["y".into(), "n".into()],
            vec![
                vec!["是".into(), RawValue::Null],
                vec!["否".into(), 1.0.into()],
            ],
        );
        let specs = [FieldSpec::outcome("y"), FieldSpec::numeric("n").drop_missing()];
        let frame = DatasetFrame::coerce(&raw, &specs, &CoercionOptions::default()).unwrap();
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.dropped_outcome_rows(), 1);
    }

    #[test]
    fn test_schema_errors() {
        let raw = RawTable::new(vec!["y".into(), "a".into()], vec![]);
        let options = CoercionOptions::default();

        let err = DatasetFrame::coerce(&raw, &[FieldSpec::outcome("y"), FieldSpec::numeric("z")], &options)
            .unwrap_err();
        assert_eq!(err, SchemaError::MissingField { name: "z".into() });

        let err = DatasetFrame::coerce(&raw, &[FieldSpec::numeric("a")], &options).unwrap_err();
        assert_eq!(err, SchemaError::NoOutcomeField);

        let err = DatasetFrame::coerce(&raw, &[FieldSpec::outcome("y"), FieldSpec::outcome("a")], &options)
            .unwrap_err();
        assert!(matches!(err, SchemaError::MultipleOutcomeFields { .. }));

        let err = DatasetFrame::coerce(
            &raw,
            &[FieldSpec::outcome("y"), FieldSpec::numeric("a"), FieldSpec::categorical("a")],
            &options,
        )
        .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateField { name: "a".into() });
    }

    #[test]
    fn test_column_access_errors() {
        let frame = sample_frame(&[("是", Some(1.0), "a")]);
        assert!(matches!(
            frame.numeric("group"),
            Err(FrameError::WrongKind { .. })
        ));
        assert!(matches!(
            frame.categorical("missing"),
            Err(FrameError::UnknownColumn { .. })
        ));
        assert_eq!(frame.kind("outcome").unwrap(), FieldKind::Outcome);
        assert_eq!(frame.category_labels("outcome").unwrap().as_ref(), ["1"]);
    }

    #[test]
    fn test_complete_cases_preserves_order() {
        let frame = sample_frame(&[
            ("是", Some(1.0), "a"),
            ("否", None, "b"),
            ("否", Some(3.0), "c"),
        ]);
        let complete = frame.complete_cases(&["x", "group"]).unwrap();
        assert_eq!(complete.len(), 2);
        assert_eq!(complete.numeric("x").unwrap(), [Some(1.0), Some(3.0)]);
        assert_eq!(complete.categorical("group").unwrap(), ["a", "c"]);
        assert_eq!(complete.outcome(), [true, false]);
        // the source frame is untouched
        assert_eq!(frame.len(), 3);
    }
}
