//! Nested records → rectangular table.
//!
//! Each record is walked to its leaves. Objects recurse; arrays and scalars
//! are leaves. Every distinct leaf seen in any record becomes a column, in
//! order of first appearance, and each record becomes one row.
//!
//! # Column naming
//!
//! By default ([`ColumnNaming::LeafKey`]) a column is named by the leaf's
//! terminal key only, so `a.id` and `b.id` both land in column `id`. This is
//! lossy and kept for compatibility with existing outputs. When one record
//! has several leaves under the same name, its first non-empty value wins.
//! [`ColumnNaming::FullPath`] keeps the dotted path instead.

use std::collections::HashMap;

use serde_json::Value;

/// How flattened columns are named.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColumnNaming {
    #[default]
    LeafKey,
    FullPath,
}

/// One leaf of a nested record.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf<'a> {
    pub path: Vec<&'a str>,
    pub value: &'a Value,
}

impl Leaf<'_> {
    pub fn full_path(&self) -> String {
        self.path.join(".")
    }

    pub fn key(&self) -> &str {
        self.path.last().copied().unwrap_or_default()
    }

    fn column_name(&self, naming: ColumnNaming) -> String {
        match naming {
            ColumnNaming::LeafKey => self.key().to_string(),
            ColumnNaming::FullPath => self.full_path(),
        }
    }
}

/// Walk `record` and return its leaves in document order.
///
/// A record that is not an object has no keyed leaves and yields nothing.
pub fn collect_leaves(record: &Value) -> Vec<Leaf<'_>> {
    let mut out = Vec::new();
    if let Value::Object(_) = record {
        walk(record, &mut Vec::new(), &mut out);
    }
    out
}

fn walk<'a>(value: &'a Value, path: &mut Vec<&'a str>, out: &mut Vec<Leaf<'a>>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                path.push(key);
                walk(child, path, out);
                path.pop();
            }
        }
        _ => out.push(Leaf {
            path: path.clone(),
            value,
        }),
    }
}

/// Render a leaf value as a CSV cell.
pub fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Rectangular view over a set of records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl FlattenedTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cell at `row` under column `name`, if both exist.
    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        let col = self.columns.iter().position(|c| c == name)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }
}

/// Flatten `records` into a table, one row per record in input order.
pub fn flatten(records: &[Value], naming: ColumnNaming) -> FlattenedTable {
    let mut columns: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut sparse_rows: Vec<Vec<(usize, String)>> = Vec::with_capacity(records.len());

    for record in records {
        let mut cells: Vec<(usize, String)> = Vec::new();
        for leaf in collect_leaves(record) {
            let name = leaf.column_name(naming);
            let col = *index.entry(name.clone()).or_insert_with(|| {
                columns.push(name);
                columns.len() - 1
            });

            let rendered = render_cell(leaf.value);
            match cells.iter_mut().find(|(c, _)| *c == col) {
                Some((_, existing)) if existing.is_empty() => *existing = rendered,
                Some(_) => {}
                None => cells.push((col, rendered)),
            }
        }
        sparse_rows.push(cells);
    }

    let width = columns.len();
    let rows = sparse_rows
        .into_iter()
        .map(|cells| {
            let mut row = vec![String::new(); width];
            for (col, value) in cells {
                row[col] = value;
            }
            row
        })
        .collect();

    FlattenedTable { columns, rows }
}
