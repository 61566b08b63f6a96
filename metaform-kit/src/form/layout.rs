//! Row Layout Partitioner
//!
//! Packs an ordered field list into rows of `columns` fields. A group title
//! always sits on a row of its own, and the field after it opens a new row.

use super::registry::WidgetKind;
use super::schema::FieldDescriptor;

/// Split `items` into rows.
///
/// `columns` is clamped to `[1, items.len()]`.
pub fn partition_rows<T>(
    items: impl IntoIterator<Item = T>,
    columns: usize,
    is_group_title: impl Fn(&T) -> bool,
) -> Vec<Vec<T>> {
    let items: Vec<T> = items.into_iter().collect();
    let columns = columns.clamp(1, items.len().max(1));

    let mut rows = Vec::new();
    let mut row = Vec::with_capacity(columns);

    for item in items {
        if is_group_title(&item) {
            if !row.is_empty() {
                rows.push(std::mem::take(&mut row));
            }
            rows.push(vec![item]);
            continue;
        }

        row.push(item);
        if row.len() == columns {
            rows.push(std::mem::take(&mut row));
        }
    }

    if !row.is_empty() {
        rows.push(row);
    }
    rows
}

/// Partition schema fields, treating group-title kinds as row breaks
pub fn partition_fields(fields: &[FieldDescriptor], columns: usize) -> Vec<Vec<&FieldDescriptor>> {
    partition_rows(fields, columns, |f| {
        WidgetKind::parse(&f.widget_kind).is_group_title()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes<T>(rows: &[Vec<T>]) -> Vec<usize> {
        rows.iter().map(Vec::len).collect()
    }

    fn fields(kinds: &[&str]) -> Vec<FieldDescriptor> {
        kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| FieldDescriptor::new(format!("f{i}"), *kind))
            .collect()
    }

    #[test]
    fn test_plain_rows() {
        let fields = fields(&["text"; 5]);
        assert_eq!(sizes(&partition_fields(&fields, 2)), vec![2, 2, 1]);
    }

    #[test]
    fn test_group_title_flushes() {
        let fields = fields(&["text", "text", "groupTitle", "text", "text"]);
        let rows = partition_fields(&fields, 2);
        assert_eq!(sizes(&rows), vec![2, 1, 2]);
        assert_eq!(rows[1][0].name, "f2");
    }

    #[test]
    fn test_title_mid_row_flushes_partial_row() {
        let fields = fields(&["text", "title", "text", "text", "text"]);
        assert_eq!(sizes(&partition_fields(&fields, 2)), vec![1, 1, 2, 1]);
    }

    #[test]
    fn test_columns_are_clamped() {
        let fields = fields(&["text"; 3]);
        assert_eq!(sizes(&partition_fields(&fields, 0)), vec![1, 1, 1]);
        assert_eq!(sizes(&partition_fields(&fields, 10)), vec![3]);
        assert!(partition_fields(&[], 2).is_empty());
    }

    #[test]
    fn test_generic_items() {
        let rows = partition_rows(vec![1, 2, 0, 3], 3, |n| *n == 0);
        assert_eq!(rows, vec![vec![1, 2], vec![0], vec![3]]);
    }
}
