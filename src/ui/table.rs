use crate::scope::GraphStats;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

/// Per-language totals of a `stats` run
#[derive(Tabled)]
pub struct LanguageRow {
    #[tabled(rename = "Language")]
    pub language: String,
    #[tabled(rename = "Files")]
    pub files: usize,
    #[tabled(rename = "Scopes")]
    pub scopes: usize,
    #[tabled(rename = "Defs")]
    pub definitions: usize,
    #[tabled(rename = "Imports")]
    pub imports: usize,
    #[tabled(rename = "Refs")]
    pub references: usize,
    #[tabled(rename = "Resolved")]
    pub resolved: String,
}

impl LanguageRow {
    pub fn new(language: &str, files: usize, stats: &GraphStats) -> Self {
        let resolved = if stats.references == 0 {
            "-".to_string()
        } else {
            format!(
                "{} ({:.1}%)",
                stats.resolved,
                stats.resolved as f64 * 100.0 / stats.references as f64
            )
        };
        Self {
            language: language.to_string(),
            files,
            scopes: stats.scopes,
            definitions: stats.definitions,
            imports: stats.imports,
            references: stats.references,
            resolved,
        }
    }
}

/// A registered adapter, for `languages`
#[derive(Tabled)]
pub struct AdapterRow {
    #[tabled(rename = "Language")]
    pub language: String,
    #[tabled(rename = "Extensions")]
    pub extensions: String,
    #[tabled(rename = "Namespaces")]
    pub namespaces: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        rounded(&self.rows)
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Render rows with the rounded style, or nothing for an empty slice
pub fn rounded<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_row_percentage() {
        let stats = GraphStats {
            scopes: 3,
            definitions: 4,
            imports: 1,
            references: 8,
            resolved: 6,
            edges: 0,
        };
        let row = LanguageRow::new("Python", 2, &stats);
        assert_eq!(row.resolved, "6 (75.0%)");

        let empty = LanguageRow::new("Go", 1, &GraphStats::default());
        assert_eq!(empty.resolved, "-");
    }

    #[test]
    fn test_table_builder() {
        let mut builder = TableBuilder::new();
        assert!(builder.build().is_empty());
        builder.add_row("References", "12");
        let table = builder.build();
        assert!(table.contains("Metric"));
        assert!(table.contains("References"));
    }
}
