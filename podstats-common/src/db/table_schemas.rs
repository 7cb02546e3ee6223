//! Table schema definitions
//!
//! Single source of truth for the `podcasts` table. Downstream readers
//! (ranking tools, dashboards) rely on these column names.

use crate::db::schema::{create_table, ColumnDefinition, TableSchema};
use crate::Result;
use sqlx::SqliteConnection;

/// `podcasts` table: one row per episode per reporting sheet
pub struct PodcastsTableSchema;

impl TableSchema for PodcastsTableSchema {
    fn table_name() -> &'static str {
        "podcasts"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("url", "TEXT").not_null(),
            ColumnDefinition::new("full", "INTEGER").not_null().default("0"),
            ColumnDefinition::new("partial", "INTEGER").not_null().default("0"),
            ColumnDefinition::new("avg_bandwidth", "REAL").not_null().default("0"),
            ColumnDefinition::new("total_bandwidth", "REAL").not_null().default("0"),
            // full + 0.5 * partial, always computed on import
            ColumnDefinition::new("eq_full", "REAL").not_null().default("0"),
            ColumnDefinition::new("feature", "TEXT"),
            ColumnDefinition::new("code", "INTEGER"),
            ColumnDefinition::new("sheet", "TEXT").not_null(),
            ColumnDefinition::new("year", "INTEGER"),
            ColumnDefinition::new("month", "INTEGER"),
            // ISO-8601 calendar date (YYYY-MM-DD)
            ColumnDefinition::new("date", "TEXT"),
            ColumnDefinition::new("title", "TEXT").not_null().default("''"),
        ]
    }

    fn unique_keys() -> Vec<&'static [&'static str]> {
        vec![&["url", "sheet"]]
    }

    fn indexes() -> Vec<(&'static str, &'static [&'static str])> {
        vec![
            ("idx_podcasts_feature", &["feature"]),
            ("idx_podcasts_year", &["year"]),
            ("idx_podcasts_eq_full", &["eq_full"]),
        ]
    }
}

/// Create the `podcasts` table and its indexes
pub async fn create_podcasts_table(conn: &mut SqliteConnection) -> Result<()> {
    create_table::<PodcastsTableSchema>(conn).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_podcasts_schema_column_contract() {
        let columns = PodcastsTableSchema::expected_columns();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(
            names,
            vec![
                "url",
                "full",
                "partial",
                "avg_bandwidth",
                "total_bandwidth",
                "eq_full",
                "feature",
                "code",
                "sheet",
                "year",
                "month",
                "date",
                "title",
            ]
        );
        assert!(columns.iter().any(|c| c.name == "url" && c.not_null));
        assert!(columns.iter().any(|c| c.name == "sheet" && c.not_null));
    }

    #[test]
    fn test_podcasts_unique_on_url_and_sheet() {
        let sql = PodcastsTableSchema::create_table_sql();
        assert!(sql.contains("UNIQUE (url, sheet)"));
    }
}
