use crate::schema::TableSchema;

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", schema.name);
    let mut columns = Vec::new();

    for col in schema.columns {
        let pk = if col.name == "id" { " PRIMARY KEY" } else { "" };
        let null_constraint = if !col.nullable && col.name != "id" {
            " NOT NULL"
        } else {
            ""
        };
        let unique = if col.unique { " UNIQUE" } else { "" };

        columns.push(format!(
            "    {} {}{}{}{}",
            col.name,
            col.col_type.sql_type(),
            pk,
            null_constraint,
            unique
        ));
    }

    // Add foreign key constraints
    for fk in schema.foreign_keys {
        columns.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}({})",
            fk.column, fk.references_table, fk.references_column
        ));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for foreign key columns
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    schema
        .foreign_keys
        .iter()
        .map(|fk| {
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{}_{} ON {}({})",
                schema.name, fk.column, schema.name, fk.column
            )
        })
        .collect()
}

/// Generate an INSERT statement covering every non-id column
pub fn generate_insert(schema: &TableSchema) -> String {
    let columns: Vec<&str> = schema
        .column_names()
        .into_iter()
        .filter(|name| *name != "id")
        .collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        schema.name,
        columns.join(", "),
        placeholders.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{CONTINENT, COUNTRY, COUNTRY_LANGUAGE};

    #[test]
    fn test_generate_create_table() {
        let sql = generate_create_table(&COUNTRY);
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS country"));
        assert!(sql.contains("id INTEGER PRIMARY KEY"));
        assert!(sql.contains("name TEXT NOT NULL"));
        assert!(sql.contains("currencies TEXT"));
        assert!(sql.contains("FOREIGN KEY (continent_id) REFERENCES continent(id)"));
    }

    #[test]
    fn test_unique_name_columns() {
        let sql = generate_create_table(&CONTINENT);
        assert!(sql.contains("name TEXT NOT NULL UNIQUE"));
    }

    #[test]
    fn test_generate_indexes() {
        let indexes = generate_indexes(&COUNTRY_LANGUAGE);
        assert!(indexes.iter().any(|i| i.contains("idx_country_language_country_id")));
        assert!(indexes.iter().any(|i| i.contains("idx_country_language_language_id")));
    }

    #[test]
    fn test_generate_insert_skips_id() {
        let sql = generate_insert(&COUNTRY_LANGUAGE);
        assert_eq!(
            sql,
            "INSERT INTO country_language (country_id, language_id, is_official) VALUES (?1, ?2, ?3)"
        );
    }
}
