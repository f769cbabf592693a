//! Database schema types for askdb.
//!
//! Represents the structure of a database (tables, columns, primary keys and
//! foreign keys) and renders it as a plain-text prompt fragment.

/// Represents the complete schema of a database.
///
/// Built once per database at startup and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    /// All tables, sorted by name.
    pub tables: Vec<Table>,

    /// Union of every table's outbound foreign keys, in table order.
    pub foreign_keys: Vec<ForeignKey>,
}

impl Schema {
    /// Creates a schema from tables, flattening their foreign keys.
    pub fn new(tables: Vec<Table>) -> Self {
        let foreign_keys = tables
            .iter()
            .flat_map(|table| table.foreign_keys.iter().cloned())
            .collect();
        Self {
            tables,
            foreign_keys,
        }
    }

    /// Returns the table names in schema order.
    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Formats the schema for inclusion in an LLM prompt.
    ///
    /// The output is deterministic for a given schema:
    ///
    /// ```text
    /// DATABASE SCHEMA:
    ///
    /// Table: users
    ///   - id (INTEGER, PRIMARY KEY)
    ///   - email (TEXT, NOT NULL)
    ///
    /// RELATIONSHIPS:
    ///   - orders.user_id -> users.id
    /// ```
    pub fn to_prompt_string(&self) -> String {
        let mut lines = vec!["DATABASE SCHEMA:".to_string(), String::new()];

        for table in &self.tables {
            lines.push(format!("Table: {}", table.name));
            lines.extend(table.columns.iter().map(Self::format_column));
            lines.push(String::new());
        }

        if !self.foreign_keys.is_empty() {
            lines.push("RELATIONSHIPS:".to_string());
            lines.extend(self.foreign_keys.iter().map(|fk| {
                format!(
                    "  - {}.{} -> {}.{}",
                    fk.from_table, fk.from_column, fk.to_table, fk.to_column
                )
            }));
            lines.push(String::new());
        }

        lines.join("\n")
    }

    fn format_column(column: &Column) -> String {
        let annotations = [
            Some(column.data_type.as_str()),
            column.is_primary_key.then_some("PRIMARY KEY"),
            (!column.is_nullable).then_some("NOT NULL"),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();

        format!("  - {} ({})", column.name, annotations.join(", "))
    }
}

/// Represents a database table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Columns in storage order.
    pub columns: Vec<Column>,

    /// Names of the columns that form the primary key.
    pub primary_keys: Vec<String>,

    /// Foreign keys originating from this table.
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    /// Creates a table, deriving the primary-key set from the column flags.
    pub fn new(name: impl Into<String>, columns: Vec<Column>, foreign_keys: Vec<ForeignKey>) -> Self {
        let primary_keys = columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.clone())
            .collect();
        Self {
            name: name.into(),
            columns,
            primary_keys,
            foreign_keys,
        }
    }
}

/// Represents a column in a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Declared type (e.g., "INTEGER", "VARCHAR(255)").
    pub data_type: String,

    /// Whether the column is part of the primary key.
    pub is_primary_key: bool,

    /// Whether the column allows NULL values.
    pub is_nullable: bool,
}

impl Column {
    /// Creates a new nullable, non-key column.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_primary_key: false,
            is_nullable: true,
        }
    }

    /// Sets whether the column is nullable.
    pub fn nullable(self, nullable: bool) -> Self {
        Self {
            is_nullable: nullable,
            ..self
        }
    }

    /// Sets whether the column is part of the primary key.
    pub fn primary_key(self, primary_key: bool) -> Self {
        Self {
            is_primary_key: primary_key,
            ..self
        }
    }
}

/// A directed foreign-key edge between two columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForeignKey {
    /// Source table name.
    pub from_table: String,

    /// Source column name.
    pub from_column: String,

    /// Target table name.
    pub to_table: String,

    /// Target column name.
    pub to_column: String,
}

impl ForeignKey {
    /// Creates a new foreign key edge.
    pub fn new(
        from_table: impl Into<String>,
        from_column: impl Into<String>,
        to_table: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_column: from_column.into(),
            to_table: to_table.into(),
            to_column: to_column.into(),
        }
    }
}
