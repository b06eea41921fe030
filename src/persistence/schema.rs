//! Managed tables and the schema-generation mode applied to them at startup.

use std::str::FromStr;

use crate::error::AppError;

/// Value of `hibernate.hbm2ddl.auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaMode {
    #[default]
    None,
    Validate,
    Update,
    Create,
    CreateDrop,
    CreateOnly,
    Drop,
}

impl SchemaMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaMode::None => "none",
            SchemaMode::Validate => "validate",
            SchemaMode::Update => "update",
            SchemaMode::Create => "create",
            SchemaMode::CreateDrop => "create-drop",
            SchemaMode::CreateOnly => "create-only",
            SchemaMode::Drop => "drop",
        }
    }

    /// Whether existing tables are dropped before anything is created.
    pub fn drops_on_start(&self) -> bool {
        matches!(self, SchemaMode::Create | SchemaMode::CreateDrop | SchemaMode::Drop)
    }

    pub fn drops_on_shutdown(&self) -> bool {
        matches!(self, SchemaMode::CreateDrop)
    }
}

impl FromStr for SchemaMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(SchemaMode::None),
            "validate" => Ok(SchemaMode::Validate),
            "update" => Ok(SchemaMode::Update),
            "create" => Ok(SchemaMode::Create),
            "create-drop" => Ok(SchemaMode::CreateDrop),
            "create-only" => Ok(SchemaMode::CreateOnly),
            "drop" => Ok(SchemaMode::Drop),
            _ => Err(AppError::UnknownSchemaMode(s.to_string())),
        }
    }
}

/// Portable column types, mapped to SQL by a [`super::Dialect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Auto-generated 64-bit key.
    Identity,
    BigInt,
    Integer,
    Boolean,
    Double,
    Text,
    Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            primary_key: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// A table the persistence unit owns and generates schema for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }
}
