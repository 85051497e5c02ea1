//! Schema definition: tables, fields, and value coercion.
//!
//! A [`Schema`] describes one table: its name plus ordered field metadata.
//! Schemas feed the query builder (table name) and changesets (field types,
//! nullability, validators' targets).

use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Logical field type, mapped to a concrete column type per backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Time,
    Binary,
    Decimal,
    Map,
    Array,
    Json,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::Time => "time",
            FieldType::Binary => "binary",
            FieldType::Decimal => "decimal",
            FieldType::Map => "map",
            FieldType::Array => "array",
            FieldType::Json => "json",
        }
    }
}

/// One field of a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub default: Option<Value>,
    pub nullable: bool,
    pub primary: bool,
    pub autoincrement: bool,
    pub indexed: bool,
    pub unique: bool,
}

impl Field {
    /// Start building a field of the given type.
    pub fn builder(name: impl Into<String>, field_type: FieldType) -> FieldBuilder {
        FieldBuilder {
            field: Field {
                name: name.into(),
                field_type,
                default: None,
                nullable: false,
                primary: false,
                autoincrement: false,
                indexed: false,
                unique: false,
            },
        }
    }
}

/// Fluent field builder.
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    field: Field,
}

impl FieldBuilder {
    /// Set the default value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.field.default = Some(value.into());
        self
    }

    /// Allow NULL for this field.
    pub fn nullable(mut self, allow: bool) -> Self {
        self.field.nullable = allow;
        self
    }

    /// Mark as primary key (implies autoincrement).
    pub fn primary_key(mut self) -> Self {
        self.field.primary = true;
        self.field.autoincrement = true;
        self
    }

    /// Add an index on this field.
    pub fn indexed(mut self) -> Self {
        self.field.indexed = true;
        self
    }

    /// Add a unique constraint.
    pub fn unique(mut self) -> Self {
        self.field.unique = true;
        self
    }

    /// Finish building the field.
    pub fn build(self) -> Field {
        self.field
    }
}

/// A table schema: name plus ordered fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    table_name: String,
    fields: Vec<Field>,
}

impl Schema {
    /// Create an empty schema for a table.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            fields: Vec::new(),
        }
    }

    /// Table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Append a field (fluent form).
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a field in place.
    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The primary key field, if declared.
    pub fn primary_key_field(&self) -> Option<&Field> {
        self.fields.iter().find(|f| f.primary)
    }
}

/// Registry of schemas keyed by name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Schema>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema under a name.
    pub fn register(&mut self, name: impl Into<String>, schema: Schema) {
        self.schemas.insert(name.into(), schema);
    }

    /// Look up a registered schema.
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Names of all registered schemas.
    pub fn names(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }
}

/// Coerce a value to a target field type.
///
/// Used by changeset casting. NULL passes through unchanged; incompatible
/// conversions are reported, not silently truncated.
pub fn convert_value(value: Value, target: FieldType) -> OrmResult<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    let fail = |value: &Value| {
        Err(OrmError::validation(format!(
            "cannot convert {} to {}",
            value.type_name(),
            target.as_str()
        )))
    };

    match target {
        FieldType::String => match value {
            Value::Text(_) => Ok(value),
            Value::Int(n) => Ok(Value::Text(n.to_string())),
            Value::Float(f) => Ok(Value::Text(f.to_string())),
            Value::Bool(b) => Ok(Value::Text(b.to_string())),
            Value::Uuid(u) => Ok(Value::Text(u.to_string())),
            Value::Timestamp(t) => Ok(Value::Text(t.to_rfc3339())),
            other => fail(&other),
        },
        FieldType::Integer => match value {
            Value::Int(_) => Ok(value),
            Value::Float(f) => Ok(Value::Int(f as i64)),
            Value::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| OrmError::validation(format!("cannot parse '{s}' as integer"))),
            Value::Bool(b) => Ok(Value::Int(i64::from(b))),
            other => fail(&other),
        },
        FieldType::Float => match value {
            Value::Float(_) => Ok(value),
            Value::Int(n) => Ok(Value::Float(n as f64)),
            Value::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| OrmError::validation(format!("cannot parse '{s}' as float"))),
            other => fail(&other),
        },
        FieldType::Boolean => match value {
            Value::Bool(_) => Ok(value),
            Value::Text(s) => Ok(Value::Bool(matches!(
                s.as_str(),
                "true" | "1" | "yes" | "on"
            ))),
            Value::Int(n) => Ok(Value::Bool(n != 0)),
            other => fail(&other),
        },
        FieldType::Time => match value {
            Value::Timestamp(_) => Ok(value),
            Value::Text(s) => DateTime::parse_from_rfc3339(&s)
                .map(|t| Value::Timestamp(t.with_timezone(&Utc)))
                .map_err(|e| OrmError::validation(format!("cannot parse '{s}' as time: {e}"))),
            other => fail(&other),
        },
        FieldType::Binary => match value {
            Value::Bytes(_) => Ok(value),
            Value::Text(s) => Ok(Value::Bytes(s.into_bytes())),
            other => fail(&other),
        },
        FieldType::Json | FieldType::Map | FieldType::Array => match value {
            Value::Json(_) => Ok(value),
            Value::Text(s) => serde_json::from_str(&s)
                .map(Value::Json)
                .map_err(|e| OrmError::validation(format!("invalid json: {e}"))),
            other => fail(&other),
        },
        FieldType::Decimal => match value {
            #[cfg(feature = "decimal")]
            Value::Decimal(_) => Ok(value),
            Value::Int(_) | Value::Float(_) | Value::Text(_) => Ok(value),
            other => fail(&other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_schema() -> Schema {
        Schema::new("users")
            .field(Field::builder("id", FieldType::Integer).primary_key().build())
            .field(Field::builder("name", FieldType::String).build())
            .field(
                Field::builder("email", FieldType::String)
                    .unique()
                    .indexed()
                    .build(),
            )
    }

    #[test]
    fn schema_lookup_and_order() {
        let schema = users_schema();
        assert_eq!(schema.table_name(), "users");
        assert_eq!(schema.fields().len(), 3);
        assert_eq!(schema.fields()[1].name, "name");
        assert!(schema.get_field("email").unwrap().unique);
        assert!(schema.get_field("missing").is_none());
    }

    #[test]
    fn primary_key_implies_autoincrement() {
        let schema = users_schema();
        let pk = schema.primary_key_field().unwrap();
        assert_eq!(pk.name, "id");
        assert!(pk.autoincrement);
    }

    #[test]
    fn registry_roundtrip() {
        let mut registry = SchemaRegistry::new();
        registry.register("users", users_schema());
        assert!(registry.get("users").is_some());
        assert_eq!(registry.names(), vec!["users"]);
    }

    #[test]
    fn convert_integer_variants() {
        assert_eq!(
            convert_value(Value::Text(" 42 ".into()), FieldType::Integer).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            convert_value(Value::Float(3.9), FieldType::Integer).unwrap(),
            Value::Int(3)
        );
        assert!(convert_value(Value::Text("abc".into()), FieldType::Integer).is_err());
    }

    #[test]
    fn convert_boolean_truthy_strings() {
        for s in ["true", "1", "yes", "on"] {
            assert_eq!(
                convert_value(Value::Text(s.into()), FieldType::Boolean).unwrap(),
                Value::Bool(true)
            );
        }
        assert_eq!(
            convert_value(Value::Text("nope".into()), FieldType::Boolean).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn convert_time_from_rfc3339() {
        let v = convert_value(
            Value::Text("2024-05-01T12:00:00Z".into()),
            FieldType::Time,
        )
        .unwrap();
        assert!(matches!(v, Value::Timestamp(_)));
        assert!(convert_value(Value::Text("yesterday".into()), FieldType::Time).is_err());
    }

    #[test]
    fn null_passes_through() {
        assert_eq!(
            convert_value(Value::Null, FieldType::Integer).unwrap(),
            Value::Null
        );
    }
}
