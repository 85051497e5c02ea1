//! Changesets: cast external data against a schema, track changes, validate.
//!
//! A [`Changeset`] is a single-owner value: feed it a map of incoming data
//! with [`Changeset::cast`], chain validators, then read `changes()` for the
//! write set if `is_valid()`. Casting coerces values to the schema's field
//! types and ignores fields the schema does not declare.

use crate::schema::{convert_value, FieldType, Schema};
use crate::validate::{ValidationCode, ValidationError, ValidationErrors};
use crate::value::Value;
use std::collections::BTreeMap;

/// Numeric range options for [`Changeset::validate_number`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberBounds {
    pub greater_than: Option<f64>,
    pub greater_than_or_equal_to: Option<f64>,
    pub less_than: Option<f64>,
    pub less_than_or_equal_to: Option<f64>,
    pub equal_to: Option<f64>,
}

/// A tracked set of changes against one schema.
#[derive(Debug, Clone)]
pub struct Changeset {
    schema: Schema,
    data: BTreeMap<String, Value>,
    changes: BTreeMap<String, Value>,
    previous: BTreeMap<String, Value>,
    errors: ValidationErrors,
}

impl Changeset {
    /// Create an empty changeset for a schema.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            data: BTreeMap::new(),
            changes: BTreeMap::new(),
            previous: BTreeMap::new(),
            errors: ValidationErrors::default(),
        }
    }

    /// Create a changeset seeded with existing record data.
    ///
    /// Seeded values count as data, not as changes.
    pub fn from_data(
        schema: Schema,
        data: impl IntoIterator<Item = (String, Value)>,
    ) -> Self {
        let mut cs = Self::new(schema);
        cs.data.extend(data);
        cs
    }

    /// Cast incoming values onto the changeset.
    ///
    /// Each value is coerced to its field's declared type; fields unknown to
    /// the schema are skipped; coercion failures are recorded as `cast`
    /// errors without aborting the rest of the cast.
    pub fn cast(mut self, values: impl IntoIterator<Item = (String, Value)>) -> Self {
        for (key, value) in values {
            let Some(field) = self.schema.get_field(&key) else {
                continue;
            };
            let field_type = field.field_type;

            match convert_value(value, field_type) {
                Ok(converted) => {
                    if let Some(old) = self.data.get(&key) {
                        self.previous.insert(key.clone(), old.clone());
                    }
                    self.changes.insert(key.clone(), converted.clone());
                    self.data.insert(key, converted);
                }
                Err(e) => {
                    self.errors.push(ValidationError::new(
                        key,
                        ValidationCode::Cast,
                        e.to_string(),
                    ));
                }
            }
        }
        self
    }

    /// Record a change directly, bypassing type coercion.
    ///
    /// Fields unknown to the schema are ignored.
    pub fn put_change(mut self, field: &str, value: impl Into<Value>) -> Self {
        if self.schema.get_field(field).is_none() {
            return self;
        }
        let value = value.into();
        if let Some(old) = self.data.get(field) {
            self.previous.insert(field.to_string(), old.clone());
        }
        self.changes.insert(field.to_string(), value.clone());
        self.data.insert(field.to_string(), value);
        self
    }

    /// Mark every data field as changed (used for inserts).
    pub fn force_changes(mut self) -> Self {
        for (k, v) in &self.data {
            self.changes.insert(k.clone(), v.clone());
        }
        self
    }

    // ==================== Validators ====================

    fn add_error(&mut self, field: &str, code: ValidationCode, message: impl Into<String>) {
        self.errors.push(ValidationError::new(field, code, message));
    }

    /// Require the listed fields to be present and non-empty.
    pub fn validate_required(mut self, fields: &[&str]) -> Self {
        for field in fields {
            let missing = match self.data.get(*field) {
                None | Some(Value::Null) => true,
                Some(Value::Text(s)) => s.is_empty(),
                Some(_) => false,
            };
            if missing {
                self.add_error(field, ValidationCode::Required, format!("{field} is required"));
            }
        }
        self
    }

    /// Validate string length bounds (inclusive). Absent or NULL values pass.
    pub fn validate_length(mut self, field: &str, min: Option<usize>, max: Option<usize>) -> Self {
        let Some(value) = self.data.get(field) else {
            return self;
        };
        match value {
            Value::Null => {}
            Value::Text(s) => {
                let length = s.chars().count();
                if let Some(min) = min {
                    if length < min {
                        self.add_error(
                            field,
                            ValidationCode::Len,
                            format!("{field} is too short (minimum is {min} characters)"),
                        );
                    }
                }
                if let Some(max) = max {
                    if length > max {
                        self.add_error(
                            field,
                            ValidationCode::Len,
                            format!("{field} is too long (maximum is {max} characters)"),
                        );
                    }
                }
            }
            _ => {
                self.add_error(
                    field,
                    ValidationCode::Len,
                    format!("{field} must be a string"),
                );
            }
        }
        self
    }

    /// Validate a string field against a regex pattern.
    #[cfg(feature = "validate")]
    pub fn validate_format(mut self, field: &str, pattern: &str) -> Self {
        let Some(value) = self.data.get(field) else {
            return self;
        };
        let Some(s) = value.as_str() else {
            if !value.is_null() {
                self.add_error(
                    field,
                    ValidationCode::Format,
                    format!("{field} must be a string"),
                );
            }
            return self;
        };
        match regex::Regex::new(pattern) {
            Ok(re) => {
                if !re.is_match(s) {
                    self.add_error(
                        field,
                        ValidationCode::Format,
                        format!("{field} has invalid format"),
                    );
                }
            }
            Err(e) => {
                self.add_error(
                    field,
                    ValidationCode::Format,
                    format!("invalid pattern: {e}"),
                );
            }
        }
        self
    }

    /// Validate that the field's value is one of the listed values.
    pub fn validate_inclusion(mut self, field: &str, list: &[Value]) -> Self {
        if let Some(value) = self.data.get(field) {
            if !value.is_null() && !list.contains(value) {
                self.add_error(
                    field,
                    ValidationCode::Inclusion,
                    format!("{field} is not included in the list"),
                );
            }
        }
        self
    }

    /// Validate that the field's value is none of the listed values.
    pub fn validate_exclusion(mut self, field: &str, list: &[Value]) -> Self {
        if let Some(value) = self.data.get(field) {
            if list.contains(value) {
                self.add_error(
                    field,
                    ValidationCode::Exclusion,
                    format!("{field} is reserved"),
                );
            }
        }
        self
    }

    /// Validate numeric bounds on an integer or float field.
    pub fn validate_number(mut self, field: &str, bounds: NumberBounds) -> Self {
        let Some(value) = self.data.get(field) else {
            return self;
        };
        if value.is_null() {
            return self;
        }
        let Some(num) = value.as_f64() else {
            self.add_error(
                field,
                ValidationCode::Number,
                format!("{field} must be a number"),
            );
            return self;
        };

        if let Some(min) = bounds.greater_than {
            if num <= min {
                self.add_error(
                    field,
                    ValidationCode::Number,
                    format!("{field} must be greater than {min}"),
                );
            }
        }
        if let Some(min) = bounds.greater_than_or_equal_to {
            if num < min {
                self.add_error(
                    field,
                    ValidationCode::Number,
                    format!("{field} must be greater than or equal to {min}"),
                );
            }
        }
        if let Some(max) = bounds.less_than {
            if num >= max {
                self.add_error(
                    field,
                    ValidationCode::Number,
                    format!("{field} must be less than {max}"),
                );
            }
        }
        if let Some(max) = bounds.less_than_or_equal_to {
            if num > max {
                self.add_error(
                    field,
                    ValidationCode::Number,
                    format!("{field} must be less than or equal to {max}"),
                );
            }
        }
        if let Some(expected) = bounds.equal_to {
            if num != expected {
                self.add_error(
                    field,
                    ValidationCode::Number,
                    format!("{field} must be equal to {expected}"),
                );
            }
        }
        self
    }

    // ==================== Accessors ====================

    /// True when no validation or cast errors have been recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// All recorded errors.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// The bound schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Current value of a field (data, including unchanged seeds).
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// Changed value of a field, if it changed.
    pub fn get_change(&self, field: &str) -> Option<&Value> {
        self.changes.get(field)
    }

    /// Value a field held before its latest change.
    pub fn previous(&self, field: &str) -> Option<&Value> {
        self.previous.get(field)
    }

    /// Whether a field has a recorded change.
    pub fn changed(&self, field: &str) -> bool {
        self.changes.contains_key(field)
    }

    /// Names of all changed fields.
    pub fn changed_fields(&self) -> Vec<&str> {
        self.changes.keys().map(String::as_str).collect()
    }

    /// The change map (the write set for inserts/updates).
    pub fn changes(&self) -> &BTreeMap<String, Value> {
        &self.changes
    }

    /// The full data map.
    pub fn data(&self) -> &BTreeMap<String, Value> {
        &self.data
    }

    /// Field type declared by the schema, if the field exists.
    pub fn field_type(&self, field: &str) -> Option<FieldType> {
        self.schema.get_field(field).map(|f| f.field_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, FieldType};

    fn users_schema() -> Schema {
        Schema::new("users")
            .field(Field::builder("id", FieldType::Integer).primary_key().build())
            .field(Field::builder("name", FieldType::String).build())
            .field(Field::builder("age", FieldType::Integer).nullable(true).build())
            .field(Field::builder("status", FieldType::String).build())
    }

    fn entries(pairs: &[(&str, Value)]) -> Vec<(String, Value)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn cast_coerces_and_tracks_changes() {
        let cs = Changeset::new(users_schema()).cast(entries(&[
            ("name", Value::Text("Alice".into())),
            ("age", Value::Text("30".into())),
            ("unknown", Value::Int(1)),
        ]));

        assert!(cs.is_valid());
        assert_eq!(cs.get_change("age"), Some(&Value::Int(30)));
        assert_eq!(cs.get("name"), Some(&Value::Text("Alice".into())));
        assert!(cs.get("unknown").is_none());
        assert_eq!(cs.changed_fields().len(), 2);
    }

    #[test]
    fn cast_failure_records_cast_error() {
        let cs = Changeset::new(users_schema())
            .cast(entries(&[("age", Value::Text("not a number".into()))]));
        assert!(!cs.is_valid());
        assert_eq!(cs.errors().items[0].code, ValidationCode::Cast);
        assert!(!cs.changed("age"));
    }

    #[test]
    fn cast_tracks_previous_values() {
        let cs = Changeset::from_data(
            users_schema(),
            entries(&[("status", Value::Text("active".into()))]),
        )
        .cast(entries(&[("status", Value::Text("inactive".into()))]));

        assert_eq!(cs.previous("status"), Some(&Value::Text("active".into())));
        assert_eq!(cs.get("status"), Some(&Value::Text("inactive".into())));
    }

    #[test]
    fn required_rejects_missing_null_and_empty() {
        let cs = Changeset::new(users_schema())
            .cast(entries(&[
                ("name", Value::Text(String::new())),
                ("age", Value::Null),
            ]))
            .validate_required(&["name", "age", "status"]);
        assert!(!cs.is_valid());
        assert_eq!(cs.errors().len(), 3);
    }

    #[test]
    fn length_bounds() {
        let cs = Changeset::new(users_schema())
            .cast(entries(&[("name", Value::Text("ab".into()))]))
            .validate_length("name", Some(3), Some(10));
        assert!(!cs.is_valid());
        assert_eq!(cs.errors().items[0].code, ValidationCode::Len);

        let ok = Changeset::new(users_schema())
            .cast(entries(&[("name", Value::Text("abcd".into()))]))
            .validate_length("name", Some(3), Some(10));
        assert!(ok.is_valid());
    }

    #[cfg(feature = "validate")]
    #[test]
    fn format_validation() {
        let cs = Changeset::new(users_schema())
            .cast(entries(&[("status", Value::Text("ACTIVE!".into()))]))
            .validate_format("status", r"^[a-z]+$");
        assert!(!cs.is_valid());

        let ok = Changeset::new(users_schema())
            .cast(entries(&[("status", Value::Text("active".into()))]))
            .validate_format("status", r"^[a-z]+$");
        assert!(ok.is_valid());
    }

    #[test]
    fn inclusion_and_exclusion() {
        let allowed = [Value::Text("active".into()), Value::Text("pending".into())];
        let cs = Changeset::new(users_schema())
            .cast(entries(&[("status", Value::Text("other".into()))]))
            .validate_inclusion("status", &allowed);
        assert!(!cs.is_valid());

        let reserved = [Value::Text("admin".into())];
        let cs = Changeset::new(users_schema())
            .cast(entries(&[("name", Value::Text("admin".into()))]))
            .validate_exclusion("name", &reserved);
        assert!(!cs.is_valid());
    }

    #[test]
    fn number_bounds() {
        let cs = Changeset::new(users_schema())
            .cast(entries(&[("age", Value::Int(15))]))
            .validate_number(
                "age",
                NumberBounds {
                    greater_than_or_equal_to: Some(18.0),
                    less_than: Some(120.0),
                    ..NumberBounds::default()
                },
            );
        assert!(!cs.is_valid());
        assert_eq!(cs.errors().items[0].code, ValidationCode::Number);
    }

    #[test]
    fn force_changes_marks_all_data() {
        let cs = Changeset::from_data(
            users_schema(),
            entries(&[("name", Value::Text("Alice".into()))]),
        );
        assert!(!cs.changed("name"));
        let cs = cs.force_changes();
        assert!(cs.changed("name"));
    }

    #[test]
    fn put_change_ignores_unknown_fields() {
        let cs = Changeset::new(users_schema())
            .put_change("nope", 1)
            .put_change("age", 21);
        assert!(cs.get("nope").is_none());
        assert_eq!(cs.get_change("age"), Some(&Value::Int(21)));
    }
}
