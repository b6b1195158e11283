// Asset metadata: wired fields, dates and dynamic fields

use crate::error::{PropertyError, Result};
use crate::identifier::Reference;
use crate::wire::{self, Transport, WireFormat};
use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Fixed metadata fields every metadata set knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WiredField {
    Author,
    DisplayName,
    Keywords,
    MetaDescription,
    Summary,
    Teaser,
    Title,
    StartDate,
    EndDate,
    ReviewDate,
}

impl WiredField {
    pub const ALL: [WiredField; 10] = [
        WiredField::Author,
        WiredField::DisplayName,
        WiredField::Keywords,
        WiredField::MetaDescription,
        WiredField::Summary,
        WiredField::Teaser,
        WiredField::Title,
        WiredField::StartDate,
        WiredField::EndDate,
        WiredField::ReviewDate,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            WiredField::Author => "author",
            WiredField::DisplayName => "displayName",
            WiredField::Keywords => "keywords",
            WiredField::MetaDescription => "metaDescription",
            WiredField::Summary => "summary",
            WiredField::Teaser => "teaser",
            WiredField::Title => "title",
            WiredField::StartDate => "startDate",
            WiredField::EndDate => "endDate",
            WiredField::ReviewDate => "reviewDate",
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(
            self,
            WiredField::StartDate | WiredField::EndDate | WiredField::ReviewDate
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicFieldType {
    Text,
    Radio,
    Checkbox,
    Dropdown,
    Multiselect,
    Datetime,
    Calendar,
}

impl DynamicFieldType {
    /// Takes its values from a fixed list
    pub fn is_chooser(&self) -> bool {
        matches!(
            self,
            DynamicFieldType::Radio
                | DynamicFieldType::Checkbox
                | DynamicFieldType::Dropdown
                | DynamicFieldType::Multiselect
        )
    }

    pub fn allows_multiple_values(&self) -> bool {
        matches!(
            self,
            DynamicFieldType::Checkbox | DynamicFieldType::Multiselect
        )
    }
}

/// Definition of a dynamic field in the metadata set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicFieldDefinition {
    pub name: String,
    pub field_type: DynamicFieldType,
    pub required: bool,
    pub possible_values: Vec<String>,
}

/// Constraints a metadata set places on metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRules {
    pub required: Vec<WiredField>,
    pub dynamic_fields: Vec<DynamicFieldDefinition>,
}

impl MetadataRules {
    pub fn is_required(&self, field: WiredField) -> bool {
        self.required.contains(&field)
    }

    pub fn dynamic_field(&self, name: &str) -> Option<&DynamicFieldDefinition> {
        self.dynamic_fields.iter().find(|d| d.name == name)
    }
}

/// A dynamic field and its values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicField {
    pub name: String,
    pub values: Vec<String>,
}

impl WireFormat for DynamicField {
    fn from_wire(value: &Value) -> Result<Self> {
        let obj = wire::as_object(value, "dynamicField")?;
        let name = wire::required_string(obj, "name")?;
        let values = wire::list_items(obj.get("fieldValues"), "fieldValue")
            .into_iter()
            .filter_map(|v| v.as_object().and_then(|o| wire::opt_string(o, "value")))
            .collect();
        Ok(Self { name, values })
    }

    fn to_wire(&self, transport: Transport) -> Value {
        let values = self
            .values
            .iter()
            .map(|v| {
                let mut m = Map::new();
                m.insert("value".into(), Value::String(v.clone()));
                Value::Object(m)
            })
            .collect();
        let mut map = Map::new();
        map.insert("name".into(), Value::String(self.name.clone()));
        map.insert(
            "fieldValues".into(),
            wire::wrap_list(transport, "fieldValue", values),
        );
        Value::Object(map)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    text: BTreeMap<WiredField, String>,
    dates: BTreeMap<WiredField, DateTime<FixedOffset>>,
    expiration_folder: Option<Reference>,
    expiration_folder_recycled: bool,
    dynamic_fields: Vec<DynamicField>,
    rules: Option<MetadataRules>,
}

fn parse_date(field: WiredField, value: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value.trim()).map_err(|e| {
        PropertyError::invalid(field.wire_name(), value, format!("not an RFC 3339 date: {}", e))
    })
}

impl Metadata {
    /// Attach the metadata set's rules; later writes are validated against them
    pub fn with_rules(mut self, rules: MetadataRules) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn rules(&self) -> Option<&MetadataRules> {
        self.rules.as_ref()
    }

    /// Wired field as a string; dates in RFC 3339
    pub fn wired(&self, field: WiredField) -> Option<String> {
        if field.is_date() {
            self.dates.get(&field).map(|d| d.to_rfc3339())
        } else {
            self.text.get(&field).cloned()
        }
    }

    pub fn date(&self, field: WiredField) -> Option<DateTime<FixedOffset>> {
        self.dates.get(&field).copied()
    }

    /// Set or clear a wired field
    pub fn set_wired(&mut self, field: WiredField, value: Option<&str>) -> Result<&mut Self> {
        let value = value.filter(|v| !v.trim().is_empty());
        if value.is_none() && self.rules.as_ref().is_some_and(|r| r.is_required(field)) {
            return Err(PropertyError::EmptyValue {
                field: field.wire_name().to_string(),
            });
        }
        match (field.is_date(), value) {
            (true, Some(v)) => {
                self.dates.insert(field, parse_date(field, v)?);
            }
            (true, None) => {
                self.dates.remove(&field);
            }
            (false, Some(v)) => {
                self.text.insert(field, v.to_string());
            }
            (false, None) => {
                self.text.remove(&field);
            }
        }
        Ok(self)
    }

    pub fn expiration_folder(&self) -> Option<&Reference> {
        self.expiration_folder.as_ref()
    }

    pub fn set_expiration_folder(&mut self, folder: Option<Reference>) -> &mut Self {
        self.expiration_folder = folder.filter(|f| !f.is_empty());
        self.expiration_folder_recycled = false;
        self
    }

    pub fn dynamic_field(&self, name: &str) -> Option<&DynamicField> {
        self.dynamic_fields.iter().find(|f| f.name == name)
    }

    pub fn has_dynamic_field(&self, name: &str) -> bool {
        self.dynamic_field(name).is_some()
    }

    pub fn dynamic_field_names(&self) -> Vec<&str> {
        self.dynamic_fields.iter().map(|f| f.name.as_str()).collect()
    }

    fn validate_dynamic(definition: &DynamicFieldDefinition, values: &[String]) -> Result<()> {
        if values.is_empty() && definition.required {
            return Err(PropertyError::EmptyValue {
                field: definition.name.clone(),
            });
        }
        if values.len() > 1 && !definition.field_type.allows_multiple_values() {
            return Err(PropertyError::invalid(
                &definition.name,
                values.join(", "),
                "field takes a single value",
            ));
        }
        if definition.field_type.is_chooser() {
            if let Some(bad) = values
                .iter()
                .find(|v| !definition.possible_values.contains(v))
            {
                return Err(PropertyError::invalid(
                    &definition.name,
                    bad.as_str(),
                    "not a possible value",
                ));
            }
        }
        Ok(())
    }

    /// Replace the values of a dynamic field
    ///
    /// Blank values are dropped. With rules attached the field must be
    /// defined by them and the values must satisfy its type.
    pub fn set_dynamic_field_values(&mut self, name: &str, values: &[&str]) -> Result<&mut Self> {
        let values: Vec<String> = values
            .iter()
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.to_string())
            .collect();

        match &self.rules {
            Some(rules) => {
                let definition = rules
                    .dynamic_field(name)
                    .ok_or_else(|| PropertyError::NoSuchDynamicField(name.to_string()))?;
                Self::validate_dynamic(definition, &values)?;
            }
            None if !self.has_dynamic_field(name) => {
                return Err(PropertyError::NoSuchDynamicField(name.to_string()));
            }
            None => {}
        }

        debug!("dynamic field {} set to {:?}", name, values);
        match self.dynamic_fields.iter_mut().find(|f| f.name == name) {
            Some(field) => field.values = values,
            None => self.dynamic_fields.push(DynamicField {
                name: name.to_string(),
                values,
            }),
        }
        Ok(self)
    }

    pub fn clear_dynamic_field(&mut self, name: &str) -> Result<&mut Self> {
        self.set_dynamic_field_values(name, &[])
    }
}

impl WireFormat for Metadata {
    fn from_wire(value: &Value) -> Result<Self> {
        let obj = wire::as_object(value, "metadata")?;
        let mut text = BTreeMap::new();
        let mut dates = BTreeMap::new();
        for field in WiredField::ALL {
            let Some(raw) = wire::opt_string(obj, field.wire_name()) else {
                continue;
            };
            if raw.trim().is_empty() {
                continue;
            }
            if field.is_date() {
                dates.insert(field, parse_date(field, &raw)?);
            } else {
                text.insert(field, raw);
            }
        }
        let dynamic_fields = wire::list_items(obj.get("dynamicFields"), "dynamicField")
            .into_iter()
            .map(DynamicField::from_wire)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            text,
            dates,
            expiration_folder: Reference::read(obj, "expirationFolder"),
            expiration_folder_recycled: wire::bool_field(obj, "expirationFolderRecycled", false)?,
            dynamic_fields,
            rules: None,
        })
    }

    fn to_wire(&self, transport: Transport) -> Value {
        let mut map = Map::new();
        for field in WiredField::ALL {
            wire::put_opt(&mut map, field.wire_name(), self.wired(field).as_deref());
        }
        Reference::write(self.expiration_folder.as_ref(), &mut map, "expirationFolder");
        if self.expiration_folder.is_some() {
            map.insert(
                "expirationFolderRecycled".into(),
                Value::Bool(self.expiration_folder_recycled),
            );
        }
        let fields = self
            .dynamic_fields
            .iter()
            .map(|f| f.to_wire(transport))
            .collect();
        map.insert(
            "dynamicFields".into(),
            wire::wrap_list(transport, "dynamicField", fields),
        );
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Metadata {
        Metadata::from_wire(&json!({
            "author": "Ada",
            "title": "Home",
            "summary": "",
            "startDate": "2024-03-01T09:00:00-05:00",
            "expirationFolderPath": "/archive",
            "dynamicFields": {"dynamicField": [
                {"name": "audience", "fieldValues": {"fieldValue": [{"value": "staff"}, {"value": "students"}]}},
                {"name": "featured", "fieldValues": {"fieldValue": {"value": "No"}}}
            ]}
        }))
        .unwrap()
    }

    fn rules() -> MetadataRules {
        MetadataRules {
            required: vec![WiredField::Title],
            dynamic_fields: vec![
                DynamicFieldDefinition {
                    name: "audience".into(),
                    field_type: DynamicFieldType::Checkbox,
                    required: false,
                    possible_values: vec!["staff".into(), "students".into(), "alumni".into()],
                },
                DynamicFieldDefinition {
                    name: "featured".into(),
                    field_type: DynamicFieldType::Radio,
                    required: true,
                    possible_values: vec!["Yes".into(), "No".into()],
                },
            ],
        }
    }

    #[test]
    fn test_from_wire() {
        let md = sample();
        assert_eq!(md.wired(WiredField::Author).as_deref(), Some("Ada"));
        assert_eq!(md.wired(WiredField::Summary), None);
        assert!(md.date(WiredField::StartDate).is_some());
        assert_eq!(md.expiration_folder().unwrap().path.as_deref(), Some("/archive"));
        assert_eq!(md.dynamic_field("audience").unwrap().values.len(), 2);
        assert_eq!(md.dynamic_field("featured").unwrap().values, vec!["No"]);
        assert_eq!(md.dynamic_field_names(), vec!["audience", "featured"]);
    }

    #[test]
    fn test_bad_date_rejected() {
        let err = Metadata::from_wire(&json!({"endDate": "tomorrow"})).unwrap_err();
        assert!(matches!(err, PropertyError::InvalidValue { .. }));
    }

    #[test]
    fn test_required_wired_field() {
        let mut md = sample().with_rules(rules());
        assert!(md.set_wired(WiredField::Title, Some("  ")).is_err());
        md.set_wired(WiredField::Author, None).unwrap();
        assert_eq!(md.wired(WiredField::Author), None);
        md.set_wired(WiredField::ReviewDate, Some("2025-01-01T00:00:00Z"))
            .unwrap();
        assert!(md.wired(WiredField::ReviewDate).unwrap().starts_with("2025-01-01"));
    }

    #[test]
    fn test_dynamic_field_validation() {
        let mut md = sample().with_rules(rules());
        md.set_dynamic_field_values("audience", &["alumni"]).unwrap();
        assert_eq!(md.dynamic_field("audience").unwrap().values, vec!["alumni"]);

        assert!(md.set_dynamic_field_values("audience", &["parents"]).is_err());
        assert!(md.set_dynamic_field_values("featured", &["Yes", "No"]).is_err());
        assert!(md.clear_dynamic_field("featured").is_err());
        assert!(matches!(
            md.set_dynamic_field_values("color", &["red"]),
            Err(PropertyError::NoSuchDynamicField(_))
        ));
    }

    #[test]
    fn test_dynamic_field_without_rules_must_exist() {
        let mut md = sample();
        md.set_dynamic_field_values("featured", &["anything"]).unwrap();
        assert!(md.set_dynamic_field_values("color", &["red"]).is_err());
    }

    #[test]
    fn test_to_wire_dialects() {
        let md = sample();
        let soap = md.to_wire(Transport::Soap);
        assert_eq!(soap["author"], json!("Ada"));
        assert_eq!(soap["expirationFolderPath"], json!("/archive"));
        assert_eq!(
            soap["dynamicFields"]["dynamicField"][1],
            json!({"name": "featured", "fieldValues": {"fieldValue": {"value": "No"}}})
        );
        let rest = md.to_wire(Transport::Rest);
        assert_eq!(
            rest["dynamicFields"][0]["fieldValues"],
            json!([{"value": "staff"}, {"value": "students"}])
        );
    }
}
