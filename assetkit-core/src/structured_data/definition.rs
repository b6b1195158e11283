// Data definitions: the schema a structured-data tree is checked against
//
// The CMS owns the real schema engine. This module only describes what the
// tree needs to know about each field, behind the `DataDefinition` trait,
// plus an in-memory `DefinitionTree` read from a JSON description.

use super::node::NodeType;
use crate::error::{PropertyError, Result};
use crate::wire;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Separator of identifier segments in schema paths and FQIs
pub const DELIMITER: char = ';';

/// Flavour of a text field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextType {
    Plain,
    Multiline,
    Wysiwyg,
    Checkbox,
    Dropdown,
    Radio,
    Multiselect,
    Datetime,
    Calendar,
}

impl TextType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextType::Plain => "text",
            TextType::Multiline => "multi-line",
            TextType::Wysiwyg => "wysiwyg",
            TextType::Checkbox => "checkbox",
            TextType::Dropdown => "dropdown",
            TextType::Radio => "radiobutton",
            TextType::Multiselect => "multi-selector",
            TextType::Datetime => "datetime",
            TextType::Calendar => "calendar",
        }
    }

    /// Value comes from `possible_values`
    pub fn is_chooser(&self) -> bool {
        matches!(
            self,
            TextType::Checkbox | TextType::Dropdown | TextType::Radio | TextType::Multiselect
        )
    }

    /// Chooser storing several selections in one string
    pub fn is_multi_select(&self) -> bool {
        matches!(self, TextType::Checkbox | TextType::Multiselect)
    }

    /// Free-form text that search and replace may touch
    pub fn is_free_text(&self) -> bool {
        matches!(
            self,
            TextType::Plain | TextType::Multiline | TextType::Wysiwyg
        )
    }
}

impl FromStr for TextType {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "text" => Ok(TextType::Plain),
            "multi-line" => Ok(TextType::Multiline),
            "wysiwyg" => Ok(TextType::Wysiwyg),
            "checkbox" => Ok(TextType::Checkbox),
            "dropdown" => Ok(TextType::Dropdown),
            "radiobutton" => Ok(TextType::Radio),
            "multi-selector" => Ok(TextType::Multiselect),
            "datetime" => Ok(TextType::Datetime),
            "calendar" => Ok(TextType::Calendar),
            _ => Err(PropertyError::invalid("textType", s, "unknown text type")),
        }
    }
}

/// One of the four link slots of an asset node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Block,
    File,
    Page,
    Symlink,
}

impl LinkKind {
    pub const ALL: [LinkKind; 4] = [
        LinkKind::Block,
        LinkKind::File,
        LinkKind::Page,
        LinkKind::Symlink,
    ];

    /// Prefix of the `<prefix>Id` / `<prefix>Path` wire members
    pub fn wire_prefix(&self) -> &'static str {
        match self {
            LinkKind::Block => "block",
            LinkKind::File => "file",
            LinkKind::Page => "page",
            LinkKind::Symlink => "symlink",
        }
    }
}

/// Asset chooser type of an asset field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Block,
    File,
    Page,
    Symlink,
    PageFileSymlink,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Block => "block",
            AssetKind::File => "file",
            AssetKind::Page => "page",
            AssetKind::Symlink => "symlink",
            AssetKind::PageFileSymlink => "page,file,symlink",
        }
    }

    pub fn accepts(&self, link: LinkKind) -> bool {
        matches!(
            (self, link),
            (AssetKind::Block, LinkKind::Block)
                | (AssetKind::File, LinkKind::File)
                | (AssetKind::Page, LinkKind::Page)
                | (AssetKind::Symlink, LinkKind::Symlink)
                | (AssetKind::PageFileSymlink, LinkKind::Page)
                | (AssetKind::PageFileSymlink, LinkKind::File)
                | (AssetKind::PageFileSymlink, LinkKind::Symlink)
        )
    }
}

impl FromStr for AssetKind {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "block" => Ok(AssetKind::Block),
            "file" => Ok(AssetKind::File),
            "page" => Ok(AssetKind::Page),
            "symlink" => Ok(AssetKind::Symlink),
            "page,file,symlink" => Ok(AssetKind::PageFileSymlink),
            _ => Err(PropertyError::invalid("assetType", s, "unknown asset type")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Group,
    Text(TextType),
    Asset(AssetKind),
}

impl FieldKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            FieldKind::Group => NodeType::Group,
            FieldKind::Text(_) => NodeType::Text,
            FieldKind::Asset(_) => NodeType::Asset,
        }
    }
}

/// What the schema says about one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub identifier: String,
    pub kind: FieldKind,
    pub multiple: bool,
    pub required: bool,
    pub min_instances: Option<usize>,
    pub max_instances: Option<usize>,
    pub possible_values: Vec<String>,
    pub default_value: Option<String>,
    pub children: Vec<FieldDefinition>,
}

impl FieldDefinition {
    pub fn new(identifier: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
            multiple: false,
            required: false,
            min_instances: None,
            max_instances: None,
            possible_values: Vec::new(),
            default_value: None,
            children: Vec::new(),
        }
    }

    /// Instances a tree must always keep
    pub fn min_count(&self) -> usize {
        self.min_instances.unwrap_or(1).max(1)
    }

    pub fn child(&self, identifier: &str) -> Option<&FieldDefinition> {
        self.children.iter().find(|c| c.identifier == identifier)
    }

    pub fn text_type(&self) -> Option<TextType> {
        match self.kind {
            FieldKind::Text(t) => Some(t),
            _ => None,
        }
    }

    fn from_value(value: &Value, parent: &str) -> Result<Self> {
        let obj = wire::as_object(value, "field definition")?;
        let identifier = wire::required_string(obj, "identifier")?;
        wire::non_empty("identifier", &identifier)?;
        if identifier.contains(DELIMITER) {
            return Err(PropertyError::invalid(
                "identifier",
                identifier,
                "must not contain ';'",
            ));
        }
        let path = if parent.is_empty() {
            identifier.clone()
        } else {
            format!("{}{}{}", parent, DELIMITER, identifier)
        };

        let kind = match wire::required_string(obj, "type")?.as_str() {
            "group" => FieldKind::Group,
            "text" => FieldKind::Text(
                wire::opt_string(obj, "textType")
                    .unwrap_or_default()
                    .parse()?,
            ),
            "asset" => FieldKind::Asset(wire::required_string(obj, "assetType")?.parse()?),
            other => {
                return Err(PropertyError::invalid(
                    path,
                    other,
                    "expected group, text or asset",
                ))
            }
        };

        let count = |key: &str| -> Result<Option<usize>> {
            match obj.get(key) {
                None | Some(Value::Null) => Ok(None),
                Some(v) => v
                    .as_u64()
                    .map(|n| Some(n as usize))
                    .ok_or_else(|| {
                        PropertyError::invalid(key, wire::display_value(v), "not a count")
                    }),
            }
        };

        let possible_values: Vec<String> = obj
            .get("possibleValues")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let children = match obj.get("fields") {
            Some(Value::Array(fields)) => fields
                .iter()
                .map(|f| FieldDefinition::from_value(f, &path))
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };

        let field = Self {
            identifier,
            kind,
            multiple: wire::bool_field(obj, "multiple", false)?,
            required: wire::bool_field(obj, "required", false)?,
            min_instances: count("minimum")?,
            max_instances: count("maximum")?,
            possible_values,
            default_value: wire::opt_string(obj, "default"),
            children,
        };
        field.check(&path)?;
        Ok(field)
    }

    fn check(&self, path: &str) -> Result<()> {
        match self.kind {
            FieldKind::Group if self.children.is_empty() => {
                return Err(PropertyError::invalid(path, "group", "group has no fields"));
            }
            FieldKind::Group => {
                let mut seen = HashSet::new();
                for child in &self.children {
                    if !seen.insert(child.identifier.as_str()) {
                        return Err(PropertyError::invalid(
                            path,
                            child.identifier.as_str(),
                            "duplicate field identifier",
                        ));
                    }
                }
            }
            FieldKind::Text(t) if t.is_chooser() => {
                if self.possible_values.is_empty() {
                    return Err(PropertyError::invalid(
                        path,
                        t.as_str(),
                        "chooser needs possible values",
                    ));
                }
                if let Some(default) = &self.default_value {
                    if !self.possible_values.contains(default) {
                        return Err(PropertyError::invalid(
                            path,
                            default.as_str(),
                            "default is not a possible value",
                        ));
                    }
                }
            }
            _ => {}
        }
        if let (Some(min), Some(max)) = (self.min_instances, self.max_instances) {
            if min > max {
                return Err(PropertyError::invalid(
                    path,
                    format!("{}..{}", min, max),
                    "minimum exceeds maximum",
                ));
            }
        }
        if !self.multiple && (self.min_instances.unwrap_or(1) > 1 || self.max_instances.is_some()) {
            return Err(PropertyError::invalid(
                path,
                "multiple=false",
                "instance limits need a multiple field",
            ));
        }
        Ok(())
    }
}

/// Schema source consumed by structured data
pub trait DataDefinition: fmt::Debug + Send + Sync {
    /// Top-level fields
    fn fields(&self) -> &[FieldDefinition];

    fn id(&self) -> Option<&str> {
        None
    }

    fn path(&self) -> Option<&str> {
        None
    }

    /// Field at a schema path such as `group;sub-group;text`
    fn field(&self, schema_path: &str) -> Option<&FieldDefinition> {
        let mut segments = schema_path.split(DELIMITER);
        let first = segments.next()?;
        let mut field = self.fields().iter().find(|f| f.identifier == first)?;
        for segment in segments {
            field = field.child(segment)?;
        }
        Some(field)
    }

    fn has_field(&self, schema_path: &str) -> bool {
        self.field(schema_path).is_some()
    }

    /// Every schema path, depth first
    fn schema_paths(&self) -> Vec<String> {
        fn walk(fields: &[FieldDefinition], prefix: &str, out: &mut Vec<String>) {
            for field in fields {
                let path = if prefix.is_empty() {
                    field.identifier.clone()
                } else {
                    format!("{}{}{}", prefix, DELIMITER, field.identifier)
                };
                out.push(path.clone());
                walk(&field.children, &path, out);
            }
        }
        let mut out = Vec::new();
        walk(self.fields(), "", &mut out);
        out
    }
}

/// In-memory data definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionTree {
    id: Option<String>,
    path: Option<String>,
    fields: Vec<FieldDefinition>,
}

impl DefinitionTree {
    pub fn new(id: Option<&str>, path: Option<&str>, fields: Vec<FieldDefinition>) -> Self {
        Self {
            id: id.map(str::to_string),
            path: path.map(str::to_string),
            fields,
        }
    }

    /// Parse `{"id", "path", "fields": [...]}`
    ///
    /// Each field: `identifier`, `type` (group/text/asset), optional
    /// `multiple`, `required`, `minimum`, `maximum`, `textType`,
    /// `assetType`, `possibleValues`, `default` and, for groups, `fields`.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = wire::as_object(value, "data definition")?;
        let fields = match obj.get("fields") {
            Some(Value::Array(fields)) if !fields.is_empty() => fields
                .iter()
                .map(|f| FieldDefinition::from_value(f, ""))
                .collect::<Result<Vec<_>>>()?,
            _ => {
                return Err(PropertyError::MissingField {
                    field: "fields".to_string(),
                })
            }
        };
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.identifier.as_str()) {
                return Err(PropertyError::invalid(
                    "fields",
                    field.identifier.as_str(),
                    "duplicate field identifier",
                ));
            }
        }
        Ok(Self {
            id: wire::opt_string(obj, "id"),
            path: wire::opt_string(obj, "path"),
            fields,
        })
    }
}

impl DataDefinition for DefinitionTree {
    fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}
