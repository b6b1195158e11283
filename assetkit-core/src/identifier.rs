// Asset identifiers and inline id/path references

use crate::error::{PropertyError, Result};
use crate::wire::{self, Transport, WireFormat};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Asset type names as the service spells them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Page,
    File,
    Folder,
    Symlink,
    Block,
    FeedBlock,
    IndexBlock,
    TextBlock,
    DataDefinitionBlock,
    XmlBlock,
    Format,
    XsltFormat,
    ScriptFormat,
    Template,
    WorkflowDefinition,
    DataDefinition,
    MetadataSet,
    Site,
    User,
    Group,
    Role,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Page => "page",
            EntityType::File => "file",
            EntityType::Folder => "folder",
            EntityType::Symlink => "symlink",
            EntityType::Block => "block",
            EntityType::FeedBlock => "block_FEED",
            EntityType::IndexBlock => "block_INDEX",
            EntityType::TextBlock => "block_TEXT",
            EntityType::DataDefinitionBlock => "block_XHTML_DATADEFINITION",
            EntityType::XmlBlock => "block_XML",
            EntityType::Format => "format",
            EntityType::XsltFormat => "format_XSLT",
            EntityType::ScriptFormat => "format_SCRIPT",
            EntityType::Template => "template",
            EntityType::WorkflowDefinition => "workflowdefinition",
            EntityType::DataDefinition => "datadefinition",
            EntityType::MetadataSet => "metadataset",
            EntityType::Site => "site",
            EntityType::User => "user",
            EntityType::Group => "group",
            EntityType::Role => "role",
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(
            self,
            EntityType::Block
                | EntityType::FeedBlock
                | EntityType::IndexBlock
                | EntityType::TextBlock
                | EntityType::DataDefinitionBlock
                | EntityType::XmlBlock
        )
    }

    pub fn is_format(&self) -> bool {
        matches!(
            self,
            EntityType::Format | EntityType::XsltFormat | EntityType::ScriptFormat
        )
    }
}

impl FromStr for EntityType {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self> {
        let parsed = match s {
            "page" => EntityType::Page,
            "file" => EntityType::File,
            "folder" => EntityType::Folder,
            "symlink" => EntityType::Symlink,
            "block" => EntityType::Block,
            "block_FEED" => EntityType::FeedBlock,
            "block_INDEX" => EntityType::IndexBlock,
            "block_TEXT" => EntityType::TextBlock,
            "block_XHTML_DATADEFINITION" => EntityType::DataDefinitionBlock,
            "block_XML" => EntityType::XmlBlock,
            "format" => EntityType::Format,
            "format_XSLT" => EntityType::XsltFormat,
            "format_SCRIPT" => EntityType::ScriptFormat,
            "template" => EntityType::Template,
            "workflowdefinition" => EntityType::WorkflowDefinition,
            "datadefinition" => EntityType::DataDefinition,
            "metadataset" => EntityType::MetadataSet,
            "site" => EntityType::Site,
            "user" => EntityType::User,
            "group" => EntityType::Group,
            "role" => EntityType::Role,
            _ => return Err(PropertyError::invalid("type", s, "unknown asset type")),
        };
        Ok(parsed)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path of an asset, optionally qualified by its site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPath {
    pub path: String,
    pub site_id: Option<String>,
    pub site_name: Option<String>,
}

impl AssetPath {
    pub fn new(path: impl Into<String>, site_name: Option<&str>) -> Self {
        Self {
            path: path.into(),
            site_id: None,
            site_name: site_name.map(str::to_string),
        }
    }

    fn same_location(&self, other: &AssetPath) -> bool {
        if self.path != other.path {
            return false;
        }
        match (&self.site_id, &other.site_id) {
            (Some(a), Some(b)) => a == b,
            _ => self.site_name == other.site_name,
        }
    }
}

/// Full identifier of an asset: `{id, path, type, recycled}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub id: Option<String>,
    pub path: Option<AssetPath>,
    pub entity_type: EntityType,
    pub recycled: bool,
}

impl Identifier {
    pub fn by_id(entity_type: EntityType, id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            path: None,
            entity_type,
            recycled: false,
        }
    }

    pub fn by_path(entity_type: EntityType, path: impl Into<String>, site_name: &str) -> Self {
        Self {
            id: None,
            path: Some(AssetPath::new(path, Some(site_name))),
            entity_type,
            recycled: false,
        }
    }

    /// True when both name the same asset, by id or by site-qualified path
    pub fn matches(&self, other: &Identifier) -> bool {
        if self.entity_type != other.entity_type {
            return false;
        }
        if let (Some(a), Some(b)) = (&self.id, &other.id) {
            return a == b;
        }
        match (&self.path, &other.path) {
            (Some(a), Some(b)) => a.same_location(b),
            _ => false,
        }
    }
}

impl WireFormat for Identifier {
    fn from_wire(value: &Value) -> Result<Self> {
        let obj = wire::as_object(value, "identifier")?;
        let id = wire::opt_string(obj, "id");
        let path = match obj.get("path") {
            Some(Value::Object(p)) => Some(AssetPath {
                path: wire::required_string(p, "path")?,
                site_id: wire::opt_string(p, "siteId"),
                site_name: wire::opt_string(p, "siteName"),
            }),
            // Some responses flatten the path to a plain string
            Some(Value::String(p)) => Some(AssetPath::new(p.clone(), None)),
            _ => None,
        };
        if id.is_none() && path.is_none() {
            return Err(PropertyError::MissingField {
                field: "id or path".to_string(),
            });
        }
        let entity_type = wire::required_string(obj, "type")?.parse()?;
        Ok(Self {
            id,
            path,
            entity_type,
            recycled: wire::bool_field(obj, "recycled", false)?,
        })
    }

    fn to_wire(&self, _transport: Transport) -> Value {
        let mut map = Map::new();
        wire::put_opt(&mut map, "id", self.id.as_deref());
        if let Some(path) = &self.path {
            let mut p = Map::new();
            p.insert("path".to_string(), Value::String(path.path.clone()));
            wire::put_opt(&mut p, "siteId", path.site_id.as_deref());
            wire::put_opt(&mut p, "siteName", path.site_name.as_deref());
            map.insert("path".to_string(), Value::Object(p));
        }
        map.insert(
            "type".to_string(),
            Value::String(self.entity_type.as_str().to_string()),
        );
        map.insert("recycled".to_string(), Value::Bool(self.recycled));
        Value::Object(map)
    }
}

/// Inline id/path pair such as `blockId`/`blockPath`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reference {
    pub id: Option<String>,
    pub path: Option<String>,
}

impl Reference {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            path: None,
        }
    }

    pub fn by_path(path: impl Into<String>) -> Self {
        Self {
            id: None,
            path: Some(path.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.path.is_none()
    }

    /// Read `<prefix>Id` / `<prefix>Path`; `None` when both are absent
    pub fn read(obj: &Map<String, Value>, prefix: &str) -> Option<Self> {
        let reference = Self {
            id: wire::opt_string(obj, &format!("{}Id", prefix)),
            path: wire::opt_string(obj, &format!("{}Path", prefix)),
        };
        (!reference.is_empty()).then_some(reference)
    }

    /// Write `<prefix>Id` / `<prefix>Path` members
    pub fn write(reference: Option<&Reference>, map: &mut Map<String, Value>, prefix: &str) {
        if let Some(r) = reference {
            wire::put_opt(map, &format!("{}Id", prefix), r.id.as_deref());
            wire::put_opt(map, &format!("{}Path", prefix), r.path.as_deref());
        }
    }

    /// Promote to a full identifier of the given type
    pub fn to_identifier(&self, entity_type: EntityType, site_name: Option<&str>) -> Identifier {
        Identifier {
            id: self.id.clone(),
            path: self
                .path
                .as_ref()
                .map(|p| AssetPath::new(p.clone(), site_name)),
            entity_type,
            recycled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier_from_wire() {
        let value = json!({
            "id": "abc123",
            "path": {"path": "/about/index", "siteName": "www"},
            "type": "page",
            "recycled": "false"
        });
        let ident = Identifier::from_wire(&value).unwrap();
        assert_eq!(ident.id.as_deref(), Some("abc123"));
        assert_eq!(ident.entity_type, EntityType::Page);
        assert_eq!(ident.path.unwrap().site_name.as_deref(), Some("www"));
    }

    #[test]
    fn test_identifier_requires_id_or_path() {
        let err = Identifier::from_wire(&json!({"type": "page"})).unwrap_err();
        assert!(matches!(err, PropertyError::MissingField { .. }));
    }

    #[test]
    fn test_identifier_rejects_unknown_type() {
        let err = Identifier::from_wire(&json!({"id": "x", "type": "spaceship"})).unwrap_err();
        assert!(matches!(err, PropertyError::InvalidValue { .. }));
    }

    #[test]
    fn test_identifier_matches() {
        let a = Identifier::by_path(EntityType::WorkflowDefinition, "/wf/approve", "www");
        let b = Identifier::by_path(EntityType::WorkflowDefinition, "/wf/approve", "www");
        let c = Identifier::by_path(EntityType::WorkflowDefinition, "/wf/approve", "intranet");
        assert!(a.matches(&b));
        assert!(!a.matches(&c));
        let page = Identifier::by_id(EntityType::Page, "1");
        assert!(page.matches(&Identifier::by_id(EntityType::Page, "1")));
        assert!(!page.matches(&Identifier::by_id(EntityType::File, "1")));
    }

    #[test]
    fn test_reference_read_write() {
        let obj = json!({"blockId": "b1", "formatPath": "/formats/x"});
        let obj = obj.as_object().unwrap();
        let block = Reference::read(obj, "block").unwrap();
        assert_eq!(block, Reference::by_id("b1"));
        assert_eq!(Reference::read(obj, "format").unwrap().path.as_deref(), Some("/formats/x"));
        assert!(Reference::read(obj, "page").is_none());

        let mut out = Map::new();
        Reference::write(Some(&block), &mut out, "block");
        assert_eq!(Value::Object(out), json!({"blockId": "b1"}));
    }
}
