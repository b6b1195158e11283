// A single node of a structured-data tree

use super::definition::{AssetKind, FieldDefinition, FieldKind, LinkKind, DELIMITER};
use super::text;
use crate::error::{PropertyError, Result};
use crate::identifier::Reference;
use crate::wire::{self, Transport};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Group,
    Text,
    Asset,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Group => "group",
            NodeType::Text => "text",
            NodeType::Asset => "asset",
        }
    }
}

impl FromStr for NodeType {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "group" => Ok(NodeType::Group),
            "text" => Ok(NodeType::Text),
            "asset" => Ok(NodeType::Asset),
            _ => Err(PropertyError::invalid("type", s, "unknown node type")),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Link slots of an asset node; at most one is set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetContent {
    pub asset_type: AssetKind,
    block: Option<Reference>,
    file: Option<Reference>,
    page: Option<Reference>,
    symlink: Option<Reference>,
    pub recycled: bool,
}

impl AssetContent {
    pub fn empty(asset_type: AssetKind) -> Self {
        Self {
            asset_type,
            block: None,
            file: None,
            page: None,
            symlink: None,
            recycled: false,
        }
    }

    fn slot(&self, kind: LinkKind) -> Option<&Reference> {
        match kind {
            LinkKind::Block => self.block.as_ref(),
            LinkKind::File => self.file.as_ref(),
            LinkKind::Page => self.page.as_ref(),
            LinkKind::Symlink => self.symlink.as_ref(),
        }
    }

    /// The linked asset, if any
    pub fn link(&self) -> Option<(LinkKind, &Reference)> {
        LinkKind::ALL
            .iter()
            .find_map(|&kind| self.slot(kind).map(|r| (kind, r)))
    }

    /// Replace the link; every other slot is cleared
    pub(crate) fn set_link(&mut self, kind: LinkKind, reference: Option<Reference>) {
        self.block = None;
        self.file = None;
        self.page = None;
        self.symlink = None;
        self.recycled = false;
        let reference = reference.filter(|r| !r.is_empty());
        match kind {
            LinkKind::Block => self.block = reference,
            LinkKind::File => self.file = reference,
            LinkKind::Page => self.page = reference,
            LinkKind::Symlink => self.symlink = reference,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeContent {
    Group(Vec<StructuredDataNode>),
    Text(String),
    Asset(AssetContent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredDataNode {
    pub(crate) identifier: String,
    pub(crate) fqi: String,
    /// Identifiers from the root, without positions
    pub(crate) path: String,
    pub(crate) index: usize,
    pub(crate) content: NodeContent,
    pub(crate) phantom: bool,
}

impl StructuredDataNode {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn fully_qualified_identifier(&self) -> &str {
        &self.fqi
    }

    /// Position among the live instances of the field; phantoms are
    /// numbered after them
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn node_type(&self) -> NodeType {
        match self.content {
            NodeContent::Group(_) => NodeType::Group,
            NodeContent::Text(_) => NodeType::Text,
            NodeContent::Asset(_) => NodeType::Asset,
        }
    }

    pub fn content(&self) -> &NodeContent {
        &self.content
    }

    pub fn children(&self) -> &[StructuredDataNode] {
        match &self.content {
            NodeContent::Group(children) => children,
            _ => &[],
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            NodeContent::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn asset(&self) -> Option<&AssetContent> {
        match &self.content {
            NodeContent::Asset(a) => Some(a),
            _ => None,
        }
    }

    pub fn is_phantom(&self) -> bool {
        self.phantom
    }

    pub fn schema_path(&self) -> &str {
        &self.path
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<StructuredDataNode>> {
        match &mut self.content {
            NodeContent::Group(children) => Some(children),
            _ => None,
        }
    }

    /// Fresh instance of a field with its default value
    ///
    /// Groups get `min_count` instances of every child field.
    pub(crate) fn blank(field: &FieldDefinition) -> Self {
        let content = match field.kind {
            FieldKind::Group => NodeContent::Group(
                field
                    .children
                    .iter()
                    .flat_map(|child| (0..child.min_count()).map(move |_| Self::blank(child)))
                    .collect(),
            ),
            FieldKind::Text(text_type) => {
                let default = field.default_value.as_deref().unwrap_or_default();
                NodeContent::Text(if text_type.is_multi_select() {
                    text::encode_selections(text_type, &[default])
                } else {
                    default.to_string()
                })
            }
            FieldKind::Asset(kind) => NodeContent::Asset(AssetContent::empty(kind)),
        };
        Self {
            identifier: field.identifier.clone(),
            fqi: String::new(),
            path: String::new(),
            index: 0,
            content,
            phantom: false,
        }
    }

    /// Read a node; FQIs are assigned once the tree is indexed
    pub fn from_wire(value: &Value) -> Result<Self> {
        let obj = wire::as_object(value, "structuredDataNode")?;
        let identifier = wire::required_string(obj, "identifier")?;
        wire::non_empty("identifier", &identifier)?;
        if identifier.contains(DELIMITER) {
            return Err(PropertyError::invalid(
                "identifier",
                identifier,
                "must not contain ';'",
            ));
        }
        let content = match wire::required_string(obj, "type")?.parse::<NodeType>()? {
            NodeType::Group => NodeContent::Group(
                wire::list_items(obj.get("structuredDataNodes"), "structuredDataNode")
                    .into_iter()
                    .map(StructuredDataNode::from_wire)
                    .collect::<Result<Vec<_>>>()?,
            ),
            NodeType::Text => NodeContent::Text(wire::opt_string(obj, "text").unwrap_or_default()),
            NodeType::Asset => {
                let asset_type = wire::required_string(obj, "assetType")?.parse()?;
                NodeContent::Asset(AssetContent {
                    asset_type,
                    block: Reference::read(obj, LinkKind::Block.wire_prefix()),
                    file: Reference::read(obj, LinkKind::File.wire_prefix()),
                    page: Reference::read(obj, LinkKind::Page.wire_prefix()),
                    symlink: Reference::read(obj, LinkKind::Symlink.wire_prefix()),
                    recycled: wire::bool_field(obj, "recycled", false)?,
                })
            }
        };
        Ok(Self {
            identifier,
            fqi: String::new(),
            path: String::new(),
            index: 0,
            content,
            phantom: false,
        })
    }

    pub fn to_wire(&self, transport: Transport) -> Value {
        let mut map = Map::new();
        map.insert(
            "type".into(),
            Value::String(self.node_type().as_str().to_string()),
        );
        map.insert("identifier".into(), Value::String(self.identifier.clone()));
        match &self.content {
            NodeContent::Group(children) => {
                map.insert(
                    "structuredDataNodes".into(),
                    wire::wrap_list(
                        transport,
                        "structuredDataNode",
                        children.iter().map(|c| c.to_wire(transport)).collect(),
                    ),
                );
            }
            NodeContent::Text(t) => {
                map.insert("text".into(), Value::String(t.clone()));
            }
            NodeContent::Asset(asset) => {
                map.insert(
                    "assetType".into(),
                    Value::String(asset.asset_type.as_str().to_string()),
                );
                for kind in LinkKind::ALL {
                    Reference::write(asset.slot(kind), &mut map, kind.wire_prefix());
                }
                map.insert("recycled".into(), Value::Bool(asset.recycled));
            }
        }
        Value::Object(map)
    }
}

/// Join a parent FQI with one level; only repeatable fields carry a position
pub fn child_fqi(parent: &str, identifier: &str, index: Option<usize>) -> String {
    let mut fqi = String::with_capacity(parent.len() + identifier.len() + 4);
    if !parent.is_empty() {
        fqi.push_str(parent);
        fqi.push(DELIMITER);
    }
    fqi.push_str(identifier);
    if let Some(index) = index {
        fqi.push(DELIMITER);
        fqi.push_str(&index.to_string());
    }
    fqi
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structured_data::definition::TextType;
    use serde_json::json;

    #[test]
    fn test_fqi_helpers() {
        assert_eq!(child_fqi("", "group", Some(0)), "group;0");
        assert_eq!(child_fqi("group;0", "text", Some(2)), "group;0;text;2");
        assert_eq!(child_fqi("", "title", None), "title");
        assert_eq!(child_fqi("contact;1", "name", None), "contact;1;name");
    }

    #[test]
    fn test_asset_node_from_wire() {
        let node = StructuredDataNode::from_wire(&json!({
            "type": "asset",
            "identifier": "photo",
            "assetType": "page,file,symlink",
            "fileId": "f1",
            "filePath": "/images/a.png"
        }))
        .unwrap();
        let (kind, reference) = node.asset().unwrap().link().unwrap();
        assert_eq!(kind, LinkKind::File);
        assert_eq!(reference.id.as_deref(), Some("f1"));
    }

    #[test]
    fn test_rejects_bad_identifiers() {
        let empty = json!({"type": "text", "identifier": "", "text": "x"});
        assert!(StructuredDataNode::from_wire(&empty).is_err());
        let delimited = json!({"type": "text", "identifier": "a;b", "text": "x"});
        assert!(StructuredDataNode::from_wire(&delimited).is_err());
        let typeless = json!({"identifier": "a"});
        assert!(StructuredDataNode::from_wire(&typeless).is_err());
    }

    #[test]
    fn test_group_to_wire_soap() {
        let node = StructuredDataNode::from_wire(&json!({
            "type": "group",
            "identifier": "contact",
            "structuredDataNodes": [{"type": "text", "identifier": "name", "text": "Ada"}]
        }))
        .unwrap();
        let soap = node.to_wire(Transport::Soap);
        assert_eq!(
            soap["structuredDataNodes"]["structuredDataNode"]["text"],
            json!("Ada")
        );
    }

    #[test]
    fn test_set_link_clears_other_slots() {
        let mut asset = AssetContent::empty(AssetKind::PageFileSymlink);
        asset.set_link(LinkKind::Page, Some(Reference::by_id("p1")));
        asset.set_link(LinkKind::File, Some(Reference::by_path("/a.pdf")));
        assert_eq!(asset.link().unwrap().0, LinkKind::File);
        assert!(asset.page.is_none());
        asset.set_link(LinkKind::Symlink, None);
        assert!(asset.link().is_none());
    }

    #[test]
    fn test_blank_uses_defaults() {
        let mut field = FieldDefinition::new("tags", FieldKind::Text(TextType::Checkbox));
        field.possible_values = vec!["a".into(), "b".into()];
        field.default_value = Some("b".into());
        let node = StructuredDataNode::blank(&field);
        assert_eq!(node.text(), Some("::CONTENT-XML-CHECKBOX::b"));
    }
}
