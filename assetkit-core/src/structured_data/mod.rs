//! Structured data: a schema-checked tree of group, text and asset nodes
//!
//! Nodes are addressed by fully qualified identifiers (FQIs) such as
//! `group;0;text-multiple;2` or `contact;1;name`: the identifiers from the
//! root joined by `;`, where each instance of a repeatable field is followed
//! by its position among its siblings. Phantom nodes always carry a position,
//! numbered after the live instances. The tree keeps a flat
//! index from FQI to the node's position and rebuilds it after every
//! structural change, so lookups never search the tree.
//!
//! Nodes the data definition no longer licenses are *phantom*. They are kept
//! on load so nothing is lost silently, are read-only, and can be pruned with
//! [`StructuredData::remove_phantom_nodes`].

pub mod definition;
pub mod node;
pub mod text;

pub use definition::{
    AssetKind, DataDefinition, DefinitionTree, FieldDefinition, FieldKind, LinkKind, TextType,
};
pub use node::{AssetContent, NodeContent, NodeType, StructuredDataNode};

use crate::error::{PropertyError, Result};
use crate::identifier::Reference;
use crate::wire::{self, Transport};
use node::child_fqi;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Definitions are shared between the trees built from them
pub type SharedDefinition = Arc<dyn DataDefinition>;

#[derive(Debug, Clone)]
pub struct StructuredData {
    definition: SharedDefinition,
    definition_id: Option<String>,
    definition_path: Option<String>,
    nodes: Vec<StructuredDataNode>,
    /// FQI -> child positions from the root
    index: HashMap<String, Vec<usize>>,
    /// FQIs in document order
    order: Vec<String>,
}

fn not_found(fqi: &str) -> PropertyError {
    PropertyError::NodeNotFound(fqi.to_string())
}

fn node_at<'a>(
    nodes: &'a [StructuredDataNode],
    position: &[usize],
) -> Option<&'a StructuredDataNode> {
    let (first, rest) = position.split_first()?;
    let mut node = nodes.get(*first)?;
    for &i in rest {
        node = node.children().get(i)?;
    }
    Some(node)
}

fn node_at_mut<'a>(
    nodes: &'a mut [StructuredDataNode],
    position: &[usize],
) -> Option<&'a mut StructuredDataNode> {
    let (first, rest) = position.split_first()?;
    let mut node = nodes.get_mut(*first)?;
    for &i in rest {
        node = node.children_mut()?.get_mut(i)?;
    }
    Some(node)
}

fn container<'a>(
    nodes: &'a [StructuredDataNode],
    parent: &[usize],
) -> Option<&'a [StructuredDataNode]> {
    if parent.is_empty() {
        Some(nodes)
    } else {
        node_at(nodes, parent).map(StructuredDataNode::children)
    }
}

fn container_mut<'a>(
    nodes: &'a mut Vec<StructuredDataNode>,
    parent: &[usize],
) -> Option<&'a mut Vec<StructuredDataNode>> {
    if parent.is_empty() {
        Some(nodes)
    } else {
        node_at_mut(nodes, parent)?.children_mut()
    }
}

fn blank_instances(fields: &[FieldDefinition]) -> Vec<StructuredDataNode> {
    fields
        .iter()
        .flat_map(|f| (0..f.min_count()).map(move |_| StructuredDataNode::blank(f)))
        .collect()
}

/// Assigns FQIs, schema paths and phantom flags in a depth-first walk
struct Indexer<'d> {
    definition: &'d dyn DataDefinition,
    index: HashMap<String, Vec<usize>>,
    order: Vec<String>,
    position: Vec<usize>,
}

impl Indexer<'_> {
    fn level(
        &mut self,
        nodes: &mut [StructuredDataNode],
        parent_fqi: &str,
        parent_path: &str,
        parent_phantom: bool,
    ) {
        let paths: Vec<String> = nodes
            .iter()
            .map(|node| {
                if parent_path.is_empty() {
                    node.identifier.clone()
                } else {
                    format!("{}{}{}", parent_path, definition::DELIMITER, node.identifier)
                }
            })
            .collect();

        // Some(multiple) for licensed nodes; the first instance of a
        // single-valued field wins
        let mut live_total: HashMap<&str, usize> = HashMap::new();
        let verdicts: Vec<Option<bool>> = nodes
            .iter()
            .zip(&paths)
            .map(|(node, path)| {
                let field = self
                    .definition
                    .field(path)
                    .filter(|field| !parent_phantom && Self::fits(field, node))?;
                let count = live_total.entry(node.identifier.as_str()).or_insert(0);
                if !field.multiple && *count > 0 {
                    return None;
                }
                *count += 1;
                Some(field.multiple)
            })
            .collect();
        let live_total: HashMap<String, usize> = live_total
            .into_iter()
            .map(|(identifier, count)| (identifier.to_string(), count))
            .collect();

        let mut live: HashMap<String, usize> = HashMap::new();
        let mut stray: HashMap<String, usize> = HashMap::new();
        let entries = nodes.iter_mut().zip(paths).zip(verdicts).enumerate();
        for (i, ((node, path), verdict)) in entries {
            let suffix = match verdict {
                Some(multiple) => {
                    let count = live.entry(node.identifier.clone()).or_insert(0);
                    node.index = *count;
                    *count += 1;
                    multiple.then_some(node.index)
                }
                None => {
                    let count = stray.entry(node.identifier.clone()).or_insert(0);
                    node.index = live_total.get(&node.identifier).copied().unwrap_or(0) + *count;
                    *count += 1;
                    Some(node.index)
                }
            };
            node.fqi = child_fqi(parent_fqi, &node.identifier, suffix);
            node.path = path;
            node.phantom = verdict.is_none();

            self.position.push(i);
            self.index.insert(node.fqi.clone(), self.position.clone());
            self.order.push(node.fqi.clone());
            let fqi = node.fqi.clone();
            let path = node.path.clone();
            let phantom = node.phantom;
            if let Some(children) = node.children_mut() {
                self.level(children, &fqi, &path, phantom);
            }
            self.position.pop();
        }
    }

    /// Node type agrees with the field, asset chooser type included
    fn fits(field: &FieldDefinition, node: &StructuredDataNode) -> bool {
        match (field.kind, node.asset()) {
            (FieldKind::Asset(kind), Some(asset)) => asset.asset_type == kind,
            _ => field.kind.node_type() == node.node_type(),
        }
    }
}

impl StructuredData {
    /// Read the `structuredData` member of an asset
    ///
    /// Phantom nodes are kept and reported; see [`Self::phantom_identifiers`].
    pub fn from_wire(value: &Value, definition: SharedDefinition) -> Result<Self> {
        let obj = wire::as_object(value, "structuredData")?;
        let nodes = wire::list_items(obj.get("structuredDataNodes"), "structuredDataNode")
            .into_iter()
            .map(StructuredDataNode::from_wire)
            .collect::<Result<Vec<_>>>()?;
        let definition_id =
            wire::opt_string(obj, "definitionId").or_else(|| definition.id().map(str::to_string));
        let definition_path = wire::opt_string(obj, "definitionPath")
            .or_else(|| definition.path().map(str::to_string));

        let mut data = Self {
            definition,
            definition_id,
            definition_path,
            nodes,
            index: HashMap::new(),
            order: Vec::new(),
        };
        data.reindex();
        let phantoms = data.phantom_identifiers();
        if !phantoms.is_empty() {
            warn!(
                "structured data holds {} phantom node(s), first: {}",
                phantoms.len(),
                phantoms[0]
            );
        }
        Ok(data)
    }

    /// Blank tree: every field instantiated `max(1, min_instances)` times
    pub fn with_definition(definition: SharedDefinition) -> Self {
        let nodes = blank_instances(definition.fields());
        let definition_id = definition.id().map(str::to_string);
        let definition_path = definition.path().map(str::to_string);
        let mut data = Self {
            definition,
            definition_id,
            definition_path,
            nodes,
            index: HashMap::new(),
            order: Vec::new(),
        };
        data.reindex();
        data
    }

    pub fn to_wire(&self, transport: Transport) -> Value {
        let mut map = Map::new();
        wire::put_opt(&mut map, "definitionId", self.definition_id.as_deref());
        wire::put_opt(&mut map, "definitionPath", self.definition_path.as_deref());
        map.insert(
            "structuredDataNodes".into(),
            wire::wrap_list(
                transport,
                "structuredDataNode",
                self.nodes.iter().map(|n| n.to_wire(transport)).collect(),
            ),
        );
        Value::Object(map)
    }

    pub fn definition(&self) -> &dyn DataDefinition {
        &*self.definition
    }

    /// Check the tree against another definition; phantom flags are recomputed
    pub fn set_definition(&mut self, definition: SharedDefinition) {
        self.definition_id = definition.id().map(str::to_string);
        self.definition_path = definition.path().map(str::to_string);
        self.definition = definition;
        self.reindex();
    }

    pub fn definition_id(&self) -> Option<&str> {
        self.definition_id.as_deref()
    }

    pub fn definition_path(&self) -> Option<&str> {
        self.definition_path.as_deref()
    }

    /// Top-level nodes
    pub fn nodes(&self) -> &[StructuredDataNode] {
        &self.nodes
    }

    fn reindex(&mut self) {
        let definition = Arc::clone(&self.definition);
        let mut indexer = Indexer {
            definition: &*definition,
            index: HashMap::with_capacity(self.order.len()),
            order: Vec::with_capacity(self.order.len()),
            position: Vec::new(),
        };
        indexer.level(&mut self.nodes, "", "", false);
        self.index = indexer.index;
        self.order = indexer.order;
    }

    // ---- queries ----

    /// Every FQI in document order
    pub fn identifiers(&self) -> &[String] {
        &self.order
    }

    pub fn has_identifier(&self, fqi: &str) -> bool {
        self.index.contains_key(fqi)
    }

    pub fn node(&self, fqi: &str) -> Option<&StructuredDataNode> {
        self.index
            .get(fqi)
            .and_then(|position| node_at(&self.nodes, position))
    }

    fn require(&self, fqi: &str) -> Result<&StructuredDataNode> {
        self.node(fqi).ok_or_else(|| not_found(fqi))
    }

    /// Field licensing a live node; the borrow is tied to `definition`
    fn licensed<'d>(
        &self,
        definition: &'d dyn DataDefinition,
        fqi: &str,
    ) -> Result<&'d FieldDefinition> {
        let node = self.require(fqi)?;
        if node.phantom {
            return Err(PropertyError::PhantomNode(fqi.to_string()));
        }
        definition
            .field(node.schema_path())
            .ok_or_else(|| PropertyError::PhantomNode(fqi.to_string()))
    }

    fn multiple_field<'d>(
        &self,
        definition: &'d dyn DataDefinition,
        fqi: &str,
    ) -> Result<&'d FieldDefinition> {
        let field = self.licensed(definition, fqi)?;
        if !field.multiple {
            return Err(PropertyError::NotMultiple(fqi.to_string()));
        }
        Ok(field)
    }

    /// Definition of a licensed node; `None` for unknown or phantom nodes
    pub fn field_definition(&self, fqi: &str) -> Option<&FieldDefinition> {
        self.licensed(&*self.definition, fqi).ok()
    }

    pub fn is_multiple(&self, fqi: &str) -> Result<bool> {
        Ok(self.licensed(&*self.definition, fqi)?.multiple)
    }

    pub fn is_required(&self, fqi: &str) -> Result<bool> {
        Ok(self.licensed(&*self.definition, fqi)?.required)
    }

    pub fn possible_values(&self, fqi: &str) -> Result<&[String]> {
        Ok(&self.licensed(&*self.definition, fqi)?.possible_values)
    }

    /// Parent position and the container positions of every live instance
    ///
    /// Phantom siblings sharing the identifier are not instances.
    fn instances(&self, fqi: &str) -> Result<(Vec<usize>, Vec<usize>)> {
        let position = self.index.get(fqi).ok_or_else(|| not_found(fqi))?;
        let (own, parent) = position.split_last().ok_or_else(|| not_found(fqi))?;
        let siblings = container(&self.nodes, parent).ok_or_else(|| not_found(fqi))?;
        let node = siblings.get(*own).ok_or_else(|| not_found(fqi))?;
        if node.phantom {
            return Err(PropertyError::PhantomNode(fqi.to_string()));
        }
        let positions = siblings
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.phantom && n.identifier == node.identifier)
            .map(|(i, _)| i)
            .collect();
        Ok((parent.to_vec(), positions))
    }

    /// Instances of the node's field under the same parent, itself included
    pub fn sibling_count(&self, fqi: &str) -> Result<usize> {
        Ok(self.instances(fqi)?.1.len())
    }

    pub fn sibling_identifiers(&self, fqi: &str) -> Result<Vec<String>> {
        let (parent, positions) = self.instances(fqi)?;
        let siblings = container(&self.nodes, &parent).ok_or_else(|| not_found(fqi))?;
        Ok(positions
            .into_iter()
            .filter_map(|i| siblings.get(i).map(|n| n.fqi.clone()))
            .collect())
    }

    pub fn text(&self, fqi: &str) -> Result<&str> {
        self.require(fqi)?
            .text()
            .ok_or_else(|| PropertyError::kind(fqi, "text"))
    }

    /// Values selected in a chooser
    pub fn selections(&self, fqi: &str) -> Result<Vec<String>> {
        let field = self.licensed(&*self.definition, fqi)?;
        match field.text_type() {
            Some(t) if t.is_chooser() => Ok(text::decode_selections(t, self.text(fqi)?)),
            _ => Err(PropertyError::kind(fqi, "chooser text")),
        }
    }

    pub fn link(&self, fqi: &str) -> Result<Option<(LinkKind, &Reference)>> {
        self.require(fqi)?
            .asset()
            .map(AssetContent::link)
            .ok_or_else(|| PropertyError::kind(fqi, "asset"))
    }

    // ---- value writes ----

    fn node_mut(&mut self, fqi: &str) -> Result<&mut StructuredDataNode> {
        let position = self.index.get(fqi).ok_or_else(|| not_found(fqi))?;
        node_at_mut(&mut self.nodes, position).ok_or_else(|| not_found(fqi))
    }

    fn store_text(&mut self, fqi: &str, value: &str) -> Result<()> {
        match &mut self.node_mut(fqi)?.content {
            NodeContent::Text(t) => {
                *t = value.to_string();
                Ok(())
            }
            _ => Err(PropertyError::kind(fqi, "text")),
        }
    }

    /// Validated write of a text node
    pub fn set_text(&mut self, fqi: &str, value: &str) -> Result<&mut Self> {
        let definition = Arc::clone(&self.definition);
        let field = self.licensed(&*definition, fqi)?;
        let text_type = field
            .text_type()
            .ok_or_else(|| PropertyError::kind(fqi, "text"))?;
        text::validate(fqi, field, text_type, value)?;
        self.store_text(fqi, value)?;
        debug!("set text of {}", fqi);
        Ok(self)
    }

    /// Select chooser values; single-value choosers accept at most one
    pub fn set_selections(&mut self, fqi: &str, values: &[&str]) -> Result<&mut Self> {
        let definition = Arc::clone(&self.definition);
        let field = self.licensed(&*definition, fqi)?;
        let text_type = match field.text_type() {
            Some(t) if t.is_chooser() => t,
            _ => return Err(PropertyError::kind(fqi, "chooser text")),
        };
        if !text_type.is_multi_select() && values.len() > 1 {
            return Err(PropertyError::invalid(
                fqi,
                values.join(","),
                "field accepts a single value",
            ));
        }
        let encoded = text::encode_selections(text_type, values);
        text::validate(fqi, field, text_type, &encoded)?;
        self.store_text(fqi, &encoded)?;
        debug!("set {} selection(s) of {}", values.len(), fqi);
        Ok(self)
    }

    fn store_link(
        &mut self,
        fqi: &str,
        link: LinkKind,
        reference: Option<Reference>,
    ) -> Result<&mut Self> {
        let definition = Arc::clone(&self.definition);
        let field = self.licensed(&*definition, fqi)?;
        let asset_kind = match field.kind {
            FieldKind::Asset(kind) => kind,
            _ => return Err(PropertyError::kind(fqi, "asset")),
        };
        match &reference {
            Some(r) if r.is_empty() => {
                return Err(PropertyError::EmptyValue {
                    field: fqi.to_string(),
                })
            }
            Some(_) if !asset_kind.accepts(link) => {
                return Err(PropertyError::invalid(
                    fqi,
                    link.wire_prefix(),
                    format!("a {} chooser cannot link this", asset_kind.as_str()),
                ))
            }
            None if field.required => {
                return Err(PropertyError::EmptyValue {
                    field: fqi.to_string(),
                })
            }
            _ => {}
        }
        match &mut self.node_mut(fqi)?.content {
            NodeContent::Asset(asset) => asset.set_link(link, reference),
            _ => return Err(PropertyError::kind(fqi, "asset")),
        }
        debug!("set {} link of {}", link.wire_prefix(), fqi);
        Ok(self)
    }

    pub fn set_block(&mut self, fqi: &str, block: Reference) -> Result<&mut Self> {
        self.store_link(fqi, LinkKind::Block, Some(block))
    }

    pub fn set_file(&mut self, fqi: &str, file: Reference) -> Result<&mut Self> {
        self.store_link(fqi, LinkKind::File, Some(file))
    }

    pub fn set_page(&mut self, fqi: &str, page: Reference) -> Result<&mut Self> {
        self.store_link(fqi, LinkKind::Page, Some(page))
    }

    pub fn set_symlink(&mut self, fqi: &str, symlink: Reference) -> Result<&mut Self> {
        self.store_link(fqi, LinkKind::Symlink, Some(symlink))
    }

    pub fn clear_link(&mut self, fqi: &str) -> Result<&mut Self> {
        self.store_link(fqi, LinkKind::Block, None)
    }

    // ---- structure ----

    /// Insert a blank instance after the last one and return its FQI
    pub fn append_sibling(&mut self, fqi: &str) -> Result<String> {
        let definition = Arc::clone(&self.definition);
        let field = self.multiple_field(&*definition, fqi)?;
        let (parent, positions) = self.instances(fqi)?;
        if let Some(max) = field.max_instances {
            if positions.len() >= max {
                return Err(PropertyError::InstanceLimit {
                    fqi: fqi.to_string(),
                    reason: format!("at most {} instances allowed", max),
                });
            }
        }
        let last = positions.last().copied().ok_or_else(|| not_found(fqi))?;
        container_mut(&mut self.nodes, &parent)
            .ok_or_else(|| not_found(fqi))?
            .insert(last + 1, StructuredDataNode::blank(field));
        self.reindex();

        let mut position = parent;
        position.push(last + 1);
        let created = node_at(&self.nodes, &position)
            .map(|n| n.fqi.clone())
            .ok_or_else(|| not_found(fqi))?;
        debug!("appended {}", created);
        Ok(created)
    }

    /// Drop the last instance, keeping at least `max(1, min_instances)`
    pub fn remove_last_sibling(&mut self, fqi: &str) -> Result<()> {
        let definition = Arc::clone(&self.definition);
        let field = self.multiple_field(&*definition, fqi)?;
        let (parent, positions) = self.instances(fqi)?;
        let min = field.min_count();
        if positions.len() <= min {
            return Err(PropertyError::InstanceLimit {
                fqi: fqi.to_string(),
                reason: format!("at least {} instance(s) required", min),
            });
        }
        let last = positions.last().copied().ok_or_else(|| not_found(fqi))?;
        let removed = container_mut(&mut self.nodes, &parent)
            .ok_or_else(|| not_found(fqi))?
            .remove(last);
        self.reindex();
        debug!("removed {}", removed.fqi);
        Ok(())
    }

    /// Grow or shrink the instances of a multiple field to `count`
    pub fn set_instance_count(&mut self, fqi: &str, count: usize) -> Result<()> {
        let definition = Arc::clone(&self.definition);
        let field = self.multiple_field(&*definition, fqi)?;
        let min = field.min_count();
        if count < min || field.max_instances.map_or(false, |max| count > max) {
            return Err(PropertyError::InstanceLimit {
                fqi: fqi.to_string(),
                reason: format!("{} instances is out of range", count),
            });
        }
        // the first instance survives every shrink
        let first = self
            .sibling_identifiers(fqi)?
            .into_iter()
            .next()
            .ok_or_else(|| not_found(fqi))?;
        while self.sibling_count(&first)? < count {
            self.append_sibling(&first)?;
        }
        while self.sibling_count(&first)? > count {
            self.remove_last_sibling(&first)?;
        }
        Ok(())
    }

    /// Exchange the data of two instances of the same field
    pub fn swap_data(&mut self, first: &str, second: &str) -> Result<()> {
        let definition = Arc::clone(&self.definition);
        self.multiple_field(&*definition, first)?;
        self.multiple_field(&*definition, second)?;

        let a = self.index.get(first).cloned().ok_or_else(|| not_found(first))?;
        let b = self.index.get(second).cloned().ok_or_else(|| not_found(second))?;
        let (ia, parent_a) = a.split_last().ok_or_else(|| not_found(first))?;
        let (ib, parent_b) = b.split_last().ok_or_else(|| not_found(second))?;
        let same_field = self.require(first)?.path == self.require(second)?.path;
        if parent_a != parent_b || !same_field {
            return Err(PropertyError::NotSiblings {
                first: first.to_string(),
                second: second.to_string(),
            });
        }
        if ia == ib {
            return Ok(());
        }
        container_mut(&mut self.nodes, parent_a)
            .ok_or_else(|| not_found(first))?
            .swap(*ia, *ib);
        self.reindex();
        debug!("swapped {} and {}", first, second);
        Ok(())
    }

    /// Move data one instance up; returns the FQI now holding it
    pub fn move_up(&mut self, fqi: &str) -> Result<String> {
        let index = self.require(fqi)?.index;
        if index == 0 {
            return Err(PropertyError::InstanceLimit {
                fqi: fqi.to_string(),
                reason: "first instance cannot move up".to_string(),
            });
        }
        let target = self
            .sibling_identifiers(fqi)?
            .get(index - 1)
            .cloned()
            .ok_or_else(|| not_found(fqi))?;
        self.swap_data(fqi, &target)?;
        Ok(target)
    }

    /// Move data one instance down; returns the FQI now holding it
    pub fn move_down(&mut self, fqi: &str) -> Result<String> {
        let index = self.require(fqi)?.index;
        let target = self
            .sibling_identifiers(fqi)?
            .get(index + 1)
            .cloned()
            .ok_or_else(|| PropertyError::InstanceLimit {
                fqi: fqi.to_string(),
                reason: "last instance cannot move down".to_string(),
            })?;
        self.swap_data(fqi, &target)?;
        Ok(target)
    }

    /// Copy text and asset data from nodes with the same FQI in `other`
    ///
    /// Values this tree's definition rejects are skipped. Returns the number
    /// of nodes written.
    pub fn copy_data_from(&mut self, other: &StructuredData) -> usize {
        let mut copied = 0;
        for fqi in self.order.clone() {
            let Some(source) = other.node(&fqi) else {
                continue;
            };
            let result = match source.content() {
                NodeContent::Text(t) => self.set_text(&fqi, t).map(|_| ()),
                NodeContent::Asset(asset) => match asset.link() {
                    Some((link, reference)) => self
                        .store_link(&fqi, link, Some(reference.clone()))
                        .map(|_| ()),
                    None => self.clear_link(&fqi).map(|_| ()),
                },
                NodeContent::Group(_) => continue,
            };
            match result {
                Ok(()) => copied += 1,
                Err(e) => debug!("not copying {}: {}", fqi, e),
            }
        }
        info!("copied {} node value(s)", copied);
        copied
    }

    // ---- search ----

    /// Text nodes whose value contains `needle`
    pub fn search_text(&self, needle: &str) -> Vec<String> {
        if needle.is_empty() {
            return Vec::new();
        }
        self.order
            .iter()
            .filter(|fqi| {
                self.node(fqi)
                    .and_then(StructuredDataNode::text)
                    .map_or(false, |t| t.contains(needle))
            })
            .cloned()
            .collect()
    }

    /// Replace in free-text fields only; returns the nodes changed
    pub fn replace_text(&mut self, needle: &str, replacement: &str) -> Result<usize> {
        wire::non_empty("needle", needle)?;
        let definition = Arc::clone(&self.definition);
        let mut replaced = 0;
        for fqi in self.search_text(needle) {
            let Ok(field) = self.licensed(&*definition, &fqi) else {
                continue;
            };
            let Some(text_type) = field.text_type().filter(TextType::is_free_text) else {
                continue;
            };
            let updated = self.text(&fqi)?.replace(needle, replacement);
            if let Err(e) = text::validate(&fqi, field, text_type, &updated) {
                warn!("not replacing in {}: {}", fqi, e);
                continue;
            }
            self.store_text(&fqi, &updated)?;
            replaced += 1;
        }
        debug!("replaced '{}' in {} node(s)", needle, replaced);
        Ok(replaced)
    }

    // ---- phantoms ----

    /// Phantom nodes and their descendants, in document order
    pub fn phantom_identifiers(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|fqi| self.node(fqi).map_or(false, StructuredDataNode::is_phantom))
            .cloned()
            .collect()
    }

    pub fn has_phantom_nodes(&self) -> bool {
        self.order
            .iter()
            .any(|fqi| self.node(fqi).map_or(false, StructuredDataNode::is_phantom))
    }

    /// Prune phantom nodes; returns how many nodes went, descendants included
    pub fn remove_phantom_nodes(&mut self) -> usize {
        fn prune(nodes: &mut Vec<StructuredDataNode>) {
            nodes.retain(|n| !n.phantom);
            for node in nodes.iter_mut() {
                if let Some(children) = node.children_mut() {
                    prune(children);
                }
            }
        }

        let removed = self.phantom_identifiers().len();
        if removed > 0 {
            prune(&mut self.nodes);
            self.reindex();
            info!("removed {} phantom node(s)", removed);
        }
        removed
    }

    fn phantom_selections_at(&self, fqi: &str) -> Vec<String> {
        let Ok(field) = self.licensed(&*self.definition, fqi) else {
            return Vec::new();
        };
        match (field.text_type(), self.node(fqi).and_then(StructuredDataNode::text)) {
            (Some(text_type), Some(value)) => text::phantom_selections(field, text_type, value),
            _ => Vec::new(),
        }
    }

    /// Chooser nodes holding values outside their possible values
    pub fn phantom_values(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|fqi| !self.phantom_selections_at(fqi).is_empty())
            .cloned()
            .collect()
    }

    pub fn has_phantom_values(&self) -> bool {
        self.order
            .iter()
            .any(|fqi| !self.phantom_selections_at(fqi).is_empty())
    }

    /// Drop unlicensed chooser values; single-value choosers fall back to
    /// the default. Returns the nodes cleaned.
    pub fn remove_phantom_values(&mut self) -> usize {
        let definition = Arc::clone(&self.definition);
        let mut cleaned = 0;
        for fqi in self.phantom_values() {
            let Ok(field) = self.licensed(&*definition, &fqi) else {
                continue;
            };
            let Some(text_type) = field.text_type() else {
                continue;
            };
            let kept: Vec<String> = match self.text(&fqi) {
                Ok(current) => text::decode_selections(text_type, current)
                    .into_iter()
                    .filter(|v| field.possible_values.contains(v))
                    .collect(),
                Err(_) => continue,
            };
            let kept: Vec<&str> = kept.iter().map(String::as_str).collect();
            let mut encoded = text::encode_selections(text_type, &kept);
            if encoded.is_empty() && !text_type.is_multi_select() {
                encoded = field.default_value.clone().unwrap_or_default();
            }
            if self.store_text(&fqi, &encoded).is_ok() {
                cleaned += 1;
            }
        }
        if cleaned > 0 {
            info!("removed phantom values from {} node(s)", cleaned);
        }
        cleaned
    }
}
