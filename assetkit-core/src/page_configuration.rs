// Page configurations and their regions

use crate::error::{PropertyError, Result};
use crate::identifier::{EntityType, Reference};
use crate::service::AssetService;
use crate::wire::{self, Transport, WireFormat};
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::debug;

/// Output serialization of a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationType {
    Html,
    Xml,
    Pdf,
    Rtf,
    Json,
    Js,
    Css,
}

impl SerializationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SerializationType::Html => "HTML",
            SerializationType::Xml => "XML",
            SerializationType::Pdf => "PDF",
            SerializationType::Rtf => "RTF",
            SerializationType::Json => "JSON",
            SerializationType::Js => "JS",
            SerializationType::Css => "CSS",
        }
    }
}

impl FromStr for SerializationType {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "HTML" => Ok(SerializationType::Html),
            "XML" => Ok(SerializationType::Xml),
            "PDF" => Ok(SerializationType::Pdf),
            "RTF" => Ok(SerializationType::Rtf),
            "JSON" => Ok(SerializationType::Json),
            "JS" => Ok(SerializationType::Js),
            "CSS" => Ok(SerializationType::Css),
            _ => Err(PropertyError::invalid(
                "serializationType",
                s,
                "expected one of HTML, XML, PDF, RTF, JSON, JS, CSS",
            )),
        }
    }
}

/// Block and format attached to one region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRegion {
    pub id: Option<String>,
    pub name: String,
    block: Option<Reference>,
    block_recycled: bool,
    no_block: bool,
    format: Option<Reference>,
    format_recycled: bool,
    no_format: bool,
}

impl PageRegion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            block: None,
            block_recycled: false,
            no_block: false,
            format: None,
            format_recycled: false,
            no_format: false,
        }
    }

    pub fn block(&self) -> Option<&Reference> {
        self.block.as_ref()
    }

    pub fn format(&self) -> Option<&Reference> {
        self.format.as_ref()
    }

    pub fn no_block(&self) -> bool {
        self.no_block
    }

    pub fn no_format(&self) -> bool {
        self.no_format
    }

    pub fn block_recycled(&self) -> bool {
        self.block_recycled
    }

    pub fn format_recycled(&self) -> bool {
        self.format_recycled
    }

    /// Attach or detach a block; attaching lifts `noBlock`
    pub fn set_block(&mut self, block: Option<Reference>) -> &mut Self {
        self.block = block.filter(|b| !b.is_empty());
        self.block_recycled = false;
        if self.block.is_some() {
            self.no_block = false;
        }
        self
    }

    /// `noBlock` suppresses inherited blocks; setting it drops the block
    pub fn set_no_block(&mut self, no_block: bool) -> &mut Self {
        self.no_block = no_block;
        if no_block {
            self.block = None;
            self.block_recycled = false;
        }
        self
    }

    pub fn set_format(&mut self, format: Option<Reference>) -> &mut Self {
        self.format = format.filter(|f| !f.is_empty());
        self.format_recycled = false;
        if self.format.is_some() {
            self.no_format = false;
        }
        self
    }

    pub fn set_no_format(&mut self, no_format: bool) -> &mut Self {
        self.no_format = no_format;
        if no_format {
            self.format = None;
            self.format_recycled = false;
        }
        self
    }

    /// Fetch the attached block from the service
    ///
    /// `site_name` qualifies a path-only link; pass the owning site.
    pub fn read_block(
        &self,
        service: &dyn AssetService,
        site_name: Option<&str>,
    ) -> Result<Option<Value>> {
        match &self.block {
            Some(block) => {
                debug!("reading block of region {}", self.name);
                service
                    .read(&block.to_identifier(EntityType::Block, site_name))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    /// Fetch the attached format from the service
    pub fn read_format(
        &self,
        service: &dyn AssetService,
        site_name: Option<&str>,
    ) -> Result<Option<Value>> {
        match &self.format {
            Some(format) => service
                .read(&format.to_identifier(EntityType::Format, site_name))
                .map(Some),
            None => Ok(None),
        }
    }
}

impl WireFormat for PageRegion {
    fn from_wire(value: &Value) -> Result<Self> {
        let obj = wire::as_object(value, "pageRegion")?;
        let name = wire::required_string(obj, "name")?;
        wire::non_empty("name", &name)?;
        Ok(Self {
            id: wire::opt_string(obj, "id"),
            name,
            block: Reference::read(obj, "block"),
            block_recycled: wire::bool_field(obj, "blockRecycled", false)?,
            no_block: wire::bool_field(obj, "noBlock", false)?,
            format: Reference::read(obj, "format"),
            format_recycled: wire::bool_field(obj, "formatRecycled", false)?,
            no_format: wire::bool_field(obj, "noFormat", false)?,
        })
    }

    fn to_wire(&self, _transport: Transport) -> Value {
        let mut map = Map::new();
        wire::put_opt(&mut map, "id", self.id.as_deref());
        map.insert("name".into(), Value::String(self.name.clone()));
        Reference::write(self.block.as_ref(), &mut map, "block");
        map.insert("blockRecycled".into(), Value::Bool(self.block_recycled));
        map.insert("noBlock".into(), Value::Bool(self.no_block));
        Reference::write(self.format.as_ref(), &mut map, "format");
        map.insert("formatRecycled".into(), Value::Bool(self.format_recycled));
        map.insert("noFormat".into(), Value::Bool(self.no_format));
        Value::Object(map)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageConfiguration {
    pub id: Option<String>,
    pub name: String,
    pub default_configuration: bool,
    pub template: Option<Reference>,
    format: Option<Reference>,
    format_recycled: bool,
    regions: Vec<PageRegion>,
    output_extension: String,
    serialization_type: SerializationType,
    include_xml_declaration: bool,
    publishable: bool,
}

impl PageConfiguration {
    pub fn format(&self) -> Option<&Reference> {
        self.format.as_ref()
    }

    pub fn format_recycled(&self) -> bool {
        self.format_recycled
    }

    pub fn regions(&self) -> &[PageRegion] {
        &self.regions
    }

    pub fn region(&self, name: &str) -> Option<&PageRegion> {
        self.regions.iter().find(|r| r.name == name)
    }

    fn region_mut(&mut self, name: &str) -> Result<&mut PageRegion> {
        self.regions
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| PropertyError::NoSuchRegion(name.to_string()))
    }

    pub fn has_region(&self, name: &str) -> bool {
        self.region(name).is_some()
    }

    pub fn region_names(&self) -> Vec<&str> {
        self.regions.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn set_region_block(&mut self, name: &str, block: Option<Reference>) -> Result<&mut Self> {
        self.region_mut(name)?.set_block(block);
        Ok(self)
    }

    pub fn set_region_no_block(&mut self, name: &str, no_block: bool) -> Result<&mut Self> {
        self.region_mut(name)?.set_no_block(no_block);
        Ok(self)
    }

    pub fn set_region_format(
        &mut self,
        name: &str,
        format: Option<Reference>,
    ) -> Result<&mut Self> {
        self.region_mut(name)?.set_format(format);
        Ok(self)
    }

    pub fn set_region_no_format(&mut self, name: &str, no_format: bool) -> Result<&mut Self> {
        self.region_mut(name)?.set_no_format(no_format);
        Ok(self)
    }

    /// Resolve a region's block through the service
    pub fn read_region_block(
        &self,
        service: &dyn AssetService,
        name: &str,
        site_name: Option<&str>,
    ) -> Result<Option<Value>> {
        self.region(name)
            .ok_or_else(|| PropertyError::NoSuchRegion(name.to_string()))?
            .read_block(service, site_name)
    }

    /// Configuration-level format
    pub fn set_format(&mut self, format: Option<Reference>) -> &mut Self {
        self.format = format.filter(|f| !f.is_empty());
        self.format_recycled = false;
        self
    }

    pub fn output_extension(&self) -> &str {
        &self.output_extension
    }

    pub fn set_output_extension(&mut self, extension: &str) -> Result<&mut Self> {
        wire::non_empty("outputExtension", extension)?;
        if !extension.starts_with('.') {
            return Err(PropertyError::invalid(
                "outputExtension",
                extension,
                "must start with '.'",
            ));
        }
        self.output_extension = extension.to_string();
        Ok(self)
    }

    pub fn serialization_type(&self) -> SerializationType {
        self.serialization_type
    }

    pub fn set_serialization_type(&mut self, serialization: SerializationType) -> &mut Self {
        self.serialization_type = serialization;
        self
    }

    pub fn set_serialization_type_str(&mut self, serialization: &str) -> Result<&mut Self> {
        Ok(self.set_serialization_type(serialization.parse()?))
    }

    pub fn include_xml_declaration(&self) -> bool {
        self.include_xml_declaration
    }

    pub fn set_include_xml_declaration(&mut self, include: bool) -> &mut Self {
        self.include_xml_declaration = include;
        self
    }

    pub fn publishable(&self) -> bool {
        self.publishable
    }

    pub fn set_publishable(&mut self, publishable: bool) -> &mut Self {
        self.publishable = publishable;
        self
    }
}

impl WireFormat for PageConfiguration {
    fn from_wire(value: &Value) -> Result<Self> {
        let obj = wire::as_object(value, "pageConfiguration")?;
        let name = wire::required_string(obj, "name")?;
        wire::non_empty("name", &name)?;
        let regions = wire::list_items(obj.get("pageRegions"), "pageRegion")
            .into_iter()
            .map(PageRegion::from_wire)
            .collect::<Result<Vec<_>>>()?;
        let serialization_type = match wire::opt_string(obj, "serializationType") {
            Some(s) => s.parse()?,
            None => SerializationType::Html,
        };
        Ok(Self {
            id: wire::opt_string(obj, "id"),
            name,
            default_configuration: wire::bool_field(obj, "defaultConfiguration", false)?,
            template: Reference::read(obj, "template"),
            format: Reference::read(obj, "format"),
            format_recycled: wire::bool_field(obj, "formatRecycled", false)?,
            regions,
            output_extension: wire::opt_string(obj, "outputExtension")
                .unwrap_or_else(|| ".html".to_string()),
            serialization_type,
            include_xml_declaration: wire::bool_field(obj, "includeXMLDeclaration", false)?,
            publishable: wire::bool_field(obj, "publishable", true)?,
        })
    }

    fn to_wire(&self, transport: Transport) -> Value {
        let mut map = Map::new();
        wire::put_opt(&mut map, "id", self.id.as_deref());
        map.insert("name".into(), Value::String(self.name.clone()));
        map.insert(
            "defaultConfiguration".into(),
            Value::Bool(self.default_configuration),
        );
        Reference::write(self.template.as_ref(), &mut map, "template");
        Reference::write(self.format.as_ref(), &mut map, "format");
        map.insert("formatRecycled".into(), Value::Bool(self.format_recycled));
        let regions = self.regions.iter().map(|r| r.to_wire(transport)).collect();
        map.insert(
            "pageRegions".into(),
            wire::wrap_list(transport, "pageRegion", regions),
        );
        map.insert(
            "outputExtension".into(),
            Value::String(self.output_extension.clone()),
        );
        map.insert(
            "serializationType".into(),
            Value::String(self.serialization_type.as_str().into()),
        );
        map.insert(
            "includeXMLDeclaration".into(),
            Value::Bool(self.include_xml_declaration),
        );
        map.insert("publishable".into(), Value::Bool(self.publishable));
        Value::Object(map)
    }
}
