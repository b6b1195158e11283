// Plugins and their parameters

use crate::error::{PropertyError, Result};
use crate::wire::{self, Transport, WireFormat};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plugin {
    name: String,
    parameters: Vec<Parameter>,
}

impl Plugin {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameter(name).is_some()
    }

    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    /// Only parameters the plugin already declares can be set
    pub fn set_parameter_value(&mut self, name: &str, value: Option<&str>) -> Result<&mut Self> {
        let parameter = self
            .parameters
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| PropertyError::NoSuchParameter(name.to_string()))?;
        parameter.value = value.map(str::to_string);
        Ok(self)
    }

    /// Read a `plugins` collection
    pub fn list_from_wire(value: Option<&Value>) -> Result<Vec<Plugin>> {
        wire::list_items(value, "plugin")
            .into_iter()
            .map(Plugin::from_wire)
            .collect()
    }

    /// Write a `plugins` collection
    pub fn list_to_wire(plugins: &[Plugin], transport: Transport) -> Value {
        let items = plugins.iter().map(|p| p.to_wire(transport)).collect();
        wire::wrap_list(transport, "plugin", items)
    }
}

impl WireFormat for Plugin {
    fn from_wire(value: &Value) -> Result<Self> {
        let obj = wire::as_object(value, "plugin")?;
        let name = wire::required_string(obj, "name")?;
        wire::non_empty("name", &name)?;
        let parameters = wire::list_items(obj.get("parameters"), "parameter")
            .into_iter()
            .map(|p| {
                let p = wire::as_object(p, "parameter")?;
                Ok(Parameter {
                    name: wire::required_string(p, "name")?,
                    value: wire::opt_string(p, "value"),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { name, parameters })
    }

    fn to_wire(&self, transport: Transport) -> Value {
        let params = self
            .parameters
            .iter()
            .map(|p| {
                let mut m = Map::new();
                m.insert("name".into(), Value::String(p.name.clone()));
                wire::put_opt(&mut m, "value", p.value.as_deref());
                Value::Object(m)
            })
            .collect();
        let mut map = Map::new();
        map.insert("name".into(), Value::String(self.name.clone()));
        map.insert(
            "parameters".into(),
            wire::wrap_list(transport, "parameter", params),
        );
        Value::Object(map)
    }
}
