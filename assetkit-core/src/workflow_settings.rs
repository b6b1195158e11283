// Workflow settings of a folder

use crate::error::{PropertyError, Result};
use crate::identifier::{EntityType, Identifier};
use crate::service::AssetService;
use crate::wire::{self, Transport, WireFormat};
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    identifier: Identifier,
    workflow_definitions: Vec<Identifier>,
    inherit_workflows: bool,
    require_workflow: bool,
    inherited_workflow_definitions: Vec<Identifier>,
}

fn read_definitions(value: Option<&Value>) -> Result<Vec<Identifier>> {
    wire::list_items(value, "assetIdentifier")
        .into_iter()
        .map(Identifier::from_wire)
        .collect()
}

impl WorkflowSettings {
    pub fn new(identifier: Identifier) -> Self {
        Self {
            identifier,
            workflow_definitions: Vec::new(),
            inherit_workflows: false,
            require_workflow: false,
            inherited_workflow_definitions: Vec::new(),
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn workflow_definitions(&self) -> &[Identifier] {
        &self.workflow_definitions
    }

    pub fn inherited_workflow_definitions(&self) -> &[Identifier] {
        &self.inherited_workflow_definitions
    }

    pub fn inherit_workflows(&self) -> bool {
        self.inherit_workflows
    }

    pub fn require_workflow(&self) -> bool {
        self.require_workflow
    }

    pub fn has_workflow_definition(&self, definition: &Identifier) -> bool {
        self.workflow_definitions
            .iter()
            .any(|d| d.matches(definition))
    }

    /// Assign a workflow definition; already assigned ones are left alone
    pub fn add_workflow_definition(&mut self, definition: Identifier) -> Result<&mut Self> {
        if definition.entity_type != EntityType::WorkflowDefinition {
            return Err(PropertyError::invalid(
                "workflowDefinition",
                definition.entity_type.as_str(),
                "identifier must name a workflowdefinition",
            ));
        }
        if !self.has_workflow_definition(&definition) {
            debug!("assigning workflow definition {:?}", definition.id);
            self.workflow_definitions.push(definition);
        }
        Ok(self)
    }

    pub fn remove_workflow_definition(&mut self, definition: &Identifier) -> &mut Self {
        self.workflow_definitions.retain(|d| !d.matches(definition));
        self
    }

    pub fn unset_workflow_definitions(&mut self) -> &mut Self {
        self.workflow_definitions.clear();
        self
    }

    pub fn set_inherit_workflows(&mut self, inherit: bool) -> &mut Self {
        self.inherit_workflows = inherit;
        self
    }

    pub fn set_require_workflow(&mut self, require: bool) -> &mut Self {
        self.require_workflow = require;
        self
    }

    /// Build the `editWorkflowSettings` request body
    pub fn edit_request(
        &self,
        transport: Transport,
        apply_inherit_to_children: bool,
        apply_require_to_children: bool,
    ) -> Value {
        let mut map = Map::new();
        map.insert("workflowSettings".into(), self.to_wire(transport));
        map.insert(
            "applyInheritWorkflowsToChildren".into(),
            Value::Bool(apply_inherit_to_children),
        );
        map.insert(
            "applyRequireWorkflowToChildren".into(),
            Value::Bool(apply_require_to_children),
        );
        Value::Object(map)
    }

    /// Send the settings to the service
    pub fn commit(
        &self,
        service: &dyn AssetService,
        apply_inherit_to_children: bool,
        apply_require_to_children: bool,
    ) -> Result<()> {
        let request = self.edit_request(
            service.transport(),
            apply_inherit_to_children,
            apply_require_to_children,
        );
        service.edit_workflow_settings(&request)
    }
}

impl WireFormat for WorkflowSettings {
    fn from_wire(value: &Value) -> Result<Self> {
        let obj = wire::as_object(value, "workflowSettings")?;
        let identifier = Identifier::from_wire(obj.get("identifier").ok_or_else(|| {
            PropertyError::MissingField {
                field: "identifier".to_string(),
            }
        })?)?;
        Ok(Self {
            identifier,
            workflow_definitions: read_definitions(obj.get("workflowDefinitions"))?,
            inherit_workflows: wire::bool_field(obj, "inheritWorkflows", false)?,
            require_workflow: wire::bool_field(obj, "requireWorkflow", false)?,
            inherited_workflow_definitions: read_definitions(
                obj.get("inheritedWorkflowDefinitions"),
            )?,
        })
    }

    fn to_wire(&self, transport: Transport) -> Value {
        let definitions = |list: &[Identifier]| {
            wire::wrap_list(
                transport,
                "assetIdentifier",
                list.iter().map(|d| d.to_wire(transport)).collect(),
            )
        };
        let mut map = Map::new();
        map.insert("identifier".into(), self.identifier.to_wire(transport));
        map.insert(
            "workflowDefinitions".into(),
            definitions(&self.workflow_definitions),
        );
        map.insert(
            "inheritWorkflows".into(),
            Value::Bool(self.inherit_workflows),
        );
        map.insert("requireWorkflow".into(), Value::Bool(self.require_workflow));
        map.insert(
            "inheritedWorkflowDefinitions".into(),
            definitions(&self.inherited_workflow_definitions),
        );
        Value::Object(map)
    }
}
