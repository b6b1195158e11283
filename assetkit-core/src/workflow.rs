// Workflow state of an asset: steps, actions and transitions

use crate::error::{PropertyError, Result};
use crate::identifier::Identifier;
use crate::service::AssetService;
use crate::wire::{self, Transport, WireFormat};
use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowAction {
    pub identifier: String,
    pub label: Option<String>,
    pub action_type: Option<String>,
    pub next_id: Option<String>,
}

impl WireFormat for WorkflowAction {
    fn from_wire(value: &Value) -> Result<Self> {
        let obj = wire::as_object(value, "action")?;
        Ok(Self {
            identifier: wire::required_string(obj, "identifier")?,
            label: wire::opt_string(obj, "label"),
            action_type: wire::opt_string(obj, "actionType"),
            next_id: wire::opt_string(obj, "nextId"),
        })
    }

    fn to_wire(&self, _transport: Transport) -> Value {
        let mut map = Map::new();
        map.insert("identifier".into(), Value::String(self.identifier.clone()));
        wire::put_opt(&mut map, "label", self.label.as_deref());
        wire::put_opt(&mut map, "actionType", self.action_type.as_deref());
        wire::put_opt(&mut map, "nextId", self.next_id.as_deref());
        Value::Object(map)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowStep {
    pub identifier: String,
    pub label: Option<String>,
    pub step_type: Option<String>,
    pub owner: Option<String>,
    pub actions: Vec<WorkflowAction>,
}

impl WorkflowStep {
    pub fn action(&self, identifier: &str) -> Option<&WorkflowAction> {
        self.actions.iter().find(|a| a.identifier == identifier)
    }
}

impl WireFormat for WorkflowStep {
    fn from_wire(value: &Value) -> Result<Self> {
        let obj = wire::as_object(value, "step")?;
        let actions = wire::list_items(obj.get("actions"), "action")
            .into_iter()
            .map(WorkflowAction::from_wire)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            identifier: wire::required_string(obj, "identifier")?,
            label: wire::opt_string(obj, "label"),
            step_type: wire::opt_string(obj, "stepType"),
            owner: wire::opt_string(obj, "owner"),
            actions,
        })
    }

    fn to_wire(&self, transport: Transport) -> Value {
        let mut map = Map::new();
        map.insert("identifier".into(), Value::String(self.identifier.clone()));
        wire::put_opt(&mut map, "label", self.label.as_deref());
        wire::put_opt(&mut map, "stepType", self.step_type.as_deref());
        wire::put_opt(&mut map, "owner", self.owner.as_deref());
        let actions = self.actions.iter().map(|a| a.to_wire(transport)).collect();
        map.insert(
            "actions".into(),
            wire::wrap_list(transport, "action", actions),
        );
        Value::Object(map)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub related_entity: Identifier,
    current_step: String,
    ordered_steps: Vec<WorkflowStep>,
    unordered_steps: Vec<WorkflowStep>,
    pub start_date: Option<DateTime<FixedOffset>>,
    pub end_date: Option<DateTime<FixedOffset>>,
}

fn read_steps(value: Option<&Value>) -> Result<Vec<WorkflowStep>> {
    wire::list_items(value, "step")
        .into_iter()
        .map(WorkflowStep::from_wire)
        .collect()
}

fn read_date(obj: &Map<String, Value>, key: &str) -> Result<Option<DateTime<FixedOffset>>> {
    match wire::opt_string(obj, key) {
        Some(raw) if !raw.trim().is_empty() => DateTime::parse_from_rfc3339(raw.trim())
            .map(Some)
            .map_err(|e| PropertyError::invalid(key, raw, e.to_string())),
        _ => Ok(None),
    }
}

impl Workflow {
    pub fn current_step_identifier(&self) -> &str {
        &self.current_step
    }

    pub fn current_step(&self) -> Option<&WorkflowStep> {
        self.step(&self.current_step)
    }

    /// Ordered steps first, then unordered ones
    pub fn steps(&self) -> impl Iterator<Item = &WorkflowStep> {
        self.ordered_steps.iter().chain(self.unordered_steps.iter())
    }

    pub fn ordered_steps(&self) -> &[WorkflowStep] {
        &self.ordered_steps
    }

    pub fn unordered_steps(&self) -> &[WorkflowStep] {
        &self.unordered_steps
    }

    pub fn step(&self, identifier: &str) -> Option<&WorkflowStep> {
        self.steps().find(|s| s.identifier == identifier)
    }

    /// Actions offered by the current step
    pub fn possible_actions(&self) -> &[WorkflowAction] {
        self.current_step()
            .map(|s| s.actions.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_possible_action(&self, identifier: &str) -> bool {
        self.possible_actions()
            .iter()
            .any(|a| a.identifier == identifier)
    }

    /// Ask the service to take one of the current step's actions
    pub fn perform_transition(
        &self,
        service: &dyn AssetService,
        action: &str,
        comment: &str,
    ) -> Result<()> {
        if self.current_step().is_none() {
            return Err(PropertyError::NoSuchStep(self.current_step.clone()));
        }
        if !self.is_possible_action(action) {
            return Err(PropertyError::ImpossibleAction {
                action: action.to_string(),
                step: self.current_step.clone(),
            });
        }
        info!(
            "workflow {} transition '{}' from step '{}'",
            self.id, action, self.current_step
        );
        service.perform_workflow_transition(&self.id, action, comment)
    }
}

impl WireFormat for Workflow {
    fn from_wire(value: &Value) -> Result<Self> {
        let obj = wire::as_object(value, "workflow")?;
        let related_entity =
            Identifier::from_wire(obj.get("relatedEntity").ok_or_else(|| {
                PropertyError::MissingField {
                    field: "relatedEntity".to_string(),
                }
            })?)?;
        Ok(Self {
            id: wire::required_string(obj, "id")?,
            name: wire::required_string(obj, "name")?,
            related_entity,
            current_step: wire::required_string(obj, "currentStep")?,
            ordered_steps: read_steps(obj.get("orderedSteps"))?,
            unordered_steps: read_steps(obj.get("unorderedSteps"))?,
            start_date: read_date(obj, "startDate")?,
            end_date: read_date(obj, "endDate")?,
        })
    }

    fn to_wire(&self, transport: Transport) -> Value {
        let steps = |list: &[WorkflowStep]| {
            wire::wrap_list(
                transport,
                "step",
                list.iter().map(|s| s.to_wire(transport)).collect(),
            )
        };
        let mut map = Map::new();
        map.insert("id".into(), Value::String(self.id.clone()));
        map.insert("name".into(), Value::String(self.name.clone()));
        map.insert(
            "relatedEntity".into(),
            self.related_entity.to_wire(transport),
        );
        map.insert(
            "currentStep".into(),
            Value::String(self.current_step.clone()),
        );
        map.insert("orderedSteps".into(), steps(&self.ordered_steps));
        map.insert("unorderedSteps".into(), steps(&self.unordered_steps));
        wire::put_opt(
            &mut map,
            "startDate",
            self.start_date.map(|d| d.to_rfc3339()).as_deref(),
        );
        wire::put_opt(
            &mut map,
            "endDate",
            self.end_date.map(|d| d.to_rfc3339()).as_deref(),
        );
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Workflow {
        Workflow::from_wire(&json!({
            "id": "wf1",
            "name": "Publish News",
            "relatedEntity": {"id": "p1", "type": "page"},
            "currentStep": "review",
            "orderedSteps": {"step": [
                {"identifier": "initialize", "stepType": "system", "actions": {"action": {"identifier": "start", "nextId": "review"}}},
                {"identifier": "review", "label": "Review", "owner": "Editors", "actions": {"action": [
                    {"identifier": "approve", "actionType": "forward", "nextId": "publish"},
                    {"identifier": "reject", "actionType": "reverse", "nextId": "edit"}
                ]}}
            ]},
            "unorderedSteps": {"step": {"identifier": "edit", "actions": []}},
            "startDate": "2024-05-01T10:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_steps_and_actions() {
        let wf = sample();
        assert_eq!(wf.steps().count(), 3);
        assert_eq!(wf.current_step().unwrap().owner.as_deref(), Some("Editors"));
        assert!(wf.is_possible_action("approve"));
        assert!(!wf.is_possible_action("start"));
        assert_eq!(wf.step("edit").unwrap().actions.len(), 0);
        assert!(wf.start_date.is_some());
    }

    #[test]
    fn test_to_wire_soap() {
        let soap = sample().to_wire(Transport::Soap);
        assert_eq!(soap["unorderedSteps"]["step"]["identifier"], json!("edit"));
        assert_eq!(
            soap["orderedSteps"]["step"][1]["actions"]["action"][0]["identifier"],
            json!("approve")
        );
        let rest = sample().to_wire(Transport::Rest);
        assert_eq!(rest["orderedSteps"][0]["actions"][0]["nextId"], json!("review"));
    }

    #[test]
    fn test_missing_current_step_field() {
        let value = json!({
            "id": "wf1", "name": "x",
            "relatedEntity": {"id": "p1", "type": "page"}
        });
        assert!(Workflow::from_wire(&value).is_err());
    }
}
