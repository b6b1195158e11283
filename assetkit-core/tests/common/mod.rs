// Shared fixtures for integration tests

#![allow(dead_code)]

use assetkit_core::{
    AssetService, DefinitionTree, Identifier, PropertyError, Result, SharedDefinition, Transport,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Definition covering every field kind the tree handles
pub fn news_definition() -> SharedDefinition {
    Arc::new(
        DefinitionTree::from_value(&json!({
            "id": "dd-news",
            "path": "/definitions/news",
            "fields": [
                {"identifier": "title", "type": "text", "required": true},
                {"identifier": "body", "type": "text", "textType": "wysiwyg"},
                {"identifier": "published", "type": "text", "textType": "calendar"},
                {"identifier": "updated", "type": "text", "textType": "datetime"},
                {"identifier": "category", "type": "text", "textType": "dropdown",
                 "possibleValues": ["campus", "research", "sports"], "default": "campus"},
                {"identifier": "audience", "type": "text", "textType": "checkbox",
                 "possibleValues": ["students", "faculty", "alumni"]},
                {"identifier": "related", "type": "asset", "assetType": "page,file,symlink"},
                {"identifier": "sidebar", "type": "asset", "assetType": "block"},
                {"identifier": "contact", "type": "group", "multiple": true, "maximum": 4, "fields": [
                    {"identifier": "name", "type": "text"},
                    {"identifier": "phone", "type": "text", "multiple": true, "minimum": 2}
                ]}
            ]
        }))
        .unwrap(),
    )
}

/// Wire object as the service returns it (SOAP dialect)
pub fn news_wire() -> Value {
    json!({
        "definitionId": "dd-news",
        "structuredDataNodes": {"structuredDataNode": [
            {"type": "text", "identifier": "title", "text": "Commencement"},
            {"type": "text", "identifier": "body", "text": "<p>Welcome to commencement week</p>"},
            {"type": "text", "identifier": "category", "text": "campus"},
            {"type": "text", "identifier": "audience",
             "text": "::CONTENT-XML-CHECKBOX::students::CONTENT-XML-CHECKBOX::alumni"},
            {"type": "asset", "identifier": "related", "assetType": "page,file,symlink", "pageId": "p42"},
            {"type": "group", "identifier": "contact", "structuredDataNodes": {"structuredDataNode": [
                {"type": "text", "identifier": "name", "text": "Registrar"},
                {"type": "text", "identifier": "phone", "text": "555-0100"},
                {"type": "text", "identifier": "phone", "text": "555-0101"}
            ]}},
            {"type": "group", "identifier": "contact", "structuredDataNodes": [
                {"type": "text", "identifier": "name", "text": "Dean of Students"},
                {"type": "text", "identifier": "phone", "text": "555-0200"},
                {"type": "text", "identifier": "phone", "text": ""}
            ]}
        ]}
    })
}

/// Service double that serves canned assets and records every call
#[derive(Default)]
pub struct RecordingService {
    pub transport: Transport,
    pub assets: HashMap<String, Value>,
    pub reads: Mutex<Vec<Identifier>>,
    pub transitions: Mutex<Vec<(String, String, String)>>,
    pub requests: Mutex<Vec<Value>>,
}

impl RecordingService {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            ..Self::default()
        }
    }

    pub fn with_asset(mut self, id: &str, asset: Value) -> Self {
        self.assets.insert(id.to_string(), asset);
        self
    }
}

impl AssetService for RecordingService {
    fn transport(&self) -> Transport {
        self.transport
    }

    /// Canned assets are keyed by id, or by path for path-only identifiers
    fn read(&self, identifier: &Identifier) -> Result<Value> {
        self.reads.lock().push(identifier.clone());
        let key = identifier
            .id
            .as_deref()
            .or_else(|| identifier.path.as_ref().map(|p| p.path.as_str()));
        key.and_then(|key| self.assets.get(key))
            .cloned()
            .ok_or_else(|| PropertyError::Service(format!("no asset {:?}", key)))
    }

    fn perform_workflow_transition(
        &self,
        workflow_id: &str,
        action_identifier: &str,
        comment: &str,
    ) -> Result<()> {
        self.transitions.lock().push((
            workflow_id.to_string(),
            action_identifier.to_string(),
            comment.to_string(),
        ));
        Ok(())
    }

    fn edit_workflow_settings(&self, request: &Value) -> Result<()> {
        self.requests.lock().push(request.clone());
        Ok(())
    }
}
