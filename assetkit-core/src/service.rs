//! Remote service boundary
//!
//! Property classes never talk to the network themselves. Operations that
//! need a round trip (resolving a region's block, moving a workflow along)
//! take an `AssetService`, which callers implement over their SOAP or REST
//! client of choice.

use crate::error::Result;
use crate::identifier::Identifier;
use crate::wire::Transport;
use serde_json::Value;

pub trait AssetService {
    /// Dialect the service speaks
    fn transport(&self) -> Transport;

    /// Read an asset and return its wire object
    fn read(&self, identifier: &Identifier) -> Result<Value>;

    /// Advance a workflow with one of its current step's actions
    fn perform_workflow_transition(
        &self,
        workflow_id: &str,
        action_identifier: &str,
        comment: &str,
    ) -> Result<()>;

    /// Submit an `editWorkflowSettings` request
    fn edit_workflow_settings(&self, request: &Value) -> Result<()>;
}
