// assetkit-core/src/lib.rs
// Typed property classes for CMS asset web-service payloads

pub mod abilities;
pub mod access_rights;
pub mod config;
pub mod error;
pub mod identifier;
pub mod metadata;
pub mod page_configuration;
pub mod plugin;
pub mod service;
pub mod structured_data;
pub mod wire;
pub mod workflow;
pub mod workflow_settings;

// Public exports
pub use abilities::{Abilities, Ability, AbilityScope, RoleType};
pub use access_rights::{AccessLevel, AccessRightsInformation, AclEntry, PrincipalType};
pub use config::ClientConfig;
pub use error::{PropertyError, Result};
pub use identifier::{AssetPath, EntityType, Identifier, Reference};
pub use metadata::{
    DynamicField, DynamicFieldDefinition, DynamicFieldType, Metadata, MetadataRules, WiredField,
};
pub use page_configuration::{PageConfiguration, PageRegion, SerializationType};
pub use plugin::{Parameter, Plugin};
pub use service::AssetService;
pub use structured_data::{
    DataDefinition, DefinitionTree, FieldDefinition, SharedDefinition, StructuredData,
    StructuredDataNode,
};
pub use wire::{Transport, WireFormat};
pub use workflow::{Workflow, WorkflowAction, WorkflowStep};
pub use workflow_settings::WorkflowSettings;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = "assetkit-core";
