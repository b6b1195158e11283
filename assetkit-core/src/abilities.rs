// Role abilities: the boolean permission flags of site and global roles

use crate::error::{PropertyError, Result};
use crate::wire::{self, Transport};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::trace;

/// Kind of role an ability set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleType {
    Site,
    Global,
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleType::Site => f.write_str("site"),
            RoleType::Global => f.write_str("global"),
        }
    }
}

/// Which role types an ability applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilityScope {
    Site,
    Global,
    Both,
}

impl AbilityScope {
    fn includes(&self, role_type: RoleType) -> bool {
        matches!(
            (self, role_type),
            (AbilityScope::Both, _)
                | (AbilityScope::Site, RoleType::Site)
                | (AbilityScope::Global, RoleType::Global)
        )
    }
}

macro_rules! abilities {
    ($($variant:ident => $name:literal, $scope:ident;)*) => {
        /// A single named ability
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Ability {
            $($variant,)*
        }

        impl Ability {
            /// Every ability in wire order
            pub const ALL: &'static [Ability] = &[$(Ability::$variant,)*];

            /// camelCase name used on the wire
            pub fn wire_name(&self) -> &'static str {
                match self {
                    $(Ability::$variant => $name,)*
                }
            }

            pub fn from_wire_name(name: &str) -> Option<Ability> {
                match name {
                    $($name => Some(Ability::$variant),)*
                    _ => None,
                }
            }

            pub fn scope(&self) -> AbilityScope {
                match self {
                    $(Ability::$variant => AbilityScope::$scope,)*
                }
            }
        }
    };
}

abilities! {
    BypassAllPermissionsChecks => "bypassAllPermissionsChecks", Both;
    AccessSiteManagement => "accessSiteManagement", Global;
    CreateSites => "createSites", Global;
    EditAccessRights => "editAccessRights", Both;
    AccessAudits => "accessAudits", Both;
    AccessAllSites => "accessAllSites", Global;
    ViewSystemInfoAndLogs => "viewSystemInfoAndLogs", Global;
    ForceLogout => "forceLogout", Global;
    DiagnosticTests => "diagnosticTests", Both;
    AccessSecurityArea => "accessSecurityArea", Global;
    OptimizeDatabase => "optimizeDatabase", Global;
    SyncLdap => "syncLdap", Global;
    ConfigureLogging => "configureLogging", Global;
    SearchingIndexing => "searchingIndexing", Global;
    AccessConfiguration => "accessConfiguration", Global;
    EditSystemPreferences => "editSystemPreferences", Global;
    BroadcastMessages => "broadcastMessages", Global;
    ViewUsersInMemberGroups => "viewUsersInMemberGroups", Global;
    ViewAllUsers => "viewAllUsers", Global;
    CreateUsers => "createUsers", Global;
    DeleteUsersInMemberGroups => "deleteUsersInMemberGroups", Global;
    DeleteAllUsers => "deleteAllUsers", Global;
    ViewMemberGroups => "viewMemberGroups", Global;
    ViewAllGroups => "viewAllGroups", Global;
    CreateGroups => "createGroups", Global;
    DeleteMemberGroups => "deleteMemberGroups", Global;
    DeleteAllGroups => "deleteAllGroups", Global;
    AccessRoles => "accessRoles", Global;
    CreateRoles => "createRoles", Global;
    DatabaseExportTool => "databaseExportTool", Global;
    ChangeIdentity => "changeIdentity", Global;
    ModifyDictionary => "modifyDictionary", Global;
    UploadImagesFromWysiwyg => "uploadImagesFromWysiwyg", Site;
    MultiSelectCopy => "multiSelectCopy", Site;
    MultiSelectPublish => "multiSelectPublish", Site;
    MultiSelectMove => "multiSelectMove", Site;
    MultiSelectDelete => "multiSelectDelete", Site;
    EditPageLevelConfigurations => "editPageLevelConfigurations", Site;
    EditPageContentType => "editPageContentType", Site;
    EditDataDefinition => "editDataDefinition", Site;
    PublishReadableHomeAssets => "publishReadableHomeAssets", Site;
    PublishWritableHomeAssets => "publishWritableHomeAssets", Site;
    ViewVersions => "viewVersions", Site;
    ActivateDeleteVersions => "activateDeleteVersions", Site;
    BypassWorkflow => "bypassWorkflow", Site;
    AssignApproveWorkflowSteps => "assignApproveWorkflowSteps", Site;
    DeleteWorkflows => "deleteWorkflows", Site;
    BreakLocks => "breakLocks", Site;
    AssignWorkflowsToFolders => "assignWorkflowsToFolders", Site;
    BypassAssetFactoryGroupsNewMenu => "bypassAssetFactoryGroupsNewMenu", Site;
    BypassDestinationGroupsWhenPublishing => "bypassDestinationGroupsWhenPublishing", Site;
    BypassWorkflowDefinitionGroupsForFolders => "bypassWorkflowDefintionGroupsForFolders", Site;
    AccessManageSiteArea => "accessManageSiteArea", Site;
    AccessAssetFactories => "accessAssetFactories", Site;
    AccessConfigurationSets => "accessConfigurationSets", Site;
    AccessDataDefinitions => "accessDataDefinitions", Site;
    AccessMetadataSets => "accessMetadataSets", Site;
    AccessPublishSets => "accessPublishSets", Site;
    AccessDestinations => "accessDestinations", Site;
    AccessTransports => "accessTransports", Site;
    AccessWorkflowDefinitions => "accessWorkflowDefinitions", Site;
    AccessContentTypes => "accessContentTypes", Site;
    AccessConnectors => "accessConnectors", Site;
    PublishReadableAdminAreaAssets => "publishReadableAdminAreaAssets", Site;
    PublishWritableAdminAreaAssets => "publishWritableAdminAreaAssets", Site;
    ImportZipArchive => "importZipArchive", Site;
    BulkChange => "bulkChange", Site;
    RecycleBinViewRestoreUserAssets => "recycleBinViewRestoreUserAssets", Both;
    RecycleBinDeleteAssets => "recycleBinDeleteAssets", Both;
    RecycleBinViewRestoreAllAssets => "recycleBinViewRestoreAllAssets", Both;
    MoveRenameAssets => "moveRenameAssets", Both;
    AlwaysAllowedToToggleDataChecks => "alwaysAllowedToToggleDataChecks", Site;
    ViewPublishQueue => "viewPublishQueue", Site;
    ReorderPublishQueue => "reorderPublishQueue", Site;
    CancelPublishJobs => "cancelPublishJobs", Site;
    SendStaleAssetNotifications => "sendStaleAssetNotifications", Site;
    BrokenLinkReportAccess => "brokenLinkReportAccess", Site;
    BrokenLinkReportMarkFixed => "brokenLinkReportMarkFixed", Site;
    AccessEditorConfigurations => "accessEditorConfigurations", Site;
    BypassWysiwygEditorRestrictions => "bypassWysiwygEditorRestrictions", Site;
}

impl Ability {
    pub fn applies_to(&self, role_type: RoleType) -> bool {
        self.scope().includes(role_type)
    }
}

/// Ability set of one role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abilities {
    role_type: RoleType,
    flags: BTreeMap<Ability, bool>,
}

impl Abilities {
    /// Every applicable ability revoked
    pub fn new(role_type: RoleType) -> Self {
        let flags = Ability::ALL
            .iter()
            .filter(|a| a.applies_to(role_type))
            .map(|a| (*a, false))
            .collect();
        Self { role_type, flags }
    }

    pub fn from_wire(role_type: RoleType, value: &Value) -> Result<Self> {
        let obj = wire::as_object(value, "abilities")?;
        let mut abilities = Self::new(role_type);
        for (key, raw) in obj {
            let Some(ability) = Ability::from_wire_name(key) else {
                trace!("skipping unknown ability {}", key);
                continue;
            };
            if !ability.applies_to(role_type) || raw.is_null() {
                continue;
            }
            abilities.flags.insert(ability, wire::parse_bool(key, raw)?);
        }
        Ok(abilities)
    }

    pub fn role_type(&self) -> RoleType {
        self.role_type
    }

    fn check(&self, ability: Ability) -> Result<()> {
        if ability.applies_to(self.role_type) {
            Ok(())
        } else {
            Err(PropertyError::UnsupportedAbility {
                ability: ability.wire_name().to_string(),
                role_type: self.role_type.to_string(),
            })
        }
    }

    pub fn get(&self, ability: Ability) -> Result<bool> {
        self.check(ability)?;
        Ok(self.flags.get(&ability).copied().unwrap_or(false))
    }

    pub fn set(&mut self, ability: Ability, granted: bool) -> Result<&mut Self> {
        self.check(ability)?;
        self.flags.insert(ability, granted);
        Ok(self)
    }

    /// Set from an untyped value, which must be a boolean
    pub fn set_from_value(&mut self, ability: Ability, value: &Value) -> Result<&mut Self> {
        let granted = wire::parse_bool(ability.wire_name(), value)?;
        self.set(ability, granted)
    }

    pub fn grant_all(&mut self) -> &mut Self {
        self.flags.values_mut().for_each(|v| *v = true);
        self
    }

    pub fn revoke_all(&mut self) -> &mut Self {
        self.flags.values_mut().for_each(|v| *v = false);
        self
    }

    /// Abilities currently granted
    pub fn granted(&self) -> Vec<Ability> {
        self.flags
            .iter()
            .filter(|(_, granted)| **granted)
            .map(|(ability, _)| *ability)
            .collect()
    }

    pub fn to_wire(&self, _transport: Transport) -> Value {
        let mut map = Map::new();
        for (ability, granted) in &self.flags {
            map.insert(ability.wire_name().to_string(), Value::Bool(*granted));
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_names_round_trip() {
        for ability in Ability::ALL {
            assert_eq!(Ability::from_wire_name(ability.wire_name()), Some(*ability));
        }
    }

    #[test]
    fn test_new_revokes_everything() {
        let abilities = Abilities::new(RoleType::Site);
        assert!(abilities.granted().is_empty());
        assert!(!abilities.get(Ability::BypassWorkflow).unwrap());
    }

    #[test]
    fn test_from_wire_validates_booleans() {
        let value = json!({"bypassWorkflow": "true", "breakLocks": false, "madeUp": true});
        let abilities = Abilities::from_wire(RoleType::Site, &value).unwrap();
        assert_eq!(abilities.granted(), vec![Ability::BypassWorkflow]);

        let bad = json!({"breakLocks": "sometimes"});
        assert!(Abilities::from_wire(RoleType::Site, &bad).is_err());
    }

    #[test]
    fn test_scope_enforced() {
        let mut site = Abilities::new(RoleType::Site);
        let err = site.set(Ability::CreateSites, true).unwrap_err();
        assert!(matches!(err, PropertyError::UnsupportedAbility { .. }));

        let mut global = Abilities::new(RoleType::Global);
        global.set(Ability::CreateSites, true).unwrap();
        assert!(global.get(Ability::CreateSites).unwrap());
        assert!(global.get(Ability::BreakLocks).is_err());
    }

    #[test]
    fn test_set_from_value() {
        let mut abilities = Abilities::new(RoleType::Site);
        abilities
            .set_from_value(Ability::ViewVersions, &json!("TRUE"))
            .unwrap();
        assert!(abilities.get(Ability::ViewVersions).unwrap());
        assert!(abilities
            .set_from_value(Ability::ViewVersions, &json!(null))
            .is_err());
    }

    #[test]
    fn test_to_wire_only_applicable() {
        let mut abilities = Abilities::new(RoleType::Global);
        abilities.grant_all();
        let wire = abilities.to_wire(Transport::Soap);
        let obj = wire.as_object().unwrap();
        assert_eq!(obj.get("syncLdap"), Some(&json!(true)));
        assert!(obj.get("breakLocks").is_none());
        assert!(obj.get("bypassAllPermissionsChecks").is_some());
    }
}
