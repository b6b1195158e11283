// Access rights of an asset: ACL entries plus the level granted to everyone

use crate::error::{PropertyError, Result};
use crate::identifier::Identifier;
use crate::wire::{self, Transport, WireFormat};
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccessLevel {
    None,
    Read,
    Write,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::None => "none",
            AccessLevel::Read => "read",
            AccessLevel::Write => "write",
        }
    }
}

impl FromStr for AccessLevel {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(AccessLevel::None),
            "read" => Ok(AccessLevel::Read),
            "write" => Ok(AccessLevel::Write),
            _ => Err(PropertyError::invalid(
                "level",
                s,
                "expected none, read or write",
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalType {
    User,
    Group,
}

impl PrincipalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalType::User => "user",
            PrincipalType::Group => "group",
        }
    }
}

impl FromStr for PrincipalType {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(PrincipalType::User),
            "group" => Ok(PrincipalType::Group),
            _ => Err(PropertyError::invalid("type", s, "expected user or group")),
        }
    }
}

/// One ACL entry; level is always read or write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclEntry {
    pub level: AccessLevel,
    pub principal_type: PrincipalType,
    pub name: String,
}

impl WireFormat for AclEntry {
    fn from_wire(value: &Value) -> Result<Self> {
        let obj = wire::as_object(value, "aclEntry")?;
        let level: AccessLevel = wire::required_string(obj, "level")?.parse()?;
        if level == AccessLevel::None {
            return Err(PropertyError::invalid(
                "level",
                "none",
                "ACL entries grant read or write",
            ));
        }
        let name = wire::required_string(obj, "name")?;
        wire::non_empty("name", &name)?;
        Ok(Self {
            level,
            principal_type: wire::required_string(obj, "type")?.parse()?,
            name,
        })
    }

    fn to_wire(&self, _transport: Transport) -> Value {
        let mut map = Map::new();
        map.insert("level".into(), Value::String(self.level.as_str().into()));
        map.insert(
            "type".into(),
            Value::String(self.principal_type.as_str().into()),
        );
        map.insert("name".into(), Value::String(self.name.clone()));
        Value::Object(map)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRightsInformation {
    identifier: Identifier,
    entries: Vec<AclEntry>,
    all_level: AccessLevel,
}

impl AccessRightsInformation {
    pub fn new(identifier: Identifier) -> Self {
        Self {
            identifier,
            entries: Vec::new(),
            all_level: AccessLevel::None,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn entries(&self) -> &[AclEntry] {
        &self.entries
    }

    pub fn all_level(&self) -> AccessLevel {
        self.all_level
    }

    pub fn set_all_level(&mut self, level: AccessLevel) -> &mut Self {
        self.all_level = level;
        self
    }

    pub fn set_all_level_str(&mut self, level: &str) -> Result<&mut Self> {
        Ok(self.set_all_level(level.parse()?))
    }

    fn level_of(&self, principal_type: PrincipalType, name: &str) -> Option<AccessLevel> {
        self.entries
            .iter()
            .find(|e| e.principal_type == principal_type && e.name == name)
            .map(|e| e.level)
    }

    pub fn has_user(&self, name: &str) -> bool {
        self.level_of(PrincipalType::User, name).is_some()
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.level_of(PrincipalType::Group, name).is_some()
    }

    pub fn user_level(&self, name: &str) -> Option<AccessLevel> {
        self.level_of(PrincipalType::User, name)
    }

    pub fn group_level(&self, name: &str) -> Option<AccessLevel> {
        self.level_of(PrincipalType::Group, name)
    }

    /// Grant a level; `AccessLevel::None` removes the entry
    fn grant(
        &mut self,
        principal_type: PrincipalType,
        name: &str,
        level: AccessLevel,
    ) -> Result<()> {
        wire::non_empty(principal_type.as_str(), name)?;
        if level == AccessLevel::None {
            self.deny(principal_type, name);
            return Ok(());
        }
        match self
            .entries
            .iter_mut()
            .find(|e| e.principal_type == principal_type && e.name == name)
        {
            Some(entry) => entry.level = level,
            None => self.entries.push(AclEntry {
                level,
                principal_type,
                name: name.to_string(),
            }),
        }
        debug!("granted {} {} {}", principal_type.as_str(), name, level.as_str());
        Ok(())
    }

    fn deny(&mut self, principal_type: PrincipalType, name: &str) {
        self.entries
            .retain(|e| !(e.principal_type == principal_type && e.name == name));
    }

    pub fn grant_user(&mut self, name: &str, level: AccessLevel) -> Result<&mut Self> {
        self.grant(PrincipalType::User, name, level)?;
        Ok(self)
    }

    pub fn grant_group(&mut self, name: &str, level: AccessLevel) -> Result<&mut Self> {
        self.grant(PrincipalType::Group, name, level)?;
        Ok(self)
    }

    pub fn deny_user(&mut self, name: &str) -> &mut Self {
        self.deny(PrincipalType::User, name);
        self
    }

    pub fn deny_group(&mut self, name: &str) -> &mut Self {
        self.deny(PrincipalType::Group, name);
        self
    }

    pub fn clear_entries(&mut self) -> &mut Self {
        self.entries.clear();
        self
    }
}

impl WireFormat for AccessRightsInformation {
    fn from_wire(value: &Value) -> Result<Self> {
        let obj = wire::as_object(value, "accessRightsInformation")?;
        let identifier = Identifier::from_wire(obj.get("identifier").ok_or_else(|| {
            PropertyError::MissingField {
                field: "identifier".to_string(),
            }
        })?)?;
        let entries = wire::list_items(obj.get("aclEntries"), "aclEntry")
            .into_iter()
            .map(AclEntry::from_wire)
            .collect::<Result<Vec<_>>>()?;
        let all_level = match wire::opt_string(obj, "allLevel") {
            Some(level) => level.parse()?,
            None => AccessLevel::None,
        };
        Ok(Self {
            identifier,
            entries,
            all_level,
        })
    }

    fn to_wire(&self, transport: Transport) -> Value {
        let mut map = Map::new();
        map.insert("identifier".into(), self.identifier.to_wire(transport));
        let entries = self.entries.iter().map(|e| e.to_wire(transport)).collect();
        map.insert(
            "aclEntries".into(),
            wire::wrap_list(transport, "aclEntry", entries),
        );
        map.insert(
            "allLevel".into(),
            Value::String(self.all_level.as_str().into()),
        );
        Value::Object(map)
    }
}
