use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod config;
pub mod logging;

// ============================================================================
// Desired state
// ============================================================================

/// What the caller wants to be true in the identity store after the run.
///
/// There is no "current state" probe: the module issues one command for the
/// desired state and classifies the backend's reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    /// The principal exists (create it if missing).
    Present,
    /// The principal is gone (delete it if present).
    Absent,
    /// The principal keeps its identity but gets a new key or password.
    Change,
}

impl Default for DesiredState {
    fn default() -> Self {
        DesiredState::Present
    }
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesiredState::Present => write!(f, "present"),
            DesiredState::Absent => write!(f, "absent"),
            DesiredState::Change => write!(f, "change"),
        }
    }
}

impl FromStr for DesiredState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(DesiredState::Present),
            "absent" => Ok(DesiredState::Absent),
            "change" => Ok(DesiredState::Change),
            other => Err(format!(
                "invalid state '{}', expected one of: present, absent, change",
                other
            )),
        }
    }
}

// ============================================================================
// Principal identity
// ============================================================================

/// A Kerberos principal identity, canonically `name[/instance][@realm]`.
///
/// `Display` renders the canonical form. Values are embedded verbatim, in a
/// fixed order (name, instance suffix, realm suffix); no escaping or
/// normalization is performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Short name of the principal (user or service).
    pub name: String,
    /// Optional qualifier distinguishing principal variants (host, role, group).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// Administrative domain; omitted to use the default database realm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance: None,
            realm: None,
        }
    }

    /// Build a principal from flat module parameters.
    ///
    /// Empty instance/realm strings count as absent, matching how the module
    /// parameters have always been interpreted.
    pub fn from_parts(
        name: impl Into<String>,
        instance: Option<String>,
        realm: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instance: non_empty(instance),
            realm: non_empty(realm),
        }
    }

    #[must_use]
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    #[must_use]
    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(instance) = &self.instance {
            write!(f, "/{}", instance)?;
        }
        if let Some(realm) = &self.realm {
            write!(f, "@{}", realm)?;
        }
        Ok(())
    }
}

/// Treat empty module parameters as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// ============================================================================
// Credentials
// ============================================================================

/// Credential material handed to the identity store on create/change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Let the backend generate a random key.
    RandomKey,
    /// Explicit password, passed verbatim.
    Password(String),
}

impl Credential {
    /// A missing or empty password selects a random key.
    ///
    /// The empty-string case is deliberate: passing `password: ""` has always
    /// been the documented way to request a random key explicitly.
    pub fn from_password(password: Option<&str>) -> Self {
        match password {
            Some(p) if !p.is_empty() => Credential::Password(p.to_string()),
            _ => Credential::RandomKey,
        }
    }

    pub fn is_random(&self) -> bool {
        matches!(self, Credential::RandomKey)
    }
}

// ============================================================================
// Reconcile request
// ============================================================================

/// One reconciliation order: the principal, the desired end state, and the
/// credential/attribute inputs that state may need.
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    pub principal: Principal,
    pub state: DesiredState,
    /// Explicit password; `None` or empty means random key.
    pub password: Option<String>,
    /// Opaque attribute token, forwarded to the backend on create only.
    pub attributes: Option<String>,
}

impl ReconcileRequest {
    pub fn new(principal: Principal, state: DesiredState) -> Self {
        Self {
            principal,
            state,
            password: None,
            attributes: None,
        }
    }

    #[must_use]
    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Option<String>) -> Self {
        self.attributes = non_empty(attributes);
        self
    }

    pub fn credential(&self) -> Credential {
        Credential::from_password(self.password.as_deref())
    }
}

// ============================================================================
// Module report
// ============================================================================

/// The single result object a module run prints on stdout.
///
/// `failed` is omitted from the JSON unless true; the orchestration layer
/// treats absence as success, so the serialized shape matters as much as the
/// values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleReport {
    pub changed: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub failed: bool,
    pub msg: String,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ModuleReport {
    /// The desired state was applied.
    pub fn changed(msg: impl Into<String>) -> Self {
        Self {
            changed: true,
            failed: false,
            msg: msg.into(),
        }
    }

    /// The store was already in the desired state; nothing was done.
    pub fn unchanged(msg: impl Into<String>) -> Self {
        Self {
            changed: false,
            failed: false,
            msg: msg.into(),
        }
    }

    /// The operation failed; `msg` carries the backend diagnostic verbatim.
    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            changed: false,
            failed: true,
            msg: msg.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("Failed to serialize report")
    }
}
