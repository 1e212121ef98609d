//! Plan document types
//!
//! A PlanDocument describes the set of smart contracts a user wants built.
//! Untrusted JSON becomes a PlanDocument only through the validator. The fields
//! stay public so code can build and adjust plans directly; a document built
//! that way is not re-checked until it is parsed again or `check_ready` runs.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::PlanError;
use super::validate;

/// Plan status in the delivery pipeline
///
/// Declaration order is pipeline order: `Ord` compares by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// Still being refined in conversation
    #[default]
    Draft,
    /// Approved, waiting for code generation to pick it up
    Ready,
    /// Code generation in progress
    Generating,
    /// Generated contracts under test
    Testing,
    /// Deployed on chain; immutable
    Deployed,
}

impl PlanStatus {
    /// Every status, in pipeline order
    pub const ALL: [PlanStatus; 5] = [
        PlanStatus::Draft,
        PlanStatus::Ready,
        PlanStatus::Generating,
        PlanStatus::Testing,
        PlanStatus::Deployed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Ready => "ready",
            Self::Generating => "generating",
            Self::Testing => "testing",
            Self::Deployed => "deployed",
        }
    }

    /// Draft and ready may be swapped freely while the user edits
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Ready)
    }

    /// Check if no further writes are allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Deployed)
    }

    /// Check whether a document stored with `from` may be overwritten with `to`
    ///
    /// `None` means nothing is stored yet, so any status is accepted.
    pub fn check_transition(from: Option<PlanStatus>, to: PlanStatus) -> Result<(), PlanError> {
        debug!(?from, %to, "PlanStatus::check_transition: called");
        let Some(from) = from else {
            return Ok(());
        };

        if from.is_terminal() {
            debug!("PlanStatus::check_transition: stored plan is deployed");
            return Err(PlanError::IllegalTransition { from, to });
        }

        if (from.is_editable() && to.is_editable()) || to >= from {
            Ok(())
        } else {
            debug!("PlanStatus::check_transition: backward transition rejected");
            Err(PlanError::IllegalTransition { from, to })
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlanStatus {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| PlanError::Schema {
                path: "status".to_string(),
                message: format!(
                    "unknown status '{}', expected one of: draft, ready, generating, testing, deployed",
                    s
                ),
            })
    }
}

/// A named, typed parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub description: String,
}

/// A typed return value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputSpec {
    #[serde(rename = "type")]
    pub ty: String,
    pub description: String,
}

/// Code that runs once on deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstructorSpec {
    pub description: String,
    pub inputs: Vec<ParamSpec>,
}

/// One contract function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub inputs: Vec<ParamSpec>,
    pub outputs: Vec<OutputSpec>,
    /// Access rules and preconditions, in plain language
    pub conditions: Vec<String>,
}

/// One contract in the project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractSpec {
    pub name: String,
    pub description: String,
    /// ERC template id ("ERC-20", ...); None for a fully custom contract
    pub erc_template: Option<String>,
    pub dependencies: Vec<String>,
    pub constructor: ConstructorSpec,
    pub functions: Vec<FunctionSpec>,
}

/// The structured plan a conversation produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanDocument {
    pub project_name: String,
    pub description: String,
    pub status: PlanStatus,
    pub contracts: Vec<ContractSpec>,
}

impl PlanDocument {
    /// Parse and validate a JSON string
    pub fn from_json_str(s: &str) -> Result<Self, PlanError> {
        debug!(len = s.len(), "PlanDocument::from_json_str: called");
        let value: Value = serde_json::from_str(s).map_err(|e| PlanError::Malformed(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Validate an already-parsed JSON value
    pub fn from_value(value: &Value) -> Result<Self, PlanError> {
        validate::document(value)
    }

    /// Pretty JSON with stable field order
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Same document with a different status
    pub fn with_status(mut self, status: PlanStatus) -> Self {
        self.status = status;
        self
    }

    /// Check the extra requirements a plan must meet before it can be `ready`
    pub fn check_ready(&self) -> Result<(), PlanError> {
        validate::readiness(self)
    }

    /// Human-readable overview used in tool replies and the CLI
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Project: {}\nStatus: {}\nContracts:",
            self.project_name, self.status
        );
        for contract in &self.contracts {
            out.push_str(&format!(
                "\n  - {} ({}): {} function(s)",
                contract.name,
                contract.erc_template.as_deref().unwrap_or("custom"),
                contract.functions.len()
            ));
        }
        out
    }
}
