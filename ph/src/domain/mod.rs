//! Domain types for PartyHat
//!
//! The plan document the conversation builds, its validator, and the static
//! ERC reference catalog the planning tools consult.

mod error;
mod plan;
pub mod reference;
mod validate;

pub use error::PlanError;
pub use plan::{ConstructorSpec, ContractSpec, FunctionSpec, OutputSpec, ParamSpec, PlanDocument, PlanStatus};
pub use reference::{ErcStandard, lookup_standard, normalize_template_id};
