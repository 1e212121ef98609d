//! Structural and readiness validation for plan documents
//!
//! Walks the raw JSON value and stops at the first offending field, reporting
//! its path (`contracts[0].functions[1].inputs[0].type`).

use serde_json::{Map, Value};
use tracing::debug;

use super::{ConstructorSpec, ContractSpec, FunctionSpec, OutputSpec, ParamSpec, PlanDocument, PlanError, PlanStatus};

type Object = Map<String, Value>;

/// Build a PlanDocument from a JSON value, or report the first schema violation
pub(crate) fn document(value: &Value) -> Result<PlanDocument, PlanError> {
    debug!("validate::document: called");
    let obj = object(value, "$")?;

    let project_name = string(obj, "project_name", "")?;
    let description = string(obj, "description", "")?;
    let status = match obj.get("status") {
        None | Some(Value::Null) => PlanStatus::default(),
        Some(Value::String(s)) => s.parse()?,
        Some(other) => return Err(wrong_type("status", "a string", other)),
    };

    let contracts = list(obj, "contracts", "")?
        .iter()
        .enumerate()
        .map(|(i, v)| contract(v, &format!("contracts[{}]", i)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PlanDocument {
        project_name,
        description,
        status,
        contracts,
    })
}

/// Requirements on top of the schema for a plan that may be marked ready
pub(crate) fn readiness(doc: &PlanDocument) -> Result<(), PlanError> {
    debug!(project = %doc.project_name, "validate::readiness: called");
    if doc.contracts.is_empty() {
        return Err(PlanError::NotReady {
            path: "contracts".to_string(),
            message: "at least one contract is required".to_string(),
        });
    }

    for (i, contract) in doc.contracts.iter().enumerate() {
        if contract.functions.is_empty() {
            return Err(PlanError::NotReady {
                path: format!("contracts[{}].functions", i),
                message: format!("contract '{}' needs at least one function", contract.name),
            });
        }
    }

    Ok(())
}

fn contract(value: &Value, path: &str) -> Result<ContractSpec, PlanError> {
    let obj = object(value, path)?;

    // Checked in document order
    let name = string(obj, "name", path)?;
    let description = string(obj, "description", path)?;
    // A missing key reads as null
    let erc_template = optional_string(obj, "erc_template", path)?;
    let dependencies = string_list(obj, "dependencies", path)?;

    let ctor_path = join(path, "constructor");
    let ctor = object(required(obj, "constructor", path)?, &ctor_path)?;
    let constructor = ConstructorSpec {
        description: string(ctor, "description", &ctor_path)?,
        inputs: params(ctor, "inputs", &ctor_path)?,
    };

    let functions = list(obj, "functions", path)?
        .iter()
        .enumerate()
        .map(|(i, v)| function(v, &format!("{}.functions[{}]", path, i)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ContractSpec {
        name,
        description,
        erc_template,
        dependencies,
        constructor,
        functions,
    })
}

fn function(value: &Value, path: &str) -> Result<FunctionSpec, PlanError> {
    let obj = object(value, path)?;

    let name = string(obj, "name", path)?;
    let description = string(obj, "description", path)?;
    let inputs = params(obj, "inputs", path)?;

    let outputs = list(obj, "outputs", path)?
        .iter()
        .enumerate()
        .map(|(i, v)| -> Result<OutputSpec, PlanError> {
            let out_path = format!("{}.outputs[{}]", path, i);
            let out = object(v, &out_path)?;
            Ok(OutputSpec {
                ty: string(out, "type", &out_path)?,
                description: string(out, "description", &out_path)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FunctionSpec {
        name,
        description,
        inputs,
        outputs,
        conditions: string_list(obj, "conditions", path)?,
    })
}

fn params(obj: &Object, key: &str, path: &str) -> Result<Vec<ParamSpec>, PlanError> {
    let list_path = join(path, key);
    list(obj, key, path)?
        .iter()
        .enumerate()
        .map(|(i, v)| -> Result<ParamSpec, PlanError> {
            let param_path = format!("{}[{}]", list_path, i);
            let param = object(v, &param_path)?;
            Ok(ParamSpec {
                name: string(param, "name", &param_path)?,
                ty: string(param, "type", &param_path)?,
                description: string(param, "description", &param_path)?,
            })
        })
        .collect()
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn wrong_type(path: &str, expected: &str, found: &Value) -> PlanError {
    PlanError::Schema {
        path: path.to_string(),
        message: format!("expected {}, found {}", expected, kind(found)),
    }
}

fn object<'a>(value: &'a Value, path: &str) -> Result<&'a Object, PlanError> {
    value.as_object().ok_or_else(|| wrong_type(path, "an object", value))
}

fn required<'a>(obj: &'a Object, key: &str, path: &str) -> Result<&'a Value, PlanError> {
    obj.get(key).ok_or_else(|| PlanError::Schema {
        path: join(path, key),
        message: "missing required field".to_string(),
    })
}

fn string(obj: &Object, key: &str, path: &str) -> Result<String, PlanError> {
    match required(obj, key, path)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(wrong_type(&join(path, key), "a string", other)),
    }
}

fn optional_string(obj: &Object, key: &str, path: &str) -> Result<Option<String>, PlanError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(wrong_type(&join(path, key), "a string or null", other)),
    }
}

fn list<'a>(obj: &'a Object, key: &str, path: &str) -> Result<&'a Vec<Value>, PlanError> {
    match required(obj, key, path)? {
        Value::Array(items) => Ok(items),
        other => Err(wrong_type(&join(path, key), "a list", other)),
    }
}

fn string_list(obj: &Object, key: &str, path: &str) -> Result<Vec<String>, PlanError> {
    let list_path = join(path, key);
    list(obj, key, path)?
        .iter()
        .enumerate()
        .map(|(i, v)| match v {
            Value::String(s) => Ok(s.clone()),
            other => Err(wrong_type(&format!("{}[{}]", list_path, i), "a string", other)),
        })
        .collect()
}
