//! Function descriptors and the service dispatch table.
//!
//! Descriptors come from a JSON metadata document; the code behind each one
//! is a plain function pointer registered under `(service, function)`.

use std::{collections::HashMap, fmt};

use log::debug;

use crate::{config::Limits, services, value::Value};

/// Metadata for the built-in functions.
const BUILTIN_METADATA: &str = include_str!("functions.json");

/// Declared type of a function parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Int,
    Float,
    Matrix,
    Dynamic,
}

impl ParamType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "int" => Some(ParamType::Int),
            "float" => Some(ParamType::Float),
            "Matrix" => Some(ParamType::Matrix),
            "dynamic" => Some(ParamType::Dynamic),
            _ => None,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Matrix => "Matrix",
            ParamType::Dynamic => "dynamic",
        })
    }
}

/// Declared return type of a function; decides the kind of the result token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    Matrix,
    Matrices,
    Float,
    Int,
    Void,
    Null,
}

impl ReturnType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Matrix" => Some(ReturnType::Matrix),
            "Matrices" => Some(ReturnType::Matrices),
            "float" => Some(ReturnType::Float),
            "int" => Some(ReturnType::Int),
            "void" => Some(ReturnType::Void),
            "null" => Some(ReturnType::Null),
            _ => None,
        }
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReturnType::Matrix => "Matrix",
            ReturnType::Matrices => "Matrices",
            ReturnType::Float => "float",
            ReturnType::Int => "int",
            ReturnType::Void => "void",
            ReturnType::Null => "null",
        })
    }
}

/// A type-checked argument handed to a service.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Int(i64),
    Float(f64),
    Matrix(Value),
    Text(String),
    Null,
}

/// What a service hands back.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Value(Value),
    Values(Vec<Value>),
    Number(f64),
    Void,
    Null,
}

/// Signature of every service implementation. Errors are plain messages and
/// are shown to the user as they are.
pub type ServiceFn = fn(&[Arg], &Limits) -> Result<Output, String>;

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: ParamType,
    pub required: bool,
    pub default: Option<Arg>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDescriptor {
    pub name: String,
    pub aliases: Vec<String>,
    pub params: Vec<Param>,
    pub returns: ReturnType,
    pub service: String,
    pub description: String,
}

impl FunctionDescriptor {
    pub fn param_types(&self) -> Vec<ParamType> {
        self.params.iter().map(|p| p.ty).collect()
    }

    pub fn required_indices(&self) -> Vec<usize> {
        self.params
            .iter()
            .enumerate()
            .filter(|(_, p)| p.required)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    /// Usage line, e.g. `!Fill(rows: int, cols: int, value: float = 0) -> Matrix`.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| match &p.default {
                Some(d) => format!("{}: {} = {}", p.name, p.ty, describe_arg(d)),
                None if !p.required => format!("{}: {}?", p.name, p.ty),
                None => format!("{}: {}", p.name, p.ty),
            })
            .collect();
        format!("!{}({}) -> {}", self.name, params.join(", "), self.returns)
    }
}

fn describe_arg(arg: &Arg) -> String {
    match arg {
        Arg::Int(n) => n.to_string(),
        Arg::Float(n) => n.to_string(),
        Arg::Text(s) => format!("\"{}\"", s),
        Arg::Matrix(_) => "<matrix>".to_string(),
        Arg::Null => "null".to_string(),
    }
}

/// Errors in function metadata.
#[derive(Debug)]
pub enum RegistryError {
    Json(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Json(e) => write!(f, "Invalid function metadata: {}", e),
            RegistryError::Invalid(msg) => write!(f, "Invalid function metadata: {}", msg),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Json(e) => Some(e),
            RegistryError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(e: serde_json::Error) -> Self {
        RegistryError::Json(e)
    }
}

/// Function lookup by name or alias, plus the handler for each function.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: Vec<FunctionDescriptor>,
    /// Names and aliases -> index into `functions`
    index: HashMap<String, usize>,
    handlers: HashMap<(String, String), ServiceFn>,
}

impl FunctionRegistry {
    /// The built-in functions with their handlers.
    pub fn builtin() -> Result<Self, RegistryError> {
        let mut registry = FunctionRegistry::from_json(BUILTIN_METADATA)?;
        for (service, name, handler) in services::BUILTIN_SERVICES {
            registry.register_handler(service, name, *handler);
        }
        Ok(registry)
    }

    /// Loads descriptors from a metadata document of the form
    /// `{"functions": [{"name", "service", "returns", "params": [...]}, ...]}`.
    pub fn from_json(source: &str) -> Result<Self, RegistryError> {
        let doc: serde_json::Value = serde_json::from_str(source)?;
        let entries = doc
            .get("functions")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| RegistryError::Invalid("missing 'functions' array".into()))?;

        let mut registry = FunctionRegistry::default();
        for entry in entries {
            registry.add(parse_descriptor(entry)?)?;
        }
        debug!("loaded {} function descriptors", registry.functions.len());
        Ok(registry)
    }

    /// Adds a descriptor; its name and aliases must not already be taken.
    pub fn add(&mut self, descriptor: FunctionDescriptor) -> Result<(), RegistryError> {
        let position = self.functions.len();
        for key in std::iter::once(&descriptor.name).chain(&descriptor.aliases) {
            if self.index.contains_key(key) {
                return Err(RegistryError::Invalid(format!(
                    "function name '{}' is defined twice",
                    key
                )));
            }
        }
        for key in std::iter::once(&descriptor.name).chain(&descriptor.aliases) {
            self.index.insert(key.clone(), position);
        }
        self.functions.push(descriptor);
        Ok(())
    }

    pub fn register_handler(&mut self, service: &str, function: &str, handler: ServiceFn) {
        self.handlers
            .insert((service.to_string(), function.to_string()), handler);
    }

    /// Exact, case-sensitive lookup. Returns a copy the caller may modify.
    pub fn find(&self, name: &str) -> Option<FunctionDescriptor> {
        self.index
            .get(name)
            .and_then(|&i| self.functions.get(i))
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn handler(&self, service: &str, function: &str) -> Option<ServiceFn> {
        self.handlers
            .get(&(service.to_string(), function.to_string()))
            .copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionDescriptor> {
        self.functions.iter()
    }
}

fn field<'a>(entry: &'a serde_json::Value, key: &str, owner: &str) -> Result<&'a str, RegistryError> {
    entry
        .get(key)
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| RegistryError::Invalid(format!("{} is missing string field '{}'", owner, key)))
}

fn parse_descriptor(entry: &serde_json::Value) -> Result<FunctionDescriptor, RegistryError> {
    let name = field(entry, "name", "function")?.to_string();
    let service = field(entry, "service", &name)?.to_string();
    let returns_str = field(entry, "returns", &name)?;
    let returns = ReturnType::parse(returns_str).ok_or_else(|| {
        RegistryError::Invalid(format!("{} has unknown return type '{}'", name, returns_str))
    })?;
    let description = entry
        .get("description")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();

    let aliases = match entry.get("aliases") {
        None => Vec::new(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .map(|a| {
                a.as_str().map(str::to_string).ok_or_else(|| {
                    RegistryError::Invalid(format!("{} has a non-string alias", name))
                })
            })
            .collect::<Result<_, _>>()?,
        Some(_) => {
            return Err(RegistryError::Invalid(format!("{}: 'aliases' must be an array", name)));
        }
    };

    let mut params = Vec::new();
    if let Some(list) = entry.get("params") {
        let list = list
            .as_array()
            .ok_or_else(|| RegistryError::Invalid(format!("{}: 'params' must be an array", name)))?;
        for p in list {
            params.push(parse_param(p, &name)?);
        }
    }

    // Hints may reorder arguments freely, positional binding relies on this.
    if let Some(pos) = params.iter().position(|p| !p.required)
        && let Some(late) = params[pos..].iter().find(|p| p.required)
    {
        return Err(RegistryError::Invalid(format!(
            "{}: required parameter '{}' follows an optional one",
            name, late.name
        )));
    }

    Ok(FunctionDescriptor {
        name,
        aliases,
        params,
        returns,
        service,
        description,
    })
}

fn parse_param(p: &serde_json::Value, function: &str) -> Result<Param, RegistryError> {
    let owner = format!("parameter of {}", function);
    let name = field(p, "name", &owner)?.to_string();
    let ty_str = field(p, "type", &owner)?;
    let ty = ParamType::parse(ty_str).ok_or_else(|| {
        RegistryError::Invalid(format!("{}.{} has unknown type '{}'", function, name, ty_str))
    })?;
    let default = match p.get("default") {
        None => None,
        Some(d) => Some(default_arg(d, ty).ok_or_else(|| {
            RegistryError::Invalid(format!("{}.{} has a default that isn't a {}", function, name, ty))
        })?),
    };
    let required = p
        .get("required")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(default.is_none());

    Ok(Param {
        name,
        ty,
        required,
        default,
    })
}

fn default_arg(value: &serde_json::Value, ty: ParamType) -> Option<Arg> {
    match (value, ty) {
        (serde_json::Value::Null, _) => Some(Arg::Null),
        (serde_json::Value::Number(n), ParamType::Int) => n.as_i64().map(Arg::Int),
        (serde_json::Value::Number(n), ParamType::Float | ParamType::Dynamic) => {
            n.as_f64().map(Arg::Float)
        }
        (serde_json::Value::String(s), ParamType::Dynamic) => Some(Arg::Text(s.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_metadata_loads() {
        let registry = FunctionRegistry::builtin().unwrap();
        let fill = registry.find("Fill").unwrap();
        assert_eq!(fill.param_types(), vec![ParamType::Int, ParamType::Int, ParamType::Float]);
        assert_eq!(fill.required_indices(), vec![0, 1]);
        assert_eq!(fill.params[2].default, Some(Arg::Float(0.0)));
    }

    #[test]
    fn test_every_builtin_has_a_handler() {
        let registry = FunctionRegistry::builtin().unwrap();
        for f in registry.iter().filter(|f| f.service != "session") {
            assert!(
                registry.handler(&f.service, &f.name).is_some(),
                "no handler for {}.{}",
                f.service,
                f.name
            );
        }
    }

    #[test]
    fn test_aliases_and_case_sensitivity() {
        let registry = FunctionRegistry::builtin().unwrap();
        assert_eq!(registry.find("Det").unwrap().name, "Determinant");
        assert!(registry.find("determinant").is_none());
    }

    #[test]
    fn test_required_after_optional_is_rejected() {
        let json = r#"{"functions": [{"name": "G", "service": "s", "returns": "float",
            "params": [{"name": "a", "type": "int", "default": 1},
                       {"name": "b", "type": "int"}]}]}"#;
        assert!(matches!(
            FunctionRegistry::from_json(json),
            Err(RegistryError::Invalid(_))
        ));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let json = r#"{"functions": [
            {"name": "G", "service": "s", "returns": "void"},
            {"name": "H", "aliases": ["G"], "service": "s", "returns": "void"}]}"#;
        assert!(FunctionRegistry::from_json(json).is_err());
    }
}
