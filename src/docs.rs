//! Help text for `?` queries and `!Help()`.

use crate::{
    constants::{self, ConstValue, Constant},
    registry::{FunctionDescriptor, FunctionRegistry},
    store::{self, BindingStore},
    value::{Grid, Value},
};

/// What a `?name` query refers to.
#[derive(Debug, Clone)]
pub enum DocTarget<'a> {
    Function(FunctionDescriptor),
    Constant(&'static Constant),
    /// A valid matrix name, bound or not
    Matrix {
        name: String,
        value: Option<&'a Value>,
    },
    Nothing(String),
}

/// Functions win over constants, constants over matrix names.
pub fn resolve<'a>(name: &str, registry: &FunctionRegistry, store: &'a BindingStore) -> DocTarget<'a> {
    if let Some(f) = registry.find(name) {
        DocTarget::Function(f)
    } else if let Some(c) = constants::get(name) {
        DocTarget::Constant(c)
    } else if store::is_identifier(name) {
        DocTarget::Matrix {
            name: name.to_string(),
            value: store.get(name),
        }
    } else {
        DocTarget::Nothing(name.to_string())
    }
}

pub fn render(target: &DocTarget<'_>) -> String {
    match target {
        DocTarget::Function(f) => render_function(f),
        DocTarget::Constant(c) => match c.value {
            ConstValue::Number(n) => format!("!{} = {}\n  {}", c.name, n, c.description),
            ConstValue::Null => format!("!{}\n  {}", c.name, c.description),
        },
        DocTarget::Matrix { name, value: Some(v) } => {
            let (rows, cols) = v.shape();
            format!("{}: {} with {} rows and {} columns", name, v.type_name(), rows, cols)
        }
        DocTarget::Matrix { name, value: None } => {
            format!("{}: no matrix with this name yet; create one with {} = ...", name, name)
        }
        DocTarget::Nothing(name) => format!("Nothing found for '{}'", name),
    }
}

pub fn render_function(f: &FunctionDescriptor) -> String {
    let mut out = f.signature();
    if !f.aliases.is_empty() {
        out.push_str(&format!("\n  aliases: {}", f.aliases.join(", ")));
    }
    if !f.description.is_empty() {
        out.push_str(&format!("\n  {}", f.description));
    }
    out
}

/// Every function and special value, grouped by service.
pub fn overview(registry: &FunctionRegistry) -> String {
    let mut functions: Vec<&FunctionDescriptor> = registry.iter().collect();
    functions.sort_by(|a, b| (&a.service, &a.name).cmp(&(&b.service, &b.name)));

    let mut out = String::from("FUNCTIONS\n");
    let mut service = "";
    for f in functions {
        if f.service != service {
            service = &f.service;
            out.push_str(&format!("\n  [{}]\n", service));
        }
        out.push_str(&format!("  {}\n", f.signature()));
    }

    out.push_str("\nSPECIAL VALUES\n\n");
    for c in constants::CONSTANTS {
        out.push_str(&format!("  !{:<6} {}\n", c.name, c.description));
    }
    out.push_str("\nUse ?Name for details on a single function, value or matrix.\n");
    out
}
