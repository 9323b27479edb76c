//! Special values reachable with the `!` prefix, e.g. `!pi` or `!null`.

/// What a special name evaluates to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    Number(f64),
    Null,
}

#[derive(Debug, Clone)]
pub struct Constant {
    pub name: &'static str,
    pub value: ConstValue,
    pub description: &'static str,
}

/// Every special value. Names are case-sensitive.
pub static CONSTANTS: &[Constant] = &[
    Constant {
        name: "pi",
        value: ConstValue::Number(std::f64::consts::PI),
        description: "Ratio of a circle's circumference to its diameter",
    },
    Constant {
        name: "e",
        value: ConstValue::Number(std::f64::consts::E),
        description: "Euler's number, base of the natural logarithm",
    },
    Constant {
        name: "tau",
        value: ConstValue::Number(std::f64::consts::TAU),
        description: "Circumference of the unit circle (2 * pi)",
    },
    Constant {
        name: "phi",
        value: ConstValue::Number(1.618_033_988_749_895),
        description: "The golden ratio",
    },
    Constant {
        name: "inf",
        value: ConstValue::Number(f64::INFINITY),
        description: "Positive infinity",
    },
    Constant {
        name: "nan",
        value: ConstValue::Number(f64::NAN),
        description: "Not a number",
    },
    Constant {
        name: "null",
        value: ConstValue::Null,
        description: "The null value; rejected by arithmetic",
    },
];

pub fn get(name: &str) -> Option<&'static Constant> {
    CONSTANTS.iter().find(|c| c.name == name)
}

pub fn contains(name: &str) -> bool {
    get(name).is_some()
}

pub fn describe(name: &str) -> Option<&'static str> {
    get(name).map(|c| c.description)
}
