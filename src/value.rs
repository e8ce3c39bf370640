//! JavaScript value representation
//!
//! `Value` is the engine-facing value type. Strings are reference counted
//! and objects are [`Object`] handles, so cloning a value is always cheap.
//! Only the capabilities the object layer consumes live here: equality,
//! string and number conversion of primitives, and export to host data.

use std::fmt;
use std::rc::Rc;

use crate::error::JsResult;
use crate::runtime::Object;

/// Native function signature
///
/// Native functions take the `this` value and the arguments.
pub type Function = Rc<dyn Fn(&Value, &[Value]) -> JsResult<Value>>;

/// High-level JavaScript value type
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Object(Object),
}

impl Value {
    /// Create an undefined value
    #[inline]
    pub const fn undefined() -> Self {
        Value::Undefined
    }

    /// Create a null value
    #[inline]
    pub const fn null() -> Self {
        Value::Null
    }

    /// Create a boolean value
    #[inline]
    pub const fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    /// Create a number value from an integer
    #[inline]
    pub fn int(val: i64) -> Self {
        Value::Number(val as f64)
    }

    /// Create a number value
    #[inline]
    pub const fn number(val: f64) -> Self {
        Value::Number(val)
    }

    /// Create a string value
    pub fn string(s: &str) -> Self {
        Value::String(Rc::from(s))
    }

    /// Check if this is undefined
    #[inline]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if this is null
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this is nullish (null or undefined)
    #[inline]
    pub const fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Check if this is an object
    #[inline]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Get the object handle, if this is an object
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Get the number, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// ToNumber for primitives
    ///
    /// Objects must be converted with [`Object::to_primitive`] first; an
    /// unconverted object yields NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Object(_) => f64::NAN,
        }
    }

    /// Property name for this value when used as a key
    pub fn to_property_name(&self) -> Rc<str> {
        match self {
            Value::String(s) => s.clone(),
            other => Rc::from(other.to_string()),
        }
    }

    /// SameValue comparison (NaN equals NaN, +0 differs from -0)
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b && a.is_sign_negative() == b.is_sign_negative()
                }
            }
            _ => self == other,
        }
    }

    /// Convert to a host value
    pub fn export(&self) -> JsResult<Exported> {
        Ok(match self {
            Value::Undefined => Exported::Undefined,
            Value::Null => Exported::Null,
            Value::Bool(b) => Exported::Bool(*b),
            Value::Number(n) => Exported::Number(*n),
            Value::String(s) => Exported::String(s.to_string()),
            Value::Object(o) => o.export()?,
        })
    }
}

/// Format a number the way property names and string conversion expect
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        // Covers -0
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        // Exponent form, with an explicit sign on positive exponents
        let s = format!("{:e}", n);
        match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => s,
        }
    } else {
        format!("{}", n)
    }
}

fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts these spellings, JavaScript does not
        "inf" | "+inf" | "-inf" | "infinity" | "NaN" | "nan" => f64::NAN,
        _ => s.parse::<f64>().unwrap_or(f64::NAN),
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Number(n) => write!(f, "Number({})", number_to_string(*n)),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Object(o) => write!(f, "{:?}", o),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", number_to_string(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Object(o) => {
                let class = o.class_name().unwrap_or("Object");
                write!(f, "[object {}]", class)
            }
        }
    }
}

/// Strict equality (`===`); objects compare by identity
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

/// A value converted for consumption by the host
///
/// Arrays export holes as `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum Exported {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Option<Exported>>),
    Map(Vec<(String, Exported)>),
    Function,
}

/// The host type an object exports to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportType {
    Array,
    Map,
    Function,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined() {
        let v = Value::undefined();
        assert!(v.is_undefined());
        assert!(v.is_nullish());
        assert!(!v.is_null());
        assert!(v.to_number().is_nan());
    }

    #[test]
    fn test_equality() {
        assert_eq!(Value::int(1), Value::number(1.0));
        assert_ne!(Value::number(f64::NAN), Value::number(f64::NAN));
        assert!(Value::number(f64::NAN).same_value(&Value::number(f64::NAN)));
        assert!(!Value::number(0.0).same_value(&Value::number(-0.0)));
        assert_eq!(Value::number(0.0), Value::number(-0.0));
        assert_ne!(Value::string("1"), Value::int(1));
    }

    #[test]
    fn test_to_number() {
        assert_eq!(Value::string(" 42 ").to_number(), 42.0);
        assert_eq!(Value::string("").to_number(), 0.0);
        assert!(Value::string("abc").to_number().is_nan());
        assert!(Value::string("inf").to_number().is_nan());
        assert_eq!(Value::string("-Infinity").to_number(), f64::NEG_INFINITY);
        assert_eq!(Value::bool(true).to_number(), 1.0);
        assert_eq!(Value::null().to_number(), 0.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::int(7).to_string(), "7");
        assert_eq!(Value::number(1.5).to_string(), "1.5");
        assert_eq!(Value::number(-0.0).to_string(), "0");
        assert_eq!(Value::number(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Value::null().to_string(), "null");
        assert_eq!(&*Value::bool(false).to_property_name(), "false");
    }

    #[test]
    fn test_exponent_form() {
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(-1.5e22), "-1.5e+22");
        assert_eq!(number_to_string(1e20), "100000000000000000000");
        assert_eq!(number_to_string(1.5e-7), "1.5e-7");
        assert_eq!(number_to_string(0.000001), "0.000001");
        assert_eq!(&*Value::number(1e21).to_property_name(), "1e+21");
    }

    #[test]
    fn test_export_primitives() {
        assert_eq!(Value::int(3).export().unwrap(), Exported::Number(3.0));
        assert_eq!(
            Value::string("a").export().unwrap(),
            Exported::String("a".into())
        );
        assert_eq!(Value::undefined().export().unwrap(), Exported::Undefined);
    }
}
