/*  This file is part of OneModel, a program to manage knowledge.
    Copyright in each year of 2025-2026 inclusive, Luke A. Call.
    OneModel is free software, distributed under a license that includes honesty, the Golden Rule,
    and the GNU Affero General Public License as published by the Free Software Foundation;
    see the file LICENSE for license version and details.
    OneModel is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
    You should have received a copy of the GNU Affero General Public License along with OneModel.  If not, see <http://www.gnu.org/licenses/>
*/
use crate::error::{CoreError, CoreResult};
use crate::model::numeric_type::NumericType;
use crate::util::Util;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;
use tracing::*;

pub type Timestamp = DateTime<Utc>;

/// One non-null attribute value. Null is always expressed as Option::None around a Value.
#[derive(Debug, Clone)]
pub enum Value {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    BigDecimal(BigDecimal),
    String(String),
    Timestamp(Timestamp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    BigDecimal,
    String,
    Timestamp,
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Boolean(_) => ValueType::Boolean,
            Value::Byte(_) => ValueType::Byte,
            Value::Short(_) => ValueType::Short,
            Value::Integer(_) => ValueType::Integer,
            Value::Long(_) => ValueType::Long,
            Value::Float(_) => ValueType::Float,
            Value::Double(_) => ValueType::Double,
            Value::BigDecimal(_) => ValueType::BigDecimal,
            Value::String(_) => ValueType::String,
            Value::Timestamp(_) => ValueType::Timestamp,
        }
    }

    /// A hash that is stable across processes and releases (unlike Hash), for indexes that are
    /// built in one place and probed in another.
    pub fn hash_code(&self) -> i32 {
        match self {
            Value::Boolean(b) => {
                if *b {
                    1231
                } else {
                    1237
                }
            }
            Value::Byte(v) => *v as i32,
            Value::Short(v) => *v as i32,
            Value::Integer(v) => *v,
            Value::Long(v) => Util::long_hash_code(*v),
            Value::Float(v) => v.to_bits() as i32,
            Value::Double(v) => Util::long_hash_code(v.to_bits() as i64),
            Value::BigDecimal(d) => Util::string_hash_code(&d.normalized().to_string()),
            Value::String(s) => Util::string_hash_code(s),
            Value::Timestamp(t) => Util::long_hash_code(t.timestamp_millis()),
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integral kinds widened to i64; None for anything else.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(*v as i64),
            Value::Short(v) => Some(*v as i64),
            Value::Integer(v) => Some(*v as i64),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            Value::BigDecimal(d) => d.to_string().parse::<f64>().ok(),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_big_decimal(&self) -> Option<BigDecimal> {
        match self {
            Value::BigDecimal(d) => Some(d.clone()),
            Value::Float(_) | Value::Double(_) => self
                .as_f64()
                .and_then(|f| BigDecimal::from_str(&f.to_string()).ok()),
            _ => self.as_i64().map(BigDecimal::from),
        }
    }

    /// The value re-expressed as the given type, if that can be done without losing anything
    /// (numeric widening, or the type it already has).
    pub fn coerce_to(&self, target: ValueType) -> Option<Value> {
        if self.value_type() == target {
            return Some(self.clone());
        }
        let (from, to) = (self.value_type().numeric_type()?, target.numeric_type()?);
        if !from.can_widen_to(to) {
            return None;
        }
        to.convert(self)
    }

    fn variant_index(&self) -> u8 {
        self.value_type() as u8
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Values of different variants order by variant (so a BTreeSet of mixed values is still well
/// defined); floats order by total_cmp, so NaN and -0.0 each have one place.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Byte(a), Value::Byte(b)) => a.cmp(b),
            (Value::Short(a), Value::Short(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Long(a), Value::Long(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Double(a), Value::Double(b)) => a.total_cmp(b),
            (Value::BigDecimal(a), Value::BigDecimal(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            _ => self.variant_index().cmp(&other.variant_index()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.variant_index().hash(state);
        match self {
            Value::Boolean(v) => v.hash(state),
            Value::Byte(v) => v.hash(state),
            Value::Short(v) => v.hash(state),
            Value::Integer(v) => v.hash(state),
            Value::Long(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Double(v) => v.to_bits().hash(state),
            // (normalized so that 1.0 and 1.00, which compare equal, also hash equal)
            Value::BigDecimal(v) => v.normalized().to_string().hash(state),
            Value::String(v) => v.hash(state),
            Value::Timestamp(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::BigDecimal(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "\"{}\"", v),
            Value::Timestamp(v) => write!(f, "{}", Util::useful_date_format(v.timestamp_millis())),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}
impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Byte(v)
    }
}
impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Short(v)
    }
}
impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}
impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}
impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}
impl From<BigDecimal> for Value {
    fn from(v: BigDecimal) -> Self {
        Value::BigDecimal(v)
    }
}
impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}
impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}
impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Self {
        Value::Timestamp(v)
    }
}

impl ValueType {
    pub fn numeric_type(&self) -> Option<NumericType> {
        match self {
            ValueType::Byte => Some(NumericType::Byte),
            ValueType::Short => Some(NumericType::Short),
            ValueType::Integer => Some(NumericType::Integer),
            ValueType::Long => Some(NumericType::Long),
            ValueType::Float => Some(NumericType::Float),
            ValueType::Double => Some(NumericType::Double),
            ValueType::BigDecimal => Some(NumericType::BigDecimal),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric_type().is_some()
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Boolean => "boolean",
            ValueType::Byte => "byte",
            ValueType::Short => "short",
            ValueType::Integer => "int",
            ValueType::Long => "long",
            ValueType::Float => "float",
            ValueType::Double => "double",
            ValueType::BigDecimal => "BigDecimal",
            ValueType::String => "String",
            ValueType::Timestamp => "Timestamp",
        }
    }

    /// Reads a literal of this type from text, as found in a data file on the given line.
    pub fn parse_literal(&self, text: &str, line: usize) -> CoreResult<Value> {
        let t = text.trim();
        let bad = |message: String| CoreError::invalid_literal(line, text, message);
        let parsed = match self {
            ValueType::Boolean => match t {
                "true" => Value::Boolean(true),
                "false" => Value::Boolean(false),
                _ => return Err(bad("expected true or false".to_string())),
            },
            ValueType::Byte => Value::Byte(t.parse::<i8>().map_err(|e| bad(format!("not a byte: {}", e)))?),
            ValueType::Short => Value::Short(t.parse::<i16>().map_err(|e| bad(format!("not a short: {}", e)))?),
            ValueType::Integer => Value::Integer(t.parse::<i32>().map_err(|e| bad(format!("not an int: {}", e)))?),
            ValueType::Long => Value::Long(t.parse::<i64>().map_err(|e| bad(format!("not a long: {}", e)))?),
            ValueType::Float => Value::Float(t.parse::<f32>().map_err(|e| bad(format!("not a float: {}", e)))?),
            ValueType::Double => Value::Double(t.parse::<f64>().map_err(|e| bad(format!("not a double: {}", e)))?),
            ValueType::BigDecimal => {
                Value::BigDecimal(BigDecimal::from_str(t).map_err(|e| bad(format!("not a decimal: {}", e)))?)
            }
            ValueType::String => Value::String(text.to_string()),
            ValueType::Timestamp => {
                Value::Timestamp(Util::parse_timestamp(t).ok_or_else(|| bad("not a recognized date/time".to_string()))?)
            }
        };
        Ok(parsed)
    }

    /// A number read from a data file, narrowed to this type. Integral types reject fractions
    /// and anything outside their range.
    pub fn value_from_number(&self, number: f64, line: usize) -> CoreResult<Value> {
        let out_of_range = || {
            CoreError::invalid_literal(
                line,
                number.to_string(),
                format!("incorrect {} value", self.name()),
            )
        };
        // the upper bound is exclusive: i64::MAX as f64 rounds up to 2^63
        let integral = |min: f64, below: f64| -> CoreResult<f64> {
            if number.is_finite() && number >= min && number < below && number.floor() == number {
                Ok(number)
            } else {
                Err(out_of_range())
            }
        };
        match self {
            ValueType::Byte => Ok(Value::Byte(integral(i8::MIN as f64, i8::MAX as f64 + 1.0)? as i8)),
            ValueType::Short => Ok(Value::Short(integral(i16::MIN as f64, i16::MAX as f64 + 1.0)? as i16)),
            ValueType::Integer => Ok(Value::Integer(integral(i32::MIN as f64, i32::MAX as f64 + 1.0)? as i32)),
            ValueType::Long => Ok(Value::Long(integral(i64::MIN as f64, 9_223_372_036_854_775_808.0)? as i64)),
            ValueType::Float => {
                if number.is_finite() && number.abs() > f32::MAX as f64 {
                    Err(out_of_range())
                } else {
                    Ok(Value::Float(number as f32))
                }
            }
            ValueType::Double => Ok(Value::Double(number)),
            ValueType::BigDecimal => BigDecimal::from_str(&number.to_string())
                .map(Value::BigDecimal)
                .map_err(|_| out_of_range()),
            _ => Err(CoreError::invalid_literal(
                line,
                number.to_string(),
                format!("did not expect a number for a {} attribute", self.name()),
            )),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Anything an attribute can read a value from: a business object, or the data object behind it.
pub trait DataObject: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Reads and writes one field of an owner. The compile-time replacement for generated
/// per-column extractor classes: each attribute is given one of these at registration.
pub trait ValueAccessor: Send + Sync {
    fn get(&self, owner: &dyn DataObject) -> Option<Value>;
    fn set(&self, owner: &mut dyn DataObject, value: Option<Value>) -> CoreResult<()>;
}

/// A ValueAccessor made from two plain functions on the concrete owner type.
pub struct FieldAccessor<T: DataObject> {
    getter: fn(&T) -> Option<Value>,
    setter: Option<fn(&mut T, Option<Value>)>,
    _owner: PhantomData<fn(&T)>,
}

impl<T: DataObject> FieldAccessor<T> {
    pub fn new(getter: fn(&T) -> Option<Value>, setter: fn(&mut T, Option<Value>)) -> FieldAccessor<T> {
        FieldAccessor {
            getter,
            setter: Some(setter),
            _owner: PhantomData,
        }
    }

    pub fn read_only(getter: fn(&T) -> Option<Value>) -> FieldAccessor<T> {
        FieldAccessor {
            getter,
            setter: None,
            _owner: PhantomData,
        }
    }
}

impl<T: DataObject> ValueAccessor for FieldAccessor<T> {
    fn get(&self, owner: &dyn DataObject) -> Option<Value> {
        match owner.as_any().downcast_ref::<T>() {
            Some(o) => (self.getter)(o),
            None => {
                warn!("accessor for {} given a {:?}", std::any::type_name::<T>(), owner);
                None
            }
        }
    }

    fn set(&self, owner: &mut dyn DataObject, value: Option<Value>) -> CoreResult<()> {
        let setter = self.setter.ok_or_else(|| {
            CoreError::unsupported(format!("field of {} is read-only", std::any::type_name::<T>()))
        })?;
        match owner.as_any_mut().downcast_mut::<T>() {
            Some(o) => {
                setter(o, value);
                Ok(())
            }
            None => Err(CoreError::invalid_input(format!(
                "expected an owner of type {}",
                std::any::type_name::<T>()
            ))),
        }
    }
}
