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
use crate::model::value::{Value, ValueType};
use crate::util::Util;
use bigdecimal::{BigDecimal, RoundingMode};
use std::fmt;
use tracing::*;

/// The numeric kinds arithmetic can be done on. Each has a bitmap; AND-ing two bitmaps gives the
/// bitmap of the type their arithmetic is done in (see calculated_type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericType {
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    BigDecimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOperator {
    Plus,
    Minus,
    Times,
    DividedBy,
}

struct NumericTypeInfo {
    bitmap: u8,
    name: &'static str,
    value_type: ValueType,
    // what a column of this type can hold, as (precision, scale), for quotient scale purposes:
    implicit_precision: i64,
    implicit_scale: i64,
}

// indexed by `NumericType as usize`
const NUMERIC_TYPES: [NumericTypeInfo; 7] = [
    NumericTypeInfo {
        bitmap: 63,
        name: "byte",
        value_type: ValueType::Byte,
        implicit_precision: 3,
        implicit_scale: 0,
    },
    NumericTypeInfo {
        bitmap: 31,
        name: "short",
        value_type: ValueType::Short,
        implicit_precision: 5,
        implicit_scale: 0,
    },
    NumericTypeInfo {
        bitmap: 15,
        name: "int",
        value_type: ValueType::Integer,
        implicit_precision: 10,
        implicit_scale: 0,
    },
    NumericTypeInfo {
        bitmap: 7,
        name: "long",
        value_type: ValueType::Long,
        implicit_precision: 19,
        implicit_scale: 0,
    },
    NumericTypeInfo {
        bitmap: 3,
        name: "float",
        value_type: ValueType::Float,
        implicit_precision: Util::MAX_DECIMAL_PRECISION,
        implicit_scale: Util::MIN_QUOTIENT_SCALE,
    },
    NumericTypeInfo {
        bitmap: 1,
        name: "double",
        value_type: ValueType::Double,
        implicit_precision: Util::MAX_DECIMAL_PRECISION,
        implicit_scale: Util::MIN_QUOTIENT_SCALE,
    },
    NumericTypeInfo {
        bitmap: 0,
        name: "BigDecimal",
        value_type: ValueType::BigDecimal,
        implicit_precision: Util::MAX_DECIMAL_PRECISION,
        implicit_scale: Util::MIN_QUOTIENT_SCALE,
    },
];

impl NumericType {
    fn info(self) -> &'static NumericTypeInfo {
        &NUMERIC_TYPES[self as usize]
    }

    pub fn bitmap(self) -> u8 {
        self.info().bitmap
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn value_type(self) -> ValueType {
        self.info().value_type
    }

    /// (precision, scale) assumed for an operand of this type that has no declared ones.
    pub fn implicit_precision_and_scale(self) -> (i64, i64) {
        (self.info().implicit_precision, self.info().implicit_scale)
    }

    pub fn from_bitmap(bitmap: u8) -> CoreResult<NumericType> {
        match bitmap {
            0 => Ok(NumericType::BigDecimal),
            1 => Ok(NumericType::Double),
            3 => Ok(NumericType::Float),
            7 => Ok(NumericType::Long),
            15 | 31 | 63 => Ok(NumericType::Integer),
            other => Err(CoreError::invalid_type_combination(format!(
                "no arithmetic type for bitmap {}",
                other
            ))),
        }
    }

    /// The type arithmetic between the two is done in: int op double is double, long op long is
    /// long, and anything with a BigDecimal is BigDecimal. Symmetric.
    pub fn calculated_type(self, other: NumericType) -> CoreResult<NumericType> {
        NumericType::from_bitmap(self.bitmap() & other.bitmap())
    }

    pub fn can_widen_to(self, target: NumericType) -> bool {
        self <= target
    }

    /// Bytes and shorts have no absolute value.
    pub fn supports_absolute_value(self) -> bool {
        !matches!(self, NumericType::Short | NumericType::Byte)
    }

    /// Scale of a BigDecimal quotient, from the precision and scale of the dividend (1) and
    /// divisor (2). Keeps at least MIN_QUOTIENT_SCALE digits, and gives up scale (never below that
    /// minimum) when the result would need more than MAX_DECIMAL_PRECISION digits.
    pub fn calculate_quotient_scale(precision1: i64, scale1: i64, precision2: i64, scale2: i64) -> i64 {
        let mut scale = std::cmp::max(Util::MIN_QUOTIENT_SCALE, scale1 + precision2 + 1);
        let precision = precision1 - scale1 + scale2 + scale;
        if precision > Util::MAX_DECIMAL_PRECISION {
            scale = std::cmp::max(Util::MIN_QUOTIENT_SCALE, scale - (precision - Util::MAX_DECIMAL_PRECISION));
        }
        scale
    }

    /// The value as this type, or None if it isn't numeric or doesn't fit.
    pub fn convert(self, value: &Value) -> Option<Value> {
        match self {
            NumericType::Byte => value.as_i64().and_then(|v| i8::try_from(v).ok()).map(Value::Byte),
            NumericType::Short => value.as_i64().and_then(|v| i16::try_from(v).ok()).map(Value::Short),
            NumericType::Integer => value.as_i64().and_then(|v| i32::try_from(v).ok()).map(Value::Integer),
            NumericType::Long => value.as_i64().map(Value::Long),
            NumericType::Float => value.as_f64().map(|v| Value::Float(v as f32)),
            NumericType::Double => value.as_f64().map(Value::Double),
            NumericType::BigDecimal => value.as_big_decimal().map(Value::BigDecimal),
        }
    }

    /// Does the arithmetic in this type. Integer kinds wrap on overflow the way the database's
    /// would. A zero divisor gives None, i.e. a null result.
    pub fn apply(self, operator: ArithmeticOperator, left: &Value, right: &Value, scale: Option<i64>) -> Option<Value> {
        let (l, r) = (self.convert(left)?, self.convert(right)?);
        let result = match (l, r) {
            (Value::Integer(a), Value::Integer(b)) => match operator {
                ArithmeticOperator::Plus => Value::Integer(a.wrapping_add(b)),
                ArithmeticOperator::Minus => Value::Integer(a.wrapping_sub(b)),
                ArithmeticOperator::Times => Value::Integer(a.wrapping_mul(b)),
                ArithmeticOperator::DividedBy => {
                    Self::check_divisor(b != 0)?;
                    Value::Integer(a.wrapping_div(b))
                }
            },
            (Value::Long(a), Value::Long(b)) => match operator {
                ArithmeticOperator::Plus => Value::Long(a.wrapping_add(b)),
                ArithmeticOperator::Minus => Value::Long(a.wrapping_sub(b)),
                ArithmeticOperator::Times => Value::Long(a.wrapping_mul(b)),
                ArithmeticOperator::DividedBy => {
                    Self::check_divisor(b != 0)?;
                    Value::Long(a.wrapping_div(b))
                }
            },
            (Value::Float(a), Value::Float(b)) => match operator {
                ArithmeticOperator::Plus => Value::Float(a + b),
                ArithmeticOperator::Minus => Value::Float(a - b),
                ArithmeticOperator::Times => Value::Float(a * b),
                ArithmeticOperator::DividedBy => {
                    Self::check_divisor(b != 0.0)?;
                    Value::Float(a / b)
                }
            },
            (Value::Double(a), Value::Double(b)) => match operator {
                ArithmeticOperator::Plus => Value::Double(a + b),
                ArithmeticOperator::Minus => Value::Double(a - b),
                ArithmeticOperator::Times => Value::Double(a * b),
                ArithmeticOperator::DividedBy => {
                    Self::check_divisor(b != 0.0)?;
                    Value::Double(a / b)
                }
            },
            (Value::BigDecimal(a), Value::BigDecimal(b)) => match operator {
                ArithmeticOperator::Plus => Value::BigDecimal(&a + &b),
                ArithmeticOperator::Minus => Value::BigDecimal(&a - &b),
                ArithmeticOperator::Times => Value::BigDecimal(&a * &b),
                ArithmeticOperator::DividedBy => {
                    Self::check_divisor(b != BigDecimal::from(0))?;
                    let quotient = &a / &b;
                    Value::BigDecimal(match scale {
                        Some(s) => quotient.with_scale_round(s, RoundingMode::HalfUp),
                        None => quotient,
                    })
                }
            },
            // (byte and short arithmetic is always done as int, so never get here)
            (l, r) => {
                debug!("no {:?} arithmetic for {} and {}", self, l, r);
                return None;
            }
        };
        Some(result)
    }

    fn check_divisor(nonzero: bool) -> Option<()> {
        if nonzero {
            Some(())
        } else {
            debug!("division by zero gives a null result");
            None
        }
    }

    pub fn absolute(self, value: &Value) -> CoreResult<Option<Value>> {
        if !self.supports_absolute_value() {
            return Err(CoreError::unsupported(format!("absolute value of a {}", self.name())));
        }
        let v = match self.convert(value) {
            Some(v) => v,
            None => return Ok(None),
        };
        Ok(match v {
            Value::Integer(i) => Some(Value::Integer(i.wrapping_abs())),
            Value::Long(l) => Some(Value::Long(l.wrapping_abs())),
            Value::Float(f) => Some(Value::Float(f.abs())),
            Value::Double(d) => Some(Value::Double(d.abs())),
            Value::BigDecimal(d) => Some(Value::BigDecimal(d.abs())),
            _ => None,
        })
    }

    /// The type an absolute value of this type comes back as.
    pub fn absolute_value_type(self) -> CoreResult<NumericType> {
        if !self.supports_absolute_value() {
            return Err(CoreError::unsupported(format!("absolute value of a {}", self.name())));
        }
        self.calculated_type(self)
    }
}

impl fmt::Display for NumericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl ArithmeticOperator {
    pub fn sql_symbol(self) -> &'static str {
        match self {
            ArithmeticOperator::Plus => "+",
            ArithmeticOperator::Minus => "-",
            ArithmeticOperator::Times => "*",
            ArithmeticOperator::DividedBy => "/",
        }
    }
}
