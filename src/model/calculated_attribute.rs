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
use crate::model::attribute::{Attribute, AttributeKind};
use crate::model::entity::EntityMetadata;
use crate::model::numeric_type::{ArithmeticOperator, NumericType};
use crate::model::value::{DataObject, Value};
use crate::util::Util;
use std::sync::Arc;
use tracing::*;

/// The right-hand side of an arithmetic calculation.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    Attribute(Attribute),
    Constant(Value),
}

impl Operand {
    fn value_of(&self, owner: &dyn DataObject) -> Option<Value> {
        match self {
            Operand::Attribute(a) => a.value_of(owner),
            Operand::Constant(v) => Some(v.clone()),
        }
    }

    fn numeric_type(&self) -> Option<NumericType> {
        match self {
            Operand::Attribute(a) => a.numeric_type(),
            Operand::Constant(v) => v.value_type().numeric_type(),
        }
    }

    fn precision_and_scale(&self) -> (i64, i64) {
        match self {
            Operand::Attribute(a) => a.precision_and_scale(),
            Operand::Constant(Value::BigDecimal(d)) => {
                let (digits, scale) = d.as_bigint_and_exponent();
                let precision = digits.to_string().trim_start_matches('-').len() as i64;
                (std::cmp::max(precision, scale), scale)
            }
            Operand::Constant(v) => match v.value_type().numeric_type() {
                Some(t) => t.implicit_precision_and_scale(),
                None => (0, 0),
            },
        }
    }

    fn sql(&self) -> String {
        match self {
            Operand::Attribute(a) => a.sql_name(),
            Operand::Constant(v) => v.to_string(),
        }
    }
}

/// How a calculated attribute gets its value from others.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Calculator {
    Arithmetic {
        operator: ArithmeticOperator,
        left: Attribute,
        right: Operand,
        result_type: NumericType,
        // only for a BigDecimal quotient:
        scale: Option<i64>,
    },
    AbsoluteValue {
        attribute: Attribute,
        result_type: NumericType,
    },
}

impl Calculator {
    pub fn result_type(&self) -> NumericType {
        match self {
            Calculator::Arithmetic { result_type, .. } | Calculator::AbsoluteValue { result_type, .. } => *result_type,
        }
    }

    /// Null when any input is null, or on division by zero.
    pub fn value_of(&self, owner: &dyn DataObject) -> Option<Value> {
        match self {
            Calculator::Arithmetic {
                operator,
                left,
                right,
                result_type,
                scale,
            } => {
                let l = left.value_of(owner)?;
                let r = right.value_of(owner)?;
                result_type.apply(*operator, &l, &r, *scale)
            }
            Calculator::AbsoluteValue { attribute, .. } => {
                let v = attribute.value_of(owner)?;
                attribute.numeric_type()?.absolute(&v).ok().flatten()
            }
        }
    }

    pub fn sql_expression(&self) -> String {
        match self {
            Calculator::Arithmetic {
                operator, left, right, ..
            } => format!("{} {} {}", left.sql_name(), operator.sql_symbol(), right.sql()),
            Calculator::AbsoluteValue { attribute, .. } => format!("abs({})", attribute.sql_name()),
        }
    }

    pub fn precision_and_scale(&self) -> (i64, i64) {
        let result_type = self.result_type();
        if result_type != NumericType::BigDecimal {
            return result_type.implicit_precision_and_scale();
        }
        match self {
            Calculator::Arithmetic {
                operator,
                left,
                right,
                scale,
                ..
            } => {
                let (s1, s2) = (left.precision_and_scale().1, right.precision_and_scale().1);
                let scale = match operator {
                    ArithmeticOperator::DividedBy => scale.unwrap_or(Util::MIN_QUOTIENT_SCALE),
                    ArithmeticOperator::Times => std::cmp::min(s1 + s2, Util::MAX_DECIMAL_PRECISION),
                    ArithmeticOperator::Plus | ArithmeticOperator::Minus => std::cmp::max(s1, s2),
                };
                (Util::MAX_DECIMAL_PRECISION, scale)
            }
            Calculator::AbsoluteValue { attribute, .. } => attribute.precision_and_scale(),
        }
    }

    pub fn owner_entity(&self) -> Arc<EntityMetadata> {
        match self {
            Calculator::Arithmetic { left, .. } => left.owner_entity(),
            Calculator::AbsoluteValue { attribute, .. } => attribute.owner_entity(),
        }
    }

    pub fn dependent_attributes(&self) -> Vec<Attribute> {
        match self {
            Calculator::Arithmetic { left, right, .. } => {
                let mut result = left.dependent_attributes();
                if let Operand::Attribute(r) = right {
                    for a in r.dependent_attributes() {
                        if !result.contains(&a) {
                            result.push(a);
                        }
                    }
                }
                result
            }
            Calculator::AbsoluteValue { attribute, .. } => attribute.dependent_attributes(),
        }
    }
}

/// A numeric attribute computed from others (and constants) of the same object.
pub struct CalculatedAttribute {
    calculator: Calculator,
}

impl CalculatedAttribute {
    pub fn calculator(&self) -> &Calculator {
        &self.calculator
    }
}

impl Attribute {
    pub fn plus(&self, other: &Attribute) -> CoreResult<Attribute> {
        self.arithmetic(ArithmeticOperator::Plus, Operand::Attribute(other.clone()))
    }

    pub fn plus_value(&self, value: impl Into<Value>) -> CoreResult<Attribute> {
        self.arithmetic(ArithmeticOperator::Plus, Operand::Constant(value.into()))
    }

    pub fn minus(&self, other: &Attribute) -> CoreResult<Attribute> {
        self.arithmetic(ArithmeticOperator::Minus, Operand::Attribute(other.clone()))
    }

    pub fn minus_value(&self, value: impl Into<Value>) -> CoreResult<Attribute> {
        self.arithmetic(ArithmeticOperator::Minus, Operand::Constant(value.into()))
    }

    pub fn times(&self, other: &Attribute) -> CoreResult<Attribute> {
        self.arithmetic(ArithmeticOperator::Times, Operand::Attribute(other.clone()))
    }

    pub fn times_value(&self, value: impl Into<Value>) -> CoreResult<Attribute> {
        self.arithmetic(ArithmeticOperator::Times, Operand::Constant(value.into()))
    }

    pub fn divided_by(&self, other: &Attribute) -> CoreResult<Attribute> {
        self.arithmetic(ArithmeticOperator::DividedBy, Operand::Attribute(other.clone()))
    }

    pub fn divided_by_value(&self, value: impl Into<Value>) -> CoreResult<Attribute> {
        self.arithmetic(ArithmeticOperator::DividedBy, Operand::Constant(value.into()))
    }

    pub fn absolute_value(&self) -> CoreResult<Attribute> {
        if let Some(m) = self.as_mapped() {
            let inner = m.wrapped_attribute().absolute_value()?;
            return Attribute::mapped(m.mapper().clone(), inner, m.parent_selector().clone());
        }
        let numeric_type = self.required_numeric_type()?;
        let result_type = numeric_type.absolute_value_type()?;
        Ok(Attribute::new(AttributeKind::Calculated(CalculatedAttribute {
            calculator: Calculator::AbsoluteValue {
                attribute: self.clone(),
                result_type,
            },
        })))
    }

    fn required_numeric_type(&self) -> CoreResult<NumericType> {
        self.numeric_type()
            .ok_or_else(|| CoreError::invalid_type_combination(format!("{} is not numeric", self)))
    }

    /// Arithmetic in the type the two operand types promote to. Through a relationship, the
    /// calculation is done on the related entity where it can be: with a constant, or with an
    /// attribute that shares the leading part of the path.
    fn arithmetic(&self, operator: ArithmeticOperator, right: Operand) -> CoreResult<Attribute> {
        let left_type = self.required_numeric_type()?;
        let right_type = right.numeric_type().ok_or_else(|| {
            CoreError::invalid_type_combination(format!("{} is not numeric, for {}", right.sql(), self))
        })?;
        if let Operand::Attribute(r) = &right {
            if r.owner_entity() != self.owner_entity() {
                return Err(CoreError::invalid_input(format!(
                    "{} and {} don't start from the same entity",
                    self, r
                )));
            }
        }
        if let Some(m) = self.as_mapped() {
            match &right {
                Operand::Constant(_) => {
                    let inner = m.wrapped_attribute().arithmetic(operator, right.clone())?;
                    return Attribute::mapped(m.mapper().clone(), inner, m.parent_selector().clone());
                }
                Operand::Attribute(r) => {
                    if let Some(rm) = r.as_mapped() {
                        if let Some(common) = m.mapper().common_mapper(rm.mapper()) {
                            debug!("{} {} {}: calculating under {}", self, operator.sql_symbol(), r, common);
                            let (l, r) = (self.with_mapper_remainder(&common), r.with_mapper_remainder(&common));
                            let inner = l.arithmetic(operator, Operand::Attribute(r))?;
                            let selector = m.parent_selector().prefix(common.depth());
                            return Attribute::mapped(common, inner, selector);
                        }
                    }
                }
            }
        }
        let result_type = left_type.calculated_type(right_type)?;
        let scale = if operator == ArithmeticOperator::DividedBy && result_type == NumericType::BigDecimal {
            let (p1, s1) = self.precision_and_scale();
            if right_type == NumericType::BigDecimal {
                let (p2, s2) = right.precision_and_scale();
                Some(NumericType::calculate_quotient_scale(p1, s1, p2, s2))
            } else {
                Some(s1)
            }
        } else {
            None
        };
        Ok(Attribute::new(AttributeKind::Calculated(CalculatedAttribute {
            calculator: Calculator::Arithmetic {
                operator,
                left: self.clone(),
                right,
                result_type,
                scale,
            },
        })))
    }
}
