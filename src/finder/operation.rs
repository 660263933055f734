/*  This file is part of OneModel, a program to manage knowledge.
    Copyright in each year of 2025-2026 inclusive, Luke A. Call.
    OneModel is free software, distributed under a license that includes honesty, the Golden Rule,
    and the GNU Affero General Public License as published by the Free Software Foundation;
    see the file LICENSE for license version and details.
    OneModel is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
    You should have received a copy of the GNU Affero General Public License along with OneModel.  If not, see <http://www.gnu.org/licenses/>
*/
use crate::finder::mapper::Mapper;
use crate::finder::mapper_stack::MapperStack;
use crate::model::as_of_attribute::AsOfAttribute;
use crate::model::attribute::Attribute;
use crate::model::entity::EntityMetadata;
use crate::model::value::{DataObject, Timestamp, Value};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    NotEq,
    GreaterThan,
    GreaterThanEquals,
    LessThan,
    LessThanEquals,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::GreaterThan => ">",
            CompareOp::GreaterThanEquals => ">=",
            CompareOp::LessThan => "<",
            CompareOp::LessThanEquals => "<=",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::NotEq => "not_eq",
            CompareOp::GreaterThan => "greater_than",
            CompareOp::GreaterThanEquals => "greater_than_equals",
            CompareOp::LessThan => "less_than",
            CompareOp::LessThanEquals => "less_than_equals",
        }
    }

    /// Whether `left.cmp(right) == ordering` satisfies `left <op> right`.
    pub fn test(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::NotEq => ordering != Ordering::Equal,
            CompareOp::GreaterThan => ordering == Ordering::Greater,
            CompareOp::GreaterThanEquals => ordering != Ordering::Less,
            CompareOp::LessThan => ordering == Ordering::Less,
            CompareOp::LessThanEquals => ordering != Ordering::Greater,
        }
    }
}

/// An operation on a related entity, carried over to this one through a mapper.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MappedOperation {
    pub mapper: Mapper,
    pub operation: Operation,
}

/// A query predicate. Built by the factory methods on Attribute and combined with and/or;
/// immutable once built, and compared structurally.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Every object of the attribute's entity.
    All(Attribute),
    /// The identity for and/or: stands for "nothing said yet".
    NoOperation,
    /// No object at all.
    None(Attribute),
    Atomic {
        attribute: Attribute,
        op: CompareOp,
        value: Value,
    },
    In {
        attribute: Attribute,
        values: BTreeSet<Value>,
        negated: bool,
    },
    IsNull(Attribute),
    IsNotNull(Attribute),
    /// Two attributes of the same object compared with each other.
    SelfComparison {
        left: Attribute,
        op: CompareOp,
        right: Attribute,
    },
    /// Rows valid at the date, in one bitemporal dimension.
    AsOfEq {
        attribute: AsOfAttribute,
        date: Timestamp,
    },
    /// Rows whose `edge` column equals the as-of date.
    AsOfEdgePoint {
        attribute: AsOfAttribute,
        edge: Attribute,
    },
    And(Vec<Operation>),
    Or(Vec<Operation>),
    Mapped(Box<MappedOperation>),
}

impl Operation {
    pub fn mapped(mapper: Mapper, operation: Operation) -> Operation {
        Operation::Mapped(Box::new(MappedOperation { mapper, operation }))
    }

    pub fn mapper(&self) -> Option<&Mapper> {
        match self {
            Operation::Mapped(m) => Some(&m.mapper),
            _ => None,
        }
    }

    /// Whether this can't match anything.
    pub fn is_none(&self) -> bool {
        match self {
            Operation::None(_) => true,
            Operation::And(ops) => ops.iter().any(|o| o.is_none()),
            Operation::Or(ops) => !ops.is_empty() && ops.iter().all(|o| o.is_none()),
            Operation::Mapped(m) => m.operation.is_none(),
            _ => false,
        }
    }

    fn is_all_for(&self, other: &Operation) -> bool {
        matches!(self, Operation::All(_)) && self.result_entity().is_some() && self.result_entity() == other.result_entity()
    }

    /// The entity whose objects this operation selects; None only for NoOperation.
    pub fn result_entity(&self) -> Option<Arc<EntityMetadata>> {
        match self {
            Operation::NoOperation => None,
            Operation::All(a)
            | Operation::None(a)
            | Operation::IsNull(a)
            | Operation::IsNotNull(a)
            | Operation::Atomic { attribute: a, .. }
            | Operation::In { attribute: a, .. }
            | Operation::SelfComparison { left: a, .. } => Some(a.owner_entity()),
            Operation::AsOfEq { attribute, .. } | Operation::AsOfEdgePoint { attribute, .. } => {
                Some(attribute.attribute().owner_entity())
            }
            Operation::And(ops) | Operation::Or(ops) => ops.iter().find_map(|o| o.result_entity()),
            Operation::Mapped(m) => Some(m.mapper.result_entity()),
        }
    }

    /// Both must hold. NoOperation is the identity, a none absorbs, an all of the same entity
    /// gives way, and operations through the same mapper are combined under it.
    pub fn and(self, other: Operation) -> Operation {
        if matches!(other, Operation::NoOperation) {
            return self;
        }
        if matches!(self, Operation::NoOperation) {
            return other;
        }
        if self.is_none() {
            return self;
        }
        if other.is_none() {
            return other;
        }
        if self.is_all_for(&other) {
            return other;
        }
        if other.is_all_for(&self) {
            return self;
        }
        match (self, other) {
            (Operation::Mapped(a), Operation::Mapped(b)) if a.mapper == b.mapper => {
                let (a, b) = (*a, *b);
                Operation::mapped(a.mapper, a.operation.and(b.operation))
            }
            (Operation::And(mut list), Operation::And(more)) => {
                for op in more {
                    Self::push_combined(&mut list, op, Operation::and);
                }
                Operation::And(list)
            }
            (Operation::And(mut list), op) => {
                Self::push_combined(&mut list, op, Operation::and);
                Operation::And(list)
            }
            (op, Operation::And(more)) => {
                let mut list = vec![op];
                for o in more {
                    Self::push_combined(&mut list, o, Operation::and);
                }
                Operation::And(list)
            }
            (a, b) => Operation::And(vec![a, b]),
        }
    }

    /// Either may hold. NoOperation is the identity, an all of the same entity absorbs, a none
    /// gives way, and operations through the same mapper are combined under it.
    pub fn or(self, other: Operation) -> Operation {
        if matches!(other, Operation::NoOperation) {
            return self;
        }
        if matches!(self, Operation::NoOperation) {
            return other;
        }
        if self.is_all_for(&other) {
            return self;
        }
        if other.is_all_for(&self) {
            return other;
        }
        if self.is_none() {
            return other;
        }
        if other.is_none() {
            return self;
        }
        match (self, other) {
            (Operation::Mapped(a), Operation::Mapped(b)) if a.mapper == b.mapper => {
                let (a, b) = (*a, *b);
                Operation::mapped(a.mapper, a.operation.or(b.operation))
            }
            (Operation::Or(mut list), Operation::Or(more)) => {
                for op in more {
                    Self::push_combined(&mut list, op, Operation::or);
                }
                Operation::Or(list)
            }
            (Operation::Or(mut list), op) => {
                Self::push_combined(&mut list, op, Operation::or);
                Operation::Or(list)
            }
            (op, Operation::Or(more)) => {
                let mut list = vec![op];
                for o in more {
                    Self::push_combined(&mut list, o, Operation::or);
                }
                Operation::Or(list)
            }
            (a, b) => Operation::Or(vec![a, b]),
        }
    }

    /// Appends `op` to a list of conjuncts (or disjuncts), folding it into one already there
    /// that goes through the same mapper.
    fn push_combined(list: &mut Vec<Operation>, op: Operation, combine: fn(Operation, Operation) -> Operation) {
        if let Operation::Mapped(m) = &op {
            let same_mapper = list
                .iter()
                .position(|o| matches!(o, Operation::Mapped(existing) if existing.mapper == m.mapper));
            if let Some(at) = same_mapper {
                let existing = list.remove(at);
                list.insert(at, combine(existing, op));
                return;
            }
        }
        list.push(op);
    }

    /// Evaluates this against one object. Comparisons with a null are false, as in SQL. None when
    /// the answer depends on other objects (a mapped operation) or on the date being queried
    /// (an edge point).
    pub fn matches(&self, owner: &dyn DataObject) -> Option<bool> {
        match self {
            Operation::All(_) | Operation::NoOperation => Some(true),
            Operation::None(_) => Some(false),
            Operation::Atomic { attribute, op, value } => Some(match attribute.value_of(owner) {
                Some(v) => compare_values(&v, value).map(|o| op.test(o)).unwrap_or(false),
                None => false,
            }),
            Operation::In {
                attribute,
                values,
                negated,
            } => Some(match attribute.value_of(owner) {
                Some(v) => values.contains(&v) != *negated,
                None => false,
            }),
            Operation::IsNull(a) => Some(a.is_attribute_null(owner)),
            Operation::IsNotNull(a) => Some(!a.is_attribute_null(owner)),
            Operation::SelfComparison { left, op, right } => {
                Some(match (left.value_of(owner), right.value_of(owner)) {
                    (Some(l), Some(r)) => compare_values(&l, &r).map(|o| op.test(o)).unwrap_or(false),
                    _ => false,
                })
            }
            Operation::AsOfEq { attribute, date } => match attribute.data_matches(owner, *date) {
                Ok(m) => Some(m),
                Err(e) => {
                    warn!("can't tell whether {} matches: {}", attribute, e);
                    None
                }
            },
            Operation::AsOfEdgePoint { .. } | Operation::Mapped(_) => None,
            Operation::And(ops) => {
                let mut result = Some(true);
                for o in ops {
                    match o.matches(owner) {
                        Some(false) => return Some(false),
                        Some(true) => {}
                        None => result = None,
                    }
                }
                result
            }
            Operation::Or(ops) => {
                let mut result = Some(false);
                for o in ops {
                    match o.matches(owner) {
                        Some(true) => return Some(true),
                        Some(false) => {}
                        None => result = None,
                    }
                }
                result
            }
        }
    }

    /// Walks the tree, pushing each mapper on the stack before its operation and popping it after.
    pub fn visit_mappers(&self, stack: &mut dyn MapperStack) {
        match self {
            Operation::Mapped(m) => {
                m.mapper.push_mappers(stack);
                m.operation.visit_mappers(stack);
                m.mapper.pop_mappers(stack);
            }
            Operation::And(ops) | Operation::Or(ops) => {
                for o in ops {
                    o.visit_mappers(stack);
                }
            }
            _ => {}
        }
    }
}

/// Orders two values, widening numbers of different types to a common one first.
fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    if left.value_type() == right.value_type() {
        return compare_same_type(left, right);
    }
    let (l, r) = (left.value_type().numeric_type()?, right.value_type().numeric_type()?);
    let common = l.calculated_type(r).ok()?;
    compare_same_type(&common.convert(left)?, &common.convert(right)?)
}

/// Floats compare numerically: -0.0 equals 0.0, and NaN is unordered.
fn compare_same_type(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
        _ => Some(left.cmp(right)),
    }
}

fn join(ops: &[Operation], separator: &str) -> String {
    let parts: Vec<String> = ops.iter().map(|o| o.to_string()).collect();
    parts.join(separator)
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::All(a) => write!(f, "all of {}", a.owner_entity()),
            Operation::NoOperation => write!(f, "no operation"),
            Operation::None(a) => write!(f, "none of {}", a.owner_entity()),
            Operation::Atomic { attribute, op, value } => write!(f, "{} {} {}", attribute, op.symbol(), value),
            Operation::In {
                attribute,
                values,
                negated,
            } => {
                let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                let keyword = if *negated { "not in" } else { "in" };
                write!(f, "{} {} [{}]", attribute, keyword, values.join(", "))
            }
            Operation::IsNull(a) => write!(f, "{} is null", a),
            Operation::IsNotNull(a) => write!(f, "{} is not null", a),
            Operation::SelfComparison { left, op, right } => write!(f, "{} {} {}", left, op.symbol(), right),
            Operation::AsOfEq { attribute, date } => write!(f, "{} = {}", attribute, Value::Timestamp(*date)),
            Operation::AsOfEdgePoint { attribute, edge } => write!(f, "{} equals edge point {}", attribute, edge),
            Operation::And(ops) => write!(f, "({})", join(ops, " & ")),
            Operation::Or(ops) => write!(f, "({})", join(ops, " | ")),
            Operation::Mapped(m) => write!(f, "[{}] {}", m.mapper, m.operation),
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operation({})", self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::finder::mapper_stack::AliasScope;
    use crate::model::test_entities::{OrderData, TestEntities};
    use crate::util::Util;
    use bigdecimal::BigDecimal;

    fn quantity_is(n: i32) -> Operation {
        TestEntities::get().order.quantity.eq(Value::Integer(n)).unwrap()
    }

    #[test]
    fn no_operation_is_the_identity() {
        Util::initialize_tracing();
        let op = quantity_is(1);
        assert_eq!(op.clone().and(Operation::NoOperation), op);
        assert_eq!(Operation::NoOperation.and(op.clone()), op);
        assert_eq!(op.clone().or(Operation::NoOperation), op);
        assert_eq!(Operation::NoOperation.or(op.clone()), op);
        assert!(Operation::NoOperation.result_entity().is_none());
    }

    #[test]
    fn none_and_all() {
        Util::initialize_tracing();
        let e = TestEntities::get();
        let none = Operation::None(e.order.id.clone());
        let all = Operation::All(e.order.id.clone());
        let op = quantity_is(1);
        assert!(op.clone().and(none.clone()).is_none());
        assert!(none.clone().and(op.clone()).is_none());
        assert_eq!(none.clone().or(op.clone()), op);
        assert_eq!(op.clone().or(none), op);
        assert_eq!(all.clone().and(op.clone()), op);
        assert_eq!(op.clone().or(all.clone()), all);
        // all of another entity is a real constraint
        let other_all = Operation::All(e.account.id.clone());
        assert!(matches!(other_all.and(op), Operation::And(ref v) if v.len() == 2));
    }

    #[test]
    fn and_or_flatten() {
        Util::initialize_tracing();
        let (a, b, c, d) = (quantity_is(1), quantity_is(2), quantity_is(3), quantity_is(4));
        let ab = a.clone().and(b.clone());
        let cd = c.clone().and(d.clone());
        assert_eq!(ab.clone().and(cd), Operation::And(vec![a.clone(), b.clone(), c.clone(), d.clone()]));
        assert_eq!(
            c.clone().and(ab.clone()),
            Operation::And(vec![c.clone(), a.clone(), b.clone()])
        );
        let or = a.clone().or(b.clone()).or(c.clone());
        assert_eq!(or, Operation::Or(vec![a.clone(), b.clone(), c.clone()]));
        assert!(matches!(ab.or(c), Operation::Or(ref v) if v.len() == 2));
    }

    #[test]
    fn same_mapper_operations_merge() {
        Util::initialize_tracing();
        let e = TestEntities::get();
        let desc = e.item_order_description();
        let qty = e.item_order_quantity();
        let first = desc.eq(Value::from("rush")).unwrap();
        let second = qty.greater_than(Value::Integer(2)).unwrap();
        let combined = first.and(second);
        match &combined {
            Operation::Mapped(m) => {
                assert_eq!(m.mapper, e.item_order_mapper());
                assert!(matches!(m.operation, Operation::And(ref v) if v.len() == 2));
            }
            other => panic!("expected one mapped operation, got {}", other),
        }
        // merged into an existing conjunct too
        let local = e.item.quantity.eq(Value::Integer(1)).unwrap();
        let more = qty.less_than(Value::Integer(9)).unwrap();
        let op = local.and(combined).and(more);
        match &op {
            Operation::And(v) => {
                assert_eq!(v.len(), 2);
                assert!(matches!(&v[1], Operation::Mapped(m) if matches!(m.operation, Operation::And(ref inner) if inner.len() == 3)));
            }
            other => panic!("unexpected {}", other),
        }
        let either = desc.eq(Value::from("a")).unwrap().or(desc.eq(Value::from("b")).unwrap());
        assert!(matches!(either, Operation::Mapped(ref m) if matches!(m.operation, Operation::Or(_))));
    }

    #[test]
    fn matching_single_objects() {
        Util::initialize_tracing();
        let e = TestEntities::get();
        let mut o = OrderData::new(5);
        o.quantity = Some(3);
        o.amount = Some(BigDecimal::from(10));
        assert_eq!(quantity_is(3).matches(&o), Some(true));
        assert_eq!(quantity_is(4).matches(&o), Some(false));
        assert_eq!(e.order.quantity.greater_than(Value::Integer(2)).unwrap().matches(&o), Some(true));
        assert_eq!(e.order.description.eq(Value::from("x")).unwrap().matches(&o), Some(false));
        assert_eq!(e.order.description.not_eq(Value::from("x")).unwrap().matches(&o), Some(false));
        assert_eq!(e.order.description.is_null().unwrap().matches(&o), Some(true));
        assert_eq!(
            e.order.quantity.in_values(vec![Value::Integer(1), Value::Integer(3)]).unwrap().matches(&o),
            Some(true)
        );
        assert_eq!(
            e.order.quantity.not_in(vec![Value::Integer(1), Value::Integer(3)]).unwrap().matches(&o),
            Some(false)
        );
        // an int column against a decimal one
        assert_eq!(e.order.quantity.less_than_attribute(&e.order.amount).unwrap().matches(&o), Some(true));
        let as_of = e.order.business_date.eq_date(TestEntities::date("2020-02-01"));
        assert_eq!(as_of.matches(&o), Some(true));
        let both = quantity_is(3).and(as_of.clone());
        assert_eq!(both.matches(&o), Some(true));
        let mapped = e.item_order_description().eq(Value::from("x")).unwrap();
        assert_eq!(quantity_is(3).and(mapped.clone()).matches(&o), None);
        assert_eq!(quantity_is(4).and(mapped.clone()).matches(&o), Some(false));
        assert_eq!(quantity_is(3).or(mapped).matches(&o), Some(true));
        assert_eq!(Operation::None(e.order.id.clone()).matches(&o), Some(false));
    }

    #[test]
    fn float_comparisons_are_numeric() {
        Util::initialize_tracing();
        let e = TestEntities::get();
        let mut o = OrderData::new(6);
        o.rate = Some(-0.0);
        o.price = Some(f64::NAN);
        assert_eq!(e.order.rate.eq(Value::Float(0.0)).unwrap().matches(&o), Some(true));
        assert_eq!(e.order.rate.greater_than(Value::Float(0.0)).unwrap().matches(&o), Some(false));
        // float widened to double
        assert_eq!(e.order.rate.eq_attribute(&e.order.price).unwrap().matches(&o), Some(false));
        o.price = Some(0.0);
        assert_eq!(e.order.rate.eq_attribute(&e.order.price).unwrap().matches(&o), Some(true));
        o.price = Some(f64::NAN);
        assert_eq!(e.order.price.eq(Value::Double(f64::NAN)).unwrap().matches(&o), Some(false));
        assert_eq!(e.order.price.less_than(Value::Double(1.0)).unwrap().matches(&o), Some(false));
    }

    #[test]
    fn unreadable_bounds_leave_the_match_open() {
        Util::initialize_tracing();
        let e = TestEntities::get();
        let mut o = OrderData::new(7);
        o.business_from = None;
        let as_of = e.order.business_date.eq_date(TestEntities::date("2020-02-01"));
        assert!(e.order.business_date.data_matches(&o, TestEntities::date("2020-02-01")).is_err());
        assert_eq!(as_of.matches(&o), None);
        assert_eq!(as_of.clone().and(quantity_is(99)).matches(&o), Some(false));
    }

    #[test]
    fn display() {
        let e = TestEntities::get();
        assert_eq!(quantity_is(3).to_string(), "Order.quantity = 3");
        assert_eq!(
            quantity_is(3).or(quantity_is(4)).to_string(),
            "(Order.quantity = 3 | Order.quantity = 4)"
        );
        assert_eq!(e.order.description.is_null().unwrap().to_string(), "Order.description is null");
        assert_eq!(
            e.item_order_description().eq(Value::from("x")).unwrap().to_string(),
            "[OrderItem.orderId = Order.id] Order.description = \"x\""
        );
        assert_eq!(Operation::All(e.order.id.clone()).to_string(), "all of Order");
    }

    #[test]
    fn visiting_mappers() {
        Util::initialize_tracing();
        let e = TestEntities::get();
        let op = e
            .item_order_description()
            .eq(Value::from("x"))
            .unwrap()
            .and(e.item_order_account_name().eq(Value::from("y")).unwrap());
        let mut scope = AliasScope::new();
        op.visit_mappers(&mut scope);
        assert_eq!(scope.depth(), 0);
        // the chained path starts with the same hop, so shares its alias
        assert_eq!(scope.alias_count(), 2);
    }
}
