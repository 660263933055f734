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
use crate::finder::mapper::Mapper;
use crate::finder::operation::{CompareOp, Operation};
use crate::finder::operation_pool::OperationPool;
use crate::model::as_of_attribute::{AsOfAttribute, AsOfDefinition};
use crate::model::calculated_attribute::CalculatedAttribute;
use crate::model::entity::{AttributeId, EntityId, EntityMetadata, SourceAttributeType};
use crate::model::mapped_attribute::MappedAttribute;
use crate::model::numeric_type::NumericType;
use crate::model::order_by::OrderBy;
use crate::model::value::{DataObject, Value, ValueAccessor, ValueType};
use crate::util::Util;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::*;

/// Counts updates to an attribute's column, so that cached query results depending on it can
/// tell they are stale. Transactional holders belong to attributes of transactional entities.
#[derive(Debug)]
pub struct UpdateCountHolder {
    transactional: bool,
    count: AtomicU32,
}

impl UpdateCountHolder {
    pub fn new(transactional: bool) -> UpdateCountHolder {
        UpdateCountHolder {
            transactional,
            count: AtomicU32::new(0),
        }
    }

    pub fn get(&self) -> u32 {
        self.count.load(AtomicOrdering::Acquire)
    }

    pub fn increment(&self) {
        self.count.fetch_add(1, AtomicOrdering::AcqRel);
    }

    pub fn is_transactional(&self) -> bool {
        self.transactional
    }
}

/// What every column-backed attribute (plain or as-of) knows about itself.
#[derive(Debug)]
pub struct AttributeMetadata {
    id: AttributeId,
    name: Arc<str>,
    column_name: Arc<str>,
    value_type: ValueType,
    nullable: bool,
    shadow: Option<AttributeId>,
    precision: i64,
    scale: i64,
    update_count: UpdateCountHolder,
    source_attribute: bool,
    entity: Arc<EntityMetadata>,
}

impl AttributeMetadata {
    pub fn id(&self) -> AttributeId {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn column_name(&self) -> &str {
        &self.column_name
    }
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
    pub fn shadow(&self) -> Option<AttributeId> {
        self.shadow
    }
    pub fn entity(&self) -> &Arc<EntityMetadata> {
        &self.entity
    }
    pub fn update_count_holder(&self) -> &UpdateCountHolder {
        &self.update_count
    }
}

pub struct ColumnAttribute {
    metadata: AttributeMetadata,
    accessor: Arc<dyn ValueAccessor>,
}

/// The closed set of attribute shapes. Code that has to treat them differently matches on this.
pub enum AttributeKind {
    Column(ColumnAttribute),
    AsOf(Arc<AsOfDefinition>),
    Mapped(MappedAttribute),
    Calculated(CalculatedAttribute),
}

/// A typed accessor for one value of an entity, and the factory for operations on that value.
/// Cheap to clone: clones share the same definition, which is created once at registration and
/// never changes afterwards.
#[derive(Clone)]
pub struct Attribute {
    kind: Arc<AttributeKind>,
}

/// Registers a column or as-of attribute of an entity.
pub struct AttributeBuilder {
    entity: Arc<EntityMetadata>,
    field: u32,
    name: String,
    column_name: Option<String>,
    value_type: ValueType,
    nullable: bool,
    shadow: Option<AttributeId>,
    precision: i64,
    scale: i64,
    transactional: bool,
    source_attribute: bool,
}

impl AttributeBuilder {
    pub fn new(entity: &Arc<EntityMetadata>, field: u32, name: &str, value_type: ValueType) -> AttributeBuilder {
        AttributeBuilder {
            entity: entity.clone(),
            field,
            name: name.to_string(),
            column_name: None,
            value_type,
            nullable: true,
            shadow: None,
            precision: 0,
            scale: 0,
            transactional: true,
            source_attribute: false,
        }
    }

    pub fn column_name(mut self, column_name: &str) -> Self {
        self.column_name = Some(column_name.to_string());
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// The attribute this one stands in for, in detached or temporary copies of the entity.
    pub fn shadow_of(mut self, id: AttributeId) -> Self {
        self.shadow = Some(id);
        self
    }

    pub fn precision_and_scale(mut self, precision: i64, scale: i64) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }

    pub fn transactional(mut self, transactional: bool) -> Self {
        self.transactional = transactional;
        self
    }

    pub fn source_attribute(mut self) -> Self {
        self.source_attribute = true;
        self
    }

    pub(crate) fn build_metadata(self) -> AttributeMetadata {
        let column_name = self.column_name.unwrap_or_else(|| self.name.clone());
        AttributeMetadata {
            id: AttributeId {
                entity: self.entity.id(),
                field: self.field,
            },
            name: Arc::from(self.name.as_str()),
            column_name: Arc::from(column_name.as_str()),
            value_type: self.value_type,
            nullable: self.nullable,
            shadow: self.shadow,
            precision: self.precision,
            scale: self.scale,
            update_count: UpdateCountHolder::new(self.transactional),
            source_attribute: self.source_attribute,
            entity: self.entity,
        }
    }

    pub fn column<A: ValueAccessor + 'static>(self, accessor: A) -> Attribute {
        Attribute::new(AttributeKind::Column(ColumnAttribute {
            metadata: self.build_metadata(),
            accessor: Arc::new(accessor),
        }))
    }
}

impl Attribute {
    pub(crate) fn new(kind: AttributeKind) -> Attribute {
        Attribute { kind: Arc::new(kind) }
    }

    pub fn kind(&self) -> &AttributeKind {
        &self.kind
    }

    /// Set for column and as-of attributes, which are the ones with an identity of their own.
    pub fn metadata(&self) -> Option<&AttributeMetadata> {
        match self.kind() {
            AttributeKind::Column(c) => Some(&c.metadata),
            AttributeKind::AsOf(d) => Some(d.metadata()),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<AttributeId> {
        self.metadata().map(|m| m.id)
    }

    pub fn shadow_attribute_id(&self) -> Option<AttributeId> {
        self.metadata().and_then(|m| m.shadow)
    }

    pub fn name(&self) -> String {
        match self.kind() {
            AttributeKind::Column(c) => c.metadata.name.to_string(),
            AttributeKind::AsOf(d) => d.metadata().name.to_string(),
            AttributeKind::Mapped(m) => m.wrapped_attribute().name(),
            AttributeKind::Calculated(c) => c.calculator().sql_expression(),
        }
    }

    /// What a SQL generator would write for this attribute, before table aliasing.
    pub fn sql_name(&self) -> String {
        match self.kind() {
            AttributeKind::Column(c) => c.metadata.column_name.to_string(),
            AttributeKind::AsOf(d) => d.metadata().column_name.to_string(),
            AttributeKind::Mapped(m) => m.wrapped_attribute().sql_name(),
            AttributeKind::Calculated(c) => format!("({})", c.calculator().sql_expression()),
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self.kind() {
            AttributeKind::Column(c) => c.metadata.value_type,
            AttributeKind::AsOf(_) => ValueType::Timestamp,
            AttributeKind::Mapped(m) => m.wrapped_attribute().value_type(),
            AttributeKind::Calculated(c) => c.calculator().result_type().value_type(),
        }
    }

    pub fn numeric_type(&self) -> Option<NumericType> {
        self.value_type().numeric_type()
    }

    /// Declared (precision, scale) of a BigDecimal column; otherwise what the type implies.
    pub fn precision_and_scale(&self) -> (i64, i64) {
        match self.kind() {
            AttributeKind::Column(c) if c.metadata.precision > 0 => (c.metadata.precision, c.metadata.scale),
            AttributeKind::Mapped(m) => m.wrapped_attribute().precision_and_scale(),
            AttributeKind::Calculated(c) => c.calculator().precision_and_scale(),
            _ => match self.numeric_type() {
                Some(t) => t.implicit_precision_and_scale(),
                None => (0, 0),
            },
        }
    }

    /// Mapped attributes can always come back null: the related object may not exist.
    pub fn is_nullable(&self) -> bool {
        match self.kind() {
            AttributeKind::Column(c) => c.metadata.nullable,
            AttributeKind::AsOf(_) => false,
            AttributeKind::Mapped(_) | AttributeKind::Calculated(_) => true,
        }
    }

    /// The entity whose objects this attribute is read from: for a mapped attribute, the entity
    /// at the start of the relationship path, not the one holding the wrapped attribute.
    pub fn owner_entity(&self) -> Arc<EntityMetadata> {
        match self.kind() {
            AttributeKind::Column(c) => c.metadata.entity.clone(),
            AttributeKind::AsOf(d) => d.metadata().entity.clone(),
            AttributeKind::Mapped(m) => m.mapper().result_entity(),
            AttributeKind::Calculated(c) => c.calculator().owner_entity(),
        }
    }

    pub fn owner_entity_id(&self) -> EntityId {
        self.owner_entity().id()
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self.kind(), AttributeKind::Mapped(_))
    }

    pub fn as_mapped(&self) -> Option<&MappedAttribute> {
        match self.kind() {
            AttributeKind::Mapped(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_as_of_attribute(&self) -> bool {
        matches!(self.kind(), AttributeKind::AsOf(_))
    }

    pub fn as_as_of(&self) -> Option<AsOfAttribute> {
        AsOfAttribute::from_attribute(self)
    }

    pub fn is_calculated(&self) -> bool {
        matches!(self.kind(), AttributeKind::Calculated(_))
    }

    pub fn is_source_attribute(&self) -> bool {
        self.metadata().map(|m| m.source_attribute).unwrap_or(false)
    }

    /// None for mapped attributes: a relationship traversal is never correlated on its source.
    pub fn source_attribute_type(&self) -> Option<SourceAttributeType> {
        match self.kind() {
            AttributeKind::Mapped(_) => None,
            _ => self.owner_entity().source_attribute_type(),
        }
    }

    pub fn source_attribute(&self) -> Option<Attribute> {
        self.owner_entity().source_attribute().cloned()
    }

    /// The bitemporal dimensions of the owning entity (none, for a mapped attribute).
    pub fn as_of_attributes(&self) -> Vec<AsOfAttribute> {
        match self.kind() {
            AttributeKind::Mapped(_) => Vec::new(),
            _ => self.owner_entity().as_of_attributes().to_vec(),
        }
    }

    /// Every column attribute this one reads, itself included where it is one.
    pub fn dependent_attributes(&self) -> Vec<Attribute> {
        match self.kind() {
            AttributeKind::Column(_) => vec![self.clone()],
            AttributeKind::AsOf(d) => vec![self.clone(), d.from_attribute().clone(), d.to_attribute().clone()],
            AttributeKind::Mapped(m) => {
                let mut result = m.mapper().dependent_attributes();
                for a in m.wrapped_attribute().dependent_attributes() {
                    if !result.contains(&a) {
                        result.push(a);
                    }
                }
                result
            }
            AttributeKind::Calculated(c) => c.calculator().dependent_attributes(),
        }
    }

    pub fn update_count(&self) -> u32 {
        match self.kind() {
            AttributeKind::Column(c) => c.metadata.update_count.get(),
            AttributeKind::AsOf(d) => d.metadata().update_count.get(),
            AttributeKind::Mapped(m) => m.wrapped_attribute().update_count(),
            AttributeKind::Calculated(_) => self
                .dependent_attributes()
                .iter()
                .fold(0_u32, |sum, a| sum.wrapping_add(a.update_count())),
        }
    }

    pub fn increment_update_count(&self) {
        match self.kind() {
            AttributeKind::Column(c) => c.metadata.update_count.increment(),
            AttributeKind::AsOf(d) => d.metadata().update_count.increment(),
            AttributeKind::Mapped(m) => m.wrapped_attribute().increment_update_count(),
            AttributeKind::Calculated(_) => {
                for a in self.dependent_attributes() {
                    a.increment_update_count();
                }
            }
        }
    }

    // ---- values ----

    pub fn value_of(&self, owner: &dyn DataObject) -> Option<Value> {
        match self.kind() {
            AttributeKind::Column(c) => c.accessor.get(owner),
            AttributeKind::AsOf(d) => d.accessor().get(owner),
            AttributeKind::Mapped(m) => m.value_of(owner),
            AttributeKind::Calculated(c) => c.calculator().value_of(owner),
        }
    }

    pub fn is_attribute_null(&self, owner: &dyn DataObject) -> bool {
        self.value_of(owner).is_none()
    }

    /// Util::NULL_HASH for a null value.
    pub fn value_hash_code(&self, owner: &dyn DataObject) -> i32 {
        match self.value_of(owner) {
            Some(v) => v.hash_code(),
            None => Util::NULL_HASH,
        }
    }

    /// Null-safe: two nulls are equal.
    pub fn value_equals(&self, first: &dyn DataObject, second: &dyn DataObject) -> bool {
        self.value_of(first) == self.value_of(second)
    }

    /// Like value_equals, with the second value read by another attribute (of the same type).
    pub fn value_equals_other(&self, first: &dyn DataObject, second: &dyn DataObject, second_attribute: &Attribute) -> bool {
        self.value_of(first) == second_attribute.value_of(second)
    }

    pub fn set_value(&self, owner: &mut dyn DataObject, value: impl Into<Option<Value>>) -> CoreResult<()> {
        let value = value.into();
        match self.kind() {
            AttributeKind::Column(c) => {
                let value = match value {
                    Some(v) => Some(self.literal(v)?),
                    None => {
                        if !c.metadata.nullable {
                            return Err(CoreError::invalid_input(format!("{} is not nullable", self)));
                        }
                        None
                    }
                };
                trace!("setting {} to {:?}", self, value);
                c.accessor.set(owner, value)
            }
            AttributeKind::AsOf(_) => Err(CoreError::unsupported(format!("setting the value of as of attribute {}", self))),
            AttributeKind::Mapped(_) => Err(CoreError::unsupported(format!("setting the value of mapped attribute {}", self))),
            AttributeKind::Calculated(_) => Err(CoreError::unsupported(format!(
                "setting the value of calculated attribute {}",
                self
            ))),
        }
    }

    pub fn set_value_null(&self, owner: &mut dyn DataObject) -> CoreResult<()> {
        self.set_value(owner, None)
    }

    pub fn copy_value_from(&self, destination: &mut dyn DataObject, source: &dyn DataObject) -> CoreResult<()> {
        let value = self.value_of(source);
        self.set_value(destination, value)
    }

    pub fn parse_string_and_set(&self, text: &str, owner: &mut dyn DataObject, line: usize) -> CoreResult<()> {
        match self.kind() {
            AttributeKind::Column(c) => {
                let value = c.metadata.value_type.parse_literal(text, line)?;
                self.set_value(owner, value)
            }
            _ => Err(CoreError::unsupported(format!("parse_string_and_set can not be called on {}", self))),
        }
    }

    pub fn parse_number_and_set(&self, number: f64, owner: &mut dyn DataObject, line: usize) -> CoreResult<()> {
        match self.kind() {
            AttributeKind::Column(c) => {
                let value = c.metadata.value_type.value_from_number(number, line)?;
                self.set_value(owner, value)
            }
            _ => Err(CoreError::unsupported(format!("parse_number_and_set can not be called on {}", self))),
        }
    }

    /// Handles the bare words a data file can hold: "null", and true/false for a boolean.
    pub fn parse_word_and_set(&self, word: &str, owner: &mut dyn DataObject, line: usize) -> CoreResult<()> {
        if word == "null" {
            return self
                .set_value_null(owner)
                .map_err(|e| CoreError::invalid_literal(line, word, e.to_string()));
        }
        if self.value_type() == ValueType::Boolean && (word == "true" || word == "false") {
            return self.set_value(owner, Value::Boolean(word == "true"));
        }
        Err(CoreError::invalid_literal(line, word, format!("unexpected word for {}", self)))
    }

    /// The value as this attribute's type (widening numbers), or an error if it can't be.
    pub(crate) fn literal(&self, value: Value) -> CoreResult<Value> {
        let target = self.value_type();
        value.coerce_to(target).ok_or_else(|| {
            CoreError::invalid_input(format!("{} is not a {} value, for {}", value, target, self))
        })
    }

    // ---- operations against values ----

    /// Matches nothing when given no value.
    pub fn eq(&self, value: impl Into<Option<Value>>) -> CoreResult<Operation> {
        let value = match value.into() {
            Some(v) => v,
            None => return Ok(Operation::None(self.clone())),
        };
        match self.kind() {
            AttributeKind::AsOf(d) => AsOfAttribute::from_parts(self, d).eq_value(Some(value)),
            AttributeKind::Mapped(m) => Ok(Operation::mapped(m.mapper().clone(), m.wrapped_attribute().eq(value)?)),
            _ => Ok(Operation::Atomic {
                attribute: self.clone(),
                op: CompareOp::Eq,
                value: self.literal(value)?,
            }),
        }
    }

    /// Matches nothing when given no value, as SQL would.
    pub fn not_eq(&self, value: impl Into<Option<Value>>) -> CoreResult<Operation> {
        self.compare(CompareOp::NotEq, value.into())
    }

    pub fn greater_than(&self, value: impl Into<Option<Value>>) -> CoreResult<Operation> {
        self.compare(CompareOp::GreaterThan, value.into())
    }

    pub fn greater_than_equals(&self, value: impl Into<Option<Value>>) -> CoreResult<Operation> {
        self.compare(CompareOp::GreaterThanEquals, value.into())
    }

    pub fn less_than(&self, value: impl Into<Option<Value>>) -> CoreResult<Operation> {
        self.compare(CompareOp::LessThan, value.into())
    }

    pub fn less_than_equals(&self, value: impl Into<Option<Value>>) -> CoreResult<Operation> {
        self.compare(CompareOp::LessThanEquals, value.into())
    }

    fn compare(&self, op: CompareOp, value: Option<Value>) -> CoreResult<Operation> {
        if op == CompareOp::Eq {
            return self.eq(value);
        }
        let value = match value {
            Some(v) => v,
            None => return Ok(Operation::None(self.clone())),
        };
        match self.kind() {
            AttributeKind::AsOf(_) => Err(self.not_supported_on_as_of(op.name())),
            AttributeKind::Mapped(m) => Ok(Operation::mapped(
                m.mapper().clone(),
                m.wrapped_attribute().compare(op, Some(value))?,
            )),
            _ => Ok(Operation::Atomic {
                attribute: self.clone(),
                op,
                value: self.literal(value)?,
            }),
        }
    }

    /// An empty set matches nothing; a set of one is just eq.
    pub fn in_values<I: IntoIterator<Item = Value>>(&self, values: I) -> CoreResult<Operation> {
        if let AttributeKind::AsOf(d) = self.kind() {
            return AsOfAttribute::from_parts(self, d).in_values(values.into_iter().map(Some));
        }
        let set = self.literal_set(values)?;
        if let AttributeKind::Mapped(m) = self.kind() {
            if set.is_empty() {
                return Ok(Operation::None(self.clone()));
            }
            return Ok(Operation::mapped(m.mapper().clone(), m.wrapped_attribute().in_values(set)?));
        }
        Ok(self.in_operation(set, false))
    }

    /// An empty set matches everything.
    pub fn not_in<I: IntoIterator<Item = Value>>(&self, values: I) -> CoreResult<Operation> {
        if self.is_as_of_attribute() {
            return Err(self.not_supported_on_as_of("not_in"));
        }
        let set = self.literal_set(values)?;
        if let AttributeKind::Mapped(m) = self.kind() {
            if set.is_empty() {
                return Ok(Operation::All(self.clone()));
            }
            return Ok(Operation::mapped(m.mapper().clone(), m.wrapped_attribute().not_in(set)?));
        }
        Ok(self.in_operation(set, true))
    }

    /// in_values over what `extractor` reads from each object; nulls are skipped (for an as-of
    /// attribute, see AsOfAttribute::in_values).
    pub fn in_objects(&self, objects: &[&dyn DataObject], extractor: &Attribute) -> CoreResult<Operation> {
        if let AttributeKind::AsOf(d) = self.kind() {
            return AsOfAttribute::from_parts(self, d).in_values(objects.iter().map(|o| extractor.value_of(*o)));
        }
        self.in_values(objects.iter().filter_map(|o| extractor.value_of(*o)))
    }

    /// Like in_objects, but gives up (matching nothing, so the caller can fall back to something
    /// else) once there are more than max_in_clause distinct values.
    pub fn in_with_max(&self, max_in_clause: usize, objects: &[&dyn DataObject], extractor: &Attribute) -> CoreResult<Operation> {
        if let AttributeKind::AsOf(d) = self.kind() {
            return AsOfAttribute::from_parts(self, d).in_values_with_max(objects.iter().map(|o| extractor.value_of(*o)));
        }
        let mut set = BTreeSet::new();
        for o in objects {
            if let Some(v) = extractor.value_of(*o) {
                set.insert(v);
                if set.len() > max_in_clause {
                    debug!("more than {} values for {}; giving up on the in clause", max_in_clause, self);
                    return Ok(Operation::None(self.clone()));
                }
            }
        }
        self.in_values(set)
    }

    fn literal_set<I: IntoIterator<Item = Value>>(&self, values: I) -> CoreResult<BTreeSet<Value>> {
        let mut set = BTreeSet::new();
        for v in values {
            set.insert(self.literal(v)?);
        }
        Ok(set)
    }

    fn in_operation(&self, mut set: BTreeSet<Value>, negated: bool) -> Operation {
        match set.len() {
            0 if negated => Operation::All(self.clone()),
            0 => Operation::None(self.clone()),
            1 => {
                let op = if negated { CompareOp::NotEq } else { CompareOp::Eq };
                match set.pop_first() {
                    Some(value) => Operation::Atomic {
                        attribute: self.clone(),
                        op,
                        value,
                    },
                    None => Operation::None(self.clone()),
                }
            }
            _ => Operation::In {
                attribute: self.clone(),
                values: set,
                negated,
            },
        }
    }

    pub fn is_null(&self) -> CoreResult<Operation> {
        match self.kind() {
            AttributeKind::AsOf(_) => Err(self.not_supported_on_as_of("is_null")),
            AttributeKind::Mapped(m) => Ok(Operation::mapped(m.mapper().clone(), m.wrapped_attribute().is_null()?)),
            _ => Ok(Operation::IsNull(self.clone())),
        }
    }

    pub fn is_not_null(&self) -> CoreResult<Operation> {
        match self.kind() {
            AttributeKind::AsOf(_) => Err(self.not_supported_on_as_of("is_not_null")),
            AttributeKind::Mapped(m) => Ok(Operation::mapped(
                m.mapper().clone(),
                m.wrapped_attribute().is_not_null()?,
            )),
            _ => Ok(Operation::IsNotNull(self.clone())),
        }
    }

    // ---- operations against other attributes ----

    /// Equality with another attribute. Within one entity this is a filter on each object;
    /// across entities it is a join (see join_eq).
    pub fn eq_attribute(&self, other: &Attribute) -> CoreResult<Operation> {
        self.check_comparable(other)?;
        match self.kind() {
            AttributeKind::Mapped(m) => m.filter_eq_for_mapped_attribute(self, other),
            AttributeKind::AsOf(d) => AsOfAttribute::from_parts(self, d).eq_attribute(other),
            _ => {
                if self.owner_entity() == other.owner_entity() {
                    self.filter_eq(other)
                } else {
                    self.join_eq(other)
                }
            }
        }
    }

    /// A join to the other attribute's entity. When both entities are partitioned by the same
    /// kind of source attribute, the join also equates the two source attributes; and each
    /// bitemporal dimension of this entity with a same-named one on the other is equated too.
    pub fn join_eq(&self, other: &Attribute) -> CoreResult<Operation> {
        self.check_comparable(other)?;
        match self.kind() {
            AttributeKind::Mapped(_) => Err(CoreError::unsupported(format!("join_eq on mapped attribute {}", self))),
            _ => Ok(self.join_eq_with_source_and_as_of_check(other)),
        }
    }

    /// Equality between two attributes of the same object (or of objects related to it).
    pub fn filter_eq(&self, other: &Attribute) -> CoreResult<Operation> {
        self.check_comparable(other)?;
        match self.kind() {
            AttributeKind::Mapped(m) => m.filter_eq_for_mapped_attribute(self, other),
            _ => Ok(self.filter_eq_with_check(other)),
        }
    }

    pub fn not_eq_attribute(&self, other: &Attribute) -> CoreResult<Operation> {
        self.compare_attribute(CompareOp::NotEq, other)
    }

    pub fn greater_than_attribute(&self, other: &Attribute) -> CoreResult<Operation> {
        self.compare_attribute(CompareOp::GreaterThan, other)
    }

    pub fn greater_than_equals_attribute(&self, other: &Attribute) -> CoreResult<Operation> {
        self.compare_attribute(CompareOp::GreaterThanEquals, other)
    }

    pub fn less_than_attribute(&self, other: &Attribute) -> CoreResult<Operation> {
        self.compare_attribute(CompareOp::LessThan, other)
    }

    pub fn less_than_equals_attribute(&self, other: &Attribute) -> CoreResult<Operation> {
        self.compare_attribute(CompareOp::LessThanEquals, other)
    }

    /// Anything but equality only works within one object: there are no non-equality joins.
    fn compare_attribute(&self, op: CompareOp, other: &Attribute) -> CoreResult<Operation> {
        if op == CompareOp::Eq {
            return self.eq_attribute(other);
        }
        self.check_comparable(other)?;
        match self.kind() {
            AttributeKind::AsOf(_) => Err(self.not_supported_on_as_of(op.name())),
            AttributeKind::Mapped(m) => Ok(Operation::mapped(
                m.mapper().clone(),
                m.wrapped_attribute().compare_attribute(op, other)?,
            )),
            _ => {
                if !other.is_mapped() && self.owner_entity() == other.owner_entity() {
                    Ok(Operation::SelfComparison {
                        left: self.clone(),
                        op,
                        right: other.clone(),
                    })
                } else {
                    Err(CoreError::unsupported("non-equality joins are not supported"))
                }
            }
        }
    }

    fn check_comparable(&self, other: &Attribute) -> CoreResult<()> {
        let (mine, theirs) = (self.value_type(), other.value_type());
        if mine == theirs || (mine.is_numeric() && theirs.is_numeric()) {
            Ok(())
        } else {
            Err(CoreError::invalid_input(format!(
                "can't compare {} ({}) with {} ({})",
                self, mine, other, theirs
            )))
        }
    }

    pub(crate) fn join_eq_with_source_and_as_of_check(&self, other: &Attribute) -> Operation {
        let mut pairs: Option<Vec<Mapper>> = None;
        if let Some(source_type) = self.source_attribute_type() {
            if !other.is_mapped() && Some(source_type) == other.source_attribute_type() {
                if let (Some(mine), Some(theirs)) = (self.source_attribute(), other.source_attribute()) {
                    debug!("joining {} to {}: adding source attributes", self, other);
                    pairs = Some(vec![
                        self.construct_equality_mapper(other),
                        mine.construct_equality_mapper(&theirs).as_auto_generated(),
                    ]);
                }
            }
        }
        let pairs = self.add_as_of_pairs(other, pairs);
        let mapper = match pairs {
            Some(mut p) if !p.is_empty() => {
                let first = p.remove(0);
                Mapper::multi_equality(first, p)
            }
            _ => {
                debug!("joining {} to {} on the one pair", self, other);
                self.construct_equality_mapper(other)
            }
        }
        .as_anonymous();
        let target = match other.as_mapped() {
            Some(m) => m.wrapped_attribute().clone(),
            None => other.clone(),
        };
        Operation::mapped(mapper, Operation::All(target))
    }

    /// Adds an equality for each bitemporal dimension of this entity that has a same-named one
    /// on the other entity. None in, None out, if there are none.
    fn add_as_of_pairs(&self, other: &Attribute, pairs: Option<Vec<Mapper>>) -> Option<Vec<Mapper>> {
        if other.is_mapped() {
            return pairs;
        }
        let mut pairs = pairs;
        let theirs = other.as_of_attributes();
        for mine in self.as_of_attributes() {
            if let Some(compatible) = mine.get_compatible_as_of_attribute(&theirs) {
                debug!("joining {} to {}: adding {}", self, other, mine);
                let p = pairs.get_or_insert_with(|| vec![self.construct_equality_mapper(other)]);
                p.push(mine.attribute().construct_equality_mapper(compatible.attribute()).as_auto_generated());
            }
        }
        pairs
    }

    pub(crate) fn filter_eq_with_check(&self, other: &Attribute) -> Operation {
        match other.as_mapped() {
            Some(m) => {
                let mapper = self.construct_equality_mapper(other).as_anonymous();
                Operation::mapped(mapper, Operation::All(m.wrapped_attribute().clone()))
            }
            None => Operation::SelfComparison {
                left: self.clone(),
                op: CompareOp::Eq,
                right: other.clone(),
            },
        }
    }

    /// The one-pair mapper from this attribute to `right`; as-of attributes get their own kinds.
    pub fn construct_equality_mapper(&self, right: &Attribute) -> Mapper {
        match self.as_as_of() {
            Some(left) => match right.as_as_of() {
                Some(r) => Mapper::as_of_equality(left, r),
                None => Mapper::as_of_timestamp_equality(left, right.clone()),
            },
            None => Mapper::equality(self.clone(), right.clone()),
        }
    }

    // ---- ordering, and operations rebuilt from results ----

    pub fn ascending_order_by(&self) -> CoreResult<OrderBy> {
        if self.is_as_of_attribute() {
            return Err(CoreError::unsupported(Util::NOT_SUPPORTED_ON_AS_OF));
        }
        Ok(OrderBy::new(self.clone(), true))
    }

    pub fn descending_order_by(&self) -> CoreResult<OrderBy> {
        if self.is_as_of_attribute() {
            return Err(CoreError::unsupported(Util::NOT_SUPPORTED_ON_AS_OF));
        }
        Ok(OrderBy::new(self.clone(), false))
    }

    /// An operation that finds the given result again: equality with its value of this attribute.
    pub fn operation_from_result(&self, result: &dyn DataObject, pool: &mut OperationPool) -> CoreResult<Operation> {
        let value = self.value_of(result);
        self.operation_for_value(value, pool)
    }

    /// Like operation_from_result, with the value read from `original` by `left`.
    pub fn operation_from_original(
        &self,
        original: &dyn DataObject,
        left: &Attribute,
        pool: &mut OperationPool,
    ) -> CoreResult<Operation> {
        let value = left.value_of(original);
        self.operation_for_value(value, pool)
    }

    fn operation_for_value(&self, value: Option<Value>, pool: &mut OperationPool) -> CoreResult<Operation> {
        let as_of = self.is_as_of_attribute();
        pool.get_or_create(self, value, |value| match value {
            None if !as_of => self.is_null(),
            v => self.eq(v.cloned()),
        })
    }

    fn not_supported_on_as_of(&self, what: &str) -> CoreError {
        CoreError::unsupported(format!("{} is not supported on as of attribute {}", what, self))
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.kind, &other.kind) {
            return true;
        }
        match (self.kind(), other.kind()) {
            (AttributeKind::Column(a), AttributeKind::Column(b)) => a.metadata.id == b.metadata.id,
            (AttributeKind::AsOf(a), AttributeKind::AsOf(b)) => a.metadata().id == b.metadata().id,
            (AttributeKind::Mapped(a), AttributeKind::Mapped(b)) => a == b,
            (AttributeKind::Calculated(a), AttributeKind::Calculated(b)) => a.calculator() == b.calculator(),
            _ => false,
        }
    }
}

impl Eq for Attribute {}

impl Hash for Attribute {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.kind() {
            AttributeKind::Column(c) => {
                0_u8.hash(state);
                c.metadata.id.hash(state);
            }
            AttributeKind::AsOf(d) => {
                1_u8.hash(state);
                d.metadata().id.hash(state);
            }
            AttributeKind::Mapped(m) => {
                2_u8.hash(state);
                m.hash(state);
            }
            AttributeKind::Calculated(c) => {
                3_u8.hash(state);
                c.calculator().hash(state);
            }
        }
    }
}

/// "Entity.attribute"; mapped attributes show the entity they start from.
impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            AttributeKind::Column(c) => write!(f, "{}.{}", c.metadata.entity.name(), c.metadata.name),
            AttributeKind::AsOf(d) => write!(f, "{}.{}", d.metadata().entity.name(), d.metadata().name),
            AttributeKind::Mapped(m) => write!(f, "{}.{}", m.mapper().result_entity().name(), m.wrapped_attribute()),
            AttributeKind::Calculated(c) => write!(f, "{}", c.calculator().sql_expression()),
        }
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Attribute({})", self)
    }
}
