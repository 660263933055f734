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
use crate::finder::operation::Operation;
use crate::model::attribute::{Attribute, AttributeBuilder, AttributeKind, AttributeMetadata};
use crate::model::value::{DataObject, Timestamp, Value, ValueAccessor, ValueType};
use crate::util::Util;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::*;

/// The from/to columns of one bitemporal dimension, and how to read them.
pub struct AsOfBounds {
    from: Attribute,
    to: Attribute,
    infinity: Timestamp,
    to_is_inclusive: bool,
    future_expiring_rows_exist: bool,
    default_date: Option<Timestamp>,
    is_processing_date: bool,
    infinity_null: bool,
}

impl AsOfBounds {
    /// Defaults: the usual infinity date, `to` exclusive, a business-time dimension.
    pub fn new(from: &Attribute, to: &Attribute) -> AsOfBounds {
        AsOfBounds {
            from: from.clone(),
            to: to.clone(),
            infinity: Util::default_infinity_date(),
            to_is_inclusive: false,
            future_expiring_rows_exist: false,
            default_date: None,
            is_processing_date: false,
            infinity_null: false,
        }
    }

    pub fn infinity(mut self, infinity: Timestamp) -> Self {
        self.infinity = infinity;
        self
    }

    pub fn to_is_inclusive(mut self, inclusive: bool) -> Self {
        self.to_is_inclusive = inclusive;
        self
    }

    pub fn future_expiring_rows_exist(mut self, exist: bool) -> Self {
        self.future_expiring_rows_exist = exist;
        self
    }

    pub fn default_date(mut self, date: Timestamp) -> Self {
        self.default_date = Some(date);
        self
    }

    pub fn processing_date(mut self) -> Self {
        self.is_processing_date = true;
        self
    }

    /// Whether a null `to` column means infinity.
    pub fn infinity_null(mut self, infinity_null: bool) -> Self {
        self.infinity_null = infinity_null;
        self
    }
}

pub struct AsOfDefinition {
    metadata: AttributeMetadata,
    accessor: Arc<dyn ValueAccessor>,
    bounds: AsOfBounds,
}

impl AsOfDefinition {
    pub fn metadata(&self) -> &AttributeMetadata {
        &self.metadata
    }
    pub(crate) fn accessor(&self) -> &Arc<dyn ValueAccessor> {
        &self.accessor
    }
    pub fn from_attribute(&self) -> &Attribute {
        &self.bounds.from
    }
    pub fn to_attribute(&self) -> &Attribute {
        &self.bounds.to
    }
}

impl AttributeBuilder {
    /// Registers a bitemporal dimension. The accessor reads the date the object was found as of;
    /// `bounds` names the two timestamp columns holding the row's validity interval.
    pub fn as_of<A: ValueAccessor + 'static>(self, bounds: AsOfBounds, accessor: A) -> CoreResult<AsOfAttribute> {
        let metadata = self.build_metadata();
        if metadata.value_type() != ValueType::Timestamp {
            return Err(CoreError::invalid_input(format!("as of attribute {} must be a timestamp", metadata.name())));
        }
        for bound in [&bounds.from, &bounds.to] {
            if bound.value_type() != ValueType::Timestamp || bound.is_as_of_attribute() || bound.is_mapped() {
                return Err(CoreError::invalid_input(format!(
                    "{} can't bound as of attribute {}",
                    bound,
                    metadata.name()
                )));
            }
            if bound.owner_entity() != *metadata.entity() {
                return Err(CoreError::invalid_input(format!(
                    "{} is not an attribute of {}",
                    bound,
                    metadata.entity()
                )));
            }
        }
        let definition = Arc::new(AsOfDefinition {
            metadata,
            accessor: Arc::new(accessor),
            bounds,
        });
        let attribute = Attribute::new(AttributeKind::AsOf(definition.clone()));
        Ok(AsOfAttribute { attribute, definition })
    }
}

/// One bitemporal dimension (business or processing time) of an entity. Each row is valid over
/// `[from, to)`, or `[from, to]` when the dimension is to-inclusive; a `to` of the infinity date
/// means the row has no known expiry.
#[derive(Clone)]
pub struct AsOfAttribute {
    attribute: Attribute,
    definition: Arc<AsOfDefinition>,
}

impl AsOfAttribute {
    pub fn from_attribute(attribute: &Attribute) -> Option<AsOfAttribute> {
        match attribute.kind() {
            AttributeKind::AsOf(d) => Some(Self::from_parts(attribute, d)),
            _ => None,
        }
    }

    pub(crate) fn from_parts(attribute: &Attribute, definition: &Arc<AsOfDefinition>) -> AsOfAttribute {
        AsOfAttribute {
            attribute: attribute.clone(),
            definition: definition.clone(),
        }
    }

    /// This dimension as a plain attribute, for everything that isn't particular to as-of.
    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    pub fn name(&self) -> &str {
        self.definition.metadata.name()
    }

    pub fn from_column(&self) -> &Attribute {
        &self.definition.bounds.from
    }

    pub fn to_column(&self) -> &Attribute {
        &self.definition.bounds.to
    }

    pub fn infinity_date(&self) -> Timestamp {
        self.definition.bounds.infinity
    }

    pub fn is_to_inclusive(&self) -> bool {
        self.definition.bounds.to_is_inclusive
    }

    pub fn future_expiring_rows_exist(&self) -> bool {
        self.definition.bounds.future_expiring_rows_exist
    }

    pub fn default_date(&self) -> Option<Timestamp> {
        self.definition.bounds.default_date
    }

    pub fn is_processing_date(&self) -> bool {
        self.definition.bounds.is_processing_date
    }

    pub fn is_infinity_null(&self) -> bool {
        self.definition.bounds.infinity_null
    }

    fn infinity_millis(&self) -> i64 {
        self.infinity_date().timestamp_millis()
    }

    pub fn from_millis(&self, row: &dyn DataObject) -> CoreResult<i64> {
        match self.from_column().value_of(row).and_then(|v| v.as_timestamp()) {
            Some(t) => Ok(t.timestamp_millis()),
            None => Err(CoreError::invalid_input(format!("{} has no {}", self, self.from_column()))),
        }
    }

    /// A null `to` reads as infinity when the dimension says so.
    pub fn to_millis(&self, row: &dyn DataObject) -> CoreResult<i64> {
        match self.to_column().value_of(row).and_then(|v| v.as_timestamp()) {
            Some(t) => Ok(t.timestamp_millis()),
            None if self.is_infinity_null() => Ok(self.infinity_millis()),
            None => Err(CoreError::invalid_input(format!("{} has no {}", self, self.to_column()))),
        }
    }

    /// Whether the row is valid at `as_of`. At the infinity date itself, that means the row
    /// doesn't expire, however `to` is bounded.
    pub fn data_matches(&self, row: &dyn DataObject, as_of: Timestamp) -> CoreResult<bool> {
        let mut as_of_millis = as_of.timestamp_millis();
        if as_of_millis != self.infinity_millis() && !self.is_to_inclusive() {
            as_of_millis += 1;
        }
        Ok(self.from_millis(row)? < as_of_millis && self.to_millis(row)? >= as_of_millis)
    }

    /// Whether the row's interval overlaps `[start, end)`. Touching isn't overlapping.
    pub fn has_range_overlap(&self, row: &dyn DataObject, start_millis: i64, end_millis: i64) -> CoreResult<bool> {
        let (from, to) = (self.from_millis(row)?, self.to_millis(row)?);
        Ok(!(end_millis <= from || start_millis >= to))
    }

    /// data_matches, given bounds already read from a row.
    pub fn as_of_date_matches_range(&self, as_of: Timestamp, from: Timestamp, to: Timestamp) -> bool {
        let infinity = self.infinity_date();
        if as_of == infinity {
            return to == infinity;
        }
        let inclusive = self.is_to_inclusive();
        let to_ok = to > as_of || (inclusive && to == as_of);
        let from_ok = from < as_of || (!inclusive && from == as_of);
        to_ok && from_ok
    }

    /// The dimension of `others` with the same name as this one: the one to correlate with it
    /// when joining two dated entities.
    pub fn get_compatible_as_of_attribute<'a>(&self, others: &'a [AsOfAttribute]) -> Option<&'a AsOfAttribute> {
        others.iter().find(|o| o.name() == self.name())
    }

    /// Every dimension's interval is non-empty (from strictly before to).
    pub fn is_milestoning_valid(row: &dyn DataObject, dimensions: &[AsOfAttribute]) -> CoreResult<bool> {
        for d in dimensions {
            if d.from_millis(row)? >= d.to_millis(row)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// is_milestoning_valid, with the first degenerate dimension reported as an error.
    pub fn check_milestoning_valid(row: &dyn DataObject, dimensions: &[AsOfAttribute]) -> CoreResult<()> {
        for d in dimensions {
            let (from, to) = (d.from_millis(row)?, d.to_millis(row)?);
            if from >= to {
                return Err(CoreError::degenerate_interval(format!(
                    "{}: from {} is not before to {}",
                    d,
                    Util::useful_date_format(from),
                    Util::useful_date_format(to)
                )));
            }
        }
        Ok(())
    }

    /// Whether the two rows are valid at some common point in every dimension.
    pub fn is_milestoning_overlap(
        first: &dyn DataObject,
        second: &dyn DataObject,
        dimensions: &[AsOfAttribute],
    ) -> CoreResult<bool> {
        for d in dimensions {
            let (from1, to1) = (d.from_millis(first)?, d.to_millis(first)?);
            let (from2, to2) = (d.from_millis(second)?, d.to_millis(second)?);
            if from1 >= to2 || from2 >= to1 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Matches rows whose boundary on the inclusive side (`to` if to-inclusive, else `from`)
    /// equals the as-of date: the row about to expire, or the one that just took effect.
    pub fn equals_edge_point(&self) -> Operation {
        let edge = if self.is_to_inclusive() {
            self.to_column()
        } else {
            self.from_column()
        };
        Operation::AsOfEdgePoint {
            attribute: self.clone(),
            edge: edge.clone(),
        }
    }

    pub fn equals_infinity(&self) -> Operation {
        self.eq_date(self.infinity_date())
    }

    /// None (matches nothing) for no date.
    pub fn eq_date(&self, date: impl Into<Option<Timestamp>>) -> Operation {
        match date.into() {
            Some(date) => Operation::AsOfEq {
                attribute: self.clone(),
                date,
            },
            None => Operation::None(self.attribute.clone()),
        }
    }

    pub(crate) fn eq_value(&self, value: Option<Value>) -> CoreResult<Operation> {
        match value {
            None => Ok(self.eq_date(None::<Timestamp>)),
            Some(Value::Timestamp(t)) => Ok(self.eq_date(t)),
            Some(other) => Err(CoreError::invalid_input(format!("{} is not a date, for {}", other, self))),
        }
    }

    /// A query sees one point in each dimension, so this is eq of the one distinct date given.
    /// Nulls are skipped; an error if there is more than one date, or none.
    pub fn in_values<I>(&self, values: I) -> CoreResult<Operation>
    where
        I: IntoIterator<Item = Option<Value>>,
    {
        let distinct = self.distinct_dates(values)?;
        if distinct.len() > 1 {
            return Err(CoreError::unsupported("only one as of attribute value is supported"));
        }
        self.eq_value(distinct.into_iter().next())
    }

    /// Like in_values, but more than one date gives an operation matching nothing instead.
    pub fn in_values_with_max<I>(&self, values: I) -> CoreResult<Operation>
    where
        I: IntoIterator<Item = Option<Value>>,
    {
        let distinct = self.distinct_dates(values)?;
        if distinct.len() > 1 {
            debug!("{} distinct dates for {}; matching nothing", distinct.len(), self);
            return Ok(Operation::None(self.attribute.clone()));
        }
        self.eq_value(distinct.into_iter().next())
    }

    fn distinct_dates<I>(&self, values: I) -> CoreResult<BTreeSet<Value>>
    where
        I: IntoIterator<Item = Option<Value>>,
    {
        let distinct: BTreeSet<Value> = values.into_iter().flatten().collect();
        if distinct.is_empty() {
            return Err(CoreError::invalid_input(
                "must have at least one non-null as of attribute value",
            ));
        }
        Ok(distinct)
    }

    /// Correlates this dimension with another entity's (as-of or plain timestamp) attribute.
    pub(crate) fn eq_attribute(&self, other: &Attribute) -> CoreResult<Operation> {
        if other.value_type() != ValueType::Timestamp {
            return Err(CoreError::invalid_input(format!("can't correlate {} with {}", self, other)));
        }
        let mapper = self.attribute.construct_equality_mapper(other).as_anonymous();
        let target = match other.as_mapped() {
            Some(m) => m.wrapped_attribute().clone(),
            None => other.clone(),
        };
        Ok(Operation::mapped(mapper, Operation::All(target)))
    }

    pub fn set_until(&self, _owner: &mut dyn DataObject, _value: Option<Value>, _until: Timestamp) -> CoreResult<()> {
        Err(CoreError::unsupported("cannot set an as of attribute until"))
    }
}

impl PartialEq for AsOfAttribute {
    fn eq(&self, other: &Self) -> bool {
        self.attribute == other.attribute
    }
}

impl Eq for AsOfAttribute {}

impl Hash for AsOfAttribute {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.attribute.hash(state);
    }
}

impl fmt::Display for AsOfAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.attribute)
    }
}

impl fmt::Debug for AsOfAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AsOfAttribute({})", self.attribute)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::finder::mapper::Mapper;
    use crate::model::test_entities::{OrderData, TestEntities};

    fn millis_before(t: Timestamp, millis: i64) -> Timestamp {
        Util::timestamp_from_millis(t.timestamp_millis() - millis).unwrap()
    }

    #[test]
    fn point_in_range_with_exclusive_to() {
        Util::initialize_tracing();
        let e = TestEntities::get();
        let bd = &e.order.business_date;
        assert_eq!(bd.infinity_date(), TestEntities::date("9999-12-31"));
        assert!(!bd.is_to_inclusive());
        // business interval is 2020-01-01 to 2020-06-01
        let row = OrderData::new(1);
        assert!(bd.data_matches(&row, TestEntities::date("2020-03-01")).unwrap());
        assert!(!bd.data_matches(&row, TestEntities::date("2020-06-01")).unwrap());
        assert!(bd.data_matches(&row, millis_before(TestEntities::date("2020-06-01"), 1)).unwrap());
        assert!(bd.data_matches(&row, TestEntities::date("2020-01-01")).unwrap());
        assert!(!bd.data_matches(&row, millis_before(TestEntities::date("2020-01-01"), 1)).unwrap());
    }

    #[test]
    fn infinity_matches_only_rows_that_do_not_expire() {
        Util::initialize_tracing();
        let e = TestEntities::get();
        let mut row = OrderData::new(1);
        let bd = &e.order.business_date;
        assert!(!bd.data_matches(&row, bd.infinity_date()).unwrap());
        row.business_to = Some(bd.infinity_date());
        assert!(bd.data_matches(&row, bd.infinity_date()).unwrap());
        assert!(bd.data_matches(&row, TestEntities::date("2030-01-01")).unwrap());

        // processing time: to-inclusive, and a null to is infinity
        let pd = &e.order.processing_date;
        assert!(pd.is_to_inclusive());
        assert!(pd.is_processing_date());
        assert!(row.processing_to.is_none());
        assert!(pd.data_matches(&row, pd.infinity_date()).unwrap());
        row.processing_to = Some(TestEntities::date("2021-01-01"));
        assert!(!pd.data_matches(&row, pd.infinity_date()).unwrap());
        assert!(pd.data_matches(&row, TestEntities::date("2021-01-01")).unwrap());
        assert!(!pd.data_matches(&row, TestEntities::date("2020-01-01")).unwrap());
    }

    #[test]
    fn missing_bounds_are_an_error() {
        let e = TestEntities::get();
        let mut row = OrderData::new(1);
        row.business_to = None;
        assert!(e.order.business_date.data_matches(&row, TestEntities::date("2020-03-01")).is_err());
    }

    #[test]
    fn touching_ranges_do_not_overlap() {
        Util::initialize_tracing();
        let e = TestEntities::get();
        let bd = &e.order.business_date;
        let row = OrderData::new(1);
        let (from, to) = (bd.from_millis(&row).unwrap(), bd.to_millis(&row).unwrap());
        assert!(!bd.has_range_overlap(&row, to, to + 1).unwrap());
        assert!(!bd.has_range_overlap(&row, from - 10, from).unwrap());
        assert!(bd.has_range_overlap(&row, to - 1, to + 1).unwrap());
        assert!(bd.has_range_overlap(&row, from - 10, from + 1).unwrap());
        assert!(bd.has_range_overlap(&row, from + 5, to - 5).unwrap());
    }

    #[test]
    fn date_matches_range() {
        let e = TestEntities::get();
        let bd = &e.order.business_date;
        let (from, to) = (TestEntities::date("2020-01-01"), TestEntities::date("2020-06-01"));
        assert!(bd.as_of_date_matches_range(TestEntities::date("2020-03-01"), from, to));
        assert!(bd.as_of_date_matches_range(from, from, to));
        assert!(!bd.as_of_date_matches_range(to, from, to));
        assert!(bd.as_of_date_matches_range(bd.infinity_date(), from, bd.infinity_date()));
        let pd = &e.order.processing_date;
        assert!(pd.as_of_date_matches_range(to, from, to));
        assert!(!pd.as_of_date_matches_range(from, from, to));
    }

    #[test]
    fn infinity_only_matches_an_open_ended_range() {
        let e = TestEntities::get();
        let bd = &e.order.business_date;
        assert!(!bd.is_to_inclusive());
        let infinity = bd.infinity_date();
        let from = TestEntities::date("2020-01-01");
        assert!(bd.as_of_date_matches_range(infinity, from, infinity));
        // from doesn't matter once to is open-ended
        assert!(bd.as_of_date_matches_range(infinity, infinity, infinity));
        assert!(!bd.as_of_date_matches_range(infinity, from, millis_before(infinity, 1)));
        let past_infinity = Util::timestamp_from_millis(infinity.timestamp_millis() + 1000).unwrap();
        assert!(!bd.as_of_date_matches_range(infinity, from, past_infinity));
    }

    #[test]
    fn degenerate_intervals_are_invalid() {
        Util::initialize_tracing();
        let e = TestEntities::get();
        let dims = e.order.entity.as_of_attributes();
        let mut row = OrderData::new(1);
        assert!(AsOfAttribute::is_milestoning_valid(&row, dims).unwrap());
        AsOfAttribute::check_milestoning_valid(&row, dims).unwrap();
        row.business_to = row.business_from;
        assert!(!AsOfAttribute::is_milestoning_valid(&row, dims).unwrap());
        let err = AsOfAttribute::check_milestoning_valid(&row, dims).unwrap_err();
        assert!(matches!(err, CoreError::DegenerateInterval { .. }));
        row.business_to = Some(TestEntities::date("2019-01-01"));
        assert!(!AsOfAttribute::is_milestoning_valid(&row, dims).unwrap());
    }

    #[test]
    fn milestoning_overlap_needs_every_dimension() {
        let e = TestEntities::get();
        let dims = e.order.entity.as_of_attributes();
        let first = OrderData::new(1);
        let mut second = OrderData::new(2);
        assert!(AsOfAttribute::is_milestoning_overlap(&first, &second, dims).unwrap());
        second.business_from = first.business_to;
        second.business_to = Some(TestEntities::date("2021-01-01"));
        assert!(!AsOfAttribute::is_milestoning_overlap(&first, &second, dims).unwrap());
        second.business_from = Some(TestEntities::date("2020-05-01"));
        assert!(AsOfAttribute::is_milestoning_overlap(&first, &second, dims).unwrap());
        second.processing_to = Some(TestEntities::date("2020-01-01"));
        second.processing_from = Some(TestEntities::date("2019-01-01"));
        assert!(!AsOfAttribute::is_milestoning_overlap(&first, &second, dims).unwrap());
    }

    #[test]
    fn in_collapses_to_one_date() {
        Util::initialize_tracing();
        let e = TestEntities::get();
        let bd = &e.order.business_date;
        let d1 = Value::Timestamp(TestEntities::date("2020-02-02"));
        let d2 = Value::Timestamp(TestEntities::date("2020-03-03"));
        assert_eq!(
            bd.in_values(vec![Some(d1.clone()), None, Some(d1.clone())]).unwrap(),
            bd.eq_date(TestEntities::date("2020-02-02"))
        );
        let err = bd.in_values(vec![Some(d1.clone()), Some(d2.clone())]).unwrap_err();
        assert!(err.to_string().contains("only one as of attribute value is supported"));
        let err = bd.in_values(vec![None, None]).unwrap_err();
        assert!(err.to_string().contains("must have at least one non-null as of attribute value"));
        assert!(bd.in_values_with_max(vec![Some(d1.clone()), Some(d2)]).unwrap().is_none());
        assert!(bd.in_values_with_max(Vec::new()).is_err());
        // and through the plain attribute
        assert!(bd.attribute().in_values(vec![d1]).is_ok());
    }

    #[test]
    fn eq_and_edge_points() {
        Util::initialize_tracing();
        let e = TestEntities::get();
        let bd = &e.order.business_date;
        assert!(bd.eq_date(None::<Timestamp>).is_none());
        assert!(bd.attribute().eq(None::<Value>).unwrap().is_none());
        assert_eq!(
            bd.attribute().eq(Value::Timestamp(TestEntities::date("2020-02-02"))).unwrap(),
            bd.eq_date(TestEntities::date("2020-02-02"))
        );
        assert!(bd.attribute().eq(Value::Integer(2)).is_err());
        assert_eq!(bd.equals_infinity(), bd.eq_date(bd.infinity_date()));
        match bd.equals_edge_point() {
            Operation::AsOfEdgePoint { edge, .. } => assert_eq!(edge, e.order.business_from),
            other => panic!("unexpected {}", other),
        }
        match e.order.processing_date.equals_edge_point() {
            Operation::AsOfEdgePoint { edge, .. } => assert_eq!(edge, e.order.processing_to),
            other => panic!("unexpected {}", other),
        }
        assert!(bd.attribute().greater_than(Value::Timestamp(bd.infinity_date())).unwrap_err().is_unsupported());
        assert!(bd.attribute().is_null().unwrap_err().is_unsupported());
    }

    #[test]
    fn compatible_dimensions_are_found_by_name() {
        let e = TestEntities::get();
        let account_dims = e.account.entity.as_of_attributes();
        assert_eq!(
            e.order.business_date.get_compatible_as_of_attribute(account_dims),
            Some(&e.account.business_date)
        );
        assert_eq!(e.order.processing_date.get_compatible_as_of_attribute(account_dims), None);
        assert!(e.order.business_date.get_compatible_as_of_attribute(&[]).is_none());
    }

    #[test]
    fn correlating_two_dimensions() {
        Util::initialize_tracing();
        let e = TestEntities::get();
        let op = e.order.business_date.attribute().eq_attribute(e.account.business_date.attribute()).unwrap();
        match op {
            Operation::Mapped(m) => {
                assert_eq!(
                    m.mapper,
                    Mapper::as_of_equality(e.order.business_date.clone(), e.account.business_date.clone())
                );
                assert_eq!(m.operation, Operation::All(e.account.business_date.attribute().clone()));
            }
            other => panic!("unexpected {}", other),
        }
        let op = e.order.business_date.attribute().eq_attribute(&e.account.business_from).unwrap();
        assert!(matches!(op, Operation::Mapped(ref m) if m.mapper == Mapper::as_of_timestamp_equality(e.order.business_date.clone(), e.account.business_from.clone())));
        assert!(e.order.business_date.attribute().eq_attribute(&e.account.id).is_err());
    }

    #[test]
    fn cannot_set_until() {
        let e = TestEntities::get();
        let mut row = OrderData::new(1);
        let err = e
            .order
            .business_date
            .set_until(&mut row, None, TestEntities::date("2020-01-01"))
            .unwrap_err();
        assert!(err.to_string().contains("cannot set an as of attribute until"));
    }
}
