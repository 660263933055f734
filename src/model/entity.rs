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
use crate::model::as_of_attribute::AsOfAttribute;
use crate::model::attribute::Attribute;
use crate::model::value::{DataObject, ValueType};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};
use tracing::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// Identity of a column or as-of attribute: which entity, and which field of it. Assigned once at
/// registration, so comparing two attributes is comparing two of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeId {
    pub entity: EntityId,
    pub field: u32,
}

/// The type of the attribute that partitions an entity's rows across sources (databases). Two
/// entities can only be joined on their source attributes if these are the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceAttributeType {
    Integer,
    String,
}

impl SourceAttributeType {
    pub fn value_type(&self) -> ValueType {
        match self {
            SourceAttributeType::Integer => ValueType::Integer,
            SourceAttributeType::String => ValueType::String,
        }
    }
}

/// What the (external) cache offers this core: a look in memory for the objects matching an
/// operation. None means "can't tell without going to the database", not "no match".
pub trait ObjectPortal: Send + Sync {
    fn find_in_memory(&self, operation: &Operation) -> Option<Vec<Arc<dyn DataObject>>>;
}

struct EntityDimensions {
    source_attribute: Option<Attribute>,
    as_of_attributes: Vec<AsOfAttribute>,
}

/// Per-entity metadata that attributes point back to: the entity's name, its source attribute,
/// its bitemporal dimensions, and its object portal.
///
/// The dimensions and the portal are themselves made of (or refer to) attributes of this
/// entity, so they are set once, after those attributes exist.
pub struct EntityMetadata {
    id: EntityId,
    name: Arc<str>,
    source_attribute_type: Option<SourceAttributeType>,
    dimensions: OnceLock<EntityDimensions>,
    portal: OnceLock<Arc<dyn ObjectPortal>>,
}

impl EntityMetadata {
    pub fn new(id: u32, name: &str, source_attribute_type: Option<SourceAttributeType>) -> Arc<EntityMetadata> {
        Arc::new(EntityMetadata {
            id: EntityId(id),
            name: Arc::from(name),
            source_attribute_type,
            dimensions: OnceLock::new(),
            portal: OnceLock::new(),
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_attribute_type(&self) -> Option<SourceAttributeType> {
        self.source_attribute_type
    }

    pub fn set_dimensions(
        &self,
        source_attribute: Option<Attribute>,
        as_of_attributes: Vec<AsOfAttribute>,
    ) -> CoreResult<()> {
        if source_attribute.is_some() != self.source_attribute_type.is_some() {
            return Err(CoreError::invalid_input(format!(
                "{} has a source attribute type if and only if it has a source attribute",
                self.name
            )));
        }
        debug!(
            "{}: {} as of attribute(s), source attribute: {}",
            self.name,
            as_of_attributes.len(),
            source_attribute.is_some()
        );
        self.dimensions
            .set(EntityDimensions {
                source_attribute,
                as_of_attributes,
            })
            .map_err(|_| CoreError::invalid_input(format!("dimensions of {} were already set", self.name)))
    }

    pub fn source_attribute(&self) -> Option<&Attribute> {
        self.dimensions.get().and_then(|d| d.source_attribute.as_ref())
    }

    /// Empty for an entity that isn't dated.
    pub fn as_of_attributes(&self) -> &[AsOfAttribute] {
        match self.dimensions.get() {
            Some(d) => &d.as_of_attributes,
            None => &[],
        }
    }

    pub fn is_dated(&self) -> bool {
        !self.as_of_attributes().is_empty()
    }

    pub fn set_object_portal(&self, portal: Arc<dyn ObjectPortal>) -> CoreResult<()> {
        self.portal
            .set(portal)
            .map_err(|_| CoreError::invalid_input(format!("object portal of {} was already set", self.name)))
    }

    pub fn object_portal(&self) -> Option<&Arc<dyn ObjectPortal>> {
        self.portal.get()
    }
}

impl PartialEq for EntityMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityMetadata {}

impl Hash for EntityMetadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// (not derived: the dimensions point back here)
impl fmt::Debug for EntityMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityMetadata")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("source_attribute_type", &self.source_attribute_type)
            .finish()
    }
}

impl fmt::Display for EntityMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::test_entities::TestEntities;
    use crate::util::Util;

    #[test]
    fn dimensions_are_set_once() {
        Util::initialize_tracing();
        let e = TestEntities::get();
        assert_eq!(e.order.entity.as_of_attributes().len(), 2);
        assert!(e.order.entity.is_dated());
        assert!(e.order.entity.source_attribute().is_some());
        assert!(e
            .order
            .entity
            .set_dimensions(Some(e.order.source.clone()), vec![])
            .is_err());
    }

    #[test]
    fn source_attribute_must_match_its_type() {
        let plain = EntityMetadata::new(900, "Plain", None);
        let source_typed = EntityMetadata::new(901, "Sourced", Some(SourceAttributeType::String));
        let e = TestEntities::get();
        assert!(plain.set_dimensions(Some(e.order.source.clone()), vec![]).is_err());
        assert!(source_typed.set_dimensions(None, vec![]).is_err());
        assert!(!plain.is_dated());
        assert!(plain.as_of_attributes().is_empty());
    }

    #[test]
    fn identity_is_by_id() {
        let a = EntityMetadata::new(950, "A", None);
        let b = EntityMetadata::new(950, "B", None);
        assert_eq!(*a, *b);
        assert_eq!(a.to_string(), "A");
        assert_eq!(SourceAttributeType::Integer.value_type(), ValueType::Integer);
    }
}
