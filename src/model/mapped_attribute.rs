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
use crate::finder::operation::Operation;
use crate::model::attribute::{Attribute, AttributeKind};
use crate::model::value::{DataObject, Value};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::*;

type Hop = Arc<dyn for<'a> Fn(&'a dyn DataObject) -> Option<&'a dyn DataObject> + Send + Sync>;

/// Navigates from an object to a related one, one relationship (hop) at a time. Used to read a
/// mapped attribute's value in memory; it has as many hops as the attribute's mapper.
#[derive(Clone)]
pub struct ParentSelector {
    hops: Vec<Hop>,
}

impl ParentSelector {
    pub fn new<F>(hop: F) -> ParentSelector
    where
        F: for<'a> Fn(&'a dyn DataObject) -> Option<&'a dyn DataObject> + Send + Sync + 'static,
    {
        ParentSelector { hops: vec![Arc::new(hop)] }
    }

    /// This selector's hops followed by `next`'s.
    pub fn then(&self, next: &ParentSelector) -> ParentSelector {
        let mut hops = self.hops.clone();
        hops.extend(next.hops.iter().cloned());
        ParentSelector { hops }
    }

    pub fn depth(&self) -> usize {
        self.hops.len()
    }

    /// None if any object along the way is missing.
    pub fn select<'a>(&self, owner: &'a dyn DataObject) -> Option<&'a dyn DataObject> {
        let mut current = owner;
        for hop in &self.hops {
            current = hop(current)?;
        }
        Some(current)
    }

    /// The hops after the first `skip`.
    pub fn suffix(&self, skip: usize) -> ParentSelector {
        ParentSelector {
            hops: self.hops.iter().skip(skip).cloned().collect(),
        }
    }

    /// The first `depth` hops.
    pub fn prefix(&self, depth: usize) -> ParentSelector {
        ParentSelector {
            hops: self.hops.iter().take(depth).cloned().collect(),
        }
    }
}

/// An attribute of a related entity, seen from this one: `wrapped` read through `mapper`. The
/// wrapped attribute is never itself mapped; nested ones are flattened into a chained mapper
/// when built.
pub struct MappedAttribute {
    mapper: Mapper,
    wrapped: Attribute,
    selector: ParentSelector,
}

impl Attribute {
    /// `wrapped`, reached from the mapper's result entity. The selector must take as many hops
    /// as the mapper, and the mapper must end at the wrapped attribute's entity.
    pub fn mapped(mapper: Mapper, wrapped: Attribute, selector: ParentSelector) -> CoreResult<Attribute> {
        if mapper.depth() != selector.depth() {
            return Err(CoreError::invalid_input(format!(
                "mapper {} has {} hop(s) but its parent selector has {}",
                mapper,
                mapper.depth(),
                selector.depth()
            )));
        }
        if mapper.from_entity() != wrapped.owner_entity() {
            return Err(CoreError::invalid_input(format!("mapper {} doesn't lead to {}", mapper, wrapped)));
        }
        let (mut mapper, mut wrapped, mut selector) = (mapper, wrapped, selector);
        while let Some(inner) = wrapped.as_mapped() {
            debug!("flattening {} into {}", wrapped, mapper);
            let (inner_mapper, inner_wrapped, inner_selector) =
                (inner.mapper.clone(), inner.wrapped.clone(), inner.selector.clone());
            mapper = Mapper::chained(&mapper, &inner_mapper);
            selector = selector.then(&inner_selector);
            wrapped = inner_wrapped;
        }
        Ok(Attribute::new(AttributeKind::Mapped(MappedAttribute {
            mapper,
            wrapped,
            selector,
        })))
    }

    /// This attribute as seen from the far end of `head`, a leading run of its mapper's hops.
    /// What isn't mapped, or isn't mapped beyond `head`, is returned as the plain attribute.
    pub fn with_mapper_remainder(&self, head: &Mapper) -> Attribute {
        match self.as_mapped() {
            Some(m) => match m.mapper.mapper_remainder(head) {
                Some(rest) => Attribute::new(AttributeKind::Mapped(MappedAttribute {
                    mapper: rest,
                    wrapped: m.wrapped.clone(),
                    selector: m.selector.suffix(head.depth()),
                })),
                None => m.wrapped.clone(),
            },
            None => self.clone(),
        }
    }
}

impl MappedAttribute {
    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    pub fn wrapped_attribute(&self) -> &Attribute {
        &self.wrapped
    }

    pub fn parent_selector(&self) -> &ParentSelector {
        &self.selector
    }

    pub(crate) fn value_of(&self, owner: &dyn DataObject) -> Option<Value> {
        let related = self.selector.select(owner)?;
        self.wrapped.value_of(related)
    }

    /// Equality between this (as `this`) and another attribute of the same root. When the two
    /// share the leading part of their paths, the comparison is pushed down under that part.
    pub(crate) fn filter_eq_for_mapped_attribute(&self, this: &Attribute, other: &Attribute) -> CoreResult<Operation> {
        let theirs = match other.as_mapped() {
            Some(m) => m,
            None => return Ok(other.filter_eq_with_check(this)),
        };
        if self.mapper == theirs.mapper {
            return Ok(Operation::mapped(
                self.mapper.clone(),
                self.wrapped.filter_eq_with_check(&theirs.wrapped),
            ));
        }
        match self.mapper.common_mapper(&theirs.mapper) {
            Some(common) if common == self.mapper => {
                let reduced = other.with_mapper_remainder(&common);
                Ok(Operation::mapped(common, self.wrapped.filter_eq_with_check(&reduced)))
            }
            Some(common) if common == theirs.mapper => {
                let reduced = this.with_mapper_remainder(&common);
                Ok(Operation::mapped(common, theirs.wrapped.filter_eq_with_check(&reduced)))
            }
            _ => Ok(this.filter_eq_with_check(other)),
        }
    }

    /// Whether the related entity's cache can answer `operation` (on this attribute's root) in
    /// memory, by walking the relationship backwards.
    pub fn find_deep_relationship_in_memory(&self, operation: &Operation) -> bool {
        let reverse = match self.mapper.reverse_mapper() {
            Some(r) => r,
            None => return false,
        };
        let entity = reverse.result_entity();
        let portal = match entity.object_portal() {
            Some(p) => p,
            None => return false,
        };
        let reversed = Operation::mapped(reverse, operation.clone());
        let found = portal.find_in_memory(&reversed);
        trace!("looked in memory for {}: {}", reversed, found.is_some());
        found.is_some()
    }
}

impl PartialEq for MappedAttribute {
    fn eq(&self, other: &Self) -> bool {
        self.mapper == other.mapper && self.wrapped == other.wrapped
    }
}

impl Hash for MappedAttribute {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mapper.hash(state);
        self.wrapped.hash(state);
    }
}
