/*  This file is part of OneModel, a program to manage knowledge.
    Copyright in each year of 2025-2026 inclusive, Luke A. Call.
    OneModel is free software, distributed under a license that includes honesty, the Golden Rule,
    and the GNU Affero General Public License as published by the Free Software Foundation;
    see the file LICENSE for license version and details.
    OneModel is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
    You should have received a copy of the GNU Affero General Public License along with OneModel.  If not, see <http://www.gnu.org/licenses/>
*/
use crate::finder::mapper_stack::MapperStack;
use crate::model::as_of_attribute::AsOfAttribute;
use crate::model::attribute::Attribute;
use crate::model::entity::EntityMetadata;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::*;

/// The shapes of join a mapper can be. MultiEquality always has at least two pairs and Chained
/// at least two hops, none of which is itself chained.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum MapperKind {
    Equality { left: Attribute, right: Attribute },
    AsOfEquality { left: AsOfAttribute, right: AsOfAttribute },
    AsOfTimestampEquality { left: AsOfAttribute, right: Attribute },
    MultiEquality(Vec<Mapper>),
    Chained(Vec<Mapper>),
}

struct MapperInner {
    kind: MapperKind,
    anonymous: bool,
    auto_generated: bool,
}

/// A join from one entity (the result side, on the left) to another (the from side, on the
/// right), possibly through others. Operations on the right-hand entity are carried over to the
/// left one by wrapping them with a mapper (see Operation::Mapped).
///
/// Mappers are immutable and shared. Equality ignores the anonymous and auto-generated flags.
#[derive(Clone)]
pub struct Mapper {
    inner: Arc<MapperInner>,
}

impl Mapper {
    fn new(kind: MapperKind) -> Mapper {
        Mapper {
            inner: Arc::new(MapperInner {
                kind,
                anonymous: false,
                auto_generated: false,
            }),
        }
    }

    fn with_flags(&self, anonymous: bool, auto_generated: bool) -> Mapper {
        Mapper {
            inner: Arc::new(MapperInner {
                kind: self.inner.kind.clone(),
                anonymous,
                auto_generated,
            }),
        }
    }

    pub fn equality(left: Attribute, right: Attribute) -> Mapper {
        Mapper::new(MapperKind::Equality { left, right })
    }

    pub fn as_of_equality(left: AsOfAttribute, right: AsOfAttribute) -> Mapper {
        Mapper::new(MapperKind::AsOfEquality { left, right })
    }

    pub fn as_of_timestamp_equality(left: AsOfAttribute, right: Attribute) -> Mapper {
        Mapper::new(MapperKind::AsOfTimestampEquality { left, right })
    }

    /// A join on several pairs at once. Pairs already present are ignored, and pairs whose right
    /// side is a mapped attribute go after the plain ones. A single distinct pair is returned
    /// as it is.
    pub fn multi_equality<I>(first: Mapper, others: I) -> Mapper
    where
        I: IntoIterator<Item = Mapper>,
    {
        let mut pairs: Vec<Mapper> = Vec::new();
        for mapper in std::iter::once(first).chain(others) {
            let parts = match mapper.kind() {
                MapperKind::MultiEquality(parts) => parts.clone(),
                _ => vec![mapper],
            };
            for part in parts {
                Self::add_pair(&mut pairs, part);
            }
        }
        match pairs.len() {
            1 => pairs.remove(0),
            _ => Mapper::new(MapperKind::MultiEquality(pairs)),
        }
    }

    fn add_pair(pairs: &mut Vec<Mapper>, pair: Mapper) {
        if pairs.contains(&pair) {
            trace!("ignoring repeated pair {}", pair);
            return;
        }
        if pair.has_triangle_joins() {
            pairs.push(pair);
        } else {
            let at = pairs.iter().position(|p| p.has_triangle_joins()).unwrap_or(pairs.len());
            pairs.insert(at, pair);
        }
    }

    /// `first` followed by `second`: from first's result entity through to second's from entity.
    pub fn chained(first: &Mapper, second: &Mapper) -> Mapper {
        let mut hops = first.unchained_mappers();
        hops.extend(second.unchained_mappers());
        Mapper::new(MapperKind::Chained(hops))
    }

    /// The mapper for a run of single hops: None for no hops, the hop itself for one.
    pub fn from_hops(mut hops: Vec<Mapper>) -> Option<Mapper> {
        match hops.len() {
            0 | 1 => hops.pop(),
            _ => Some(Mapper::new(MapperKind::Chained(hops))),
        }
    }

    pub fn kind(&self) -> &MapperKind {
        &self.inner.kind
    }

    /// Set on mappers made up for a join or filter written in a query, as opposed to those
    /// declared as relationships.
    pub fn is_anonymous(&self) -> bool {
        self.inner.anonymous
    }

    pub fn as_anonymous(&self) -> Mapper {
        self.with_flags(true, self.inner.auto_generated)
    }

    /// Set on pairs added to a join to correlate source attributes or as-of dimensions.
    pub fn is_auto_generated(&self) -> bool {
        self.inner.auto_generated
    }

    pub fn as_auto_generated(&self) -> Mapper {
        self.with_flags(self.inner.anonymous, true)
    }

    /// The hops of a chained mapper; any other mapper is one hop.
    pub fn unchained_mappers(&self) -> Vec<Mapper> {
        match self.kind() {
            MapperKind::Chained(hops) => hops.clone(),
            _ => vec![self.clone()],
        }
    }

    pub fn depth(&self) -> usize {
        match self.kind() {
            MapperKind::Chained(hops) => hops.len(),
            _ => 1,
        }
    }

    /// The entity this mapper's operations end up on.
    pub fn result_entity(&self) -> Arc<EntityMetadata> {
        match self.kind() {
            MapperKind::Equality { left, .. } => left.owner_entity(),
            MapperKind::AsOfEquality { left, .. } => left.attribute().owner_entity(),
            MapperKind::AsOfTimestampEquality { left, .. } => left.attribute().owner_entity(),
            MapperKind::MultiEquality(parts) => parts[0].result_entity(),
            MapperKind::Chained(hops) => hops[0].result_entity(),
        }
    }

    /// The entity of the operations this mapper wraps.
    pub fn from_entity(&self) -> Arc<EntityMetadata> {
        match self.kind() {
            MapperKind::Equality { right, .. } => right.owner_entity(),
            MapperKind::AsOfEquality { right, .. } => right.attribute().owner_entity(),
            MapperKind::AsOfTimestampEquality { right, .. } => right.owner_entity(),
            MapperKind::MultiEquality(parts) => parts[0].from_entity(),
            MapperKind::Chained(hops) => hops[hops.len() - 1].from_entity(),
        }
    }

    /// Every (left, right) attribute pair this mapper equates, hop by hop.
    pub fn equality_pairs(&self) -> Vec<(Attribute, Attribute)> {
        match self.kind() {
            MapperKind::Equality { left, right } => vec![(left.clone(), right.clone())],
            MapperKind::AsOfEquality { left, right } => vec![(left.attribute().clone(), right.attribute().clone())],
            MapperKind::AsOfTimestampEquality { left, right } => vec![(left.attribute().clone(), right.clone())],
            MapperKind::MultiEquality(parts) | MapperKind::Chained(parts) => {
                parts.iter().flat_map(|p| p.equality_pairs()).collect()
            }
        }
    }

    pub fn auto_generated_count(&self) -> usize {
        match self.kind() {
            MapperKind::MultiEquality(parts) | MapperKind::Chained(parts) => {
                parts.iter().map(|p| p.auto_generated_count()).sum()
            }
            _ => usize::from(self.is_auto_generated()),
        }
    }

    /// The same join walked the other way, or None where that can't be expressed (a pair whose
    /// right side is itself mapped, or an as-of dimension driven by a plain timestamp).
    pub fn reverse_mapper(&self) -> Option<Mapper> {
        let reversed = match self.kind() {
            MapperKind::Equality { left, right } => {
                if right.is_mapped() {
                    return None;
                }
                Mapper::equality(right.clone(), left.clone())
            }
            MapperKind::AsOfEquality { left, right } => Mapper::as_of_equality(right.clone(), left.clone()),
            MapperKind::AsOfTimestampEquality { .. } => return None,
            MapperKind::MultiEquality(parts) => {
                let mut reversed = parts.iter().map(|p| p.reverse_mapper()).collect::<Option<Vec<_>>>()?;
                let first = reversed.remove(0);
                Mapper::multi_equality(first, reversed)
            }
            MapperKind::Chained(hops) => {
                let reversed = hops.iter().rev().map(|h| h.reverse_mapper()).collect::<Option<Vec<_>>>()?;
                Mapper::from_hops(reversed)?
            }
        };
        Some(reversed.with_flags(self.is_anonymous(), self.is_auto_generated()))
    }

    pub fn is_reversible(&self) -> bool {
        self.reverse_mapper().is_some()
    }

    /// Whether some pair equates with an attribute reached through yet another relationship.
    pub fn has_triangle_joins(&self) -> bool {
        match self.kind() {
            MapperKind::Equality { right, .. } => right.is_mapped(),
            MapperKind::AsOfTimestampEquality { right, .. } => right.is_mapped(),
            MapperKind::AsOfEquality { .. } => false,
            MapperKind::MultiEquality(parts) | MapperKind::Chained(parts) => parts.iter().any(|p| p.has_triangle_joins()),
        }
    }

    /// The longest run of leading hops this mapper and `other` share, if they share any.
    pub fn common_mapper(&self, other: &Mapper) -> Option<Mapper> {
        let mine = self.unchained_mappers();
        let theirs = other.unchained_mappers();
        let shared = mine.iter().zip(theirs.iter()).take_while(|(a, b)| a == b).count();
        if shared == mine.len() {
            return Some(self.clone());
        }
        Mapper::from_hops(mine[..shared].to_vec())
    }

    /// What is left of this mapper after `head`, which must be a leading run of its hops; None
    /// when nothing is left.
    pub fn mapper_remainder(&self, head: &Mapper) -> Option<Mapper> {
        let mine = self.unchained_mappers();
        let skip = head.depth();
        if skip >= mine.len() {
            return None;
        }
        Mapper::from_hops(mine[skip..].to_vec())
    }

    /// The attributes of all pairs, each once.
    pub fn dependent_attributes(&self) -> Vec<Attribute> {
        let mut result: Vec<Attribute> = Vec::new();
        for (left, right) in self.equality_pairs() {
            for a in [left, right] {
                if !result.contains(&a) {
                    result.push(a);
                }
            }
        }
        result
    }

    /// Pushes this mapper on the stack; a chained one goes on as a container of its hops.
    pub fn push_mappers(&self, stack: &mut dyn MapperStack) {
        match self.kind() {
            MapperKind::Chained(hops) => {
                stack.push_mapper_container(self);
                for hop in hops {
                    hop.push_mappers(stack);
                }
            }
            _ => stack.push_mapper(self),
        }
    }

    /// Undoes push_mappers.
    pub fn pop_mappers(&self, stack: &mut dyn MapperStack) {
        match self.kind() {
            MapperKind::Chained(hops) => {
                for hop in hops.iter().rev() {
                    hop.pop_mappers(stack);
                }
                stack.pop_mapper_container();
            }
            _ => {
                stack.pop_mapper();
            }
        }
    }
}

impl PartialEq for Mapper {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.kind == other.inner.kind
    }
}

impl Eq for Mapper {}

impl Hash for Mapper {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.kind.hash(state);
    }
}

impl fmt::Display for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            MapperKind::Equality { left, right } => write!(f, "{} = {}", left, right),
            MapperKind::AsOfEquality { left, right } => write!(f, "{} = {}", left, right),
            MapperKind::AsOfTimestampEquality { left, right } => write!(f, "{} = {}", left, right),
            MapperKind::MultiEquality(parts) => {
                let parts: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
                write!(f, "({})", parts.join(" and "))
            }
            MapperKind::Chained(hops) => {
                let hops: Vec<String> = hops.iter().map(|h| h.to_string()).collect();
                write!(f, "{}", hops.join(" -> "))
            }
        }
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mapper({})", self)
    }
}
