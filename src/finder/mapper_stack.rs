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
use std::collections::HashMap;
use tracing::*;

/// Tracks where a walk over an operation tree is, in terms of the joins it has gone through.
/// A query generator implements this to give each distinct join path its own table alias.
pub trait MapperStack {
    fn push_mapper(&mut self, mapper: &Mapper);
    fn pop_mapper(&mut self) -> Option<Mapper>;
    fn push_mapper_container(&mut self, container: &Mapper);
    fn pop_mapper_container(&mut self) -> Option<Mapper>;
}

/// A MapperStack that names each join path it sees: the root is "t0", and each new path gets
/// the next number. Coming back to a path already seen gives the same alias again.
#[derive(Debug, Default)]
pub struct AliasScope {
    mappers: Vec<Mapper>,
    containers: Vec<Mapper>,
    aliases: HashMap<Vec<Mapper>, String>,
}

impl AliasScope {
    pub fn new() -> AliasScope {
        AliasScope::default()
    }

    pub fn depth(&self) -> usize {
        self.mappers.len()
    }

    pub fn container_depth(&self) -> usize {
        self.containers.len()
    }

    pub fn current_mapper_list(&self) -> &[Mapper] {
        &self.mappers
    }

    pub fn current_alias(&self) -> &str {
        match self.aliases.get(&self.mappers) {
            Some(alias) => alias,
            None => "t0",
        }
    }

    /// How many aliases besides the root have been handed out.
    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}

impl MapperStack for AliasScope {
    fn push_mapper(&mut self, mapper: &Mapper) {
        self.mappers.push(mapper.clone());
        if !self.aliases.contains_key(&self.mappers) {
            let alias = format!("t{}", self.aliases.len() + 1);
            trace!("{} for {}", alias, mapper);
            self.aliases.insert(self.mappers.clone(), alias);
        }
    }

    fn pop_mapper(&mut self) -> Option<Mapper> {
        self.mappers.pop()
    }

    fn push_mapper_container(&mut self, container: &Mapper) {
        self.containers.push(container.clone());
    }

    fn pop_mapper_container(&mut self) -> Option<Mapper> {
        self.containers.pop()
    }
}
