/*  This file is part of OneModel, a program to manage knowledge.
    Copyright in each year of 2025-2026 inclusive, Luke A. Call.
    OneModel is free software, distributed under a license that includes honesty, the Golden Rule,
    and the GNU Affero General Public License as published by the Free Software Foundation;
    see the file LICENSE for license version and details.
    OneModel is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
    You should have received a copy of the GNU Affero General Public License along with OneModel.  If not, see <http://www.gnu.org/licenses/>
*/
use crate::error::CoreResult;
use crate::finder::operation::Operation;
use crate::model::attribute::Attribute;
use crate::model::value::Value;
use crate::settings::CoreSettings;
use std::collections::HashMap;
use tracing::*;

/// Remembers the operations built from result values, per attribute, so that rebuilding the
/// same one (e.g. to refresh a cached result) doesn't allocate it again. Holds at most
/// `capacity` values per attribute; past that, operations are built but not kept.
pub struct OperationPool {
    capacity: usize,
    operations: HashMap<Attribute, HashMap<Option<Value>, Operation>>,
}

impl OperationPool {
    pub fn new(settings: &CoreSettings) -> OperationPool {
        OperationPool::with_capacity(settings.operation_pool_capacity)
    }

    pub fn with_capacity(capacity: usize) -> OperationPool {
        OperationPool {
            capacity,
            operations: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get_or_create<F>(&mut self, attribute: &Attribute, value: Option<Value>, create: F) -> CoreResult<Operation>
    where
        F: FnOnce(Option<&Value>) -> CoreResult<Operation>,
    {
        let capacity = self.capacity;
        let cached = self.operations.entry(attribute.clone()).or_default();
        if let Some(op) = cached.get(&value) {
            return Ok(op.clone());
        }
        let op = create(value.as_ref())?;
        if cached.len() < capacity {
            cached.insert(value, op.clone());
        } else {
            debug!("operation pool for {} is full at {}; not keeping {}", attribute, capacity, op);
        }
        Ok(op)
    }

    pub fn cached_count(&self, attribute: &Attribute) -> usize {
        self.operations.get(attribute).map(|m| m.len()).unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.operations.clear();
    }
}
