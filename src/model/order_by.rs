/*  This file is part of OneModel, a program to manage knowledge.
    Copyright in each year of 2025-2026 inclusive, Luke A. Call.
    OneModel is free software, distributed under a license that includes honesty, the Golden Rule,
    and the GNU Affero General Public License as published by the Free Software Foundation;
    see the file LICENSE for license version and details.
    OneModel is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
    You should have received a copy of the GNU Affero General Public License along with OneModel.  If not, see <http://www.gnu.org/licenses/>
*/
use crate::model::attribute::Attribute;
use crate::model::value::DataObject;
use std::cmp::Ordering;
use std::fmt;

/// A sort over one or more attributes, usable on objects in memory or rendered as an ORDER BY.
#[derive(Clone, PartialEq, Eq)]
pub struct OrderBy {
    keys: Vec<(Attribute, bool)>,
}

impl OrderBy {
    pub(crate) fn new(attribute: Attribute, ascending: bool) -> OrderBy {
        OrderBy {
            keys: vec![(attribute, ascending)],
        }
    }

    pub fn then_by(mut self, next: OrderBy) -> OrderBy {
        self.keys.extend(next.keys);
        self
    }

    /// (attribute, ascending) pairs, most significant first.
    pub fn keys(&self) -> &[(Attribute, bool)] {
        &self.keys
    }

    /// Nulls sort first when ascending (and so last when descending).
    pub fn compare(&self, a: &dyn DataObject, b: &dyn DataObject) -> Ordering {
        for (attribute, ascending) in &self.keys {
            let ordering = attribute.value_of(a).cmp(&attribute.value_of(b));
            if ordering != Ordering::Equal {
                return if *ascending { ordering } else { ordering.reverse() };
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self
            .keys
            .iter()
            .map(|(a, asc)| format!("{} {}", a.sql_name(), if *asc { "asc" } else { "desc" }))
            .collect();
        write!(f, "{}", keys.join(", "))
    }
}

impl fmt::Debug for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OrderBy({})", self)
    }
}
