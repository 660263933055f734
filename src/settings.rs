/*  This file is part of OneModel, a program to manage knowledge.
    Copyright in each year of 2025-2026 inclusive, Luke A. Call.
    OneModel is free software, distributed under a license that includes honesty, the Golden Rule,
    and the GNU Affero General Public License as published by the Free Software Foundation;
    see the file LICENSE for license version and details.
    OneModel is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
    You should have received a copy of the GNU Affero General Public License along with OneModel.  If not, see <http://www.gnu.org/licenses/>
*/
use anyhow::{anyhow, Context, Result};
use tracing::*;

/// Tunables for the finder core. Nothing here changes query meaning: they only bound how much
/// work is memoized or how large a literal set may get before it is given up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreSettings {
    /// How many distinct values per attribute the operation pool keeps (see OperationPool).
    pub operation_pool_capacity: usize,
    /// Size above which Attribute::in_with_max gives up and returns a "matches nothing" operation.
    pub max_in_clause: usize,
}

impl CoreSettings {
    pub const DEFAULT_OPERATION_POOL_CAPACITY: usize = 100;
    pub const DEFAULT_MAX_IN_CLAUSE: usize = 1000;
    pub const OPERATION_POOL_CAPACITY_VAR: &'static str = "OM_FINDER_OPERATION_POOL_CAPACITY";
    pub const MAX_IN_CLAUSE_VAR: &'static str = "OM_FINDER_MAX_IN_CLAUSE";

    /// Defaults, overridden by whichever of the two environment variables are set.
    pub fn from_env() -> Result<CoreSettings> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like from_env, but with the variable lookup supplied (for tests, or for callers that keep
    /// their settings somewhere else).
    pub fn from_lookup<F>(lookup: F) -> Result<CoreSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = CoreSettings::default();
        if let Some(raw) = lookup(Self::OPERATION_POOL_CAPACITY_VAR) {
            settings.operation_pool_capacity = Self::parse_size(Self::OPERATION_POOL_CAPACITY_VAR, &raw)?;
        }
        if let Some(raw) = lookup(Self::MAX_IN_CLAUSE_VAR) {
            let max = Self::parse_size(Self::MAX_IN_CLAUSE_VAR, &raw)?;
            if max == 0 {
                return Err(anyhow!("{} must be at least 1", Self::MAX_IN_CLAUSE_VAR));
            }
            settings.max_in_clause = max;
        }
        debug!("finder settings: {:?}", settings);
        Ok(settings)
    }

    fn parse_size(name: &str, raw: &str) -> Result<usize> {
        raw.trim()
            .parse::<usize>()
            .with_context(|| format!("{} should be a non-negative whole number, not \"{}\"", name, raw))
    }
}

impl Default for CoreSettings {
    fn default() -> Self {
        CoreSettings {
            operation_pool_capacity: Self::DEFAULT_OPERATION_POOL_CAPACITY,
            max_in_clause: Self::DEFAULT_MAX_IN_CLAUSE,
        }
    }
}
