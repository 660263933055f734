/*  This file is part of OneModel, a program to manage knowledge.
    Copyright in each year of 2025-2026 inclusive, Luke A. Call.
    OneModel is free software, distributed under a license that includes honesty, the Golden Rule,
    and the GNU Affero General Public License as published by the Free Software Foundation;
    see the file LICENSE for license version and details.
    OneModel is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
    You should have received a copy of the GNU Affero General Public License along with OneModel.  If not, see <http://www.gnu.org/licenses/>
*/
use thiserror::Error;

/// Failures raised where an attribute, operation or mapper is misused. All of them are
/// synchronous: nothing here is deferred to query execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("unsupported operation: {message}")]
    Unsupported { message: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("invalid numeric type: {message}")]
    InvalidTypeCombination { message: String },
    #[error("degenerate interval: {message}")]
    DegenerateInterval { message: String },
    #[error("could not parse \"{value}\" on line {line}: {message}")]
    InvalidLiteral {
        line: usize,
        value: String,
        message: String,
    },
}

impl CoreError {
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn invalid_type_combination(message: impl Into<String>) -> Self {
        Self::InvalidTypeCombination {
            message: message.into(),
        }
    }

    pub fn degenerate_interval(message: impl Into<String>) -> Self {
        Self::DegenerateInterval {
            message: message.into(),
        }
    }

    pub fn invalid_literal(line: usize, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidLiteral {
            line,
            value: value.into(),
            message: message.into(),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, CoreError::Unsupported { .. })
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
