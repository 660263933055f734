/*  This file is part of OneModel, a program to manage knowledge.
    Copyright in each year of 2025-2026 inclusive, Luke A. Call.
    OneModel is free software, distributed under a license that includes honesty, the Golden Rule,
    and the GNU Affero General Public License as published by the Free Software Foundation;
    see the file LICENSE for license version and details.
    OneModel is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
    You should have received a copy of the GNU Affero General Public License along with OneModel.  If not, see <http://www.gnu.org/licenses/>
*/
//! The attribute and operation core of a bitemporal object finder: typed attributes of
//! entities, the operations built from them, the mappers that relate entities, and the
//! numeric typing used for calculated attributes.
pub mod error;
pub mod finder;
pub mod model;
pub mod settings;
pub mod util;

pub use error::{CoreError, CoreResult};
pub use finder::mapper::Mapper;
pub use finder::operation::Operation;
pub use finder::operation_pool::OperationPool;
pub use model::as_of_attribute::AsOfAttribute;
pub use model::attribute::{Attribute, AttributeBuilder};
pub use model::entity::EntityMetadata;
pub use model::value::{DataObject, Value, ValueType};
pub use settings::CoreSettings;
