/*  This file is part of OneModel, a program to manage knowledge.
    Copyright in each year of 2025-2026 inclusive, Luke A. Call.
    OneModel is free software, distributed under a license that includes honesty, the Golden Rule,
    and the GNU Affero General Public License as published by the Free Software Foundation;
    see the file LICENSE for license version and details.
    OneModel is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
    You should have received a copy of the GNU Affero General Public License along with OneModel.  If not, see <http://www.gnu.org/licenses/>
*/
//! A small order-entry model shared by the tests: orders (dated in business and processing
//! time) with items, products and accounts (dated in business time only).
use crate::finder::mapper::Mapper;
use crate::finder::operation::Operation;
use crate::model::as_of_attribute::{AsOfAttribute, AsOfBounds};
use crate::model::attribute::{Attribute, AttributeBuilder};
use crate::model::entity::{EntityMetadata, ObjectPortal, SourceAttributeType};
use crate::model::mapped_attribute::ParentSelector;
use crate::model::value::{DataObject, FieldAccessor, Timestamp, Value, ValueType};
use crate::util::Util;
use bigdecimal::BigDecimal;
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

macro_rules! accessor {
    ($owner:ty, $field:ident, $variant:ident) => {
        FieldAccessor::<$owner>::new(
            |o| o.$field.clone().map(Value::$variant),
            |o, v| {
                o.$field = match v {
                    Some(Value::$variant(x)) => Some(x),
                    _ => None,
                }
            },
        )
    };
}

macro_rules! data_object {
    ($owner:ty) => {
        impl DataObject for $owner {
            fn as_any(&self) -> &dyn Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }
    };
}

#[derive(Debug, Clone)]
pub struct OrderData {
    pub id: Option<i32>,
    pub description: Option<String>,
    pub quantity: Option<i32>,
    pub amount: Option<BigDecimal>,
    pub discount: Option<BigDecimal>,
    pub total: Option<i64>,
    pub weight: Option<i16>,
    pub priority: Option<i8>,
    pub rate: Option<f32>,
    pub price: Option<f64>,
    pub rush: Option<bool>,
    pub account_id: Option<i32>,
    pub source: Option<i32>,
    pub shadow_id: Option<i32>,
    pub business_from: Option<Timestamp>,
    pub business_to: Option<Timestamp>,
    pub processing_from: Option<Timestamp>,
    pub processing_to: Option<Timestamp>,
    pub business_date: Option<Timestamp>,
    pub processing_date: Option<Timestamp>,
    pub account: Option<Arc<AccountData>>,
}

impl OrderData {
    /// Valid in business time from 2020-01-01 to 2020-06-01, and current in processing time
    /// since 2020-01-01.
    pub fn new(id: i32) -> OrderData {
        OrderData {
            id: Some(id),
            description: None,
            quantity: None,
            amount: None,
            discount: None,
            total: None,
            weight: None,
            priority: None,
            rate: None,
            price: None,
            rush: None,
            account_id: None,
            source: Some(0),
            shadow_id: None,
            business_from: Some(TestEntities::date("2020-01-01")),
            business_to: Some(TestEntities::date("2020-06-01")),
            processing_from: Some(TestEntities::date("2020-01-01")),
            processing_to: None,
            business_date: None,
            processing_date: None,
            account: None,
        }
    }
}
data_object!(OrderData);

#[derive(Debug, Clone)]
pub struct OrderItemData {
    pub id: Option<i32>,
    pub order_id: Option<i32>,
    pub product_id: Option<i32>,
    pub quantity: Option<i32>,
    pub source: Option<i32>,
    pub order: Option<Arc<OrderData>>,
    pub product: Option<Arc<ProductData>>,
}

impl OrderItemData {
    pub fn new(id: i32, order_id: i32) -> OrderItemData {
        OrderItemData {
            id: Some(id),
            order_id: Some(order_id),
            product_id: None,
            quantity: None,
            source: Some(0),
            order: None,
            product: None,
        }
    }
}
data_object!(OrderItemData);

#[derive(Debug, Clone)]
pub struct ProductData {
    pub id: Option<i32>,
    pub name: Option<String>,
    pub active: Option<bool>,
}
data_object!(ProductData);

#[derive(Debug, Clone)]
pub struct AccountData {
    pub id: Option<i32>,
    pub name: Option<String>,
    pub balance: Option<i32>,
    pub parent_id: Option<i32>,
    pub source: Option<i32>,
    pub business_from: Option<Timestamp>,
    pub business_to: Option<Timestamp>,
    pub business_date: Option<Timestamp>,
    pub parent: Option<Arc<AccountData>>,
}

impl AccountData {
    pub fn new(id: i32) -> AccountData {
        AccountData {
            id: Some(id),
            name: None,
            balance: None,
            parent_id: None,
            source: Some(0),
            business_from: Some(TestEntities::date("2020-01-01")),
            business_to: None,
            business_date: None,
            parent: None,
        }
    }
}
data_object!(AccountData);

/// Counts the lookups made against it; always answers from "memory", with nothing.
#[derive(Default)]
pub struct RecordingPortal {
    seen: AtomicUsize,
}

impl RecordingPortal {
    pub fn seen_count(&self) -> usize {
        self.seen.load(Ordering::SeqCst)
    }
}

impl ObjectPortal for RecordingPortal {
    fn find_in_memory(&self, _operation: &Operation) -> Option<Vec<Arc<dyn DataObject>>> {
        self.seen.fetch_add(1, Ordering::SeqCst);
        Some(Vec::new())
    }
}

pub struct OrderAttributes {
    pub entity: Arc<EntityMetadata>,
    pub id: Attribute,
    pub description: Attribute,
    pub quantity: Attribute,
    pub amount: Attribute,
    pub discount: Attribute,
    pub total: Attribute,
    pub weight: Attribute,
    pub priority: Attribute,
    pub rate: Attribute,
    pub price: Attribute,
    pub rush: Attribute,
    pub account_id: Attribute,
    pub source: Attribute,
    pub shadow_id: Attribute,
    pub business_from: Attribute,
    pub business_to: Attribute,
    pub processing_from: Attribute,
    pub processing_to: Attribute,
    pub business_date: AsOfAttribute,
    pub processing_date: AsOfAttribute,
}

pub struct OrderItemAttributes {
    pub entity: Arc<EntityMetadata>,
    pub id: Attribute,
    pub order_id: Attribute,
    pub product_id: Attribute,
    pub quantity: Attribute,
    pub source: Attribute,
}

pub struct ProductAttributes {
    pub entity: Arc<EntityMetadata>,
    pub id: Attribute,
    pub name: Attribute,
    pub active: Attribute,
}

pub struct AccountAttributes {
    pub entity: Arc<EntityMetadata>,
    pub id: Attribute,
    pub name: Attribute,
    pub balance: Attribute,
    pub parent_id: Attribute,
    pub source: Attribute,
    pub business_from: Attribute,
    pub business_to: Attribute,
    pub business_date: AsOfAttribute,
}

pub struct TestEntities {
    pub order: OrderAttributes,
    pub item: OrderItemAttributes,
    pub product: ProductAttributes,
    pub account: AccountAttributes,
    pub order_portal: Arc<RecordingPortal>,
}

static TEST_ENTITIES: OnceLock<TestEntities> = OnceLock::new();

impl TestEntities {
    pub fn get() -> &'static TestEntities {
        TEST_ENTITIES.get_or_init(TestEntities::build)
    }

    pub fn date(text: &str) -> Timestamp {
        Util::parse_timestamp(text).unwrap()
    }

    fn build() -> TestEntities {
        let order = TestEntities::build_order();
        let item = TestEntities::build_item();
        let product = TestEntities::build_product();
        let account = TestEntities::build_account();
        let order_portal = Arc::new(RecordingPortal::default());
        order.entity.set_object_portal(order_portal.clone()).unwrap();
        TestEntities {
            order,
            item,
            product,
            account,
            order_portal,
        }
    }

    fn build_order() -> OrderAttributes {
        let entity = EntityMetadata::new(1, "Order", Some(SourceAttributeType::Integer));
        let column = |field: u32, name: &str, column: &str, value_type: ValueType| {
            AttributeBuilder::new(&entity, field, name, value_type).column_name(column)
        };
        let id = column(0, "id", "ID", ValueType::Integer)
            .nullable(false)
            .column(accessor!(OrderData, id, Integer));
        let description = column(1, "description", "DESCRIPTION", ValueType::String)
            .column(accessor!(OrderData, description, String));
        let quantity = column(2, "quantity", "QUANTITY", ValueType::Integer).column(accessor!(OrderData, quantity, Integer));
        let amount = column(3, "amount", "AMOUNT", ValueType::BigDecimal)
            .precision_and_scale(10, 2)
            .column(accessor!(OrderData, amount, BigDecimal));
        let discount = column(4, "discount", "DISCOUNT", ValueType::BigDecimal)
            .precision_and_scale(5, 1)
            .column(accessor!(OrderData, discount, BigDecimal));
        let total = column(5, "total", "TOTAL", ValueType::Long).column(accessor!(OrderData, total, Long));
        let weight = column(6, "weight", "WEIGHT", ValueType::Short).column(accessor!(OrderData, weight, Short));
        let priority = column(7, "priority", "PRIORITY", ValueType::Byte).column(accessor!(OrderData, priority, Byte));
        let rate = column(8, "rate", "RATE", ValueType::Float).column(accessor!(OrderData, rate, Float));
        let price = column(9, "price", "PRICE", ValueType::Double).column(accessor!(OrderData, price, Double));
        let rush = column(10, "rush", "RUSH", ValueType::Boolean).column(accessor!(OrderData, rush, Boolean));
        let account_id =
            column(11, "accountId", "ACCOUNT_ID", ValueType::Integer).column(accessor!(OrderData, account_id, Integer));
        let source = column(12, "source", "SOURCE", ValueType::Integer)
            .source_attribute()
            .column(accessor!(OrderData, source, Integer));
        let shadow_id = column(13, "shadowId", "ID", ValueType::Integer)
            .shadow_of(id.id().unwrap())
            .column(accessor!(OrderData, shadow_id, Integer));
        let business_from = column(14, "businessFrom", "FROM_Z", ValueType::Timestamp)
            .column(accessor!(OrderData, business_from, Timestamp));
        let business_to =
            column(15, "businessTo", "THRU_Z", ValueType::Timestamp).column(accessor!(OrderData, business_to, Timestamp));
        let processing_from = column(16, "processingFrom", "IN_Z", ValueType::Timestamp)
            .column(accessor!(OrderData, processing_from, Timestamp));
        let processing_to = column(17, "processingTo", "OUT_Z", ValueType::Timestamp)
            .column(accessor!(OrderData, processing_to, Timestamp));
        let business_date = AttributeBuilder::new(&entity, 18, "businessDate", ValueType::Timestamp)
            .as_of(
                AsOfBounds::new(&business_from, &business_to).infinity(TestEntities::date("9999-12-31")),
                accessor!(OrderData, business_date, Timestamp),
            )
            .unwrap();
        let processing_date = AttributeBuilder::new(&entity, 19, "processingDate", ValueType::Timestamp)
            .as_of(
                AsOfBounds::new(&processing_from, &processing_to)
                    .to_is_inclusive(true)
                    .processing_date()
                    .infinity_null(true),
                accessor!(OrderData, processing_date, Timestamp),
            )
            .unwrap();
        entity
            .set_dimensions(Some(source.clone()), vec![business_date.clone(), processing_date.clone()])
            .unwrap();
        OrderAttributes {
            entity,
            id,
            description,
            quantity,
            amount,
            discount,
            total,
            weight,
            priority,
            rate,
            price,
            rush,
            account_id,
            source,
            shadow_id,
            business_from,
            business_to,
            processing_from,
            processing_to,
            business_date,
            processing_date,
        }
    }

    fn build_item() -> OrderItemAttributes {
        let entity = EntityMetadata::new(2, "OrderItem", Some(SourceAttributeType::Integer));
        let id = AttributeBuilder::new(&entity, 0, "id", ValueType::Integer)
            .nullable(false)
            .column(accessor!(OrderItemData, id, Integer));
        let order_id = AttributeBuilder::new(&entity, 1, "orderId", ValueType::Integer)
            .column(accessor!(OrderItemData, order_id, Integer));
        let product_id = AttributeBuilder::new(&entity, 2, "productId", ValueType::Integer)
            .column(accessor!(OrderItemData, product_id, Integer));
        let quantity = AttributeBuilder::new(&entity, 3, "quantity", ValueType::Integer)
            .column(accessor!(OrderItemData, quantity, Integer));
        let source = AttributeBuilder::new(&entity, 4, "source", ValueType::Integer)
            .source_attribute()
            .column(accessor!(OrderItemData, source, Integer));
        entity.set_dimensions(Some(source.clone()), vec![]).unwrap();
        OrderItemAttributes {
            entity,
            id,
            order_id,
            product_id,
            quantity,
            source,
        }
    }

    fn build_product() -> ProductAttributes {
        let entity = EntityMetadata::new(3, "Product", None);
        let id = AttributeBuilder::new(&entity, 0, "id", ValueType::Integer)
            .nullable(false)
            .column(accessor!(ProductData, id, Integer));
        let name = AttributeBuilder::new(&entity, 1, "name", ValueType::String)
            .transactional(true)
            .column(accessor!(ProductData, name, String));
        let active = AttributeBuilder::new(&entity, 2, "active", ValueType::Boolean)
            .transactional(false)
            .column(accessor!(ProductData, active, Boolean));
        ProductAttributes { entity, id, name, active }
    }

    fn build_account() -> AccountAttributes {
        let entity = EntityMetadata::new(4, "Account", Some(SourceAttributeType::Integer));
        let id = AttributeBuilder::new(&entity, 0, "id", ValueType::Integer)
            .nullable(false)
            .column(accessor!(AccountData, id, Integer));
        let name = AttributeBuilder::new(&entity, 1, "name", ValueType::String).column(accessor!(AccountData, name, String));
        let balance = AttributeBuilder::new(&entity, 2, "balance", ValueType::Integer)
            .column(accessor!(AccountData, balance, Integer));
        let parent_id = AttributeBuilder::new(&entity, 3, "parentId", ValueType::Integer)
            .column(accessor!(AccountData, parent_id, Integer));
        let source = AttributeBuilder::new(&entity, 4, "source", ValueType::Integer)
            .source_attribute()
            .column(accessor!(AccountData, source, Integer));
        let business_from = AttributeBuilder::new(&entity, 5, "businessFrom", ValueType::Timestamp)
            .column(accessor!(AccountData, business_from, Timestamp));
        let business_to = AttributeBuilder::new(&entity, 6, "businessTo", ValueType::Timestamp)
            .column(accessor!(AccountData, business_to, Timestamp));
        let business_date = AttributeBuilder::new(&entity, 7, "businessDate", ValueType::Timestamp)
            .as_of(
                AsOfBounds::new(&business_from, &business_to).infinity(TestEntities::date("9999-12-31")),
                accessor!(AccountData, business_date, Timestamp),
            )
            .unwrap();
        entity
            .set_dimensions(Some(source.clone()), vec![business_date.clone()])
            .unwrap();
        AccountAttributes {
            entity,
            id,
            name,
            balance,
            parent_id,
            source,
            business_from,
            business_to,
            business_date,
        }
    }

    // ---- relationships ----

    pub fn item_order_mapper(&self) -> Mapper {
        Mapper::equality(self.item.order_id.clone(), self.order.id.clone())
    }

    pub fn order_account_mapper(&self) -> Mapper {
        Mapper::equality(self.order.account_id.clone(), self.account.id.clone())
    }

    pub fn account_parent_mapper(&self) -> Mapper {
        Mapper::equality(self.account.parent_id.clone(), self.account.id.clone())
    }

    pub fn item_product_mapper(&self) -> Mapper {
        Mapper::equality(self.item.product_id.clone(), self.product.id.clone())
    }

    pub fn item_order_selector(&self) -> ParentSelector {
        ParentSelector::new(|o| {
            o.as_any()
                .downcast_ref::<OrderItemData>()
                .and_then(|item| item.order.as_deref())
                .map(|order| order as &dyn DataObject)
        })
    }

    pub fn order_account_selector(&self) -> ParentSelector {
        ParentSelector::new(|o| {
            o.as_any()
                .downcast_ref::<OrderData>()
                .and_then(|order| order.account.as_deref())
                .map(|account| account as &dyn DataObject)
        })
    }

    pub fn item_product_selector(&self) -> ParentSelector {
        ParentSelector::new(|o| {
            o.as_any()
                .downcast_ref::<OrderItemData>()
                .and_then(|item| item.product.as_deref())
                .map(|product| product as &dyn DataObject)
        })
    }

    pub fn item_to_order(&self, attribute: &Attribute) -> Attribute {
        Attribute::mapped(self.item_order_mapper(), attribute.clone(), self.item_order_selector()).unwrap()
    }

    pub fn order_to_account(&self, attribute: &Attribute) -> Attribute {
        Attribute::mapped(self.order_account_mapper(), attribute.clone(), self.order_account_selector()).unwrap()
    }

    pub fn item_to_product(&self, attribute: &Attribute) -> Attribute {
        Attribute::mapped(self.item_product_mapper(), attribute.clone(), self.item_product_selector()).unwrap()
    }

    pub fn item_order_description(&self) -> Attribute {
        self.item_to_order(&self.order.description)
    }

    pub fn item_order_quantity(&self) -> Attribute {
        self.item_to_order(&self.order.quantity)
    }

    pub fn item_order_account_name(&self) -> Attribute {
        self.item_to_order(&self.order_to_account(&self.account.name))
    }
}
