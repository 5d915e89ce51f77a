use std::io::Write;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::{
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    pg::{Pg, PgValue},
    prelude::*,
    serialize::{self, IsNull, Output, ToSql},
};
use uuid::Uuid;

use crate::schema::{
    canteen_status, cart_items, food_categories, food_items, loyalty_points, order_items, orders,
    outbox, payments,
};

#[derive(FromSqlRow, AsExpression, PartialEq, Copy, Clone, Debug)]
#[diesel(sql_type = crate::schema::sql_types::OrderStatus)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl ToSql<crate::schema::sql_types::OrderStatus, Pg> for OrderStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match *self {
            OrderStatus::Pending => out.write_all(b"PENDING")?,
            OrderStatus::Confirmed => out.write_all(b"CONFIRMED")?,
            OrderStatus::Preparing => out.write_all(b"PREPARING")?,
            OrderStatus::Ready => out.write_all(b"READY")?,
            OrderStatus::Completed => out.write_all(b"COMPLETED")?,
            OrderStatus::Cancelled => out.write_all(b"CANCELLED")?,
        }
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::OrderStatus, Pg> for OrderStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"PENDING" => Ok(OrderStatus::Pending),
            b"CONFIRMED" => Ok(OrderStatus::Confirmed),
            b"PREPARING" => Ok(OrderStatus::Preparing),
            b"READY" => Ok(OrderStatus::Ready),
            b"COMPLETED" => Ok(OrderStatus::Completed),
            b"CANCELLED" => Ok(OrderStatus::Cancelled),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl From<canteen_proto::canteen_service::OrderStatus> for OrderStatus {
    fn from(s: canteen_proto::canteen_service::OrderStatus) -> Self {
        match s {
            canteen_proto::canteen_service::OrderStatus::Pending => OrderStatus::Pending,
            canteen_proto::canteen_service::OrderStatus::Confirmed => OrderStatus::Confirmed,
            canteen_proto::canteen_service::OrderStatus::Preparing => OrderStatus::Preparing,
            canteen_proto::canteen_service::OrderStatus::Ready => OrderStatus::Ready,
            canteen_proto::canteen_service::OrderStatus::Completed => OrderStatus::Completed,
            canteen_proto::canteen_service::OrderStatus::Cancelled => OrderStatus::Cancelled,
        }
    }
}

impl From<OrderStatus> for canteen_proto::canteen_service::OrderStatus {
    fn from(s: OrderStatus) -> Self {
        match s {
            OrderStatus::Pending => canteen_proto::canteen_service::OrderStatus::Pending,
            OrderStatus::Confirmed => canteen_proto::canteen_service::OrderStatus::Confirmed,
            OrderStatus::Preparing => canteen_proto::canteen_service::OrderStatus::Preparing,
            OrderStatus::Ready => canteen_proto::canteen_service::OrderStatus::Ready,
            OrderStatus::Completed => canteen_proto::canteen_service::OrderStatus::Completed,
            OrderStatus::Cancelled => canteen_proto::canteen_service::OrderStatus::Cancelled,
        }
    }
}

#[derive(FromSqlRow, AsExpression, PartialEq, Copy, Clone, Debug)]
#[diesel(sql_type = crate::schema::sql_types::PaymentMethod)]
pub enum PaymentMethod {
    Card,
    Upi,
    Cash,
    Wallet,
}

impl ToSql<crate::schema::sql_types::PaymentMethod, Pg> for PaymentMethod {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match *self {
            PaymentMethod::Card => out.write_all(b"CARD")?,
            PaymentMethod::Upi => out.write_all(b"UPI")?,
            PaymentMethod::Cash => out.write_all(b"CASH")?,
            PaymentMethod::Wallet => out.write_all(b"WALLET")?,
        }
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::PaymentMethod, Pg> for PaymentMethod {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"CARD" => Ok(PaymentMethod::Card),
            b"UPI" => Ok(PaymentMethod::Upi),
            b"CASH" => Ok(PaymentMethod::Cash),
            b"WALLET" => Ok(PaymentMethod::Wallet),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl From<canteen_proto::canteen_service::PaymentMethod> for PaymentMethod {
    fn from(m: canteen_proto::canteen_service::PaymentMethod) -> Self {
        match m {
            canteen_proto::canteen_service::PaymentMethod::Card => PaymentMethod::Card,
            canteen_proto::canteen_service::PaymentMethod::Upi => PaymentMethod::Upi,
            canteen_proto::canteen_service::PaymentMethod::Cash => PaymentMethod::Cash,
            canteen_proto::canteen_service::PaymentMethod::Wallet => PaymentMethod::Wallet,
        }
    }
}

impl From<PaymentMethod> for canteen_proto::canteen_service::PaymentMethod {
    fn from(m: PaymentMethod) -> Self {
        match m {
            PaymentMethod::Card => canteen_proto::canteen_service::PaymentMethod::Card,
            PaymentMethod::Upi => canteen_proto::canteen_service::PaymentMethod::Upi,
            PaymentMethod::Cash => canteen_proto::canteen_service::PaymentMethod::Cash,
            PaymentMethod::Wallet => canteen_proto::canteen_service::PaymentMethod::Wallet,
        }
    }
}

#[derive(FromSqlRow, AsExpression, PartialEq, Copy, Clone, Debug)]
#[diesel(sql_type = crate::schema::sql_types::PaymentStatus)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl ToSql<crate::schema::sql_types::PaymentStatus, Pg> for PaymentStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match *self {
            PaymentStatus::Pending => out.write_all(b"PENDING")?,
            PaymentStatus::Completed => out.write_all(b"COMPLETED")?,
            PaymentStatus::Failed => out.write_all(b"FAILED")?,
        }
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::PaymentStatus, Pg> for PaymentStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"PENDING" => Ok(PaymentStatus::Pending),
            b"COMPLETED" => Ok(PaymentStatus::Completed),
            b"FAILED" => Ok(PaymentStatus::Failed),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl From<PaymentStatus> for canteen_proto::canteen_service::PaymentStatus {
    fn from(s: PaymentStatus) -> Self {
        match s {
            PaymentStatus::Pending => canteen_proto::canteen_service::PaymentStatus::Pending,
            PaymentStatus::Completed => canteen_proto::canteen_service::PaymentStatus::Completed,
            PaymentStatus::Failed => canteen_proto::canteen_service::PaymentStatus::Failed,
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Insertable, Debug, PartialEq)]
#[diesel(table_name = food_categories)]
pub struct FoodCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub display_order: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, Debug, PartialEq, Clone)]
#[diesel(table_name = food_items)]
pub struct FoodItem {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub calories: Option<i32>,
    pub prep_time_minutes: i32,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, Debug, PartialEq)]
#[diesel(table_name = cart_items)]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_item_id: Uuid,
    pub quantity: i32,
    pub special_instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, Debug, PartialEq, Clone)]
#[diesel(table_name = orders)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_amount: BigDecimal,
    pub pickup_time: DateTime<Utc>,
    pub special_instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Insertable, Debug, PartialEq, Clone)]
#[diesel(belongs_to(Order))]
#[diesel(table_name = order_items)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub food_item_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub subtotal: BigDecimal,
    pub special_instructions: Option<String>,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Insertable, Debug, PartialEq)]
#[diesel(belongs_to(Order))]
#[diesel(table_name = payments)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub amount: BigDecimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, PartialEq)]
#[diesel(table_name = loyalty_points, primary_key(user_id))]
pub struct LoyaltyAccount {
    pub user_id: Uuid,
    pub points: i32,
    pub total_earned: i32,
    pub level_name: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Debug, PartialEq)]
#[diesel(table_name = canteen_status)]
pub struct CanteenStatusRow {
    pub id: Uuid,
    pub queue_length: i32,
    pub available_seats: i32,
    pub total_seats: i32,
    pub rush_hour: bool,
    pub estimated_wait_minutes: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Debug, PartialEq)]
#[diesel(table_name = outbox)]
pub struct Outbox {
    pub id: i32,
    pub topic: String,
    pub key: String,
    pub value: Vec<u8>,
}

#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = outbox)]
pub struct NewOutbox {
    pub topic: String,
    pub key: String,
    pub value: Vec<u8>,
}
