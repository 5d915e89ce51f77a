use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use diesel::{delete, insert_into, prelude::*, Connection, PgConnection};
use thiserror::Error;
use uuid::Uuid;

use crate::{cart, events::CanteenEventPublisher, loyalty, models, schema};

/// Pickup is free; kept as the surcharge extension point.
pub fn delivery_fee() -> BigDecimal {
    BigDecimal::from(0)
}

pub const DEFAULT_PICKUP_DELAY_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
    Order,
    OrderItems,
    Payment,
    Loyalty,
    ClearCart,
    PublishEvent,
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckoutStep::Order => "order write",
            CheckoutStep::OrderItems => "order items write",
            CheckoutStep::Payment => "payment write",
            CheckoutStep::Loyalty => "loyalty award",
            CheckoutStep::ClearCart => "cart clear",
            CheckoutStep::PublishEvent => "event publish",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Cannot place an order with an empty cart")]
    EmptyCart,
    #[error("Requested pickup time {0} is in the past")]
    InvalidPickupTime(DateTime<Utc>),
    #[error("Checkout failed during {step}")]
    Write {
        step: CheckoutStep,
        source: diesel::result::Error,
    },
    #[error("Unexpected internal error")]
    Database(#[from] diesel::result::Error),
}

fn at_step(step: CheckoutStep) -> impl Fn(diesel::result::Error) -> CheckoutError {
    move |source| CheckoutError::Write { step, source }
}

/// The rows a checkout will durably create, assembled without touching the
/// store. Unit prices are snapshotted here and never re-read.
#[derive(Debug)]
pub struct OrderDraft {
    pub order: models::Order,
    pub items: Vec<models::OrderItem>,
    pub payment: models::Payment,
}

impl OrderDraft {
    pub fn assemble(
        user_id: &Uuid,
        cart_lines: &[(models::CartItem, models::FoodItem)],
        method: models::PaymentMethod,
        requested_pickup: Option<DateTime<Utc>>,
        special_instructions: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<OrderDraft, CheckoutError> {
        if cart_lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let pickup_time = match requested_pickup {
            Some(t) if t < now => return Err(CheckoutError::InvalidPickupTime(t)),
            Some(t) => t,
            None => now + Duration::minutes(DEFAULT_PICKUP_DELAY_MINUTES),
        };

        let order_id = Uuid::new_v4();
        let items = cart_lines
            .iter()
            .map(|(line, food)| models::OrderItem {
                id: Uuid::new_v4(),
                order_id,
                food_item_id: line.food_item_id,
                quantity: line.quantity,
                unit_price: food.price.clone(),
                subtotal: &food.price * BigDecimal::from(line.quantity),
                special_instructions: line.special_instructions.clone(),
            })
            .collect::<Vec<_>>();

        let subtotal: BigDecimal = items.iter().map(|i| i.subtotal.clone()).sum();
        let total_amount = subtotal + delivery_fee();

        let order = models::Order {
            id: order_id,
            user_id: *user_id,
            order_number: format!("ORD-{}", now.timestamp_millis()),
            status: models::OrderStatus::Pending,
            total_amount: total_amount.clone(),
            pickup_time,
            special_instructions,
            created_at: now,
        };
        let payment = models::Payment {
            id: Uuid::new_v4(),
            order_id,
            user_id: *user_id,
            amount: total_amount,
            method,
            // Recorded intent only; there is no gateway call behind this.
            status: models::PaymentStatus::Completed,
            transaction_id: format!("TXN-{}", now.timestamp_millis()),
            created_at: now,
        };

        Ok(OrderDraft {
            order,
            items,
            payment,
        })
    }

    /// Runs the checkout writes in a single transaction: order, order items,
    /// payment, loyalty award, cart clear, outbox events. A failure at any
    /// step rolls everything back.
    pub fn commit(&self, conn: &mut PgConnection) -> Result<(), CheckoutError> {
        let user_id = self.order.user_id;
        conn.transaction::<_, CheckoutError, _>(|conn| {
            insert_into(schema::orders::table)
                .values(&self.order)
                .execute(conn)
                .map_err(at_step(CheckoutStep::Order))?;

            insert_into(schema::order_items::table)
                .values(&self.items)
                .execute(conn)
                .map_err(at_step(CheckoutStep::OrderItems))?;

            insert_into(schema::payments::table)
                .values(&self.payment)
                .execute(conn)
                .map_err(at_step(CheckoutStep::Payment))?;

            let (account, earned) =
                loyalty::award_for_order(conn, &user_id, &self.order.total_amount)
                    .map_err(at_step(CheckoutStep::Loyalty))?;

            delete(schema::cart_items::table.filter(schema::cart_items::user_id.eq(user_id)))
                .execute(conn)
                .map_err(at_step(CheckoutStep::ClearCart))?;

            let mut publisher = CanteenEventPublisher::new(conn);
            publisher
                .order_placed(&self.order, &self.items)
                .map_err(at_step(CheckoutStep::PublishEvent))?;
            publisher
                .loyalty_points_awarded(&account, earned)
                .map_err(at_step(CheckoutStep::PublishEvent))?;

            Ok(())
        })
    }
}

/// Converts the owner's cart into a durable order. All writes run in a single
/// transaction: a failure at any step rolls everything back and leaves the
/// cart untouched.
pub fn place_order(
    conn: &mut PgConnection,
    user_id: &Uuid,
    method: models::PaymentMethod,
    requested_pickup: Option<DateTime<Utc>>,
    special_instructions: Option<String>,
) -> Result<(models::Order, Vec<models::OrderItem>), CheckoutError> {
    let cart_lines = cart::list_lines(conn, user_id)?;
    let draft = OrderDraft::assemble(
        user_id,
        &cart_lines,
        method,
        requested_pickup,
        special_instructions,
        Utc::now(),
    )?;

    println!(
        "Placing order {} ({} lines) for user {}",
        draft.order.order_number,
        draft.items.len(),
        user_id
    );

    match draft.commit(conn) {
        Ok(()) => Ok((draft.order, draft.items)),
        Err(err) => {
            eprintln!(
                "Failed to place order {} for user {}: {:?}",
                draft.order.order_number, user_id, err
            );
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn food_item(name: &str, price: &str, prep_time_minutes: i32) -> models::FoodItem {
        let now = Utc::now();
        models::FoodItem {
            id: Uuid::new_v4(),
            category_id: None,
            name: name.to_string(),
            description: None,
            price: BigDecimal::from_str(price).unwrap(),
            image_url: None,
            calories: None,
            prep_time_minutes,
            available: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn cart_line(
        user_id: &Uuid,
        food: &models::FoodItem,
        quantity: i32,
    ) -> (models::CartItem, models::FoodItem) {
        (
            models::CartItem {
                id: Uuid::new_v4(),
                user_id: *user_id,
                food_item_id: food.id,
                quantity,
                special_instructions: None,
                created_at: Utc::now(),
            },
            food.clone(),
        )
    }

    #[test]
    fn totals_and_subtotals_add_up() {
        let user_id = Uuid::new_v4();
        let dosa = food_item("Masala Dosa", "60", 15);
        let paneer = food_item("Paneer Butter Masala", "75", 20);
        let lines = vec![cart_line(&user_id, &dosa, 2), cart_line(&user_id, &paneer, 1)];

        let draft = OrderDraft::assemble(
            &user_id,
            &lines,
            models::PaymentMethod::Upi,
            None,
            None,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(draft.items.len(), 2);
        assert_eq!(draft.items[0].subtotal, BigDecimal::from(120));
        assert_eq!(draft.items[1].subtotal, BigDecimal::from(75));
        assert_eq!(draft.order.total_amount, BigDecimal::from(195));

        let line_sum: BigDecimal = draft.items.iter().map(|i| i.subtotal.clone()).sum();
        assert_eq!(draft.order.total_amount, line_sum);
        for item in &draft.items {
            assert_eq!(
                item.subtotal,
                &item.unit_price * BigDecimal::from(item.quantity)
            );
        }
    }

    #[test]
    fn unit_price_is_snapshotted_from_catalog() {
        let user_id = Uuid::new_v4();
        let biryani = food_item("Chicken Biryani", "85.50", 25);
        let lines = vec![cart_line(&user_id, &biryani, 3)];

        let draft = OrderDraft::assemble(
            &user_id,
            &lines,
            models::PaymentMethod::Card,
            None,
            None,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(draft.items[0].unit_price, biryani.price);
        assert_eq!(
            draft.order.total_amount,
            BigDecimal::from_str("256.50").unwrap()
        );
    }

    #[test]
    fn empty_cart_is_rejected() {
        let user_id = Uuid::new_v4();
        let err = OrderDraft::assemble(
            &user_id,
            &[],
            models::PaymentMethod::Cash,
            None,
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[test]
    fn past_pickup_time_is_rejected() {
        let user_id = Uuid::new_v4();
        let idli = food_item("Idli Sambar", "35", 10);
        let lines = vec![cart_line(&user_id, &idli, 1)];
        let now = Utc::now();

        let err = OrderDraft::assemble(
            &user_id,
            &lines,
            models::PaymentMethod::Upi,
            Some(now - Duration::minutes(5)),
            None,
            now,
        )
        .unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidPickupTime(_)));
    }

    #[test]
    fn pickup_defaults_to_thirty_minutes_out() {
        let user_id = Uuid::new_v4();
        let idli = food_item("Idli Sambar", "35", 10);
        let lines = vec![cart_line(&user_id, &idli, 1)];
        let now = Utc::now();

        let draft = OrderDraft::assemble(
            &user_id,
            &lines,
            models::PaymentMethod::Upi,
            None,
            None,
            now,
        )
        .unwrap();
        assert_eq!(draft.order.pickup_time, now + Duration::minutes(30));
    }

    #[test]
    fn requested_pickup_time_is_kept() {
        let user_id = Uuid::new_v4();
        let idli = food_item("Idli Sambar", "35", 10);
        let lines = vec![cart_line(&user_id, &idli, 1)];
        let now = Utc::now();
        let requested = now + Duration::hours(2);

        let draft = OrderDraft::assemble(
            &user_id,
            &lines,
            models::PaymentMethod::Wallet,
            Some(requested),
            None,
            now,
        )
        .unwrap();
        assert_eq!(draft.order.pickup_time, requested);
    }

    #[test]
    fn payment_mirrors_order_total() {
        let user_id = Uuid::new_v4();
        let pav = food_item("Pav Bhaji", "50", 12);
        let lines = vec![cart_line(&user_id, &pav, 4)];

        let draft = OrderDraft::assemble(
            &user_id,
            &lines,
            models::PaymentMethod::Card,
            None,
            None,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(draft.payment.order_id, draft.order.id);
        assert_eq!(draft.payment.amount, draft.order.total_amount);
        assert_eq!(draft.payment.method, models::PaymentMethod::Card);
        assert_eq!(draft.payment.status, models::PaymentStatus::Completed);
        assert!(draft.payment.transaction_id.starts_with("TXN-"));
    }

    #[test]
    fn order_starts_pending_with_timestamped_number() {
        let user_id = Uuid::new_v4();
        let pav = food_item("Pav Bhaji", "50", 12);
        let lines = vec![cart_line(&user_id, &pav, 1)];
        let now = Utc::now();

        let draft = OrderDraft::assemble(
            &user_id,
            &lines,
            models::PaymentMethod::Upi,
            None,
            None,
            now,
        )
        .unwrap();

        assert_eq!(draft.order.status, models::OrderStatus::Pending);
        assert_eq!(
            draft.order.order_number,
            format!("ORD-{}", now.timestamp_millis())
        );
    }
}
