use canteen_proto::canteen_service::{
    canteen_event, CanteenEvent, LoyaltyPointsAwardedEvent, OrderLine, OrderPlacedEvent,
};
use canteen_proto::common::Money;
use diesel::{prelude::*, PgConnection};
use prost::Message;
use prost_types::Timestamp;
use uuid::Uuid;

use crate::{models, models::NewOutbox, schema, EVENT_CHANNEL};

pub struct CanteenEventPublisher<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> CanteenEventPublisher<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }

    pub fn order_placed(
        &mut self,
        order: &models::Order,
        items: &[models::OrderItem],
    ) -> Result<(), diesel::result::Error> {
        let event = CanteenEvent {
            event: Some(canteen_event::Event::OrderPlaced(OrderPlacedEvent {
                id: order.id.to_string(),
                user_id: order.user_id.to_string(),
                order_number: order.order_number.to_string(),
                total_amount: Some(Money {
                    amount: order.total_amount.to_string(),
                }),
                pickup_time: Some(Timestamp {
                    seconds: order.pickup_time.timestamp(),
                    nanos: order.pickup_time.timestamp_subsec_nanos() as i32,
                }),
                lines: items
                    .iter()
                    .map(|i| OrderLine {
                        food_item_id: i.food_item_id.to_string(),
                        quantity: i.quantity,
                        unit_price: Some(Money {
                            amount: i.unit_price.to_string(),
                        }),
                        subtotal: Some(Money {
                            amount: i.subtotal.to_string(),
                        }),
                        special_instructions: i.special_instructions.clone(),
                    })
                    .collect(),
            })),
        };
        self.publish(event, &order.id)
    }

    pub fn loyalty_points_awarded(
        &mut self,
        account: &models::LoyaltyAccount,
        earned: i32,
    ) -> Result<(), diesel::result::Error> {
        let event = CanteenEvent {
            event: Some(canteen_event::Event::LoyaltyPointsAwarded(
                LoyaltyPointsAwardedEvent {
                    user_id: account.user_id.to_string(),
                    points: earned,
                    level_name: account.level_name.to_string(),
                },
            )),
        };
        self.publish(event, &account.user_id)
    }

    fn publish(&mut self, event: CanteenEvent, key: &Uuid) -> Result<(), diesel::result::Error> {
        let mut buf = Vec::new();
        event.encode(&mut buf).unwrap();

        diesel::insert_into(schema::outbox::table)
            .values(NewOutbox {
                topic: EVENT_CHANNEL.to_string(),
                key: key.to_string(),
                value: buf,
            })
            .execute(self.conn)
            .map(|_| ())
    }
}
