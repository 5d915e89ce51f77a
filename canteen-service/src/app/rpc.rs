use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::{prelude::*, PgConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use prost_types::Timestamp;
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use uuid::Uuid;

use canteen_proto::canteen_service::canteen_service_server::{
    CanteenService, CanteenServiceServer,
};
use canteen_proto::canteen_service::{
    CanteenStatus, Cart, CartLine, FoodCategory, FoodItem, GenerateMealPlanPayload,
    GetCanteenStatusPayload, GetCartPayload, GetOrderPayload, ListMenuPayload, ListMenuResponse,
    ListOrdersPayload, ListOrdersResponse, MealPlan, MealPlanDay, Order, OrderEdge, OrderLine,
    OrderStatus, PaymentMethod, PlaceOrderPayload, PlannedMeal, RemoveCartLinePayload,
    UpdateCartLinePayload,
};
use canteen_proto::common::Money;

use canteen_service::planner::{MealPlanRecommender, PlanConstraints, StaticRecommender};
use canteen_service::{cart, checkout, establish_connection, models, planner, schema};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

#[derive(Default)]
pub struct CanteenServiceImpl {
    recommender: StaticRecommender,
}

fn parse_user_id(raw: &str) -> Result<Uuid, Status> {
    if raw.is_empty() {
        return Err(Status::unauthenticated("user_id is required"));
    }
    raw.parse()
        .map_err(|_| Status::unauthenticated("Invalid user_id"))
}

fn money(amount: &BigDecimal) -> Money {
    Money {
        amount: amount.to_string(),
    }
}

fn timestamp(t: &DateTime<Utc>) -> Timestamp {
    Timestamp {
        seconds: t.timestamp(),
        nanos: t.timestamp_subsec_nanos() as i32,
    }
}

fn parse_timestamp(ts: &Timestamp) -> Result<DateTime<Utc>, Status> {
    DateTime::from_timestamp(ts.seconds, ts.nanos as u32)
        .ok_or_else(|| Status::invalid_argument("Invalid pickup_time"))
}

fn serialize_cart(lines: &[(models::CartItem, models::FoodItem)]) -> Cart {
    let subtotal: BigDecimal = lines
        .iter()
        .map(|(line, food)| &food.price * BigDecimal::from(line.quantity))
        .sum();
    let estimated_prep_minutes = lines
        .iter()
        .map(|(_, food)| food.prep_time_minutes)
        .max()
        .unwrap_or(0);
    Cart {
        lines: lines
            .iter()
            .map(|(line, food)| CartLine {
                food_item_id: line.food_item_id.to_string(),
                name: food.name.to_string(),
                quantity: line.quantity,
                unit_price: Some(money(&food.price)),
                prep_time_minutes: food.prep_time_minutes,
                image_url: food.image_url.clone(),
                special_instructions: line.special_instructions.clone(),
            })
            .collect(),
        subtotal: Some(money(&subtotal)),
        estimated_prep_minutes,
    }
}

fn serialize_order(order: &models::Order, items: &[models::OrderItem]) -> Order {
    Order {
        id: order.id.to_string(),
        user_id: order.user_id.to_string(),
        order_number: order.order_number.to_string(),
        status: OrderStatus::from(order.status).into(),
        total_amount: Some(money(&order.total_amount)),
        pickup_time: Some(timestamp(&order.pickup_time)),
        special_instructions: order.special_instructions.clone(),
        lines: items
            .iter()
            .map(|i| OrderLine {
                food_item_id: i.food_item_id.to_string(),
                quantity: i.quantity,
                unit_price: Some(money(&i.unit_price)),
                subtotal: Some(money(&i.subtotal)),
                special_instructions: i.special_instructions.clone(),
            })
            .collect(),
        created_at: Some(timestamp(&order.created_at)),
    }
}

fn load_cart(conn: &mut PgConnection, user_id: &Uuid) -> Result<Cart, Status> {
    let lines = cart::list_lines(conn, user_id)
        .map_err(|_| Status::internal("Internal server error"))?;
    Ok(serialize_cart(&lines))
}

#[tonic::async_trait]
impl CanteenService for CanteenServiceImpl {
    async fn list_menu(
        &self,
        request: Request<ListMenuPayload>,
    ) -> Result<Response<ListMenuResponse>, Status> {
        let payload = request.into_inner();
        let conn = &mut establish_connection();

        let categories = schema::food_categories::table
            .select(models::FoodCategory::as_select())
            .filter(schema::food_categories::active.eq(true))
            .order(schema::food_categories::display_order.asc())
            .get_results::<models::FoodCategory>(conn)
            .map_err(|_| Status::internal("Internal server error"))?;

        let mut query = schema::food_items::table
            .select(models::FoodItem::as_select())
            .into_boxed();

        if let Some(category_id) = payload.category_id {
            let cid: Uuid = category_id
                .parse()
                .map_err(|_| Status::invalid_argument("Invalid category_id"))?;
            query = query.filter(schema::food_items::category_id.eq(cid));
        }
        if !payload.include_unavailable {
            query = query.filter(schema::food_items::available.eq(true));
        }

        let items = query
            .order(schema::food_items::name.asc())
            .get_results::<models::FoodItem>(conn)
            .map_err(|_| Status::internal("Internal server error"))?;

        Ok(Response::new(ListMenuResponse {
            categories: categories
                .into_iter()
                .map(|c| FoodCategory {
                    id: c.id.to_string(),
                    name: c.name,
                    description: c.description,
                    display_order: c.display_order,
                })
                .collect(),
            items: items
                .into_iter()
                .map(|i| FoodItem {
                    id: i.id.to_string(),
                    category_id: i.category_id.map(|c| c.to_string()),
                    name: i.name,
                    description: i.description,
                    price: Some(money(&i.price)),
                    image_url: i.image_url,
                    calories: i.calories,
                    prep_time_minutes: i.prep_time_minutes,
                    available: i.available,
                })
                .collect(),
        }))
    }

    async fn get_cart(&self, request: Request<GetCartPayload>) -> Result<Response<Cart>, Status> {
        let payload = request.into_inner();
        let user_id = parse_user_id(&payload.user_id)?;

        let conn = &mut establish_connection();
        Ok(Response::new(load_cart(conn, &user_id)?))
    }

    async fn update_cart_line(
        &self,
        request: Request<UpdateCartLinePayload>,
    ) -> Result<Response<Cart>, Status> {
        let payload = request.into_inner();
        let user_id = parse_user_id(&payload.user_id)?;
        let food_item_id: Uuid = payload
            .food_item_id
            .parse()
            .map_err(|_| Status::invalid_argument("Invalid food_item_id"))?;

        let conn = &mut establish_connection();
        cart::set_quantity(
            conn,
            &user_id,
            &food_item_id,
            payload.quantity,
            payload.special_instructions,
        )
        .map_err(|err| match err {
            cart::CartError::InvalidQuantity(q) => {
                Status::invalid_argument(format!("Invalid quantity {}", q))
            }
            cart::CartError::UnknownFoodItem(_) => {
                Status::invalid_argument("Food item not exists")
            }
            cart::CartError::Database(_) => Status::internal("Internal server error"),
        })?;

        Ok(Response::new(load_cart(conn, &user_id)?))
    }

    async fn remove_cart_line(
        &self,
        request: Request<RemoveCartLinePayload>,
    ) -> Result<Response<Cart>, Status> {
        let payload = request.into_inner();
        let user_id = parse_user_id(&payload.user_id)?;
        let food_item_id: Uuid = payload
            .food_item_id
            .parse()
            .map_err(|_| Status::invalid_argument("Invalid food_item_id"))?;

        let conn = &mut establish_connection();
        cart::remove_line(conn, &user_id, &food_item_id)
            .map_err(|_| Status::internal("Internal server error"))?;

        Ok(Response::new(load_cart(conn, &user_id)?))
    }

    async fn place_order(
        &self,
        request: Request<PlaceOrderPayload>,
    ) -> Result<Response<Order>, Status> {
        let payload = request.into_inner();
        let user_id = parse_user_id(&payload.user_id)?;
        let method = PaymentMethod::try_from(payload.payment_method)
            .map(models::PaymentMethod::from)
            .map_err(|_| Status::invalid_argument("Invalid payment_method"))?;
        let requested_pickup = payload
            .pickup_time
            .as_ref()
            .map(parse_timestamp)
            .transpose()?;

        let conn = &mut establish_connection();
        let (order, items) = checkout::place_order(
            conn,
            &user_id,
            method,
            requested_pickup,
            payload.special_instructions,
        )
        .map_err(|err| match err {
            checkout::CheckoutError::EmptyCart => Status::failed_precondition("Cart is empty"),
            checkout::CheckoutError::InvalidPickupTime(_) => {
                Status::invalid_argument("pickup_time is in the past")
            }
            checkout::CheckoutError::Write { .. } | checkout::CheckoutError::Database(_) => {
                Status::internal("Failed to place order")
            }
        })?;

        Ok(Response::new(serialize_order(&order, &items)))
    }

    async fn get_order(
        &self,
        request: Request<GetOrderPayload>,
    ) -> Result<Response<Order>, Status> {
        let payload = request.into_inner();
        let oid: Uuid = payload
            .id
            .parse()
            .map_err(|_| Status::invalid_argument("Invalid order id"))?;

        let conn = &mut establish_connection();
        let order = match schema::orders::table
            .select(models::Order::as_select())
            .find(&oid)
            .get_result::<models::Order>(conn)
        {
            Ok(order) => order,
            Err(diesel::result::Error::NotFound) => {
                return Err(Status::not_found("order not found"))
            }
            Err(_) => return Err(Status::internal("Internal server error")),
        };
        let items = schema::order_items::table
            .select(models::OrderItem::as_select())
            .filter(schema::order_items::order_id.eq(&oid))
            .get_results(conn)
            .map_err(|_| Status::internal("Internal server error"))?;

        Ok(Response::new(serialize_order(&order, &items)))
    }

    async fn list_orders(
        &self,
        request: Request<ListOrdersPayload>,
    ) -> Result<Response<ListOrdersResponse>, Status> {
        let payload = request.into_inner();
        let user_id = parse_user_id(&payload.user_id)?;
        let conn = &mut establish_connection();

        let mut query = schema::orders::table
            .select(models::Order::as_select())
            .filter(schema::orders::user_id.eq(user_id))
            .into_boxed();

        let limit = payload.first.unwrap_or(10).clamp(0, 100) as i64;

        if let Some(after) = payload.after {
            // Cursor format is "timestamp:order_id"
            let parts: Vec<&str> = after.split(':').collect();
            if parts.len() != 2 {
                return Err(Status::invalid_argument("Invalid cursor format"));
            }

            let after_timestamp = parts[0]
                .parse::<i64>()
                .map_err(|_| Status::invalid_argument("Invalid cursor timestamp"))?;
            let after_order_id = parts[1]
                .parse::<Uuid>()
                .map_err(|_| Status::invalid_argument("Invalid cursor order_id"))?;

            let after_datetime = DateTime::from_timestamp(after_timestamp, 0)
                .ok_or_else(|| Status::invalid_argument("Invalid cursor timestamp"))?;

            query = query.filter(
                schema::orders::created_at
                    .lt(after_datetime)
                    .or(schema::orders::created_at
                        .eq(after_datetime)
                        .and(schema::orders::id.gt(after_order_id))),
            );
        }

        let orders = query
            .order((schema::orders::created_at.desc(), schema::orders::id.asc()))
            .limit(limit)
            .get_results::<models::Order>(conn)
            .map_err(|_| Status::internal("Internal server error"))?;

        let edges = orders
            .into_iter()
            .map(|order| {
                let items = schema::order_items::table
                    .select(models::OrderItem::as_select())
                    .filter(schema::order_items::order_id.eq(&order.id))
                    .get_results::<models::OrderItem>(conn)
                    .map_err(|_| Status::internal("Internal server error"))?;

                Ok(OrderEdge {
                    cursor: format!("{}:{}", order.created_at.timestamp(), order.id),
                    node: Some(serialize_order(&order, &items)),
                })
            })
            .collect::<Result<Vec<_>, Status>>()?;

        Ok(Response::new(ListOrdersResponse { edges }))
    }

    async fn get_canteen_status(
        &self,
        _request: Request<GetCanteenStatusPayload>,
    ) -> Result<Response<CanteenStatus>, Status> {
        let conn = &mut establish_connection();
        let status = match schema::canteen_status::table
            .select(models::CanteenStatusRow::as_select())
            .first::<models::CanteenStatusRow>(conn)
        {
            Ok(status) => status,
            Err(diesel::result::Error::NotFound) => {
                return Err(Status::not_found("canteen status not available"))
            }
            Err(_) => return Err(Status::internal("Internal server error")),
        };

        Ok(Response::new(CanteenStatus {
            queue_length: status.queue_length,
            available_seats: status.available_seats,
            total_seats: status.total_seats,
            rush_hour: status.rush_hour,
            estimated_wait_minutes: status.estimated_wait_minutes,
            updated_at: Some(timestamp(&status.updated_at)),
        }))
    }

    async fn generate_meal_plan(
        &self,
        request: Request<GenerateMealPlanPayload>,
    ) -> Result<Response<MealPlan>, Status> {
        let payload = request.into_inner();
        parse_user_id(&payload.user_id)?;

        let weekly_budget = payload
            .weekly_budget
            .map(|m| {
                m.amount
                    .parse::<BigDecimal>()
                    .map_err(|_| Status::invalid_argument("Invalid weekly_budget"))
            })
            .transpose()?
            .unwrap_or_else(|| BigDecimal::from(0));

        let constraints = PlanConstraints {
            weekly_budget,
            daily_calorie_target: payload.daily_calorie_target,
            health_goals: payload.health_goals,
            dietary_restrictions: payload.dietary_restrictions,
        };

        let plan = self.recommender.generate(&constraints).await;

        Ok(Response::new(serialize_plan(&plan)))
    }
}

fn serialize_meal(m: &planner::PlannedMeal) -> PlannedMeal {
    PlannedMeal {
        name: m.name.to_string(),
        price: Some(money(&m.price)),
        calories: m.calories,
    }
}

fn serialize_plan(plan: &planner::MealPlan) -> MealPlan {
    MealPlan {
        days: plan
            .days
            .iter()
            .map(|d| MealPlanDay {
                day: d.day.to_string(),
                breakfast: Some(serialize_meal(&d.breakfast)),
                lunch: Some(serialize_meal(&d.lunch)),
                dinner: Some(serialize_meal(&d.dinner)),
            })
            .collect(),
        total_cost: Some(money(&plan.total_cost())),
        total_calories: plan.total_calories(),
    }
}

pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = establish_connection();
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run migrations");

    let addr = "0.0.0.0:8110".parse().unwrap();
    let canteen_service = CanteenServiceImpl::default();

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<CanteenServiceServer<CanteenServiceImpl>>()
        .await;

    println!("listening on {}", addr);

    Server::builder()
        .add_service(health_service)
        .add_service(CanteenServiceServer::new(canteen_service))
        .serve(addr)
        .await?;

    Ok(())
}
