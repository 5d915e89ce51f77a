pub mod sql_types {
    #[derive(diesel::query_builder::QueryId, Clone, diesel::sql_types::SqlType)]
    #[diesel(postgres_type(name = "order_status"))]
    pub struct OrderStatus;

    #[derive(diesel::query_builder::QueryId, Clone, diesel::sql_types::SqlType)]
    #[diesel(postgres_type(name = "payment_method"))]
    pub struct PaymentMethod;

    #[derive(diesel::query_builder::QueryId, Clone, diesel::sql_types::SqlType)]
    #[diesel(postgres_type(name = "payment_status"))]
    pub struct PaymentStatus;
}

diesel::table! {
    food_categories (id) {
        id -> Uuid,
        name -> Text,
        description -> Nullable<Text>,
        display_order -> Int4,
        active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    food_items (id) {
        id -> Uuid,
        category_id -> Nullable<Uuid>,
        name -> Text,
        description -> Nullable<Text>,
        price -> Numeric,
        image_url -> Nullable<Text>,
        calories -> Nullable<Int4>,
        prep_time_minutes -> Int4,
        available -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    cart_items (id) {
        id -> Uuid,
        user_id -> Uuid,
        food_item_id -> Uuid,
        quantity -> Int4,
        special_instructions -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    use diesel::sql_types::*;
    use super::sql_types::OrderStatus;

    orders (id) {
        id -> Uuid,
        user_id -> Uuid,
        order_number -> Text,
        status -> OrderStatus,
        total_amount -> Numeric,
        pickup_time -> Timestamptz,
        special_instructions -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    order_items (id) {
        id -> Uuid,
        order_id -> Uuid,
        food_item_id -> Uuid,
        quantity -> Int4,
        unit_price -> Numeric,
        subtotal -> Numeric,
        special_instructions -> Nullable<Text>,
    }
}

diesel::table! {
    use diesel::sql_types::*;
    use super::sql_types::{PaymentMethod, PaymentStatus};

    payments (id) {
        id -> Uuid,
        order_id -> Uuid,
        user_id -> Uuid,
        amount -> Numeric,
        method -> PaymentMethod,
        status -> PaymentStatus,
        transaction_id -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    loyalty_points (user_id) {
        user_id -> Uuid,
        points -> Int4,
        total_earned -> Int4,
        level_name -> Text,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    canteen_status (id) {
        id -> Uuid,
        queue_length -> Int4,
        available_seats -> Int4,
        total_seats -> Int4,
        rush_hour -> Bool,
        estimated_wait_minutes -> Int4,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    outbox (id) {
        id -> Int4,
        topic -> Text,
        key -> Text,
        value -> Bytea,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(food_items -> food_categories (category_id));
diesel::joinable!(cart_items -> food_items (food_item_id));
diesel::joinable!(order_items -> orders (order_id));
diesel::joinable!(order_items -> food_items (food_item_id));
diesel::joinable!(payments -> orders (order_id));

diesel::allow_tables_to_appear_in_same_query!(
    food_categories,
    food_items,
    cart_items,
    orders,
    order_items,
    payments,
    loyalty_points,
    canteen_status,
    outbox,
);
