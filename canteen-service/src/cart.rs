use diesel::{delete, insert_into, prelude::*, result::DatabaseErrorKind, PgConnection};
use thiserror::Error;
use uuid::Uuid;

use crate::{models, schema};

#[derive(Error, Debug)]
pub enum CartError {
    #[error("Quantity {0} is not a valid cart quantity")]
    InvalidQuantity(i32),
    #[error("Food item {0} does not exist")]
    UnknownFoodItem(Uuid),
    #[error("Unexpected internal error")]
    Database(#[from] diesel::result::Error),
}

/// Upserts the (user, food item) line. A quantity of 0 deletes the line,
/// same as `remove_line`.
pub fn set_quantity(
    conn: &mut PgConnection,
    user_id: &Uuid,
    food_item_id: &Uuid,
    quantity: i32,
    special_instructions: Option<String>,
) -> Result<(), CartError> {
    if quantity < 0 {
        return Err(CartError::InvalidQuantity(quantity));
    }
    if quantity == 0 {
        return remove_line(conn, user_id, food_item_id);
    }

    let result = insert_into(schema::cart_items::table)
        .values((
            schema::cart_items::id.eq(Uuid::new_v4()),
            schema::cart_items::user_id.eq(user_id),
            schema::cart_items::food_item_id.eq(food_item_id),
            schema::cart_items::quantity.eq(quantity),
            schema::cart_items::special_instructions.eq(special_instructions.clone()),
        ))
        .on_conflict((
            schema::cart_items::user_id,
            schema::cart_items::food_item_id,
        ))
        .do_update()
        .set((
            schema::cart_items::quantity.eq(quantity),
            schema::cart_items::special_instructions.eq(special_instructions),
        ))
        .execute(conn);

    match result {
        Ok(_) => Ok(()),
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)) => {
            Err(CartError::UnknownFoodItem(*food_item_id))
        }
        Err(err) => Err(err.into()),
    }
}

/// Idempotent: deleting a line that does not exist is not an error.
pub fn remove_line(
    conn: &mut PgConnection,
    user_id: &Uuid,
    food_item_id: &Uuid,
) -> Result<(), CartError> {
    delete(
        schema::cart_items::table
            .filter(schema::cart_items::user_id.eq(user_id))
            .filter(schema::cart_items::food_item_id.eq(food_item_id)),
    )
    .execute(conn)?;
    Ok(())
}

/// Cart lines joined with their food item at read time. Prices here are live
/// catalog prices; they only become a snapshot at checkout.
pub fn list_lines(
    conn: &mut PgConnection,
    user_id: &Uuid,
) -> Result<Vec<(models::CartItem, models::FoodItem)>, diesel::result::Error> {
    schema::cart_items::table
        .inner_join(schema::food_items::table)
        .filter(schema::cart_items::user_id.eq(user_id))
        .order(schema::cart_items::created_at.asc())
        .select((
            models::CartItem::as_select(),
            models::FoodItem::as_select(),
        ))
        .load::<(models::CartItem, models::FoodItem)>(conn)
}
