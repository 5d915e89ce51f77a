use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::Utc;
use diesel::{insert_into, prelude::*, PgConnection};
use uuid::Uuid;

use crate::{models::LoyaltyAccount, schema};

/// One point per 10 currency units of order total, floored.
const EARN_DIVISOR: u32 = 10;

const LEVELS: [(i32, &str); 3] = [(2000, "Gold"), (500, "Silver"), (0, "Bronze")];

pub fn points_for_total(total: &BigDecimal) -> i32 {
    (total / BigDecimal::from(EARN_DIVISOR))
        .with_scale_round(0, bigdecimal::RoundingMode::Floor)
        .to_i32()
        .unwrap_or(0)
}

pub fn level_for(total_earned: i32) -> &'static str {
    LEVELS
        .iter()
        .find(|(threshold, _)| total_earned >= *threshold)
        .map(|(_, name)| *name)
        .unwrap_or("Bronze")
}

/// Credits the points earned by an order. Runs inside the checkout
/// transaction, so a failed checkout never awards points.
pub fn award_for_order(
    conn: &mut PgConnection,
    user_id: &Uuid,
    total: &BigDecimal,
) -> Result<(LoyaltyAccount, i32), diesel::result::Error> {
    let earned = points_for_total(total);

    let existing = schema::loyalty_points::table
        .select(LoyaltyAccount::as_select())
        .find(user_id)
        .first::<LoyaltyAccount>(conn)
        .optional()?;

    let (points, total_earned) = match &existing {
        Some(account) => (account.points + earned, account.total_earned + earned),
        None => (earned, earned),
    };
    let account = LoyaltyAccount {
        user_id: *user_id,
        points,
        total_earned,
        level_name: level_for(total_earned).to_string(),
        updated_at: Utc::now(),
    };

    insert_into(schema::loyalty_points::table)
        .values(&account)
        .on_conflict(schema::loyalty_points::user_id)
        .do_update()
        .set(&account)
        .execute(conn)?;

    Ok((account, earned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn points_are_floored_per_ten_units() {
        assert_eq!(points_for_total(&BigDecimal::from_str("195").unwrap()), 19);
        assert_eq!(points_for_total(&BigDecimal::from_str("199.99").unwrap()), 19);
        assert_eq!(points_for_total(&BigDecimal::from_str("200").unwrap()), 20);
        assert_eq!(points_for_total(&BigDecimal::from_str("9.5").unwrap()), 0);
    }

    #[test]
    fn levels_follow_lifetime_earnings() {
        assert_eq!(level_for(0), "Bronze");
        assert_eq!(level_for(499), "Bronze");
        assert_eq!(level_for(500), "Silver");
        assert_eq!(level_for(1999), "Silver");
        assert_eq!(level_for(2000), "Gold");
    }
}
