use std::env;

use diesel::{Connection, PgConnection};
use dotenvy::dotenv;

pub mod cart;
pub mod checkout;
pub mod events;
pub mod loyalty;
pub mod models;
pub mod planner;
pub mod schema;

pub const EVENT_CHANNEL: &str = "canteen.event";

pub fn establish_connection() -> PgConnection {
    dotenv().ok();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgConnection::establish(&database_url).unwrap()
}
