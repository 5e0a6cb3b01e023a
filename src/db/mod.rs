//! MongoDB connection and collection utilities.

use mongodb::bson::doc;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};

use crate::models::user::User;

/// Name of the collection holding user documents.
pub const USERS_COLLECTION: &str = "users";

/// Connect to MongoDB and select the application database.
pub async fn connect(mongo_url: &str, database: &str) -> Result<Database, mongodb::error::Error> {
    let mut options = ClientOptions::parse(mongo_url).await?;
    options.app_name = Some("adminboard".to_string());
    let client = Client::with_options(options)?;
    Ok(client.database(database))
}

/// Typed handle to the users collection.
pub fn users(db: &Database) -> Collection<User> {
    db.collection::<User>(USERS_COLLECTION)
}

/// Create the indexes the user and dashboard queries rely on.
pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let email = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    let created_at = IndexModel::builder()
        .keys(doc! { "createdAt": -1 })
        .build();
    let role = IndexModel::builder().keys(doc! { "role": 1 }).build();

    users(db).create_indexes([email, created_at, role]).await?;
    Ok(())
}

/// Round-trip a `ping` command to check connectivity.
pub async fn ping(db: &Database) -> Result<(), mongodb::error::Error> {
    db.run_command(doc! { "ping": 1 }).await?;
    Ok(())
}
