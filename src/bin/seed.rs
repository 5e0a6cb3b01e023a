//! Seed script for development — populates a fresh database with sample users.
//!
//! Usage: `cargo run --bin seed`
//!
//! Reads `MONGO_URL` / `MONGO_DATABASE` like the server (and `.env`).

use adminboard::config::AppConfig;
use adminboard::db;
use adminboard::models::user::{User, UserRole};
use adminboard::services::{auth, user as user_service};
use chrono::{Duration, Utc};
use mongodb::bson;
use mongodb::Database;

const ADMIN_EMAIL: &str = "admin@adminboard.local";
const ADMIN_PASSWORD: &str = "Admin123!";
const SAMPLE_PASSWORD: &str = "password123";

const SAMPLE_PEOPLE: [(&str, &str); 12] = [
    ("Jane", "Doe"),
    ("John", "Smith"),
    ("Amara", "Okafor"),
    ("Luis", "García"),
    ("Mei", "Chen"),
    ("Noah", "Williams"),
    ("Priya", "Patel"),
    ("Omar", "Haddad"),
    ("Sofia", "Rossi"),
    ("Kenji", "Tanaka"),
    ("Elena", "Ivanova"),
    ("Tom", "Becker"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let db = db::connect(&config.mongo_url, &config.mongo_database).await?;
    db::ensure_indexes(&db).await?;

    println!("=== adminboard Seed Script ===");

    if user_service::find_by_email(&db, ADMIN_EMAIL).await?.is_some() {
        println!("[skip] Admin user already exists");
    } else {
        seed_staff(&db).await?;
        seed_sample_users(&db).await?;
    }

    let total = user_service::count(&db).await?;
    println!("\n=== Seed complete! {total} users ===");
    println!("Admin login: {ADMIN_EMAIL} / {ADMIN_PASSWORD}");

    Ok(())
}

struct SeedUser<'a> {
    first: &'a str,
    last: &'a str,
    email: &'a str,
    password: &'a str,
    role: UserRole,
    /// Signup age: whole days plus extra hours.
    age: (i64, i64),
}

async fn insert(db: &Database, seed: SeedUser<'_>) -> anyhow::Result<()> {
    let mut user = User::new(seed.first, seed.last, seed.email, auth::hash_password(seed.password)?);
    user.role = seed.role;
    let (days, hours) = seed.age;
    let created = Utc::now() - Duration::days(days) - Duration::hours(hours);
    user.created_at = bson::DateTime::from_chrono(created);
    user.updated_at = user.created_at;
    user_service::create(db, user).await?;
    Ok(())
}

async fn seed_staff(db: &Database) -> anyhow::Result<()> {
    insert(
        db,
        SeedUser {
            first: "Ada",
            last: "Admin",
            email: ADMIN_EMAIL,
            password: ADMIN_PASSWORD,
            role: UserRole::Admin,
            age: (120, 0),
        },
    )
    .await?;
    insert(
        db,
        SeedUser {
            first: "Theo",
            last: "Teacher",
            email: "teacher@adminboard.local",
            password: SAMPLE_PASSWORD,
            role: UserRole::Teacher,
            age: (95, 3),
        },
    )
    .await?;
    println!("[done] Created admin and teacher users");
    Ok(())
}

/// Several accounts per person, with signup dates spread over the last 90 days.
async fn seed_sample_users(db: &Database) -> anyhow::Result<()> {
    let mut created = 0;
    for round in 0..4_i64 {
        for (i, (first, last)) in SAMPLE_PEOPLE.iter().enumerate() {
            let i = i as i64;
            let n = round * SAMPLE_PEOPLE.len() as i64 + i;
            let email = format!(
                "{}.{}{}@example.com",
                first.to_lowercase(),
                last.to_lowercase(),
                round
            );
            let role = if n % 7 == 0 {
                UserRole::Teacher
            } else {
                UserRole::User
            };
            insert(
                db,
                SeedUser {
                    first: *first,
                    last: *last,
                    email: &email,
                    password: SAMPLE_PASSWORD,
                    role,
                    age: ((n * 11) % 90, (n * 5) % 24),
                },
            )
            .await?;
            created += 1;
        }
    }
    println!("[done] Created {created} sample users");
    Ok(())
}
