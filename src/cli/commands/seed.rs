use serde_json::json;

use crate::access::Role;
use crate::auth::password_digest;
use crate::cli::OutputFormat;
use crate::database::manager::DatabaseManager;

const SEED_VENUES: &[&str] = &[
    "Patrajasa Slipi",
    "Brin Gatsu",
    "Lippo",
    "Brin Thamrin",
    "Dharmagati",
    "Seskoad",
    "Samisara",
    "Bripens",
    "Paramita",
];

/// Idempotent baseline data: one superadmin, one regular user, and the
/// venue list. Existing rows are left untouched.
pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::pool().await?;

    let mut users_created: u64 = 0;
    for (name, email, password, role) in [
        ("Super Admin", "admin@sgpgroup.com", "admin123", Role::Superadmin),
        ("Regular User", "user@sgpgroup.com", "user123", Role::User),
    ] {
        let result = sqlx::query(
            "INSERT INTO users (name, email, password, role) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (email) DO NOTHING",
        )
        .bind(name)
        .bind(email)
        .bind(password_digest(password))
        .bind(role)
        .execute(&pool)
        .await?;
        users_created += result.rows_affected();
    }

    let mut venues_created: u64 = 0;
    for name in SEED_VENUES {
        let result = sqlx::query(
            "INSERT INTO venues (name, status) VALUES ($1, 'active') \
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .execute(&pool)
        .await?;
        venues_created += result.rows_affected();
    }

    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                json!({
                    "success": true,
                    "data": {
                        "users_created": users_created,
                        "venues_created": venues_created,
                    }
                })
            );
        }
        OutputFormat::Text => {
            println!("Seeded {} users and {} venues", users_created, venues_created);
        }
    }
    Ok(())
}
