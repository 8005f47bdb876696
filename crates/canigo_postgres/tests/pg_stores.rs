//! Round-trips against a live database. Run with
//! `DATABASE_URL=postgres://… cargo test -p canigo_postgres -- --ignored`.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use canigo_core::error::ErrorKind;
use canigo_core::types::{PassLevel, Place, Role, User};

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&url).await.expect("connect");
    canigo_postgres::apply_schema(&pool).await.expect("schema");
    pool
}

fn pass_level() -> PassLevel {
    PassLevel {
        id: Uuid::new_v4(),
        level: format!("level-{}", Uuid::new_v4()),
        owner_id: None,
        created_at: Utc::now(),
        updated_at: None,
    }
}

fn user(pass_level_id: Uuid) -> User {
    User {
        id: Uuid::new_v4(),
        first_name: Some("Ada".into()),
        last_name: None,
        age: 36,
        phone_number: "06 34 43".into(),
        address: None,
        email: format!("{}@example.com", Uuid::new_v4()),
        password_hash: "$2b$04$hash".into(),
        role: Role::User,
        pass_level_id,
        password_changed_at: None,
        password_reset_token: None,
        password_reset_expires: None,
    }
}

#[tokio::test]
#[ignore] // requires DATABASE_URL
async fn user_round_trip_and_email_conflict() {
    let stores = canigo_postgres::stores(pool().await);
    let pass = pass_level();
    stores.pass_levels.insert(&pass).await.unwrap();

    let mut u = user(pass.id);
    stores.users.insert(&u).await.unwrap();
    assert_eq!(stores.users.find_by_id(u.id).await.unwrap(), Some(u.clone()));
    assert_eq!(
        stores.users.find_by_email(&u.email).await.unwrap().map(|f| f.id),
        Some(u.id)
    );

    let mut dup = user(pass.id);
    dup.email = u.email.clone();
    let err = stores.users.insert(&dup).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    u.role = Role::Admin;
    stores.users.update(&u).await.unwrap();
    assert!(stores.users.find_by_id(u.id).await.unwrap().unwrap().is_admin());

    // Still referenced by the user.
    let err = stores.pass_levels.delete(pass.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    assert!(stores.users.delete(u.id).await.unwrap());
    assert!(stores.pass_levels.delete(pass.id).await.unwrap());
}

#[tokio::test]
#[ignore] // requires DATABASE_URL
async fn place_keeps_pass_level_array() {
    let stores = canigo_postgres::stores(pool().await);
    let place = Place {
        id: Uuid::new_v4(),
        address: format!("{} Nightmare Alley", Uuid::new_v4()),
        phone_number: "06 34 43".into(),
        age_require: 40,
        pass_level_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
        owner_id: Some(Uuid::new_v4()),
    };
    stores.places.insert(&place).await.unwrap();
    assert_eq!(stores.places.find_by_id(place.id).await.unwrap(), Some(place.clone()));

    let mut missing = place.clone();
    missing.id = Uuid::new_v4();
    missing.address = format!("{} elsewhere", Uuid::new_v4());
    let err = stores.places.update(&missing).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert!(stores.places.delete(place.id).await.unwrap());
    assert!(!stores.places.delete(place.id).await.unwrap());
}
