//! Development seeder. Provisions the social-network catalog and one account
//! per role so a fresh local database is immediately usable. Idempotent:
//! existing documents are left untouched.

use std::sync::Arc;

use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use cursos_backend::{
    auth::hash_password,
    config::AppConfig,
    models::{RedRef, RedSocial, Role, TipoEstudiante, User},
    repository::{PostgresRepository, Repository},
};

const REDES: &[&str] = &[
    "facebook",
    "github",
    "linkedin",
    "instagram",
    "tik-tok",
    "twitter",
    "youtube",
];

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt().init();

    let config = AppConfig::load();

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("FATAL: Failed to run database migrations.");

    let repo = Arc::new(PostgresRepository::new(pool));

    let mut github_id = None;
    for nombre in REDES {
        if let Some(existing) = repo.find_red_by_nombre(nombre).await {
            if *nombre == "github" {
                github_id = Some(existing.id);
            }
            continue;
        }
        let red = RedSocial {
            id: Uuid::new_v4(),
            nombre: nombre.to_string(),
            img: format!("{}/{}/redes/{nombre}.svg", config.s3_endpoint, config.s3_bucket),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        if *nombre == "github" {
            github_id = Some(red.id);
        }
        repo.save_red(&red).await.expect("seed: save red");
        tracing::info!("created red social '{nombre}'");
    }

    seed_user(
        repo.as_ref(),
        User {
            id: Uuid::new_v4(),
            nombre: "Admin".to_string(),
            apellidos: "SCESI".to_string(),
            email: "admin@scesi.org".to_string(),
            password: hash_password("admin123").expect("seed: hash"),
            rol: Role::Admin,
            fecha_nacimiento: Utc::now(),
            descripcion: None,
            imagen: None,
            tareas_url: None,
            tipo_estudiante: None,
            redes: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        },
    )
    .await;

    let tutor_redes = github_id
        .map(|red| {
            vec![RedRef {
                red,
                url: "https://github.com/tutor-demo".to_string(),
            }]
        })
        .unwrap_or_default();

    seed_user(
        repo.as_ref(),
        User {
            id: Uuid::new_v4(),
            nombre: "Tutor".to_string(),
            apellidos: "Demo".to_string(),
            email: "tutor@scesi.org".to_string(),
            password: hash_password("tutor123").expect("seed: hash"),
            rol: Role::Tutor,
            fecha_nacimiento: Utc::now(),
            descripcion: Some("Tutor de demostración".to_string()),
            imagen: None,
            tareas_url: None,
            tipo_estudiante: None,
            redes: tutor_redes,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        },
    )
    .await;

    seed_user(
        repo.as_ref(),
        User {
            id: Uuid::new_v4(),
            nombre: "Estudiante".to_string(),
            apellidos: "Demo".to_string(),
            email: "estudiante@scesi.org".to_string(),
            password: hash_password("estudiante123").expect("seed: hash"),
            rol: Role::Estudiante,
            fecha_nacimiento: Utc::now(),
            descripcion: None,
            imagen: None,
            tareas_url: Some(String::new()),
            tipo_estudiante: Some(TipoEstudiante::Scesi),
            redes: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        },
    )
    .await;

    tracing::info!("seeding complete");
}

async fn seed_user(repo: &PostgresRepository, user: User) {
    if repo.find_user_by_email(&user.email).await.is_some() {
        tracing::info!("user '{}' already present, skipping", user.email);
        return;
    }
    let email = user.email.clone();
    repo.save_user(&user).await.expect("seed: save user");
    tracing::info!("created user '{email}'");
}
