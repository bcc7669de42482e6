use std::sync::Arc;

use chrono::Utc;
use tokio::net::TcpListener;
use uuid::Uuid;

use cursos_backend::{
    AppConfig, AppState, MemoryRepository, MockStorageService, create_router,
    auth::hash_password,
    models::{Curso, CursoStatus, Role, TipoEstudiante, User},
    repository::{Repository, RepositoryState},
    storage::StorageState,
};

pub struct TestApp {
    pub address: String,
    pub repo: Arc<MemoryRepository>,
}

/// Boots the full router on an ephemeral port against the in-memory
/// repository and the mock image store. `AppConfig::default()` runs in
/// `Env::Local`, so tests authenticate with the `x-user-id` bypass header.
async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::new());
    let storage = Arc::new(MockStorageService::new()) as StorageState;
    let config = AppConfig::default();

    let state = AppState {
        repo: repo.clone() as RepositoryState,
        storage,
        config,
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, repo }
}

async fn seed_user(repo: &MemoryRepository, rol: Role, email: &str, password: &str) -> User {
    let user = User {
        id: Uuid::new_v4(),
        nombre: "Test".to_string(),
        apellidos: "User".to_string(),
        email: email.to_string(),
        password: hash_password(password).unwrap(),
        rol,
        fecha_nacimiento: Utc::now(),
        descripcion: None,
        imagen: None,
        tareas_url: None,
        tipo_estudiante: if rol == Role::Estudiante {
            Some(TipoEstudiante::Scesi)
        } else {
            None
        },
        redes: vec![],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    repo.save_user(&user).await.unwrap();
    user
}

async fn seed_curso(repo: &MemoryRepository, tutores: Vec<Uuid>) -> Curso {
    let curso = Curso {
        id: Uuid::new_v4(),
        titulo: "Rust desde cero".to_string(),
        descripcion: "Curso introductorio".to_string(),
        fecha_inicio: Utc::now(),
        fecha_fin: Utc::now(),
        duracion_en_semanas: 8,
        precio_general: 100.0,
        precio_umss: 50.0,
        status: CursoStatus::PorIniciar,
        esta_cancelado: false,
        img_curso: None,
        afiche_img: None,
        techs: vec![],
        tutores,
        estudiantes: vec![],
        horarios: vec![],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    repo.save_curso(&curso).await.unwrap();
    curso
}

async fn msg_of(response: reqwest::Response) -> String {
    let body: serde_json::Value = response.json().await.unwrap();
    body["msg"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_login_issues_token_and_rejects_bad_password() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    seed_user(&app.repo, Role::Admin, "admin@test.com", "secret123").await;

    let response = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({ "email": "admin@test.com", "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["role"], "admin");

    let response = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({ "email": "admin@test.com", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(msg_of(response).await, "Credenciales inválidas");
}

#[tokio::test]
async fn test_bearer_token_authenticates_protected_route() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = seed_user(&app.repo, Role::Admin, "admin@test.com", "secret123").await;

    let login: serde_json::Value = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({ "email": "admin@test.com", "password": "secret123" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = login["token"].as_str().unwrap();

    let response = client
        .get(format!("{}/api/users/{}", app.address, admin.id))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // No credential at all on an authenticated route is a 401.
    let response = client
        .get(format!("{}/api/users/{}", app.address, admin.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_register_requires_admin() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let tutor = seed_user(&app.repo, Role::Tutor, "tutor@test.com", "pw").await;

    let form = reqwest::multipart::Form::new()
        .text("nombre", "Eva")
        .text("apellidos", "Rojas")
        .text("email", "eva@test.com")
        .text("password", "pw123456")
        .text("fechaNacimiento", "2000-01-15");

    let response = client
        .post(format!("{}/api/auth/register", app.address))
        .header("x-user-id", tutor.id.to_string())
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    assert_eq!(msg_of(response).await, "Acceso denegado");
}

#[tokio::test]
async fn test_register_tutor_without_redes_is_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = seed_user(&app.repo, Role::Admin, "admin@test.com", "pw").await;

    let form = reqwest::multipart::Form::new()
        .text("nombre", "Eva")
        .text("apellidos", "Rojas")
        .text("email", "eva@test.com")
        .text("password", "pw123456")
        .text("fechaNacimiento", "2000-01-15")
        .text("rol", "tutor");

    let response = client
        .post(format!("{}/api/auth/register", app.address))
        .header("x-user-id", admin.id.to_string())
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(msg_of(response).await, "Las redes son requeridas para tutores");
}

#[tokio::test]
async fn test_register_estudiante_lifecycle() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = seed_user(&app.repo, Role::Admin, "admin@test.com", "pw").await;

    // tipoEstudiante is mandatory for the estudiante role.
    let form = reqwest::multipart::Form::new()
        .text("nombre", "Eva")
        .text("apellidos", "Rojas")
        .text("email", "eva@test.com")
        .text("password", "pw123456")
        .text("fechaNacimiento", "2000-01-15")
        .text("rol", "estudiante");
    let response = client
        .post(format!("{}/api/auth/register", app.address))
        .header("x-user-id", admin.id.to_string())
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let form = reqwest::multipart::Form::new()
        .text("nombre", "Eva")
        .text("apellidos", "Rojas")
        .text("email", "eva@test.com")
        .text("password", "pw123456")
        .text("fechaNacimiento", "2000-01-15")
        .text("rol", "estudiante")
        .text("tipoEstudiante", "umss");
    let response = client
        .post(format!("{}/api/auth/register", app.address))
        .header("x-user-id", admin.id.to_string())
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["msg"], "Usuario creado");
    assert_eq!(body["rol"], "estudiante");

    // The email is now taken.
    let form = reqwest::multipart::Form::new()
        .text("nombre", "Eva")
        .text("apellidos", "Rojas")
        .text("email", "eva@test.com")
        .text("password", "pw123456")
        .text("fechaNacimiento", "2000-01-15")
        .text("rol", "estudiante")
        .text("tipoEstudiante", "umss");
    let response = client
        .post(format!("{}/api/auth/register", app.address))
        .header("x-user-id", admin.id.to_string())
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(msg_of(response).await, "Usuario ya existe");
}

#[tokio::test]
async fn test_visitor_curso_detail_omits_estudiantes_key() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = seed_user(&app.repo, Role::Admin, "admin@test.com", "pw").await;
    let curso = seed_curso(&app.repo, vec![]).await;

    let body: serde_json::Value = client
        .get(format!("{}/api/cursos/{}", app.address, curso.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(
        !body.as_object().unwrap().contains_key("estudiantes"),
        "visitor response must omit the estudiantes field entirely"
    );

    // Any Authorization header switches the field back on.
    let body: serde_json::Value = client
        .get(format!("{}/api/cursos/{}", app.address, curso.id))
        .header("Authorization", "Bearer whatever")
        .header("x-user-id", admin.id.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body.as_object().unwrap().contains_key("estudiantes"));
}

#[tokio::test]
async fn test_curso_update_enforces_ownership() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let owner = seed_user(&app.repo, Role::Tutor, "owner@test.com", "pw").await;
    let stranger = seed_user(&app.repo, Role::Tutor, "stranger@test.com", "pw").await;
    let curso = seed_curso(&app.repo, vec![owner.id]).await;

    let response = client
        .put(format!("{}/api/cursos/{}", app.address, curso.id))
        .header("x-user-id", stranger.id.to_string())
        .multipart(reqwest::multipart::Form::new().text("titulo", "Hijacked"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = client
        .put(format!("{}/api/cursos/{}", app.address, curso.id))
        .header("x-user-id", owner.id.to_string())
        .multipart(reqwest::multipart::Form::new().text("titulo", "Rust avanzado"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["titulo"], "Rust avanzado");
}

#[tokio::test]
async fn test_duplicate_tech_version_is_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = seed_user(&app.repo, Role::Admin, "admin@test.com", "pw").await;

    let tech_form = || {
        reqwest::multipart::Form::new()
            .text("nombre", "rust")
            .text("version", "1.80")
            .part(
                "imgUrl",
                reqwest::multipart::Part::bytes(vec![0u8; 16])
                    .file_name("rust.png")
                    .mime_str("image/png")
                    .unwrap(),
            )
    };

    let response = client
        .post(format!("{}/api/techs", app.address))
        .header("x-user-id", admin.id.to_string())
        .multipart(tech_form())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/api/techs", app.address))
        .header("x-user-id", admin.id.to_string())
        .multipart(tech_form())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(msg_of(response).await, "Esta versión de la tecnología ya existe");

    // The public by-nombre lookup sees one version; an unknown nombre is 404.
    let response = client
        .get(format!("{}/api/techs/rust", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let versions: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(versions.len(), 1);

    let response = client
        .get(format!("{}/api/techs/cobol", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_double_enrollment_is_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let tutor = seed_user(&app.repo, Role::Tutor, "tutor@test.com", "pw").await;
    let estudiante = seed_user(&app.repo, Role::Estudiante, "est@test.com", "pw").await;
    let curso = seed_curso(&app.repo, vec![tutor.id]).await;

    let enroll = || {
        client
            .post(format!("{}/api/cursos/{}/estudiantes", app.address, curso.id))
            .header("x-user-id", tutor.id.to_string())
            .json(&serde_json::json!({ "userId": estudiante.id }))
    };

    let response = enroll().send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["estudiantes"].as_array().unwrap().len(), 1);

    let response = enroll().send().await.unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(msg_of(response).await, "Ya inscrito");

    // Unenrollment, then a second removal is a harmless no-op.
    let unenroll = || {
        client
            .delete(format!(
                "{}/api/cursos/{}/estudiantes/{}",
                app.address, curso.id, estudiante.id
            ))
            .header("x-user-id", tutor.id.to_string())
    };
    let response = unenroll().send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["estudiantes"].as_array().unwrap().is_empty());

    let response = unenroll().send().await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_horario_creation_validates_inputs() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let tutor = seed_user(&app.repo, Role::Tutor, "tutor@test.com", "pw").await;
    let curso = seed_curso(&app.repo, vec![tutor.id]).await;

    let response = client
        .post(format!("{}/api/cursos/{}/horarios", app.address, curso.id))
        .header("x-user-id", tutor.id.to_string())
        .json(&serde_json::json!({
            "dia": "Lunes", "horaInicio": "25:00", "horaFin": "20:00"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(msg_of(response).await, "Formato HH:mm inválido");

    let response = client
        .post(format!("{}/api/cursos/{}/horarios", app.address, curso.id))
        .header("x-user-id", tutor.id.to_string())
        .json(&serde_json::json!({
            "dia": "Funday", "horaInicio": "18:00", "horaFin": "20:00"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(msg_of(response).await, "Día inválido");

    // Modalidad defaults to virtual when absent.
    let response = client
        .post(format!("{}/api/cursos/{}/horarios", app.address, curso.id))
        .header("x-user-id", tutor.id.to_string())
        .json(&serde_json::json!({
            "dia": "Sábado", "horaInicio": "18:00", "horaFin": "20:00"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["modalidad"], "virtual");
    assert_eq!(body["dia"], "Sábado");

    // The public schedule listing shows it without credentials.
    let response = client
        .get(format!("{}/api/cursos/{}/horarios", app.address, curso.id))
        .send()
        .await
        .unwrap();
    let horarios: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(horarios.len(), 1);
}

#[tokio::test]
async fn test_delete_user_second_attempt_is_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = seed_user(&app.repo, Role::Admin, "admin@test.com", "pw").await;
    let victim = seed_user(&app.repo, Role::Estudiante, "victim@test.com", "pw").await;

    let response = client
        .delete(format!("{}/api/users/{}", app.address, victim.id))
        .header("x-user-id", admin.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(msg_of(response).await, "Usuario e imagen eliminados");

    let response = client
        .delete(format!("{}/api/users/{}", app.address, victim.id))
        .header("x-user-id", admin.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_user_read_is_self_or_admin_and_policy_reduced() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = seed_user(&app.repo, Role::Admin, "admin@test.com", "pw").await;
    let estudiante = seed_user(&app.repo, Role::Estudiante, "est@test.com", "pw").await;
    let other = seed_user(&app.repo, Role::Estudiante, "other@test.com", "pw").await;

    // A stranger may not read the record.
    let response = client
        .get(format!("{}/api/users/{}", app.address, estudiante.id))
        .header("x-user-id", other.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // The subject may, and the record is reduced by their own role: no
    // descripcion key, no password under any name.
    let response = client
        .get(format!("{}/api/users/{}", app.address, estudiante.id))
        .header("x-user-id", estudiante.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let map = body.as_object().unwrap();
    assert!(!map.contains_key("descripcion"));
    assert!(!map.contains_key("password"));
    assert_eq!(body["tipoEstudiante"], "scesi");

    // An admin may read anyone.
    let response = client
        .get(format!("{}/api/users/{}", app.address, estudiante.id))
        .header("x-user-id", admin.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_change_password_verifies_current() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let user = seed_user(&app.repo, Role::Estudiante, "est@test.com", "old-pass").await;

    let response = client
        .post(format!("{}/api/auth/change-password", app.address))
        .header("x-user-id", user.id.to_string())
        .json(&serde_json::json!({ "currentPassword": "wrong", "newPassword": "new-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(msg_of(response).await, "Password actual incorrecto");

    let response = client
        .post(format!("{}/api/auth/change-password", app.address))
        .header("x-user-id", user.id.to_string())
        .json(&serde_json::json!({ "currentPassword": "old-pass", "newPassword": "new-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // The new credential now logs in; the old one no longer does.
    let response = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({ "email": "est@test.com", "password": "new-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({ "email": "est@test.com", "password": "old-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}
