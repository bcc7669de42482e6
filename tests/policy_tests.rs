use chrono::Utc;
use uuid::Uuid;

use cursos_backend::{
    models::{Curso, CursoStatus, RedRef, RedSocial, RedSocialLink, Role, TipoEstudiante, User},
    policy,
};

// --- Fixtures ---

fn base_user(rol: Role) -> User {
    User {
        id: Uuid::new_v4(),
        nombre: "Ana".to_string(),
        apellidos: "Gutiérrez".to_string(),
        email: "ana@example.com".to_string(),
        password: "$argon2id$fake".to_string(),
        rol,
        fecha_nacimiento: Utc::now(),
        descripcion: None,
        imagen: None,
        tareas_url: None,
        tipo_estudiante: None,
        redes: vec![],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn sample_links() -> Vec<RedSocialLink> {
    vec![RedSocialLink {
        red: RedSocial {
            id: Uuid::new_v4(),
            nombre: "github".to_string(),
            img: "http://localhost:9000/b/redes/github.svg".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        },
        url: "https://github.com/ana".to_string(),
    }]
}

fn base_curso(tutores: Vec<Uuid>) -> Curso {
    Curso {
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
    }
}

// --- Role Gate ---

#[test]
fn role_gate_admin_bypasses_every_allowed_set() {
    assert!(policy::require_role(Role::Admin, &[Role::Tutor]).is_ok());
    assert!(policy::require_role(Role::Admin, &[Role::Estudiante]).is_ok());
    assert!(policy::require_role(Role::Admin, &[]).is_ok());
}

#[test]
fn role_gate_empty_set_admits_everyone() {
    assert!(policy::require_role(Role::Estudiante, &[]).is_ok());
    assert!(policy::require_role(Role::Tutor, &[]).is_ok());
}

#[test]
fn role_gate_rejects_roles_outside_the_set() {
    assert!(policy::require_role(Role::Estudiante, &[Role::Tutor]).is_err());
    assert!(policy::require_role(Role::Tutor, &[Role::Admin]).is_err());
}

#[test]
fn admin_gate_rejects_non_admins() {
    assert!(policy::require_admin(Role::Admin).is_ok());
    assert!(policy::require_admin(Role::Tutor).is_err());
    assert!(policy::require_admin(Role::Estudiante).is_err());
}

#[test]
fn self_or_admin_admits_exactly_those_two() {
    let subject = Uuid::new_v4();
    let other = Uuid::new_v4();
    assert!(policy::require_self_or_admin(subject, Role::Estudiante, subject).is_ok());
    assert!(policy::require_self_or_admin(other, Role::Admin, subject).is_ok());
    assert!(policy::require_self_or_admin(other, Role::Tutor, subject).is_err());
    assert!(policy::require_self_or_admin(other, Role::Estudiante, subject).is_err());
}

// --- Ownership ---

#[test]
fn curso_ownership_is_admin_or_assigned_tutor() {
    let tutor = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let curso = base_curso(vec![tutor]);

    assert!(policy::owns_curso(tutor, Role::Tutor, &curso));
    assert!(policy::owns_curso(stranger, Role::Admin, &curso));
    assert!(!policy::owns_curso(stranger, Role::Tutor, &curso));
    assert!(!policy::owns_curso(stranger, Role::Estudiante, &curso));
}

#[test]
fn assignment_beats_role_for_ownership() {
    // An estudiante id listed in tutores still owns the curso; the check is
    // on membership, not on the caller's role.
    let listed = Uuid::new_v4();
    let curso = base_curso(vec![listed]);
    assert!(policy::require_curso_owner(listed, Role::Estudiante, &curso).is_ok());
}

// --- Hora Validation ---

#[test]
fn hora_pattern_accepts_strict_hh_mm_only() {
    for ok in ["00:00", "08:30", "19:45", "23:59"] {
        assert!(policy::hora_valida(ok), "{ok} should be valid");
    }
    for bad in ["24:00", "8:30", "12:60", "12:5", "12:30:00", "noon", ""] {
        assert!(!policy::hora_valida(bad), "{bad} should be invalid");
    }
}

// --- Field Visibility ---

#[test]
fn admin_record_drops_role_specific_fields_even_when_set() {
    let mut admin = base_user(Role::Admin);
    admin.descripcion = Some("not shown".to_string());
    admin.tareas_url = Some("https://tareas".to_string());
    admin.tipo_estudiante = Some(TipoEstudiante::Umss);
    admin.redes = vec![RedRef {
        red: Uuid::new_v4(),
        url: "https://github.com/x".to_string(),
    }];

    let out = policy::apply_visibility(&admin, sample_links());
    assert!(out.descripcion.is_none());
    assert!(out.tareas_url.is_none());
    assert!(out.tipo_estudiante.is_none());
    assert!(out.redes.is_none());
}

#[test]
fn tutor_record_keeps_descripcion_only_when_present() {
    let mut tutor = base_user(Role::Tutor);
    tutor.descripcion = Some(String::new());
    let out = policy::apply_visibility(&tutor, vec![]);
    assert!(out.descripcion.is_none(), "empty descripcion must be dropped");

    tutor.descripcion = Some("Enseña Rust".to_string());
    let out = policy::apply_visibility(&tutor, vec![]);
    assert_eq!(out.descripcion.as_deref(), Some("Enseña Rust"));
    assert!(out.tareas_url.is_none());
    assert!(out.tipo_estudiante.is_none());
}

#[test]
fn estudiante_record_never_shows_descripcion() {
    let mut estudiante = base_user(Role::Estudiante);
    estudiante.descripcion = Some("oculta".to_string());
    estudiante.tipo_estudiante = Some(TipoEstudiante::Scesi);
    estudiante.tareas_url = Some("https://tareas".to_string());

    let out = policy::apply_visibility(&estudiante, vec![]);
    assert!(out.descripcion.is_none());
    assert_eq!(out.tipo_estudiante, Some(TipoEstudiante::Scesi));
    assert_eq!(out.tareas_url.as_deref(), Some("https://tareas"));
}

#[test]
fn empty_imagen_is_dropped_for_every_role() {
    for rol in [Role::Admin, Role::Tutor, Role::Estudiante] {
        let mut user = base_user(rol);
        user.imagen = Some(String::new());
        let out = policy::apply_visibility(&user, vec![]);
        assert!(out.imagen.is_none(), "{rol:?} empty imagen must be dropped");

        user.imagen = Some("http://img".to_string());
        let out = policy::apply_visibility(&user, vec![]);
        assert_eq!(out.imagen.as_deref(), Some("http://img"));
    }
}

#[test]
fn estudiante_redes_survive_only_when_non_empty() {
    let mut estudiante = base_user(Role::Estudiante);
    estudiante.tipo_estudiante = Some(TipoEstudiante::Externo);

    let out = policy::apply_visibility(&estudiante, vec![]);
    assert!(out.redes.is_none(), "empty redes must be dropped");

    estudiante.redes = vec![RedRef {
        red: Uuid::new_v4(),
        url: "https://github.com/x".to_string(),
    }];
    let out = policy::apply_visibility(&estudiante, sample_links());
    assert_eq!(out.redes.as_ref().map(Vec::len), Some(1));
}

#[test]
fn dropped_fields_are_absent_from_json_not_null() {
    let mut admin = base_user(Role::Admin);
    admin.descripcion = Some("hidden".to_string());

    let out = policy::apply_visibility(&admin, vec![]);
    let value = serde_json::to_value(&out).expect("serialize");
    let map = value.as_object().expect("object");

    assert!(!map.contains_key("descripcion"));
    assert!(!map.contains_key("redes"));
    assert!(!map.contains_key("tareasUrl"));
    assert!(!map.contains_key("tipoEstudiante"));
    // And the hash never leaks, under any spelling.
    assert!(!map.contains_key("password"));
    // Fixed identity fields are always present.
    assert!(map.contains_key("email"));
    assert!(map.contains_key("fechaNacimiento"));
}
