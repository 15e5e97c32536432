use axum::{extract::State, http::StatusCode, Json};
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{password, AuthenticatedUser},
    error::{AppError, AppResult},
    models::{
        AccountProfile, Faculty, NewFaculty, NewParent, NewStudent, Parent, Role, Student,
        StudentProfile,
    },
    schema::{faculty, parents, students},
    state::AppState,
};

// Required fields default to empty so an absent key and a blank value both
// reach the handler's own validation and its 400 envelope.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: AccountProfile,
    pub role: Role,
    #[serde(rename = "linkedStudent", skip_serializing_if = "Option::is_none")]
    pub linked_student: Option<StudentProfile>,
}

/// Single login endpoint for all three roles; the role picks the table.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    if payload.user_id.trim().is_empty() || payload.password.is_empty() || payload.role.is_empty() {
        return Err(AppError::bad_request(
            "missing required fields: userId, password, and role",
        ));
    }

    let role: Role = payload.role.parse().map_err(|_| {
        AppError::bad_request("invalid role: must be student, faculty, or parent")
    })?;

    let mut conn = state.db()?;

    let (user_id, email, password_hash, user, linked_student) = match role {
        Role::Student => {
            let row: Student = students::table
                .filter(students::student_id.eq(&payload.user_id))
                .first(&mut conn)
                .map_err(|err| login_lookup_error(err, &payload.user_id, role))?;
            (
                row.student_id.clone(),
                row.email.clone(),
                row.password_hash.clone(),
                AccountProfile::Student(row.into()),
                None,
            )
        }
        Role::Faculty => {
            let row: Faculty = faculty::table
                .filter(faculty::faculty_id.eq(&payload.user_id))
                .first(&mut conn)
                .map_err(|err| login_lookup_error(err, &payload.user_id, role))?;
            (
                row.faculty_id.clone(),
                row.email.clone(),
                row.password_hash.clone(),
                AccountProfile::Faculty(row.into()),
                None,
            )
        }
        Role::Parent => {
            let row: Parent = parents::table
                .filter(parents::parent_id.eq(&payload.user_id))
                .first(&mut conn)
                .map_err(|err| login_lookup_error(err, &payload.user_id, role))?;

            let linked = match row.student_id.as_deref() {
                Some(student_id) => students::table
                    .filter(students::student_id.eq(student_id))
                    .first::<Student>(&mut conn)
                    .optional()?
                    .map(StudentProfile::from),
                None => None,
            };

            (
                row.parent_id.clone(),
                row.email.clone(),
                row.password_hash.clone(),
                AccountProfile::Parent(row.into()),
                linked,
            )
        }
    };

    let valid = password::verify_password(&payload.password, &password_hash)
        .map_err(|_| AppError::invalid_credentials())?;
    if !valid {
        tracing::warn!(user_id = %user_id, role = %role, "login failed: bad password");
        return Err(AppError::invalid_credentials());
    }

    let token = state
        .jwt
        .generate_token(&user_id, role, &email)
        .map_err(AppError::from)?;

    tracing::info!(user_id = %user_id, role = %role, "login successful");

    Ok(Json(LoginResponse {
        success: true,
        message: "login successful".to_string(),
        token,
        user,
        role,
        linked_student,
    }))
}

fn login_lookup_error(err: DieselError, user_id: &str, role: Role) -> AppError {
    match err {
        DieselError::NotFound => {
            tracing::warn!(user_id = %user_id, role = %role, "login failed: unknown user");
            AppError::invalid_credentials()
        }
        other => other.into(),
    }
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub user: AccountProfile,
}

#[derive(Deserialize)]
pub struct RegisterStudentRequest {
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub semester: Option<i32>,
    #[serde(default)]
    pub enrollment_year: Option<i32>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub address: Option<String>,
}

pub async fn register_student(
    State(state): State<AppState>,
    Json(payload): Json<RegisterStudentRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    require_fields(&[
        &payload.student_id,
        &payload.name,
        &payload.email,
        &payload.password,
    ])?;

    let password_hash = password::hash_password(&payload.password)?;
    let new_student = NewStudent {
        student_id: payload.student_id,
        name: payload.name,
        email: payload.email,
        password_hash,
        phone: payload.phone,
        department: payload.department,
        semester: payload.semester,
        enrollment_year: payload.enrollment_year,
        date_of_birth: payload.date_of_birth,
        address: payload.address,
    };

    let mut conn = state.db()?;
    let row: Student = diesel::insert_into(students::table)
        .values(&new_student)
        .get_result(&mut conn)
        .map_err(|err| unique_violation(err, "student ID or email already exists"))?;

    tracing::info!(student_id = %row.student_id, "student registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "student registered successfully".to_string(),
            user: AccountProfile::Student(row.into()),
        }),
    ))
}

#[derive(Deserialize)]
pub struct RegisterFacultyRequest {
    #[serde(default)]
    pub faculty_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub joining_date: Option<NaiveDate>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

pub async fn register_faculty(
    State(state): State<AppState>,
    Json(payload): Json<RegisterFacultyRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    require_fields(&[
        &payload.faculty_id,
        &payload.name,
        &payload.email,
        &payload.password,
    ])?;

    let password_hash = password::hash_password(&payload.password)?;
    let new_faculty = NewFaculty {
        faculty_id: payload.faculty_id,
        name: payload.name,
        email: payload.email,
        password_hash,
        phone: payload.phone,
        department: payload.department,
        designation: payload.designation,
        joining_date: payload.joining_date,
        specialization: payload.specialization,
        address: payload.address,
    };

    let mut conn = state.db()?;
    let row: Faculty = diesel::insert_into(faculty::table)
        .values(&new_faculty)
        .get_result(&mut conn)
        .map_err(|err| unique_violation(err, "faculty ID or email already exists"))?;

    tracing::info!(faculty_id = %row.faculty_id, "faculty registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "faculty registered successfully".to_string(),
            user: AccountProfile::Faculty(row.into()),
        }),
    ))
}

#[derive(Deserialize)]
pub struct RegisterParentRequest {
    #[serde(default)]
    pub parent_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

pub async fn register_parent(
    State(state): State<AppState>,
    Json(payload): Json<RegisterParentRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    require_fields(&[
        &payload.parent_id,
        &payload.name,
        &payload.email,
        &payload.password,
    ])?;

    let mut conn = state.db()?;

    // An optional student link must point at a real student before any
    // row is written.
    let linked_student_id = payload.student_id.filter(|value| !value.trim().is_empty());
    if let Some(student_id) = linked_student_id.as_deref() {
        let exists: Option<String> = students::table
            .filter(students::student_id.eq(student_id))
            .select(students::student_id)
            .first(&mut conn)
            .optional()?;
        if exists.is_none() {
            return Err(AppError::bad_request(
                "invalid student_id: student does not exist",
            ));
        }
    }

    let password_hash = password::hash_password(&payload.password)?;
    let new_parent = NewParent {
        parent_id: payload.parent_id,
        name: payload.name,
        email: payload.email,
        password_hash,
        phone: payload.phone,
        student_id: linked_student_id,
        relationship: payload.relationship,
        occupation: payload.occupation,
        address: payload.address,
    };

    let row: Parent = diesel::insert_into(parents::table)
        .values(&new_parent)
        .get_result(&mut conn)
        .map_err(|err| unique_violation(err, "parent ID or email already exists"))?;

    tracing::info!(parent_id = %row.parent_id, "parent registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "parent registered successfully".to_string(),
            user: AccountProfile::Parent(row.into()),
        }),
    ))
}

#[derive(Serialize, Deserialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub user: VerifiedIdentity,
    pub role: Role,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedIdentity {
    pub user_id: String,
    pub email: String,
}

pub async fn verify(user: AuthenticatedUser) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        success: true,
        user: VerifiedIdentity {
            user_id: user.user_id,
            email: user.email,
        },
        role: user.role,
    })
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

/// Tokens are stateless; logout is the client discarding its copy.
pub async fn logout() -> Json<LogoutResponse> {
    Json(LogoutResponse {
        success: true,
        message: "logout successful".to_string(),
    })
}

fn require_fields(fields: &[&str]) -> AppResult<()> {
    if fields.iter().any(|field| field.trim().is_empty()) {
        return Err(AppError::bad_request("missing required fields"));
    }
    Ok(())
}

fn unique_violation(err: DieselError, message: &str) -> AppError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            AppError::conflict(message)
        }
        other => other.into(),
    }
}
