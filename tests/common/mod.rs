use std::env;

use anyhow::{anyhow, ensure, Context, Result};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use campus_sis::auth::jwt::JwtService;
use campus_sis::auth::password;
use campus_sis::config::AppConfig;
use campus_sis::db::{self, PgPool};
use campus_sis::models::{NewFaculty, NewParent, NewStudent, Role};
use campus_sis::routes;
use campus_sis::state::AppState;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::PgConnection;
use http_body_util::BodyExt;
use once_cell::sync::Lazy;
use serde::Serialize;
use tokio::sync::Mutex;
use tower::util::ServiceExt;

static DB_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let database_url = env::var("TEST_DATABASE_URL")
            .context("TEST_DATABASE_URL must be set for integration tests")?;

        let config = AppConfig {
            database_url: database_url.clone(),
            database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: "test-issuer".to_string(),
            jwt_audience: "test-audience".to_string(),
            jwt_expiry_minutes: 60,
            cors_allowed_origin: None,
        };

        let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
        prepare_database(&pool).await?;

        let jwt = JwtService::from_config(&config)?;
        let state = AppState::new(pool, config, jwt);
        let router = routes::create_router(state.clone());

        Ok(Self { state, router })
    }

    /// Clone of the router, for tests that serve it on a real socket.
    #[allow(dead_code)]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn cleanup(&self) -> Result<()> {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get cleanup connection: {err}"))?;
            truncate_all(&mut conn)?;
            Ok(())
        })
        .await
        .context("cleanup task panicked")?
    }

    pub async fn insert_student(&self, student_id: &str, password: &str) -> Result<()> {
        let student_id = student_id.to_string();
        let password = password.to_string();
        self.with_conn(move |conn| {
            let new_student = NewStudent {
                student_id: student_id.clone(),
                name: format!("Student {student_id}"),
                email: format!("{}@example.edu", student_id.to_lowercase()),
                password_hash: password::hash_password(&password)?,
                phone: None,
                department: Some("Computer Science".to_string()),
                semester: Some(4),
                enrollment_year: Some(2023),
                date_of_birth: None,
                address: None,
            };
            diesel::insert_into(campus_sis::schema::students::table)
                .values(&new_student)
                .execute(conn)
                .context("failed to insert student")?;
            Ok(())
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn insert_faculty(&self, faculty_id: &str, password: &str) -> Result<()> {
        let faculty_id = faculty_id.to_string();
        let password = password.to_string();
        self.with_conn(move |conn| {
            let new_faculty = NewFaculty {
                faculty_id: faculty_id.clone(),
                name: format!("Faculty {faculty_id}"),
                email: format!("{}@example.edu", faculty_id.to_lowercase()),
                password_hash: password::hash_password(&password)?,
                phone: None,
                department: Some("Mathematics".to_string()),
                designation: Some("Professor".to_string()),
                joining_date: None,
                specialization: None,
                address: None,
            };
            diesel::insert_into(campus_sis::schema::faculty::table)
                .values(&new_faculty)
                .execute(conn)
                .context("failed to insert faculty")?;
            Ok(())
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn insert_parent(
        &self,
        parent_id: &str,
        password: &str,
        linked_student_id: Option<&str>,
    ) -> Result<()> {
        let parent_id = parent_id.to_string();
        let password = password.to_string();
        let linked = linked_student_id.map(str::to_string);
        self.with_conn(move |conn| {
            let new_parent = NewParent {
                parent_id: parent_id.clone(),
                name: format!("Parent {parent_id}"),
                email: format!("{}@example.edu", parent_id.to_lowercase()),
                password_hash: password::hash_password(&password)?,
                phone: None,
                student_id: linked,
                relationship: Some("mother".to_string()),
                occupation: None,
                address: None,
            };
            diesel::insert_into(campus_sis::schema::parents::table)
                .values(&new_parent)
                .execute(conn)
                .context("failed to insert parent")?;
            Ok(())
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn login_token(&self, user_id: &str, password: &str, role: Role) -> Result<String> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct LoginPayload<'a> {
            user_id: &'a str,
            password: &'a str,
            role: Role,
        }

        let response = self
            .post_json(
                "/api/auth/login",
                &LoginPayload {
                    user_id,
                    password,
                    role,
                },
                None,
            )
            .await?;

        ensure!(
            response.status() == StatusCode::OK,
            "login failed with status {}",
            response.status()
        );

        let body = body_to_vec(response.into_body()).await?;
        #[derive(serde::Deserialize)]
        struct LoginResponse {
            token: String,
        }
        let parsed: LoginResponse = serde_json::from_slice(&body)?;
        Ok(parsed.token)
    }

    #[allow(dead_code)]
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PgConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get database connection: {err}"))?;
            f(&mut conn)
        })
        .await
        .context("connection task panicked")?
    }
}

pub async fn acquire_db_lock() -> tokio::sync::MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

#[allow(dead_code)]
pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

async fn prepare_database(pool: &PgPool) -> Result<()> {
    db::run_migrations(pool).await?;
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut conn = pool
            .get()
            .map_err(|err| anyhow!("failed to acquire connection: {err}"))?;
        truncate_all(&mut conn)?;
        Ok(())
    })
    .await
    .context("truncate task panicked")?
}

fn truncate_all(conn: &mut PgConnection) -> Result<()> {
    conn.batch_execute("TRUNCATE TABLE parents, faculty, students RESTART IDENTITY CASCADE;")
        .context("failed to truncate tables")?;
    Ok(())
}
