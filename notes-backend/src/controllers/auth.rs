use actix_web::{web, HttpRequest, HttpResponse, Responder};

use crate::auth::password::{hash_password, verify_password};
use crate::db::StoreError;
use crate::middleware::session::{bearer_token, require_session};
use crate::models::{CredentialsRequest, LoginResponse, UserProfile, UserResponse};
use crate::AppState;

/// Register a new user
async fn signup(
    data: web::Data<AppState>,
    body: web::Json<CredentialsRequest>,
) -> impl Responder {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return HttpResponse::UnprocessableEntity().json(serde_json::json!({
            "error": "Username and password are required"
        }));
    }

    let password_hash = match hash_password(&body.password) {
        Ok(h) => h,
        Err(e) => {
            log::error!("[AUTH] {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            }));
        }
    };

    match data.db.create_user(&body.username, &password_hash) {
        Ok(user) => {
            log::info!("[AUTH] Registered user {} ({})", user.username, user.id);
            HttpResponse::Created().json(UserResponse { user: user.into() })
        }
        Err(StoreError::InvalidDocument(msg)) => {
            HttpResponse::UnprocessableEntity().json(serde_json::json!({ "error": msg }))
        }
        Err(e) => {
            log::error!("[AUTH] Failed to register user: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

/// Exchange credentials for a session token
async fn login(
    data: web::Data<AppState>,
    body: web::Json<CredentialsRequest>,
) -> impl Responder {
    let invalid = || {
        HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Invalid username or password"
        }))
    };

    let user = match data.db.get_user_by_username(&body.username) {
        Ok(Some(user)) => user,
        Ok(None) => return invalid(),
        Err(e) => {
            log::error!("[AUTH] Failed to load user: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }));
        }
    };

    match verify_password(&body.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => return invalid(),
        Err(e) => {
            log::error!("[AUTH] Stored hash for {} is unusable: {}", user.id, e);
            return invalid();
        }
    }

    match data.db.create_session(&user.id, data.config.session_ttl_hours) {
        Ok(session) => HttpResponse::Ok().json(LoginResponse {
            token: session.token,
            expires_at: session.expires_at,
            user: user.into(),
        }),
        Err(e) => {
            log::error!("[AUTH] Failed to create session: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

/// End the caller's session
async fn logout(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let token = match bearer_token(&req) {
        Some(t) => t,
        None => {
            return HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "No authorization token provided"
            }));
        }
    };

    match data.db.delete_session(&token) {
        Ok(true) => HttpResponse::NoContent().finish(),
        Ok(false) => HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Invalid or expired session"
        })),
        Err(e) => {
            log::error!("[AUTH] Failed to delete session: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

/// The user behind the caller's session
async fn me(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let session = match require_session(&data, &req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match data.db.get_user_by_id(&session.user_id) {
        Ok(Some(user)) => HttpResponse::Ok().json(UserResponse {
            user: UserProfile::from(user),
        }),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "User not found"
        })),
        Err(e) => {
            log::error!("[AUTH] Failed to load user {}: {}", session.user_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/users")
            .route("/signup", web::post().to(signup))
            .route("/login", web::post().to(login))
            .route("/logout", web::delete().to(logout))
            .route("/me", web::get().to(me)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MutationMode;
    use crate::controllers::test_support::test_state;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_signup_login_me_logout() {
        let (_dir, state) = test_state(MutationMode::Confirmed);
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/api/users/signup")
            .set_json(json!({ "username": "alice", "password": "secret" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["user"]["username"], "alice");
        assert!(body["user"].get("password_hash").is_none());
        let signed_up_at = body["user"]["created_at"].clone();
        assert!(signed_up_at.is_string());

        let req = test::TestRequest::post()
            .uri("/api/users/login")
            .set_json(json!({ "username": "alice", "password": "secret" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        let token = body["token"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/api/users/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["user"]["username"], "alice");
        assert_eq!(body["user"]["created_at"], signed_up_at);
        assert!(body["user"].get("password_hash").is_none());

        let req = test::TestRequest::delete()
            .uri("/api/users/logout")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get()
            .uri("/api/users/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_signup_rejects_duplicates_and_blanks() {
        let (_dir, state) = test_state(MutationMode::Confirmed);
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        for (username, password, expected) in [
            ("alice", "secret", StatusCode::CREATED),
            ("alice", "other", StatusCode::UNPROCESSABLE_ENTITY),
            ("  ", "secret", StatusCode::UNPROCESSABLE_ENTITY),
            ("bob", "", StatusCode::UNPROCESSABLE_ENTITY),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/users/signup")
                .set_json(json!({ "username": username, "password": password }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected, "signup {:?}", username);
        }
    }

    #[actix_web::test]
    async fn test_login_with_bad_credentials() {
        let (_dir, state) = test_state(MutationMode::Confirmed);
        let hash = hash_password("secret").unwrap();
        state.db.create_user("alice", &hash).unwrap();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        for (username, password) in [("alice", "wrong"), ("nobody", "secret")] {
            let req = test::TestRequest::post()
                .uri("/api/users/login")
                .set_json(json!({ "username": username, "password": password }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }
    }
}
