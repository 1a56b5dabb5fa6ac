use actix_web::{web, HttpResponse, Responder};

use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)));
    cfg.service(web::resource("/api/version").route(web::get().to(get_version)));
}

/// Liveness, build version and the configured note mutation mode
async fn health_check(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": VERSION,
        "mutation_mode": data.config.mutation_mode.as_str()
    }))
}

async fn get_version() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "version": VERSION
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MutationMode;
    use crate::controllers::test_support::test_state;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_health_reports_mutation_mode() {
        for mode in [MutationMode::Deferred, MutationMode::Confirmed] {
            let (_dir, state) = test_state(mode);
            let app =
                test::init_service(App::new().app_data(state.clone()).configure(config_routes))
                    .await;
            let req = test::TestRequest::get().uri("/api/health").to_request();
            let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["status"], "ok");
            assert_eq!(body["version"], VERSION);
            assert_eq!(body["mutation_mode"], mode.as_str());
        }
    }

    #[actix_web::test]
    async fn test_version() {
        let app = test::init_service(App::new().configure(config_routes)).await;
        let req = test::TestRequest::get().uri("/api/version").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["version"], VERSION);
    }
}
