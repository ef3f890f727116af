// src/api/routes.rs
use actix_web::guard;
use super::handlers;
use actix_web::web;
use super::middleware::auth::TokenValidator;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Authentication routes. Register and login stay public; the rest
    // of the scope sits behind the token validator.
    cfg.service(
        web::scope("/auth")
            // POST: Register a new account
            .route("/register", web::post().to(handlers::auth::register))
            // OPTIONS: Register (for CORS preflight)
            .route("/register", web::route()
                .guard(guard::Options())
                .to(handlers::auth::register_options))

            // POST: Sign in
            .route("/login", web::post().to(handlers::auth::login))
            // OPTIONS: Sign in
            .route("/login", web::route()
                .guard(guard::Options())
                .to(handlers::auth::login_options))

            .service(
                web::scope("")
                    .wrap(TokenValidator)
                    // GET: Check session status
                    .route("/status", web::get().to(handlers::auth::check_status))
                    // OPTIONS: Check session status
                    .route("/status", web::route()
                        .guard(guard::Options())
                        .to(handlers::auth::status_options))

                    // POST: Logout
                    .route("/logout", web::post().to(handlers::auth::logout))
                    // OPTIONS: Logout
                    .route("/logout", web::route()
                        .guard(guard::Options())
                        .to(handlers::auth::logout_options))

                    // POST: Change login password
                    .route("/change-password", web::post().to(handlers::auth::change_password))
                    // OPTIONS: Change login password
                    .route("/change-password", web::route()
                        .guard(guard::Options())
                        .to(handlers::auth::change_password_options))
            )
    );

    // Credential routes (protected by token auth)
    cfg.service(
        web::scope("/credentials")
            .wrap(TokenValidator)
            .route("/count", web::get().to(handlers::credentials::count_credentials))
            .route("", web::get().to(handlers::credentials::list_credentials))
            .route("", web::post().to(handlers::credentials::add_credential))
            .route("/{id}", web::get().to(handlers::credentials::get_credential))
            .route("/{id}", web::put().to(handlers::credentials::update_credential))
            .route("/{id}", web::delete().to(handlers::credentials::delete_credential))
    );

    // Password generator (protected by token auth)
    cfg.service(
        web::scope("/generator")
            .wrap(TokenValidator)
            .route("/password", web::post().to(handlers::generator::generate_password))
            .route("/analysis/{candidate}", web::get().to(handlers::generator::analyze_password))
    );

    // Breach, geolocation and favicon helpers (protected by token auth)
    cfg.service(
        web::scope("/tools")
            .wrap(TokenValidator)
            .route("/breach", web::post().to(handlers::tools::breach_check))
            .route("/geolocation", web::get().to(handlers::tools::geolocation))
            .route("/favicon", web::get().to(handlers::tools::favicon))
    );
}
