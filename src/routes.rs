use crate::{
    api::{carry_forward, employee, leave, summary},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(handlers::me)
            .service(
                web::scope("/employee")
                    // /employee
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employee/{id}
                    .service(
                        web::resource("/{id}").route(web::get().to(employee::get_employee)),
                    ),
            )
            .service(
                web::scope("/users")
                    // /users/{id}/role
                    .service(
                        web::resource("/{id}/role")
                            .route(web::put().to(employee::update_user_role)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::leave_list))
                            .route(web::post().to(leave::create_leave)),
                    )
                    // fixed paths before /leave/{id}
                    .service(web::resource("/ranges").route(web::get().to(leave::leave_ranges)))
                    .service(
                        web::resource("/export").route(web::get().to(leave::export_leave_csv)),
                    )
                    // /leave/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(leave::get_leave))
                            .route(web::delete().to(leave::delete_leave)),
                    )
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(leave::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(leave::reject_leave)),
                    ),
            )
            .service(
                web::scope("/carry-forward")
                    // /carry-forward
                    .service(
                        web::resource("")
                            .route(web::get().to(carry_forward::carry_forward_list))
                            .route(web::post().to(carry_forward::create_carry_forward)),
                    )
                    // /carry-forward/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(carry_forward::approve_carry_forward)),
                    )
                    // /carry-forward/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(carry_forward::reject_carry_forward)),
                    ),
            )
            .service(
                web::scope("/summary")
                    // /summary/{year}
                    .service(
                        web::resource("/{year}").route(web::get().to(summary::get_summaries)),
                    )
                    // /summary/{year}/notify
                    .service(
                        web::resource("/{year}/notify")
                            .route(web::post().to(summary::notify_thresholds)),
                    ),
            ),
    );
}
