use crate::{
    api::{activity, attendance, leave_request, permission, report},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Result, anyhow};

type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter settings, built once so every worker shares the same buckets.
#[derive(Clone)]
pub struct RateLimits {
    punch: LimiterConfig,
    protected: LimiterConfig,
}

fn limiter(name: &str, requests_per_min: u32) -> Result<LimiterConfig> {
    if requests_per_min == 0 {
        return Err(anyhow!("{name} rate limit must be at least 1 request per minute"));
    }

    GovernorConfigBuilder::default()
        .milliseconds_per_request((60_000 / requests_per_min as u64).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("{name} rate limit is invalid"))
}

impl RateLimits {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            punch: limiter("check-in", config.rate_checkin_per_min)?,
            protected: limiter("protected", config.rate_protected_per_min)?,
        })
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limits: &RateLimits) {
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(Governor::new(&limits.protected))
            .service(
                web::scope("/attendance")
                    // /attendance/check-in
                    .service(
                        web::resource("/check-in")
                            .wrap(Governor::new(&limits.punch))
                            .route(web::post().to(attendance::check_in)),
                    )
                    // /attendance/check-out
                    .service(
                        web::resource("/check-out")
                            .wrap(Governor::new(&limits.punch))
                            .route(web::post().to(attendance::check_out)),
                    )
                    // /attendance/report
                    .service(
                        web::resource("/report").route(web::get().to(report::period_report)),
                    )
                    // /attendance/report/export
                    .service(
                        web::resource("/report/export")
                            .route(web::get().to(report::export_report)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/permission")
                    // /permission
                    .service(
                        web::resource("")
                            .route(web::get().to(permission::permission_list))
                            .route(web::post().to(permission::create_permission)),
                    )
                    // /permission/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(permission::approve_permission)),
                    )
                    // /permission/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(permission::reject_permission)),
                    ),
            )
            // /activity
            .service(
                web::resource("/activity")
                    .route(web::get().to(activity::list_activity))
                    .route(web::put().to(activity::upsert_activity)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_is_rejected() {
        assert!(limiter("check-in", 0).is_err());
    }

    #[test]
    fn slow_and_fast_rates_build() {
        assert!(limiter("check-in", 30).is_ok());
        assert!(limiter("protected", 120_000).is_ok());
    }
}
