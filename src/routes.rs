use crate::{
    api::{attendance, metrics, roster},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;

// Per-scope limiter; `None` when the builder rejects the quota.
fn build_limiter(requests_per_min: u32) -> Option<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / u64::from(requests_per_min)).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()?;
    Some(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let scope = web::scope(&config.api_prefix);

    match build_limiter(config.rate_protected_per_min) {
        Some(limiter) => cfg.service(scope.wrap(limiter).configure(configure_api)),
        None => {
            tracing::warn!(
                rate = config.rate_protected_per_min,
                "Invalid rate limit, serving the API without a limiter"
            );
            cfg.service(scope.configure(configure_api))
        }
    };
}

/// Metrics, rosters and the mobile punch endpoint, relative to the API prefix.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/metrics")
            // /metrics
            .service(web::resource("").route(web::get().to(metrics::get_metrics)))
            // /metrics/range
            .service(web::resource("/range").route(web::get().to(metrics::range_metrics)))
            // /metrics/tee
            .service(web::resource("/tee").route(web::get().to(metrics::tee_estimate))),
    )
    .service(
        web::scope("/attendance")
            .service(web::resource("/present").route(web::get().to(roster::present)))
            .service(web::resource("/late").route(web::get().to(roster::late)))
            .service(
                web::resource("/early-departures").route(web::get().to(roster::early_departures)),
            )
            .service(
                web::resource("/mobile-punch").route(web::post().to(attendance::mobile_punch)),
            ),
    );
}
