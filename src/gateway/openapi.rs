//! OpenAPI document for the wallet routes

use utoipa::OpenApi;

use super::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "coinvault",
        description = "Closed-loop virtual-currency wallet service"
    ),
    paths(
        handlers::wallet::topup,
        handlers::wallet::bonus,
        handlers::wallet::spend,
        handlers::wallet::balance,
        handlers::health::health_check,
    ),
    components(schemas(
        handlers::wallet::MutationBody,
        handlers::health::HealthStatus,
        crate::engine::types::SuccessPayload,
        crate::engine::types::BalanceResponse,
        crate::engine::types::BalanceEntry,
    )),
    tags(
        (name = "Wallet", description = "Wallet mutations and balance queries"),
        (name = "Health", description = "Service health")
    )
)]
pub struct ApiDoc;
