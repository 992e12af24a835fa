use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the `bearer_auth` scheme the domain handlers reference.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Marketplace API",
        version = "0.1.0",
        description = "Freelance marketplace: accounts, task postings, bidding, milestone escrow, messaging and notifications"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = "/categories", api = domain_categories::handlers::ApiDoc),
        (path = "/messages", api = domain_messages::handlers::ApiDoc),
        (path = "/notifications", api = domain_notifications::handlers::ApiDoc)
    ),
    modifiers(&SecurityAddon)
)]
struct BaseDoc;

/// The document served by the Swagger UI, ReDoc, RapiDoc and Scalar pages.
///
/// Users and tasks already carry their full paths (`/auth/...`, `/tasks/...`,
/// `/bids/...`), so they are merged instead of nested.
pub struct ApiDoc;

impl OpenApi for ApiDoc {
    fn openapi() -> utoipa::openapi::OpenApi {
        BaseDoc::openapi()
            .merge_from(domain_users::handlers::ApiDoc::openapi())
            .merge_from(domain_tasks::ApiDoc::openapi())
    }
}
