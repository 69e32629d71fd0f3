pub mod message;
pub mod record;
pub mod user;
pub use message::Message;
pub use record::*;
pub use user::*;

use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use crate::models::Role;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(
            Message,
            Role,
            LoginInfo,
            LoginUser,
            LoginResponse,
            NewUser,
            UserResponse,
            NewRecord,
            CreatedRecord,
            RecordResponse,
            UserSummary,
            MonthlyReport,
        ),
    ),
    modifiers(&SecurityAddon)
)]
/// Captures OpenAPI schemas defined in the DTO module
pub struct OpenApiSchemas;

pub struct SecurityAddon;
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        // components are always present since schemas are registered above
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}
