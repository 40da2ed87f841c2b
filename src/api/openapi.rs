//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Loans API",
        version = "0.1.0",
        description = "Book loans, returns and borrowing policy"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Loans
        loans::list_loans,
        loans::get_user_loans,
        loans::create_loan,
        loans::return_loan,
    ),
    components(
        schemas(
            // Loans
            crate::models::loan::Loan,
            crate::models::loan::CreateLoanRequest,
            loans::ReturnResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
            crate::error::ValidationProblem,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "loans", description = "Loan management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_loan_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| p.as_str() == "/loans"));
        assert!(paths.iter().any(|p| p.as_str() == "/loans/{username}"));
        assert!(paths.iter().any(|p| p.as_str() == "/loans/{id}/return"));
    }
}
