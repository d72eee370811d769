//! OpenAPI documentation, served at `/api/openapi.json` and rendered at `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use docket_core::models;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Docket API",
        version = "0.1.0",
        description = "Multi-tenant invoice intake. PDF invoices are uploaded, stored, and their fields are extracted in the background for review and confirmation. All endpoints except /health require an API key (Authorization: Bearer or x-api-key)."
    ),
    paths(
        // Files
        handlers::upload::upload_files,
        handlers::files::list_files,
        handlers::files::get_file,
        handlers::files::update_file,
        handlers::files::reprocess_file,
        // Accounts
        handlers::accounts::list_accounts,
        handlers::accounts::create_account,
        // Partners
        handlers::partners::list_partners,
        handlers::partners::create_partner,
        // Corporate registries
        handlers::corporation::get_corporation,
        // Users
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::bulk_delete_users,
    ),
    components(
        schemas(
            error::ErrorResponse,
            models::FileStatus,
            models::ExtractedFields,
            models::FileResponse,
            models::FileSummary,
            models::UpdateFileRequest,
            handlers::files::ReprocessResponse,
            models::Account,
            models::CreateAccountRequest,
            models::PartnerResponse,
            models::PartnerBankAccount,
            models::CreatePartnerRequest,
            models::PartnerData,
            models::NewPartnerBankAccount,
            models::Corporation,
            models::CorporationNumberInfo,
            models::CorporationLookup,
            models::User,
            models::UserRole,
            models::UserRequest,
            models::BulkDeleteUsersRequest,
            handlers::users::BulkDeleteResponse,
        )
    ),
    tags(
        (name = "files", description = "Invoice upload, review and confirmation"),
        (name = "accounts", description = "The organization's own bank accounts"),
        (name = "partners", description = "Business partners and their bank accounts"),
        (name = "corporation", description = "Corporate number and invoice issuer registries"),
        (name = "users", description = "Organization members"),
    )
)]
pub struct ApiDoc;
