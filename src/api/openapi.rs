use super::handlers::{auth, health, patients, treatments};
use axum::middleware;
use utoipa::openapi::{
    Components, Contact, InfoBuilder, License, OpenApiBuilder, Tag,
    security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_axum::{router::OpenApiRouter, routes};

pub const SESSION_SECURITY_SCHEME: &str = "session";

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Public routes are registered directly. Everything in `protected` runs behind
/// the authorization gate, installed as a route layer so unmatched paths still
/// fall through to `404`.
pub(crate) fn api_router() -> OpenApiRouter {
    let protected = OpenApiRouter::new()
        .routes(routes!(auth::session::session))
        .routes(routes!(
            patients::list_patients,
            patients::create_patient
        ))
        .routes(routes!(
            patients::get_patient,
            patients::update_patient,
            patients::delete_patient
        ))
        .routes(routes!(
            treatments::list_treatments,
            treatments::create_treatment
        ))
        .routes(routes!(
            treatments::update_treatment,
            treatments::delete_treatment
        ))
        .route_layer(middleware::from_fn(auth::gate::require_session));

    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(auth::register::register))
        .routes(routes!(auth::login::login))
        .routes(routes!(auth::session::logout))
        .merge(protected);

    let mut health_tag = Tag::new("health");
    health_tag.description = Some("Service and database status".to_string());

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Operator registration, sign-in and sessions".to_string());

    let mut patients_tag = Tag::new("patients");
    patients_tag.description =
        Some("Patient records with dental history and medical chart".to_string());

    let mut treatments_tag = Tag::new("treatments");
    treatments_tag.description = Some("Per-patient treatment history".to_string());

    let openapi = router.get_openapi_mut();
    openapi.tags = Some(vec![health_tag, auth_tag, patients_tag, treatments_tag]);
    openapi
        .components
        .get_or_insert_with(Components::new)
        .add_security_scheme(
            SESSION_SECURITY_SCHEME,
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );

    router
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    OpenApiBuilder::new().info(info).build()
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    fn non_empty(value: &str) -> Option<&str> {
        (!value.is_empty()).then_some(value)
    }

    match author.split_once('<') {
        Some((name, email)) => (
            non_empty(name.trim()),
            non_empty(email.trim_end_matches('>').trim()),
        ),
        None => (non_empty(author.trim()), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let doc = openapi();
        assert_eq!(doc.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(doc.info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(
            doc.info.description.as_deref(),
            Some(env!("CARGO_PKG_DESCRIPTION"))
        );

        let contact = doc.info.contact;
        assert!(contact.is_some());
        if let Some(contact) = contact {
            assert_eq!(contact.name.as_deref(), Some("Clinic Team"));
            assert_eq!(contact.email.as_deref(), Some("team@clinic.local"));
        }

        let license = doc.info.license;
        assert!(license.is_some());
        if let Some(license) = license {
            assert_eq!(license.name, "BSD-3-Clause");
            assert_eq!(license.identifier.as_deref(), Some("BSD-3-Clause"));
        }
    }

    #[test]
    fn openapi_tags_and_paths() {
        let doc = openapi();
        let tags = doc.tags.clone().unwrap_or_default();
        for name in ["health", "auth", "patients", "treatments"] {
            assert!(tags.iter().any(|tag| tag.name == name), "missing tag {name}");
        }
        for path in [
            "/health",
            "/v1/auth/register",
            "/v1/auth/login",
            "/v1/auth/session",
            "/v1/auth/logout",
            "/v1/patients",
            "/v1/patients/{id}",
            "/v1/patients/{id}/treatments",
            "/v1/treatments/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing path {path}");
        }
    }

    #[test]
    fn openapi_declares_session_scheme() {
        let doc = openapi();
        let schemes = doc
            .components
            .map(|components| components.security_schemes)
            .unwrap_or_default();
        assert!(schemes.contains_key(SESSION_SECURITY_SCHEME));
    }

    #[test]
    fn protected_operations_require_session() -> anyhow::Result<()> {
        let doc = serde_json::to_value(openapi())?;
        let paths = &doc["paths"];
        let session = serde_json::json!([{ (SESSION_SECURITY_SCHEME): [] }]);
        for (path, method) in [
            ("/v1/auth/session", "get"),
            ("/v1/patients", "get"),
            ("/v1/patients", "post"),
            ("/v1/patients/{id}", "get"),
            ("/v1/patients/{id}", "put"),
            ("/v1/patients/{id}", "delete"),
            ("/v1/patients/{id}/treatments", "get"),
            ("/v1/patients/{id}/treatments", "post"),
            ("/v1/treatments/{id}", "put"),
            ("/v1/treatments/{id}", "delete"),
        ] {
            assert_eq!(
                paths[path][method]["security"], session,
                "{method} {path} should require a session"
            );
        }
        for (path, method) in [
            ("/health", "get"),
            ("/v1/auth/register", "post"),
            ("/v1/auth/login", "post"),
            ("/v1/auth/logout", "post"),
        ] {
            assert!(paths[path][method]["security"].is_null(), "{method} {path}");
        }
        Ok(())
    }

    #[test]
    fn parse_author_variants() {
        assert_eq!(
            parse_author("Jane Doe <jane@example.com>"),
            (Some("Jane Doe"), Some("jane@example.com"))
        );
        assert_eq!(parse_author("Jane Doe"), (Some("Jane Doe"), None));
        assert_eq!(parse_author("<jane@example.com>"), (None, Some("jane@example.com")));
    }
}
