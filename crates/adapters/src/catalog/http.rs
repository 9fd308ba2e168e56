//! REST Catalog Client
//!
//! Maps each catalog port operation to a single HTTP call against the
//! environment's catalog endpoint. The environment name travels with every
//! request; credentials come from the environment's token variable and are
//! otherwise opaque to the engine.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use std::collections::BTreeSet;

use pacta_domain::{CatalogObjectState, ColumnSpec, Constraint, DataType, Privilege, QualifiedName};
use pacta_ports::{CatalogError, CatalogService};

use crate::config::{ConfigError, EnvironmentConfig};

/// Catalog client over the catalog service's REST surface
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: Client,
    base_url: String,
    environment: String,
    token: String,
}

impl HttpCatalog {
    /// Build a client for one environment. The access token is read from
    /// the environment's configured token variable up front, so a missing
    /// credential fails before any catalog call.
    pub fn new(environment: &str, config: &EnvironmentConfig) -> Result<Self, ConfigError> {
        let token = std::env::var(&config.token_env)
            .map_err(|_| ConfigError::MissingEnvVar(config.token_env.clone()))?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| ConfigError::InvalidValue(format!("http client: {err}")))?;
        Ok(Self {
            client,
            base_url: config.catalog_url.trim_end_matches('/').to_string(),
            environment: environment.to_string(),
            token,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .header("x-pacta-environment", &self.environment)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, CatalogError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response.text().await.unwrap_or_default();
        Err(status_error(status, detail))
    }

    async fn send_expecting_unit(&self, request: RequestBuilder) -> Result<(), CatalogError> {
        self.send(request).await.map(|_| ())
    }

    fn object_path(&self, name: &QualifiedName) -> String {
        format!("/objects/{name}")
    }
}

fn transport_error(err: reqwest::Error) -> CatalogError {
    if err.is_timeout() || err.is_connect() {
        CatalogError::Transient(err.to_string())
    } else {
        CatalogError::Unavailable(err.to_string())
    }
}

fn status_error(status: StatusCode, detail: String) -> CatalogError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            CatalogError::PermissionDenied(detail)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            CatalogError::Transient(format!("{status}: {detail}"))
        }
        status if status.is_server_error() => {
            CatalogError::Transient(format!("{status}: {detail}"))
        }
        _ => CatalogError::InvalidDdl(format!("{status}: {detail}")),
    }
}

#[derive(Serialize)]
struct AlterColumnBody<'a> {
    #[serde(rename = "type")]
    data_type: &'a DataType,
}

#[derive(Serialize)]
struct GrantBody<'a> {
    principal: &'a str,
    privileges: &'a BTreeSet<Privilege>,
}

#[async_trait]
impl CatalogService for HttpCatalog {
    async fn object_exists(&self, name: &QualifiedName) -> Result<bool, CatalogError> {
        let request = self.request(Method::GET, &self.object_path(name));
        let response = request.send().await.map_err(transport_error)?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => {
                let detail = response.text().await.unwrap_or_default();
                Err(status_error(status, detail))
            }
        }
    }

    async fn read_structure(
        &self,
        name: &QualifiedName,
    ) -> Result<CatalogObjectState, CatalogError> {
        let request = self.request(Method::GET, &self.object_path(name));
        let response = request.send().await.map_err(transport_error)?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(CatalogObjectState::absent(name.clone())),
            status if status.is_success() => response
                .json::<CatalogObjectState>()
                .await
                .map_err(|err| CatalogError::Unavailable(format!("malformed response: {err}"))),
            status => {
                let detail = response.text().await.unwrap_or_default();
                Err(status_error(status, detail))
            }
        }
    }

    async fn create_object(&self, desired: &CatalogObjectState) -> Result<(), CatalogError> {
        let request = self.request(Method::POST, "/objects").json(desired);
        let response = request.send().await.map_err(transport_error)?;
        match response.status() {
            // Already created by a concurrent run; creation is idempotent.
            StatusCode::CONFLICT => Ok(()),
            status if status.is_success() => Ok(()),
            status => {
                let detail = response.text().await.unwrap_or_default();
                Err(status_error(status, detail))
            }
        }
    }

    async fn add_column(
        &self,
        table: &QualifiedName,
        column: &ColumnSpec,
    ) -> Result<(), CatalogError> {
        let path = format!("{}/columns", self.object_path(table));
        self.send_expecting_unit(self.request(Method::POST, &path).json(column))
            .await
    }

    async fn drop_column(&self, table: &QualifiedName, column: &str) -> Result<(), CatalogError> {
        let path = format!("{}/columns/{column}", self.object_path(table));
        self.send_expecting_unit(self.request(Method::DELETE, &path))
            .await
    }

    async fn alter_column_type(
        &self,
        table: &QualifiedName,
        column: &str,
        to: &DataType,
    ) -> Result<(), CatalogError> {
        let path = format!("{}/columns/{column}", self.object_path(table));
        let body = AlterColumnBody { data_type: to };
        self.send_expecting_unit(self.request(Method::PATCH, &path).json(&body))
            .await
    }

    async fn add_constraint(
        &self,
        table: &QualifiedName,
        constraint: &Constraint,
    ) -> Result<(), CatalogError> {
        let path = format!("{}/constraints", self.object_path(table));
        self.send_expecting_unit(self.request(Method::POST, &path).json(constraint))
            .await
    }

    async fn drop_constraint(
        &self,
        table: &QualifiedName,
        constraint: &str,
    ) -> Result<(), CatalogError> {
        let path = format!("{}/constraints/{constraint}", self.object_path(table));
        self.send_expecting_unit(self.request(Method::DELETE, &path))
            .await
    }

    async fn grant(
        &self,
        object: &QualifiedName,
        principal: &str,
        privileges: &BTreeSet<Privilege>,
    ) -> Result<(), CatalogError> {
        let path = format!("{}/grants", self.object_path(object));
        let body = GrantBody {
            principal,
            privileges,
        };
        self.send_expecting_unit(self.request(Method::POST, &path).json(&body))
            .await
    }

    async fn revoke(
        &self,
        object: &QualifiedName,
        principal: &str,
        privileges: &BTreeSet<Privilege>,
    ) -> Result<(), CatalogError> {
        let path = format!("{}/grants/{principal}", self.object_path(object));
        let body = GrantBody {
            principal,
            privileges,
        };
        self.send_expecting_unit(self.request(Method::DELETE, &path).json(&body))
            .await
    }
}
