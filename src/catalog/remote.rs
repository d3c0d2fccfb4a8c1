use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::token::TokenProvider;
use super::{CatalogError, CatalogSnapshot, CourseSource};
use crate::storage::CourseData;

const CATALOG_TIMEOUT: Duration = Duration::from_secs(30);
const ACCEPT: &str = "application/json";

#[derive(Deserialize)]
struct TotalStudentsResponse {
    #[serde(rename = "totalStudents", default)]
    total_students: i64,
}

#[derive(Deserialize)]
struct TotalReviewsResponse {
    #[serde(rename = "totalReviews", default)]
    total_reviews: i64,
}

/// Course data from the remote catalog API.
///
/// Each snapshot fetches a new token, then the listing and both totals, one
/// request after the other.
#[derive(Clone)]
pub struct RemoteCatalog {
    client: reqwest::Client,
    base: Url,
    tokens: TokenProvider,
}

impl RemoteCatalog {
    /// `api_url` is the listing endpoint; the totals live next to it
    /// (`<api_url>totalStudents`, `<api_url>totalReviews`).
    pub fn new(
        client: reqwest::Client,
        api_url: &str,
        tokens: TokenProvider,
    ) -> Result<Self, CatalogError> {
        let mut base =
            Url::parse(api_url).map_err(|e| CatalogError::InvalidUrl(format!("{api_url}: {e}")))?;
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        Ok(Self {
            client,
            base,
            tokens,
        })
    }

    pub async fn courses(&self, token: &str) -> Result<Vec<CourseData>, CatalogError> {
        self.get_json(self.base.clone(), token).await
    }

    pub async fn total_students(&self, token: &str) -> Result<i64, CatalogError> {
        let url = self.endpoint("totalStudents")?;
        let body: TotalStudentsResponse = self.get_json(url, token).await?;
        Ok(body.total_students)
    }

    pub async fn total_reviews(&self, token: &str) -> Result<i64, CatalogError> {
        let url = self.endpoint("totalReviews")?;
        let body: TotalReviewsResponse = self.get_json(url, token).await?;
        Ok(body.total_reviews)
    }

    fn endpoint(&self, name: &str) -> Result<Url, CatalogError> {
        self.base
            .join(name)
            .map_err(|e| CatalogError::InvalidUrl(format!("{name}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, token: &str) -> Result<T, CatalogError> {
        let request = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, ACCEPT)
            .bearer_auth(token);

        let response = tokio::time::timeout(CATALOG_TIMEOUT, request.send())
            .await
            .map_err(|_| CatalogError::Timeout)?
            .map_err(CatalogError::Network)?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(url = %url, status = %status, "Catalog request failed");
            return Err(CatalogError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        tracing::debug!(url = %url, bytes = body.len(), "Catalog response received");

        serde_json::from_slice(&body).map_err(|e| {
            tracing::error!(url = %url, error = %e, "Catalog response could not be decoded");
            CatalogError::Decode(e.to_string())
        })
    }
}

#[async_trait]
impl CourseSource for RemoteCatalog {
    async fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        let token = self.tokens.fetch().await?;

        let courses = self.courses(&token).await?;
        let total_students = self.total_students(&token).await?;
        let total_reviews = self.total_reviews(&token).await?;

        Ok(CatalogSnapshot {
            courses,
            total_students,
            total_reviews,
        })
    }
}
