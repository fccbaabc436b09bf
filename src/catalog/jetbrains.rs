use crate::catalog::{ReleaseCatalog, Version};
use crate::config::CatalogSettings;
use crate::error::{BumpError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

const MAX_RESPONSE_BYTES: usize = 10 * 1024 * 1024;

/// JetBrains product data service client
pub struct JetBrainsCatalog {
    client: Client,
    endpoint: Url,
}

impl JetBrainsCatalog {
    pub fn new(settings: &CatalogSettings) -> Result<Self> {
        let endpoint = Self::build_endpoint(settings)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("ij-bump/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BumpError::CatalogUnavailable(format!("Failed to build client: {e}")))?;

        Ok(Self { client, endpoint })
    }

    fn build_endpoint(settings: &CatalogSettings) -> Result<Url> {
        let mut url = Url::parse(&settings.url)
            .map_err(|_| BumpError::Config(format!("Invalid catalog URL: {}", settings.url)))?;

        match url.scheme() {
            "https" | "http" => {}
            scheme => {
                return Err(BumpError::Config(format!(
                    "Unsupported catalog URL scheme: {scheme}"
                )));
            }
        }

        url.query_pairs_mut()
            .append_pair("code", &settings.product_code)
            .append_pair("release.type", &settings.release_type);

        Ok(url)
    }

    fn fetch_products(&self) -> Result<Vec<Product>> {
        debug!(url = %self.endpoint, "fetching release catalog");

        let response = self
            .client
            .get(self.endpoint.clone())
            .send()
            .map_err(|e| BumpError::CatalogUnavailable(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(BumpError::CatalogUnavailable(format!(
                "HTTP {} from {}",
                response.status(),
                self.endpoint
            )));
        }

        let text = response
            .text()
            .map_err(|e| BumpError::CatalogUnavailable(format!("Failed to read response: {e}")))?;

        if text.len() > MAX_RESPONSE_BYTES {
            return Err(BumpError::CatalogUnavailable(
                "Catalog response exceeded 10MB limit".to_string(),
            ));
        }

        parse_products(&text)
    }
}

impl ReleaseCatalog for JetBrainsCatalog {
    fn available_versions(&self) -> Result<Vec<Version>> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("  {spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("Querying JetBrains releases...");
        spinner.enable_steady_tick(Duration::from_millis(100));

        let products = self.fetch_products();
        spinner.finish_and_clear();

        Ok(collect_versions(&products?))
    }
}

#[derive(Debug, Deserialize)]
struct Product {
    code: String,
    name: String,
    #[serde(default)]
    releases: Vec<Release>,
}

#[derive(Debug, Deserialize)]
struct Release {
    version: String,
}

fn parse_products(text: &str) -> Result<Vec<Product>> {
    serde_json::from_str(text)
        .map_err(|e| BumpError::CatalogUnavailable(format!("Failed to decode catalog: {e}")))
}

fn collect_versions(products: &[Product]) -> Vec<Version> {
    let mut versions = Vec::new();

    for product in products {
        debug!("Processing releases for {} -> {}", product.code, product.name);

        for release in &product.releases {
            match Version::parse(&release.version) {
                Ok(version) => versions.push(version),
                Err(e) => debug!("Skipping release {}: {e}", release.version),
            }
        }
    }

    versions
}
