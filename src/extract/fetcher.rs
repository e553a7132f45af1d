use reqwest::{Client, StatusCode};

use crate::error::EtlError;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// A fetched search-result page. Both the requested and the resolved URL
/// are kept because OLX redirects out-of-range page numbers back to page 1.
#[derive(Debug, Clone)]
pub struct Page {
    pub status: StatusCode,
    pub requested_url: String,
    pub final_url: String,
    pub body: String,
}

pub fn build_client() -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .expect("failed to build http client")
}

pub async fn fetch_page(client: &Client, url: &str) -> Result<Page, EtlError> {
    let res = client.get(url).send().await?;
    let status = res.status();
    let final_url = res.url().to_string();
    let body = res.text().await?;

    Ok(Page {
        status,
        requested_url: url.to_string(),
        final_url,
        body,
    })
}

pub async fn fetch_body(client: &Client, url: &str) -> Result<String, EtlError> {
    let res = client.get(url).send().await?;
    Ok(res.text().await?)
}
