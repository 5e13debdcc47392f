//! reqwest-backed `Transport`.

use std::time::Duration;

use reqwest::blocking::{multipart, Client};
use url::Url;

use super::{ApiError, HttpResponse, MultipartBody, Transport};

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("contactbook/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(Self { client })
    }

    fn finish(response: reqwest::blocking::Response) -> Result<HttpResponse, ApiError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &Url) -> Result<HttpResponse, ApiError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Self::finish(response)
    }

    fn post_multipart(&self, url: &Url, body: MultipartBody) -> Result<HttpResponse, ApiError> {
        let mut form = multipart::Form::new();
        for (name, value) in body.fields {
            form = form.text(name, value);
        }
        if let Some((name, path)) = body.file {
            form = form
                .file(name, &path)
                .map_err(|source| ApiError::Avatar { path, source })?;
        }

        let response = self
            .client
            .post(url.clone())
            .multipart(form)
            .send()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Self::finish(response)
    }
}
