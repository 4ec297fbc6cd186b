//! `include`: fetch manifests from `source` (an `http(s)://` URL or a
//! local path) and apply them.

use crate::constants::INCLUDE_FETCH_TIMEOUT_SECS;
use crate::error::{EngineError, RemoteFetchError};
use crate::kube::ClusterApi;
use crate::Result;
use std::time::Duration;

pub async fn include(cluster: &dyn ClusterApi, source: &str, default_namespace: &str) -> Result<()> {
    let content = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_remote(source).await?
    } else {
        std::fs::read_to_string(source).map_err(EngineError::Io)?
    };
    cluster.apply_docs(&content, default_namespace).await
}

async fn fetch_remote(url: &str) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(INCLUDE_FETCH_TIMEOUT_SECS))
        .build()
        .map_err(RemoteFetchError::Http)?;
    let response = client.get(url).send().await.map_err(RemoteFetchError::Http)?;
    let status = response.status();
    if !status.is_success() {
        return Err(RemoteFetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        }
        .into());
    }
    response.text().await.map_err(|e| RemoteFetchError::Http(e).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kube::FakeClusterApi;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_manifests_over_http_and_applies_them() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/manifests.yaml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: included\n",
            ))
            .mount(&server)
            .await;

        let cluster = FakeClusterApi::new();
        let url = format!("{}/manifests.yaml", server.uri());
        include(&cluster, &url, "default").await.unwrap();

        let resource = crate::model::ResourceRef {
            api_version: "v1".into(),
            kind: "ConfigMap".into(),
            name: "included".into(),
            namespace: Some("default".into()),
        };
        assert!(cluster.get_resource_json(&resource).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn non_success_status_is_remote_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.yaml"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let cluster = FakeClusterApi::new();
        let url = format!("{}/missing.yaml", server.uri());
        let err = include(&cluster, &url, "default").await.unwrap_err();
        assert!(matches!(err, crate::error::EngineError::RemoteFetchError(_)));
    }
}
