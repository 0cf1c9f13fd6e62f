use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// POST `body` as JSON to `url` and decode a JSON reply. `api` names the
/// endpoint in error messages. Any non-2xx status is an error carrying the
/// response body.
pub(crate) async fn post_json<B, R>(
    client: &reqwest::Client,
    url: &str,
    bearer: Option<&str>,
    body: &B,
    api: &str,
) -> Result<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let mut request = client.post(url).json(body);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }

    let resp = request
        .send()
        .await
        .with_context(|| format!("Failed to call {api}"))?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        anyhow::bail!("{api} returned {status}: {text}");
    }

    resp.json()
        .await
        .with_context(|| format!("Failed to parse {api} response"))
}
