/// Track metadata from a Spotify-compatible catalog API
use async_trait::async_trait;
use nest_core::{NestError, Result, TrackCatalog, TrackMetadata};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Most ids the `/v1/tracks` endpoint accepts per call
pub const LOOKUP_BATCH: usize = 50;

/// HTTP catalog client
///
/// Without an access token every lookup fails with `UpstreamUnavailable`,
/// which callers surface as "metadata unavailable".
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    http: Client,
    base_url: String,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TracksPage {
    tracks: Vec<Option<CatalogTrack>>,
}

#[derive(Debug, Deserialize)]
struct CatalogTrack {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<CatalogArtist>,
    album: Option<CatalogAlbum>,
    #[serde(default)]
    duration_ms: u64,
    preview_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CatalogAlbum {
    name: String,
    #[serde(default)]
    images: Vec<CatalogImage>,
}

#[derive(Debug, Deserialize)]
struct CatalogImage {
    url: String,
}

impl From<CatalogTrack> for TrackMetadata {
    fn from(track: CatalogTrack) -> Self {
        let (album, image_url) = match track.album {
            Some(album) => (album.name, album.images.into_iter().next().map(|i| i.url)),
            None => (String::new(), None),
        };
        Self {
            external_track_id: track.id,
            name: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            album,
            duration_ms: track.duration_ms,
            image_url,
            preview_url: track.preview_url,
        }
    }
}

fn unavailable(msg: impl std::fmt::Display) -> NestError {
    NestError::UpstreamUnavailable(msg.to_string())
}

impl HttpCatalog {
    pub fn new(
        base_url: impl Into<String>,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(unavailable)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.filter(|t| !t.is_empty()),
        })
    }

    async fn fetch_batch(&self, token: &str, ids: &[String]) -> Result<Vec<TrackMetadata>> {
        let url = format!("{}/v1/tracks", self.base_url);
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[("ids", ids.join(","))])
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("catalog returned {}", status)));
        }

        let page: TracksPage = response.json().await.map_err(unavailable)?;
        Ok(page.tracks.into_iter().flatten().map(Into::into).collect())
    }
}

#[async_trait]
impl TrackCatalog for HttpCatalog {
    async fn lookup(&self, external_track_ids: &[String]) -> Result<HashMap<String, TrackMetadata>> {
        let Some(token) = self.access_token.as_deref() else {
            return Err(unavailable("no catalog access token configured"));
        };

        let mut ids: Vec<String> = external_track_ids.to_vec();
        ids.sort();
        ids.dedup();

        let mut found = HashMap::with_capacity(ids.len());
        for batch in ids.chunks(LOOKUP_BATCH) {
            tracing::debug!(count = batch.len(), "catalog lookup");
            for metadata in self.fetch_batch(token, batch).await? {
                found.insert(metadata.external_track_id.clone(), metadata);
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn catalog(server: &MockServer, token: Option<&str>) -> HttpCatalog {
        HttpCatalog::new(
            server.uri(),
            token.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_lookup_maps_tracks_and_skips_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/tracks"))
            .and(query_param("ids", "a,zz"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tracks": [
                    {
                        "id": "a",
                        "name": "Holocene",
                        "artists": [{"name": "Bon Iver"}],
                        "album": {"name": "Bon Iver", "images": [{"url": "https://img/1"}]},
                        "duration_ms": 336000,
                        "preview_url": null
                    },
                    null
                ]
            })))
            .mount(&server)
            .await;

        let found = catalog(&server, Some("tok"))
            .lookup(&["zz".to_string(), "a".to_string(), "a".to_string()])
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        let holocene = &found["a"];
        assert_eq!(holocene.artists, vec!["Bon Iver".to_string()]);
        assert_eq!(holocene.image_url.as_deref(), Some("https://img/1"));
    }

    #[tokio::test]
    async fn test_lookup_batches_by_fifty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/tracks"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"tracks": []})),
            )
            .expect(3)
            .mount(&server)
            .await;

        let ids: Vec<String> = (0..120).map(|i| format!("id-{:03}", i)).collect();
        let found = catalog(&server, Some("tok")).lookup(&ids).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_missing_token_is_unavailable() {
        let server = MockServer::start().await;
        let err = catalog(&server, None)
            .lookup(&["a".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, NestError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_upstream_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/tracks"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = catalog(&server, Some("tok"))
            .lookup(&["a".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), nest_core::ErrorKind::UpstreamUnavailable);
    }
}
