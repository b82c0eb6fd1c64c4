use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Rank;
use crate::constants::constants;
use crate::error::{FetchError, ResolveError};
use crate::extract::{IdPattern, dedup};
use crate::query::Query;

/// Turns a query into a playable URL.
#[allow(async_fn_in_trait)]
pub trait Resolve {
  async fn resolve(&self, query: &Query, rank: Rank) -> Result<String, ResolveError>;
}

/// Scrapes the YouTube search-result page.
pub struct Resolver {
  http_client: Client,
  search_url: Url,
  watch_url: String,
  pattern: IdPattern,
}

impl Resolver {
  pub fn new() -> Result<Self, ResolveError> {
    let c = constants();
    let http_client = Client::builder()
      .timeout(Duration::from_secs(c.request_timeout_secs))
      .user_agent(c.user_agent.as_str())
      .build()
      .map_err(|e| ResolveError::NoConnection(e.into()))?;
    // Safety: embedded constant; covered by `search_url_encodes_query`.
    let search_url = Url::parse(&c.search_url).expect("search_url in constants.ron must be a valid URL");
    Ok(Self::with_client(http_client, search_url))
  }

  fn with_client(http_client: Client, search_url: Url) -> Self {
    Self { http_client, search_url, watch_url: constants().watch_url.clone(), pattern: IdPattern::default() }
  }

  /// Search page URL with the query as the single `search_query` parameter.
  pub fn search_url(&self, query: &Query) -> Url {
    let mut url = self.search_url.clone();
    url.query_pairs_mut().clear().append_pair("search_query", query.as_str());
    url
  }

  /// The page body, which must be UTF-8. No charset sniffing or lossy decoding.
  async fn fetch_page(&self, url: Url) -> Result<String, ResolveError> {
    let fetch = async {
      let response = self.http_client.get(url).send().await?.error_for_status()?;
      let body = response.bytes().await?;
      Ok::<_, FetchError>(String::from_utf8(body.to_vec())?)
    };
    fetch.await.map_err(ResolveError::NoConnection)
  }

  /// Pick the `rank`-th unique identifier from `page`.
  pub fn select_id<'a>(&self, page: &'a str, query: &Query, rank: Rank) -> Result<&'a str, ResolveError> {
    let ids = dedup(self.pattern.extract(page));
    if ids.is_empty() {
      return Err(ResolveError::NoResults { query: query.to_string() });
    }
    ids.get(rank.get() - 1).copied().ok_or_else(|| ResolveError::RankOutOfRange {
      query: query.to_string(),
      rank: rank.get(),
      available: ids.len(),
    })
  }

  pub fn watch_url(&self, video_id: &str) -> String {
    format!("{}{}", self.watch_url, video_id)
  }
}

impl Resolve for Resolver {
  async fn resolve(&self, query: &Query, rank: Rank) -> Result<String, ResolveError> {
    let url = self.search_url(query);
    debug!(url = %url, "youtube: fetching search page");
    let page = self.fetch_page(url).await?;
    let video_id = self.select_id(&page, query, rank)?;
    let media_url = self.watch_url(video_id);
    info!(query = %query, rank = rank.get(), url = %media_url, "youtube: resolved");
    Ok(media_url)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::{Read, Write};
  use std::net::TcpListener;
  use std::thread::JoinHandle;

  fn q(s: &str) -> Query {
    Query::new(s).unwrap()
  }

  fn rank(n: usize) -> Rank {
    Rank::new(n).unwrap()
  }

  const PAGE: &str = r#"var ytInitialData = {"videoId":"AAAAAAAAAAA","title":"a"} ... {"videoId":"AAAAAAAAAAA"} ... {"videoId":"BBBBBBBBBBB"}"#;

  #[test]
  fn search_url_encodes_query() {
    let resolver = Resolver::new().unwrap();
    let url = resolver.search_url(&q("rick & morty? s01"));
    assert_eq!(url.as_str(), "https://www.youtube.com/results?search_query=rick+%26+morty%3F+s01");
  }

  #[test]
  fn duplicates_count_once_when_ranking() {
    let resolver = Resolver::new().unwrap();
    assert_eq!(resolver.select_id(PAGE, &q("x"), rank(1)).unwrap(), "AAAAAAAAAAA");
    assert_eq!(resolver.select_id(PAGE, &q("x"), rank(2)).unwrap(), "BBBBBBBBBBB");
  }

  #[test]
  fn selection_is_deterministic() {
    let resolver = Resolver::new().unwrap();
    let first = resolver.select_id(PAGE, &q("x"), rank(2)).unwrap();
    let second = resolver.select_id(PAGE, &q("x"), rank(2)).unwrap();
    assert_eq!(first, second);
  }

  #[test]
  fn rank_past_unique_results_errors() {
    let resolver = Resolver::new().unwrap();
    for n in [3, 4, 100] {
      let err = resolver.select_id(PAGE, &q("x"), rank(n)).unwrap_err();
      assert!(matches!(err, ResolveError::RankOutOfRange { rank, available: 2, .. } if rank == n));
    }
  }

  #[test]
  fn empty_page_is_no_results() {
    let resolver = Resolver::new().unwrap();
    let err = resolver.select_id("<html></html>", &q("zzzz"), rank(1)).unwrap_err();
    assert!(matches!(err, ResolveError::NoResults { ref query } if query == "zzzz"));
  }

  #[test]
  fn watch_url_appends_id() {
    let resolver = Resolver::new().unwrap();
    assert_eq!(resolver.watch_url("BBBBBBBBBBB"), "https://www.youtube.com/watch?v=BBBBBBBBBBB");
  }

  /// Answer one request on a local port with `response`; the handle yields the raw request.
  fn serve_once(response: Vec<u8>) -> (Url, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = Url::parse(&format!("http://{}/results", listener.local_addr().unwrap())).unwrap();
    let handle = std::thread::spawn(move || {
      let (mut stream, _) = listener.accept().unwrap();
      let mut request = Vec::new();
      let mut buf = [0u8; 1024];
      while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).unwrap();
        if n == 0 {
          break;
        }
        request.extend_from_slice(&buf[..n]);
      }
      stream.write_all(&response).unwrap();
      String::from_utf8_lossy(&request).into_owned()
    });
    (url, handle)
  }

  fn http_response(status: &str, body: &[u8]) -> Vec<u8> {
    let mut response =
      format!("HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n", body.len()).into_bytes();
    response.extend_from_slice(body);
    response
  }

  fn local_resolver(search_url: Url) -> Resolver {
    let client = Client::builder().no_proxy().timeout(Duration::from_secs(5)).build().unwrap();
    Resolver::with_client(client, search_url)
  }

  #[tokio::test]
  async fn resolves_served_page_end_to_end() {
    let (url, server) = serve_once(http_response("200 OK", PAGE.as_bytes()));
    let resolver = local_resolver(url);
    let media_url = resolver.resolve(&q("never gonna"), rank(2)).await.unwrap();
    assert_eq!(media_url, "https://www.youtube.com/watch?v=BBBBBBBBBBB");
    let request = server.join().unwrap();
    assert!(request.starts_with("GET /results?search_query=never+gonna HTTP/1.1"), "{request}");
  }

  #[tokio::test]
  async fn refused_connection_is_no_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = Url::parse(&format!("http://{}/results", listener.local_addr().unwrap())).unwrap();
    drop(listener);
    let err = local_resolver(url).resolve(&q("x"), rank(1)).await.unwrap_err();
    assert!(matches!(err, ResolveError::NoConnection(FetchError::Http(_))), "{err:?}");
  }

  #[tokio::test]
  async fn error_status_is_no_connection() {
    let (url, server) = serve_once(http_response("500 Internal Server Error", PAGE.as_bytes()));
    let err = local_resolver(url).resolve(&q("x"), rank(1)).await.unwrap_err();
    assert!(matches!(err, ResolveError::NoConnection(FetchError::Http(_))), "{err:?}");
    server.join().unwrap();
  }

  #[tokio::test]
  async fn invalid_utf8_body_is_no_connection() {
    let bodies: [&[u8]; 2] =
      [b"\x80\x80 \"videoId\":\"AAAAAAAAAAA\" \xc3\x28", b"\xff\xfe\"\x00v\x00i\x00d\x00e\x00o\x00I\x00d\x00"];
    for body in bodies {
      let (url, server) = serve_once(http_response("200 OK", body));
      let err = local_resolver(url).resolve(&q("x"), rank(1)).await.unwrap_err();
      assert!(matches!(err, ResolveError::NoConnection(FetchError::Body(_))), "{body:?}: {err:?}");
      server.join().unwrap();
    }
  }
}
