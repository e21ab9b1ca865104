use crate::valorant::client::ValorantClient;
use crate::valorant::region::Platform;
use crate::valorant::types::{ApiResult, RawRankResponse, ValorantAccount};

impl ValorantClient {
    /// Current competitive rank of an account.
    /// Console accounts are served from a `/console` suffixed route.
    pub async fn get_rank(&self, account: &ValorantAccount) -> ApiResult<RawRankResponse> {
        let mut path = format!(
            "/mmr/{}/{}/{}",
            urlencoding::encode(&account.username),
            urlencoding::encode(&account.tag),
            account.region.as_str()
        );
        if account.platform == Platform::Console {
            path.push_str("/console");
        }

        let body = self.get_text(&self.url(&path)).await?;

        Ok(RawRankResponse::from_body(body))
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;
    use std::time::Duration;

    use httpmock::prelude::*;

    use crate::valorant::{Platform, Region, RetryPolicy};

    use super::*;

    fn account(platform: Platform) -> ValorantAccount {
        ValorantAccount {
            username: "Chalop".into(),
            tag: "3012".into(),
            region: Region::Eu,
            platform,
        }
    }

    fn client(server: &MockServer) -> ValorantClient {
        ValorantClient::new(
            server.base_url(),
            Duration::from_secs(2),
            NonZeroU32::new(1_000).unwrap(),
            RetryPolicy::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn pc_accounts_use_the_plain_route() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/mmr/Chalop/3012/eu");
                then.status(200).body("Bronze 2, RR: 45 (+12)");
            })
            .await;

        let raw = client(&server).get_rank(&account(Platform::Pc)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(raw, RawRankResponse::Text("Bronze 2, RR: 45 (+12)".into()));
    }

    #[tokio::test]
    async fn console_accounts_use_the_console_route() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/mmr/Chalop/3012/eu/console");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"{"rank":"Gold","division":1,"rr":12}"#);
            })
            .await;

        let raw = client(&server)
            .get_rank(&account(Platform::Console))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(matches!(raw, RawRankResponse::Structured(_)));
    }
}
