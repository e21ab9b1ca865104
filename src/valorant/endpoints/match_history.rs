use crate::valorant::client::ValorantClient;
use crate::valorant::types::{ApiResult, ValorantAccount};

impl ValorantClient {
    /// Recent matches of an account, rendered by the API as plain text.
    pub async fn get_match_history(
        &self,
        account: &ValorantAccount,
        timezone: &str,
    ) -> ApiResult<String> {
        let path = format!(
            "/match_history/{}/{}/{}/{}?timezone={}",
            urlencoding::encode(&account.username),
            urlencoding::encode(&account.tag),
            account.region.as_str(),
            account.platform.as_str(),
            urlencoding::encode(timezone)
        );

        self.get_text(&self.url(&path)).await
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;
    use std::time::Duration;

    use httpmock::prelude::*;

    use crate::valorant::{Platform, Region, RetryPolicy};

    use super::*;

    #[tokio::test]
    async fn passes_platform_and_timezone() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/match_history/Chalop/3012/ap/pc")
                    .query_param("timezone", "Asia/Tokyo");
                then.status(200).body("Ascent - Win 13-7");
            })
            .await;
        let client = ValorantClient::new(
            server.base_url(),
            Duration::from_secs(2),
            NonZeroU32::new(1_000).unwrap(),
            RetryPolicy::default(),
        )
        .unwrap();
        let account = ValorantAccount {
            username: "Chalop".into(),
            tag: "3012".into(),
            region: Region::Ap,
            platform: Platform::Pc,
        };

        let history = client
            .get_match_history(&account, "Asia/Tokyo")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(history, "Ascent - Win 13-7");
    }
}
