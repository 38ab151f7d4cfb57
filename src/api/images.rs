use serde::Deserialize;

use crate::client::Client;
use crate::error::Result;

/// The image service speaks its own protocol: raw bytes in, an
/// unenveloped payload out.
#[derive(Debug, Deserialize)]
struct PictureResponse {
    payload: PicturePayload,
}

#[derive(Debug, Deserialize)]
struct PicturePayload {
    url: String,
}

pub struct ImagesApi<'a> {
    pub(crate) client: &'a Client,
}

impl ImagesApi<'_> {
    /// Uploads image bytes to the GroupMe image service and returns the
    /// hosted URL, suitable for avatar fields and image attachments.
    pub async fn upload(&self, data: Vec<u8>) -> Result<String> {
        let response: PictureResponse = self
            .client
            .post_raw(&self.client.image_service_url("/pictures"), data)
            .await?;
        Ok(response.payload.url)
    }

    /// Downloads an image from an arbitrary URL and re-hosts it on the
    /// image service. The external fetch is made without credentials.
    pub async fn reupload(&self, url: &str) -> Result<String> {
        let data = self.client.fetch_external(url).await?;
        self.upload(data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::MockTransport;
    use crate::client::{Client, Method, IMAGE_API_ROOT};

    #[tokio::test]
    async fn test_upload_parses_hosted_url() {
        let transport = MockTransport::replying(
            200,
            r#"{"payload": {"url": "https://i.groupme.com/123", "picture_url": "https://i.groupme.com/123.large"}}"#,
        );
        let client = Client::with_transport(transport.clone());

        let url = client.images().upload(vec![0xFF, 0xD8]).await.unwrap();
        assert_eq!(url, "https://i.groupme.com/123");

        let recorded = transport.recorded();
        assert_eq!(recorded[0].url, format!("{}/pictures", IMAGE_API_ROOT));
        assert_eq!(recorded[0].raw_body.as_deref(), Some(&[0xFF, 0xD8][..]));
    }

    #[tokio::test]
    async fn test_reupload_fetches_source_without_credentials() {
        let transport = MockTransport::replying(200, "fakebytes");
        transport.queue(200, r#"{"payload": {"url": "https://i.groupme.com/abc"}}"#);
        let client = Client::with_transport(transport.clone());

        let url = client
            .images()
            .reupload("https://example.com/cat.jpg")
            .await
            .unwrap();
        assert_eq!(url, "https://i.groupme.com/abc");

        let recorded = transport.recorded();
        assert_eq!(recorded[0].method, Method::Get);
        assert!(!recorded[0].authenticated);
        assert_eq!(recorded[1].raw_body.as_deref(), Some("fakebytes".as_bytes()));
    }
}
