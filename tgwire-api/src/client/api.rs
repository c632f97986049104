//! The typed Bot API client.
//!
//! Every method posts to `https://api.telegram.org/bot{token}/{method}`
//! and returns the raw [`ApiResponse`] envelope; call
//! [`into_result`](ApiResponse::into_result) to collapse it.  Structured
//! parameters travel as JSON bodies, file uploads as multipart forms.

use reqwest::Client;
use reqwest::multipart::Form;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::ClientError;
use super::files::{InputFile, form_with_params};
use crate::envelope::ApiResponse;
use crate::params::{
    AnswerCallbackQuery, AnswerInlineQuery, AnswerPreCheckoutQuery, AnswerShippingQuery,
    EditMessageText, ForwardMessage, GetUpdates, SendFile, SendMessage, SetWebhook,
};
use crate::types::{ChatId, Message, Update, User, WebhookInfo};

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

/// Typed HTTP client for the Bot API.
///
/// Cheap to clone; the underlying `reqwest::Client` is shared.
#[derive(Debug, Clone)]
pub struct BotApi {
    http: Client,
    base_url: Url,
    token: String,
}

impl BotApi {
    /// Create a client for the given bot token.
    #[allow(clippy::unwrap_used)] // DEFAULT_BASE_URL is known-valid
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: Url::parse(DEFAULT_BASE_URL).unwrap(),
            token: token.into(),
        }
    }

    /// Point the client at a different API host (e.g. a local test
    /// server or a self-hosted gateway).
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// The opaque bot credential this client calls with.
    pub fn token(&self) -> &str {
        &self.token
    }

    fn method_url(&self, method: &str) -> Result<Url, ClientError> {
        let path = format!("/bot{}/{}", self.token, method);
        Ok(self.base_url.join(&path)?)
    }

    /// Perform an arbitrary named remote call with JSON parameters.
    pub async fn call<T, P>(&self, method: &str, params: &P) -> Result<ApiResponse<T>, ClientError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let url = self.method_url(method)?;
        let resp = self.http.post(url).json(params).send().await?;
        parse_response(resp).await
    }

    /// Perform an arbitrary named remote call without parameters.
    pub async fn call_empty<T>(&self, method: &str) -> Result<ApiResponse<T>, ClientError>
    where
        T: DeserializeOwned,
    {
        let url = self.method_url(method)?;
        let resp = self.http.post(url).send().await?;
        parse_response(resp).await
    }

    /// Perform an arbitrary named remote call with a multipart body.
    pub async fn call_multipart<T>(
        &self,
        method: &str,
        form: Form,
    ) -> Result<ApiResponse<T>, ClientError>
    where
        T: DeserializeOwned,
    {
        let url = self.method_url(method)?;
        let resp = self.http.post(url).multipart(form).send().await?;
        parse_response(resp).await
    }

    /// `getMe` — basic information about the bot.
    pub async fn get_me(&self) -> Result<ApiResponse<User>, ClientError> {
        self.call_empty("getMe").await
    }

    /// `getUpdates` — fetch a batch of updates using offset-based
    /// (optionally long) polling.
    pub async fn get_updates(
        &self,
        params: &GetUpdates,
    ) -> Result<ApiResponse<Vec<Update>>, ClientError> {
        self.call("getUpdates", params).await
    }

    /// `setWebhook` — register an HTTPS URL to receive pushed updates.
    pub async fn set_webhook(&self, params: &SetWebhook) -> Result<ApiResponse<bool>, ClientError> {
        self.call("setWebhook", params).await
    }

    /// `deleteWebhook` — switch back to polling delivery.
    pub async fn delete_webhook(&self) -> Result<ApiResponse<bool>, ClientError> {
        self.call_empty("deleteWebhook").await
    }

    /// `getWebhookInfo` — current webhook status.
    pub async fn get_webhook_info(&self) -> Result<ApiResponse<WebhookInfo>, ClientError> {
        self.call_empty("getWebhookInfo").await
    }

    /// `sendMessage` — send a text message.
    pub async fn send_message(
        &self,
        params: &SendMessage,
    ) -> Result<ApiResponse<Message>, ClientError> {
        self.call("sendMessage", params).await
    }

    /// `forwardMessage` — forward a message between chats.
    pub async fn forward_message(
        &self,
        params: &ForwardMessage,
    ) -> Result<ApiResponse<Message>, ClientError> {
        self.call("forwardMessage", params).await
    }

    /// `sendPhoto` — send a photo as a multipart upload, by file id, or
    /// by URL.
    pub async fn send_photo(
        &self,
        params: &SendFile,
        photo: InputFile,
    ) -> Result<ApiResponse<Message>, ClientError> {
        let form = photo.attach(form_with_params(params)?, "photo");
        self.call_multipart("sendPhoto", form).await
    }

    /// `sendDocument` — send a general file.
    pub async fn send_document(
        &self,
        params: &SendFile,
        document: InputFile,
    ) -> Result<ApiResponse<Message>, ClientError> {
        let form = document.attach(form_with_params(params)?, "document");
        self.call_multipart("sendDocument", form).await
    }

    /// `sendChatAction` — show a typing/uploading indicator.
    pub async fn send_chat_action(
        &self,
        chat_id: impl Into<ChatId>,
        action: &str,
    ) -> Result<ApiResponse<bool>, ClientError> {
        #[derive(Serialize)]
        struct SendChatAction<'a> {
            chat_id: ChatId,
            action: &'a str,
        }
        self.call(
            "sendChatAction",
            &SendChatAction {
                chat_id: chat_id.into(),
                action,
            },
        )
        .await
    }

    /// `editMessageText` — edit the text of a sent message.
    pub async fn edit_message_text(
        &self,
        params: &EditMessageText,
    ) -> Result<ApiResponse<Message>, ClientError> {
        self.call("editMessageText", params).await
    }

    /// `deleteMessage` — delete a message.
    pub async fn delete_message(
        &self,
        chat_id: impl Into<ChatId>,
        message_id: i64,
    ) -> Result<ApiResponse<bool>, ClientError> {
        #[derive(Serialize)]
        struct DeleteMessage {
            chat_id: ChatId,
            message_id: i64,
        }
        self.call(
            "deleteMessage",
            &DeleteMessage {
                chat_id: chat_id.into(),
                message_id,
            },
        )
        .await
    }

    /// `answerCallbackQuery` — acknowledge an inline-keyboard press.
    pub async fn answer_callback_query(
        &self,
        params: &AnswerCallbackQuery,
    ) -> Result<ApiResponse<bool>, ClientError> {
        self.call("answerCallbackQuery", params).await
    }

    /// `answerInlineQuery` — answer an inline query with results.
    pub async fn answer_inline_query(
        &self,
        params: &AnswerInlineQuery,
    ) -> Result<ApiResponse<bool>, ClientError> {
        self.call("answerInlineQuery", params).await
    }

    /// `answerShippingQuery` — reply to a shipping query.
    pub async fn answer_shipping_query(
        &self,
        params: &AnswerShippingQuery,
    ) -> Result<ApiResponse<bool>, ClientError> {
        self.call("answerShippingQuery", params).await
    }

    /// `answerPreCheckoutQuery` — confirm or reject a checkout.
    pub async fn answer_pre_checkout_query(
        &self,
        params: &AnswerPreCheckoutQuery,
    ) -> Result<ApiResponse<bool>, ClientError> {
        self.call("answerPreCheckoutQuery", params).await
    }
}

async fn parse_response<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<ApiResponse<T>, ClientError> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    match serde_json::from_slice(&bytes) {
        Ok(envelope) => Ok(envelope),
        // The remote API wraps errors in the envelope even on non-2xx
        // statuses; a non-envelope body only appears when something in
        // front of the API (a proxy, a gateway) answered instead.
        Err(e) if status.is_success() => Err(ClientError::Json(e)),
        Err(_) => Err(ClientError::Api {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url_embeds_token() {
        let api = BotApi::new("123:abc");
        let url = api.method_url("getUpdates").unwrap();
        assert_eq!(url.as_str(), "https://api.telegram.org/bot123:abc/getUpdates");
    }

    #[test]
    fn test_base_url_override() {
        let api = BotApi::new("123:abc")
            .with_base_url(Url::parse("http://127.0.0.1:8081").unwrap());
        let url = api.method_url("getMe").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8081/bot123:abc/getMe");
    }
}
