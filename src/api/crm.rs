use std::{future::Future, marker::PhantomData};

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{mpsc::Sender, oneshot};

use crate::{
    ArcStr,
    channel::{Fetch, FetchOptions},
    config::{Config, StrOpt},
    log::Log,
    net::{Net, TransportError},
};

mod core;
pub mod data;
pub mod message;

use message::Message;

/// The CRM backend actor.
///
/// Intermediates calls to the networking actor: builds `/api/...` URLs under
/// the configured base, attaches the bearer token and unwraps the
/// `{"data": [...]}` envelope. Cloning is cheap as it only copies the channel
/// sender. Tests drive it over [`Net::mock`].
///
/// # Examples
/// ```ignore
/// let api = CrmApi::spawn(net, config, log).await;
/// let notifications: Vec<NotificationItem> = api.get_data("notifications", FetchOptions::new()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CrmApi {
    sender: Sender<Message>,
}

impl CrmApi {
    /// Spawns the actor with the base URL and token currently configured.
    pub async fn spawn(net: Net, config: Config, log: Log) -> Self {
        let base = config.str(StrOpt::ApiBase).await;
        let token = config.token().await;
        let (api, _) = core::Core::new(net, log, base, token).spawn();
        api
    }

    /// Fetches the records of `endpoint` as raw JSON values.
    pub async fn get_records(
        &self,
        endpoint: impl Into<ArcStr>,
        options: FetchOptions,
    ) -> Result<Vec<Value>, TransportError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(Message::GetRecords {
                endpoint: endpoint.into(),
                options,
                tx,
            })
            .await
            .context("Sending message to CrmApi actor")
            .expect("CrmApi actor died");
        rx.await
            .context("Awaiting response from CrmApi actor")
            .expect("CrmApi actor died")
    }

    /// Fetches the records of `endpoint` decoded as `T`.
    ///
    /// A record that does not match `T` fails the whole request with a
    /// `decode_error`.
    pub async fn get_data<T: DeserializeOwned>(
        &self,
        endpoint: impl Into<ArcStr>,
        options: FetchOptions,
    ) -> Result<Vec<T>, TransportError> {
        self.get_records(endpoint, options)
            .await?
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
            .map_err(|e| TransportError::decode(format!("Unexpected record: {}", e)))
    }

    /// A fetch collaborator yielding records of type `T`, for use with
    /// [`PollingChannel`](crate::channel::PollingChannel).
    pub fn records<T>(&self) -> ApiSource<T> {
        ApiSource {
            api: self.clone(),
            _record: PhantomData,
        }
    }
}

/// [`CrmApi`] seen as a source of `T` records. See [`CrmApi::records`].
#[derive(Debug)]
pub struct ApiSource<T> {
    api: CrmApi,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for ApiSource<T> {
    fn clone(&self) -> Self {
        self.api.records()
    }
}

impl<T> Fetch for ApiSource<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Record = T;

    fn fetch(
        &self,
        endpoint: ArcStr,
        options: FetchOptions,
    ) -> impl Future<Output = Result<Vec<T>, TransportError>> + Send {
        self.api.get_data(endpoint, options)
    }
}
