//! Shared application state handed to every route.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::auth::{create_email_sender, EmailSender, JwtManager};
use crate::config::{AppConfig, GeocoderSettings};
use crate::dispatch::{Action, Coordinator, DispatchMode, Dispatched, RequestContext};
use crate::geo::{GeoPoint, Geocoder, MapQuestGeocoder, StaticGeocoder};
use crate::observability::DispatchMetrics;
use crate::resources::auth::TokenIssuer;
use crate::resources::bootcamps::UploadSettings;
use crate::store::{ConnectionProvider, StoreConfig, StoreConnector, StoreName, UriConnector};

/// Collaborators and store access for request handling
pub struct AppState {
    pub coordinator: Coordinator,
    pub issuer: TokenIssuer,
    pub email: Arc<dyn EmailSender>,
    pub geocoder: Arc<dyn Geocoder>,
    pub uploads: UploadSettings,
    pub seed_dir: PathBuf,
    /// Host used in emailed links when a request carries no `Host` header
    pub public_host: String,
    pub metrics: DispatchMetrics,
}

impl AppState {
    /// Build the state described by `config`, connecting through `connector`
    pub fn from_config(config: &AppConfig, connector: Arc<dyn StoreConnector>) -> Self {
        let mut provider = ConnectionProvider::new(connector, config.retry.clone())
            .with_store(StoreName::Cloud, StoreConfig::new(&config.cloud_uri));
        if let Some(offline) = &config.offline_uri {
            provider = provider.with_store(StoreName::Offline, StoreConfig::new(offline));
        }
        info!(
            cloud = %config.cloud_uri,
            offline = config.offline_uri.as_deref().unwrap_or("<none>"),
            "stores configured"
        );

        let geocoder: Arc<dyn Geocoder> = match &config.geocoder {
            GeocoderSettings::MapQuest { api_key } => Arc::new(MapQuestGeocoder::new(api_key.clone())),
            GeocoderSettings::Static { longitude, latitude } => {
                Arc::new(StaticGeocoder::centered(GeoPoint::new(*longitude, *latitude)))
            }
        };

        Self {
            coordinator: Coordinator::new(Arc::new(provider)),
            issuer: TokenIssuer::new(
                Arc::new(JwtManager::new(config.jwt.clone())),
                config.cookie_days,
                config.env.is_production(),
            ),
            email: create_email_sender(config.email.clone()),
            geocoder,
            uploads: UploadSettings {
                dir: config.server.upload_dir.clone(),
                max_bytes: config.server.max_upload_bytes,
            },
            seed_dir: config.seed_dir.clone(),
            public_host: config.server.socket_addr(),
            metrics: DispatchMetrics::new(),
        }
    }

    /// State over URI-addressed stores
    pub fn new(config: &AppConfig) -> Self {
        Self::from_config(config, Arc::new(UriConnector::new()))
    }

    pub fn with_email_sender(mut self, sender: Arc<dyn EmailSender>) -> Self {
        self.email = sender;
        self
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = geocoder;
        self
    }

    pub fn jwt(&self) -> &JwtManager {
        self.issuer.jwt()
    }

    /// Dispatch `action` and count the result
    pub async fn dispatch(&self, ctx: &RequestContext, action: &dyn Action, mode: DispatchMode) -> Dispatched {
        let dispatched = self.coordinator.dispatch(ctx, action, mode).await;
        self.metrics.record(&dispatched);
        dispatched
    }

    /// Dispatch `action` against the primary store only
    pub async fn primary(&self, ctx: &RequestContext, action: &dyn Action) -> Dispatched {
        self.dispatch(ctx, action, DispatchMode::PrimaryOnly).await
    }
}
