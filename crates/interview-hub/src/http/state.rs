use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::hiring::activity::ActivityLog;
use crate::store::Store;

/// Shared handles injected into every hiring handler.
#[derive(Clone)]
pub struct HubState {
    pub store: Arc<Store>,
    pub tokens: Arc<TokenIssuer>,
    pub activity: ActivityLog,
}

impl HubState {
    pub fn new(store: Arc<Store>, tokens: Arc<TokenIssuer>, activity: ActivityLog) -> Self {
        Self {
            store,
            tokens,
            activity,
        }
    }
}
