use crate::location::LocationSender;
use crate::notifier::ProximityNotifier;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct HttpServerState {
    pub name: Arc<String>,
    pub notifier: Arc<ProximityNotifier>,
    pub locations: LocationSender,
}
