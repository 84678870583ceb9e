use super::{LocationSource, MovementFilter};
use crate::datamodel::LocationSample;
use async_trait::async_trait;
use tokio::sync::mpsc;

pub type LocationSender = mpsc::Sender<LocationSample>;

/// Location feed fed by raw samples pushed through a bounded channel.
#[derive(Debug)]
pub struct ChannelLocationSource {
    receiver: mpsc::Receiver<LocationSample>,
    filter: MovementFilter,
}

pub fn location_channel(capacity: usize) -> (LocationSender, ChannelLocationSource) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (
        sender,
        ChannelLocationSource {
            receiver,
            filter: MovementFilter::default(),
        },
    )
}

#[async_trait]
impl LocationSource for ChannelLocationSource {
    async fn next_sample(&mut self) -> Option<LocationSample> {
        while let Some(raw) = self.receiver.recv().await {
            if let Some(sample) = self.filter.accept(raw) {
                return Some(sample);
            }
        }
        None
    }

    fn set_movement_threshold(&mut self, meters: f64) {
        self.filter.set_threshold(meters);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hifitime::UNIX_REF_EPOCH;

    fn sample(latitude: f64) -> LocationSample {
        LocationSample::new(latitude, -74.08, None, UNIX_REF_EPOCH).unwrap()
    }

    #[tokio::test]
    async fn test_coalesces_and_closes() {
        let (sender, mut source) = location_channel(8);
        sender.send(sample(4.6)).await.unwrap();
        // A few meters away, dropped
        sender.send(sample(4.60001)).await.unwrap();
        // ~1.1 km away, accepted
        sender.send(sample(4.61)).await.unwrap();
        drop(sender);

        assert_eq!(source.next_sample().await.unwrap().latitude(), 4.6);
        assert_eq!(source.next_sample().await.unwrap().latitude(), 4.61);
        assert!(source.next_sample().await.is_none());
    }
}
