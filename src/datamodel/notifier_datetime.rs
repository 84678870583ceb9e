pub type NotifierDateTime = hifitime::Epoch;

/// Current time, falling back to the Unix epoch if the system clock is unusable.
pub fn now() -> NotifierDateTime {
    NotifierDateTime::now().unwrap_or(hifitime::UNIX_REF_EPOCH)
}
