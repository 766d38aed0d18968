//! Timestamp helpers shared across the workspace.
//!
//! Event and snapshot timestamps travel as unix milliseconds on the wire;
//! in memory everything is a [`SystemTime`].

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Truncate a timestamp down to the start of its hour.
pub fn truncate_to_hour(t: SystemTime) -> SystemTime {
    let since = t.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
    let hours = since.as_secs() / 3600;
    UNIX_EPOCH + Duration::from_secs(hours * 3600)
}

/// Serde adapter: `SystemTime` as unix milliseconds.
pub mod millis {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let since_epoch = time
            .duration_since(UNIX_EPOCH)
            .map_err(serde::ser::Error::custom)?;
        (since_epoch.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::from_millis(ms))
    }

    /// Same adapter for `Option<SystemTime>`.
    pub mod option {
        use std::time::{Duration, SystemTime, UNIX_EPOCH};

        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(time: &Option<SystemTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match time {
                Some(t) => super::serialize(t, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SystemTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let ms = Option::<u64>::deserialize(deserializer)?;
            Ok(ms.map(|ms| UNIX_EPOCH + Duration::from_millis(ms)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_drops_sub_hour_precision() {
        let t = UNIX_EPOCH + Duration::from_secs(3600 * 5 + 59 * 60 + 59);
        assert_eq!(truncate_to_hour(t), UNIX_EPOCH + Duration::from_secs(3600 * 5));
    }

    #[test]
    fn truncation_is_stable_on_the_hour() {
        let t = UNIX_EPOCH + Duration::from_secs(3600 * 7);
        assert_eq!(truncate_to_hour(t), t);
    }
}
