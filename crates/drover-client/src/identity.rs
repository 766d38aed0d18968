use std::sync::OnceLock;

static WORKER_ID: OnceLock<String> = OnceLock::new();

/// Stable identity this worker presents to the assignment service.
///
/// Hostname where available (which is the pod name on Kubernetes), a
/// generated UUID otherwise. Cached for the process lifetime.
pub fn worker_id() -> &'static str {
    WORKER_ID.get_or_init(|| {
        if let Ok(name) = hostname::get()
            && let Some(name) = name.to_str()
            && !name.is_empty()
        {
            return name.to_string();
        }
        uuid::Uuid::new_v4().to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_id_is_stable() {
        let first = worker_id();
        assert!(!first.is_empty());
        assert_eq!(first, worker_id());
    }
}
