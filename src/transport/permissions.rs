use async_trait::async_trait;

/// Microphone permission probe, checked before anything else when starting a
/// call. Embedders that sit next to a real capture device implement this
/// against the platform prompt.
#[async_trait]
pub trait PermissionProbe: Send + Sync {
    async fn microphone_granted(&self) -> bool;
}

/// Probe for environments where capture permission is managed out of band
/// (e.g. a server-side runtime fed by an already-authorized stream).
pub struct AssumeGranted;

#[async_trait]
impl PermissionProbe for AssumeGranted {
    async fn microphone_granted(&self) -> bool {
        true
    }
}
