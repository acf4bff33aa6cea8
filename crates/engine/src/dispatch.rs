use async_trait::async_trait;
use shared::{
    domain::{Coordinate, PlatformTarget},
    error::DispatchError,
};

/// Pushes a single location fix to a simulator or emulator.
///
/// The pacing loop awaits each call before issuing the next one, so
/// implementations never see concurrent calls from the same session.
#[async_trait]
pub trait PlatformDispatcher: Send + Sync {
    async fn set_location(
        &self,
        target: &PlatformTarget,
        coordinate: Coordinate,
    ) -> Result<(), DispatchError>;
}
