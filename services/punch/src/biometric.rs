//! Face unlock: key enrollment on first use, prompt-based verification after

use async_trait::async_trait;
use common::{LocalState, StoreError};
use thiserror::Error;
use tracing::{info, warn};

pub const PROMPT_MESSAGE: &str = "Authenticate with Face ID";

/// Kind of biometric sensor reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiometryKind {
    Face,
    Fingerprint,
    Other,
}

/// Sensor availability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sensor {
    pub available: bool,
    pub kind: Option<BiometryKind>,
}

impl Sensor {
    pub fn unavailable() -> Self {
        Self {
            available: false,
            kind: None,
        }
    }

    fn supports_face(&self) -> bool {
        self.available && self.kind == Some(BiometryKind::Face)
    }
}

#[derive(Error, Debug)]
pub enum BiometricError {
    #[error("Face authentication is not supported on this device.")]
    Unsupported,

    #[error("Failed to enroll face. Please try again.")]
    EnrollmentFailed,

    #[error("Face authentication failed. Please try again.")]
    Rejected,

    #[error("Biometric sensor error: {0}")]
    Sensor(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Platform biometric facility
#[async_trait]
pub trait Biometrics: Send + Sync {
    async fn sensor(&self) -> Result<Sensor, BiometricError>;

    /// Create the device key pair; yields the public key when created
    async fn create_keys(&self) -> Result<Option<String>, BiometricError>;

    /// Show the system prompt; `true` when the user was recognized
    async fn prompt(&self, message: &str) -> Result<bool, BiometricError>;
}

/// Successful face unlock outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceUnlockOutcome {
    /// Keys were created and the device is now enrolled
    Enrolled,
    /// An enrolled user was recognized
    Verified,
}

pub struct FaceUnlock<B> {
    biometrics: B,
    local: LocalState,
}

impl<B: Biometrics> FaceUnlock<B> {
    pub fn new(biometrics: B, local: LocalState) -> Self {
        Self { biometrics, local }
    }

    pub async fn authenticate(&self) -> Result<FaceUnlockOutcome, BiometricError> {
        if !self.biometrics.sensor().await?.supports_face() {
            warn!("No face sensor available");
            return Err(BiometricError::Unsupported);
        }

        if !self.local.is_face_enrolled().await? {
            return match self.biometrics.create_keys().await? {
                Some(_) => {
                    self.local.set_face_enrolled().await?;
                    info!("Face enrollment completed");
                    Ok(FaceUnlockOutcome::Enrolled)
                }
                None => Err(BiometricError::EnrollmentFailed),
            };
        }

        if self.biometrics.prompt(PROMPT_MESSAGE).await? {
            info!("Face authentication successful");
            Ok(FaceUnlockOutcome::Verified)
        } else {
            Err(BiometricError::Rejected)
        }
    }
}
