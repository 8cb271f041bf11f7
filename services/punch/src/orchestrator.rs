//! Attendance screen workflow
//!
//! One orchestrator backs one attendance screen. Loading checks device
//! permissions, fetches the user and reconciles the punched-in flag with the
//! latest attendance record. A punch runs capture → locate → geocode →
//! submit in sequence and stops at the first failing step.

use chrono::{NaiveDateTime, Timelike};
use client::models::{
    AttendanceRecord, AttendanceSubmission, Coordinates, PunchDirection, UserProfile,
};
use client::{AttendanceApi, ReverseGeocoder};
use common::LocalState;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::capabilities::{Camera, CaptureError, Locator, PermissionStatus, Photo, PositionOptions};
use crate::error::{Capability, PunchError, PunchResult};
use crate::timer::{Clock, ElapsedTimer};

/// Address submitted when reverse geocoding fails
pub const UNKNOWN_ADDRESS: &str = "Unknown Address";

pub const USER_FALLBACK: &str = "Failed to fetch user data.";
pub const STATUS_FALLBACK: &str = "Failed to fetch attendance status.";
pub const SUBMIT_FALLBACK: &str = "Failed to submit attendance.";

/// Where the screen currently is in its workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunchState {
    Idle,
    PermissionsChecked,
    UserLoaded,
    AttendanceStatusLoaded,
    Capturing,
    LocationResolving,
    Submitting,
}

/// Permission outcomes collected when the screen loads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    pub camera: PermissionStatus,
    pub location: PermissionStatus,
}

/// Evidence gathered for the punch in flight
#[derive(Debug, Clone)]
pub struct CapturedEvidence {
    pub photo: Photo,
    pub coordinates: Coordinates,
    pub address: String,
}

/// Outcome of an accepted punch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PunchReceipt {
    pub direction: PunchDirection,
    /// Confirmation message returned by the server
    pub message: String,
    pub address: String,
    pub at: NaiveDateTime,
}

/// Device collaborators of the workflow
#[derive(Clone)]
pub struct Devices {
    pub camera: Arc<dyn Camera>,
    pub locator: Arc<dyn Locator>,
    pub geocoder: Arc<dyn ReverseGeocoder>,
}

pub struct PunchOrchestrator {
    api: Arc<dyn AttendanceApi>,
    devices: Devices,
    local: LocalState,
    clock: Arc<dyn Clock>,
    timer: ElapsedTimer,
    position_options: PositionOptions,
    state: PunchState,
    permissions: Option<Permissions>,
    user: Option<UserProfile>,
    punched_in: bool,
    evidence: Option<CapturedEvidence>,
}

impl PunchOrchestrator {
    pub fn new(
        api: Arc<dyn AttendanceApi>,
        devices: Devices,
        local: LocalState,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            api,
            devices,
            local,
            timer: ElapsedTimer::new(Arc::clone(&clock)),
            clock,
            position_options: PositionOptions::default(),
            state: PunchState::Idle,
            permissions: None,
            user: None,
            punched_in: false,
            evidence: None,
        }
    }

    /// Override the position request options
    pub fn with_position_options(mut self, options: PositionOptions) -> Self {
        self.position_options = options;
        self
    }

    /// Run every load phase; the user and the attendance status are fetched
    /// independently and the first failure is returned
    pub async fn load(&mut self) -> PunchResult<()> {
        self.check_permissions().await;
        let user = self.load_user().await.map(|_| ());
        let status = self.load_attendance_status().await;
        user.and(status)
    }

    /// Request camera then location permission
    pub async fn check_permissions(&mut self) -> Permissions {
        let camera = self.devices.camera.request_permission().await;
        let location = self.devices.locator.request_permission().await;
        let permissions = Permissions { camera, location };

        if !camera.is_granted() {
            warn!("Camera permission not granted");
        }
        if !location.is_granted() {
            warn!("Location permission not granted");
        }

        self.permissions = Some(permissions);
        self.state = PunchState::PermissionsChecked;
        permissions
    }

    pub async fn load_user(&mut self) -> PunchResult<&UserProfile> {
        let profile = self.api.user_profile().await.inspect_err(|e| {
            warn!("Fetch user data error: {}", e);
        })?;

        info!("Loaded profile of {}", profile.email);
        self.state = PunchState::UserLoaded;
        Ok(self.user.insert(profile))
    }

    /// Derive the punched-in flag from the most recent attendance record
    pub async fn load_attendance_status(&mut self) -> PunchResult<()> {
        let latest = self.api.latest_attendance().await.inspect_err(|e| {
            warn!("Fetch attendance status error: {}", e);
        })?;

        self.reconcile(latest.as_ref()).await?;
        self.state = PunchState::AttendanceStatusLoaded;
        Ok(())
    }

    async fn reconcile(&mut self, latest: Option<&AttendanceRecord>) -> PunchResult<()> {
        match latest
            .filter(|record| record.is_open())
            .and_then(AttendanceRecord::punched_in_at)
        {
            Some(at) => {
                debug!("Open attendance record since {}", at);
                self.open_session(at).await
            }
            None => self.close_session().await,
        }
    }

    async fn open_session(&mut self, at: NaiveDateTime) -> PunchResult<()> {
        self.punched_in = true;
        self.timer.start(at);
        self.local.set_punch_in_time(at).await?;
        Ok(())
    }

    async fn close_session(&mut self) -> PunchResult<()> {
        self.punched_in = false;
        self.timer.stop();
        self.local.clear_punch_in_time().await?;
        Ok(())
    }

    /// Direction of the next punch given the current flag
    pub fn next_direction(&self) -> PunchDirection {
        if self.punched_in {
            PunchDirection::Out
        } else {
            PunchDirection::In
        }
    }

    /// Capture, locate, geocode and submit one punch
    ///
    /// On failure the punched-in flag and the counter are left untouched.
    /// Once the server accepts the punch it succeeds even if the local copy
    /// of the punch-in time cannot be written. Gathered evidence is
    /// discarded either way.
    pub async fn punch(&mut self, direction: PunchDirection) -> PunchResult<PunchReceipt> {
        let result = self.run_punch(direction).await;

        self.evidence = None;
        self.state = PunchState::Idle;

        match &result {
            Ok(receipt) => info!("Accepted {} at {}", direction, receipt.at),
            Err(e) => error!("Failed to {}: {}", direction, e),
        }
        result
    }

    async fn run_punch(&mut self, direction: PunchDirection) -> PunchResult<PunchReceipt> {
        self.state = PunchState::Capturing;
        let photo = self.capture().await?;

        self.state = PunchState::LocationResolving;
        let coordinates = self.locate().await?;
        let address = self.resolve_address(coordinates).await;
        let evidence = self.evidence.insert(CapturedEvidence {
            photo,
            coordinates,
            address,
        });
        let image = evidence.photo.to_data_uri();
        let address = evidence.address.clone();

        let email = self.submitter_email().await?;

        self.state = PunchState::Submitting;
        let at = self.clock.now();
        let submission = AttendanceSubmission::new(direction, email, at, address.clone(), image);
        let message = self.api.submit_attendance(&submission).await?;

        // The server has the punch; a failed local write is repaired by the
        // next load
        let persisted = match direction {
            PunchDirection::In => self.open_session(at).await,
            PunchDirection::Out => self.close_session().await,
        };
        if let Err(e) = persisted {
            warn!("Accepted {} not saved locally: {}", direction, e);
        }

        Ok(PunchReceipt {
            direction,
            message,
            address,
            at,
        })
    }

    async fn permissions(&mut self) -> Permissions {
        match self.permissions {
            Some(permissions) => permissions,
            None => self.check_permissions().await,
        }
    }

    async fn capture(&mut self) -> PunchResult<Photo> {
        if !self.permissions().await.camera.is_granted() {
            return Err(PunchError::PermissionDenied(Capability::Camera));
        }

        let camera = &self.devices.camera;
        if !camera.is_ready() {
            return Err(CaptureError::NotReady.into());
        }

        let photo = camera.take_photo().await?;
        debug!("Captured {} bytes of {}", photo.bytes.len(), photo.mime);
        Ok(photo)
    }

    async fn locate(&mut self) -> PunchResult<Coordinates> {
        if !self.permissions().await.location.is_granted() {
            return Err(PunchError::PermissionDenied(Capability::Location));
        }

        let coordinates = self
            .devices
            .locator
            .current_position(&self.position_options)
            .await?;
        debug!("Resolved position {}", coordinates);
        Ok(coordinates)
    }

    async fn resolve_address(&self, coordinates: Coordinates) -> String {
        match self.devices.geocoder.reverse(coordinates).await {
            Ok(address) => address,
            Err(e) => {
                warn!("Reverse geocoding failed for {}: {}", coordinates, e);
                UNKNOWN_ADDRESS.to_string()
            }
        }
    }

    async fn submitter_email(&self) -> PunchResult<String> {
        if let Some(email) = self.api.user_email().await? {
            return Ok(email);
        }

        self.user
            .as_ref()
            .map(|user| user.email.clone())
            .filter(|email| !email.is_empty())
            .ok_or(PunchError::NotSignedIn)
    }

    pub fn state(&self) -> PunchState {
        self.state
    }

    pub fn is_punched_in(&self) -> bool {
        self.punched_in
    }

    pub fn punched_in_since(&self) -> Option<NaiveDateTime> {
        self.timer.since()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn evidence(&self) -> Option<&CapturedEvidence> {
        self.evidence.as_ref()
    }

    pub fn timer(&self) -> &ElapsedTimer {
        &self.timer
    }

    /// Greeting for the current local hour
    pub fn greeting(&self) -> &'static str {
        greeting(self.clock.now().hour())
    }
}

/// Greeting shown at the top of the screen
pub fn greeting(hour: u32) -> &'static str {
    match hour {
        0..12 => "Good Morning",
        12..17 => "Good Afternoon",
        _ => "Good Evening",
    }
}
