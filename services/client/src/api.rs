//! Typed HR API endpoints

use async_trait::async_trait;
use common::Session;
use reqwest::StatusCode;
use tracing::{info, warn};

use crate::error::{ClientError, ClientResult};
use crate::http::SessionClient;
use crate::models::{
    AttendanceList, AttendanceRecord, AttendanceSubmission, Envelope, LoginData, LoginRequest,
    UserProfile,
};
use crate::validation;

pub const USER_PATH: &str = "user/view";
pub const ATTENDANCE_PATH: &str = "attendance/";

const LOGIN_FAILED: &str = "Login failed. Please try again.";
const INVALID_CREDENTIALS: &str = "Invalid email or password. Please try again.";
const USER_FETCH_FAILED: &str = "Failed to fetch user data.";
const SUBMIT_FAILED: &str = "Failed to submit attendance.";

/// Attendance operations the punch workflow depends on
#[async_trait]
pub trait AttendanceApi: Send + Sync {
    /// Profile of the signed-in user
    async fn user_profile(&self) -> ClientResult<UserProfile>;

    /// Attendance records, newest first; malformed records are skipped
    async fn attendance(&self) -> ClientResult<Vec<AttendanceRecord>>;

    /// Most recent attendance record, if any
    async fn latest_attendance(&self) -> ClientResult<Option<AttendanceRecord>>;

    /// Submit a punch; yields the server confirmation message
    async fn submit_attendance(&self, submission: &AttendanceSubmission) -> ClientResult<String>;

    /// Email remembered for the signed-in user
    async fn user_email(&self) -> ClientResult<Option<String>>;
}

/// HR API service
#[derive(Clone)]
pub struct HrApi {
    client: SessionClient,
}

impl HrApi {
    pub fn new(client: SessionClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &SessionClient {
        &self.client
    }

    /// Whether a session is persisted, letting the caller skip the login step
    pub async fn has_session(&self) -> ClientResult<bool> {
        Ok(self.client.session().access_token().await?.is_some())
    }

    /// Authenticate and persist the new session
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        validation::validate_credentials(email, password).map_err(ClientError::Validation)?;

        info!("Login attempt for user: {}", email);

        let login_path = self.client.login_path().to_string();
        let response = match self
            .client
            .post_json(&login_path, &LoginRequest { email, password })
            .await
        {
            Ok(response) => response,
            Err(ClientError::Http { status, body }) => {
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                    self.client.session().clear().await?;
                }
                let err = ClientError::Http { status, body };
                warn!("Login rejected for user {}: {}", email, err);
                return Err(ClientError::Auth(err.user_message(INVALID_CREDENTIALS)));
            }
            Err(e) => return Err(e),
        };

        let envelope: Envelope = response.into_json()?;
        if !envelope.status {
            let message = envelope.message.unwrap_or_else(|| LOGIN_FAILED.to_string());
            warn!("Login refused for user {}: {}", email, message);
            return Err(ClientError::Auth(message));
        }

        let data: LoginData = envelope.into_data()?;
        let session = Session::new(data.access_token, data.refresh_token, data.email);
        self.client.session().save(&session).await?;

        info!("User {} signed in", session.email);
        Ok(session)
    }

    /// Forget the persisted session
    pub async fn logout(&self) -> ClientResult<()> {
        self.client.session().clear().await?;
        Ok(())
    }
}

#[async_trait]
impl AttendanceApi for HrApi {
    async fn user_profile(&self) -> ClientResult<UserProfile> {
        let envelope: Envelope = self.client.get(USER_PATH).await?.into_json()?;
        if !envelope.status {
            return Err(ClientError::Rejected(USER_FETCH_FAILED.to_string()));
        }

        let profile: UserProfile = envelope.into_data()?;
        if !profile.email.is_empty() {
            self.client.session().set_email(&profile.email).await?;
        }
        Ok(profile)
    }

    async fn attendance(&self) -> ClientResult<Vec<AttendanceRecord>> {
        let list: AttendanceList = self.client.get(ATTENDANCE_PATH).await?.into_json()?;
        info!("Fetched {} attendance records", list.results.len());
        Ok(list.records())
    }

    async fn latest_attendance(&self) -> ClientResult<Option<AttendanceRecord>> {
        let list: AttendanceList = self.client.get(ATTENDANCE_PATH).await?.into_json()?;
        Ok(list.latest()?)
    }

    async fn submit_attendance(&self, submission: &AttendanceSubmission) -> ClientResult<String> {
        info!(
            "Submitting attendance for {} on {} (flag {})",
            submission.email, submission.date, submission.flag
        );

        let envelope: Envelope = self
            .client
            .post_json(ATTENDANCE_PATH, submission)
            .await?
            .into_json()?;

        let message = envelope.message.unwrap_or_default();
        if envelope.status {
            Ok(message)
        } else if message.is_empty() {
            Err(ClientError::Rejected(SUBMIT_FAILED.to_string()))
        } else {
            Err(ClientError::Rejected(message))
        }
    }

    async fn user_email(&self) -> ClientResult<Option<String>> {
        Ok(self.client.session().email().await?)
    }
}
