//! Staff registration: validate, check duplicates, capture a face, store.

use crate::config::Config;
use crate::engine::{Engine, EngineError};
use rollcall_hw::{Camera, CameraError, FrameError};
use rollcall_store::{DuplicateField, NewEmployee, Store, StoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegisterError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{0}")]
    Duplicate(DuplicateField),
    #[error("could not access the webcam: {0}")]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("could not encode profile image: {0}")]
    Image(#[from] FrameError),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RegisterError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(field) => RegisterError::Duplicate(field),
            other => RegisterError::Store(other),
        }
    }
}

/// Operator-entered registration details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub designation: String,
}

impl RegistrationForm {
    /// Trim every field and reject blanks.
    pub fn validate(self) -> Result<Self, RegisterError> {
        let field = |value: String, label: &'static str| {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                Err(RegisterError::MissingField(label))
            } else {
                Ok(trimmed)
            }
        };
        Ok(Self {
            name: field(self.name, "name")?,
            email: field(self.email, "email")?,
            phone: field(self.phone, "phone")?,
            designation: field(self.designation, "designation")?,
        })
    }

    /// Fail if name, email or phone is already registered.
    pub fn check_available(&self, store: &Store) -> Result<(), RegisterError> {
        match store.find_duplicate(&self.name, &self.email, &self.phone)? {
            Some(field) => Err(RegisterError::Duplicate(field)),
            None => Ok(()),
        }
    }
}

/// Run the full registration flow, returning the new employee id.
///
/// Nothing is written unless a face was captured and encoded.
pub fn register(store: &Store, config: &Config, form: RegistrationForm) -> Result<i64, RegisterError> {
    let form = form.validate()?;
    form.check_available(store)?;

    let mut engine = Engine::load(config)?;
    let camera = Camera::open(&config.camera_device, config.frame_width, config.frame_height)?;
    camera.warmup(config.warmup_frames)?;

    tracing::info!(name = %form.name, frames = config.frames_per_enroll, "capturing face");
    let (frames, dark_skipped) = camera.capture_frames(config.frames_per_enroll)?;
    drop(camera);
    tracing::debug!(captured = frames.len(), dark_skipped, "register: captured frames");

    let enrollment = engine.enroll(frames)?;
    let image = enrollment.frame.to_jpeg()?;

    let id = store.insert_employee(&NewEmployee {
        name: form.name,
        email: form.email,
        phone: form.phone,
        designation: form.designation,
        encoding: enrollment.encoding,
        image,
    })?;
    Ok(id)
}
