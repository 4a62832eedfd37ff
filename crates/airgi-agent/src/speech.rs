// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech input feeding the turn composer.
//!
//! A recognizer reports a live transcript that it may keep revising until it
//! finalizes. The composer keeps that live part separate from the text that
//! is already settled, so a revision replaces only what is still in flux and
//! never eats typed text.

use airgi_core::AirgiError;
use tracing::{debug, warn};

/// Shown when the host has no speech recognizer.
pub const SPEECH_UNAVAILABLE: &str = "Reconocimiento de voz no disponible.";

/// Shown when the recognizer refuses to start.
pub const SPEECH_START_FAILED: &str = "No se pudo iniciar el reconocimiento. Verifique permisos.";

/// A platform speech recognizer.
pub trait SpeechCapability: Send {
    fn start(&mut self) -> Result<(), AirgiError>;
    fn stop(&mut self);
}

/// Events delivered by a running recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// Latest revision of the utterance in progress.
    Partial(String),
    /// The utterance is final.
    Final(String),
    Failed(String),
}

/// Text being composed for the next turn.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    settled: String,
    live: String,
    error: Option<String>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full text as the user currently sees it.
    pub fn text(&self) -> String {
        match (self.settled.is_empty(), self.live.is_empty()) {
            (_, true) => self.settled.clone(),
            (true, false) => self.live.clone(),
            (false, false) if self.settled.ends_with(char::is_whitespace) => {
                format!("{}{}", self.settled, self.live)
            }
            (false, false) => format!("{} {}", self.settled, self.live),
        }
    }

    /// Replaces the composer with typed text, settling it.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.settled = text.into();
        self.live.clear();
    }

    /// Replaces the live, still-revisable part.
    pub fn apply_partial(&mut self, transcript: impl Into<String>) {
        self.live = transcript.into();
    }

    /// Freezes the live part into the settled text.
    pub fn commit(&mut self) {
        if !self.live.is_empty() {
            self.settled = self.text();
            self.live.clear();
        }
    }

    /// Records a soft error. Text already composed is left alone.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.error = Some(reason.into());
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn is_empty(&self) -> bool {
        self.text().trim().is_empty()
    }

    /// Takes the composed text for sending and resets the composer.
    pub fn take(&mut self) -> String {
        let text = self.text();
        *self = Self::default();
        text
    }
}

/// Drives an optional recognizer into a [`Composer`].
pub struct SpeechInput {
    capability: Option<Box<dyn SpeechCapability>>,
    listening: bool,
}

impl SpeechInput {
    pub fn new(capability: Option<Box<dyn SpeechCapability>>) -> Self {
        Self {
            capability,
            listening: false,
        }
    }

    /// No recognizer. Every start reports [`SPEECH_UNAVAILABLE`].
    pub fn unavailable() -> Self {
        Self::new(None)
    }

    pub fn is_available(&self) -> bool {
        self.capability.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Starts listening. Failure is reported on the composer, never raised.
    pub fn start(&mut self, composer: &mut Composer) -> bool {
        composer.clear_error();
        let Some(capability) = self.capability.as_mut() else {
            composer.fail(SPEECH_UNAVAILABLE);
            return false;
        };
        match capability.start() {
            Ok(()) => {
                debug!("speech recognition started");
                self.listening = true;
                true
            }
            Err(e) => {
                warn!(error = %e, "speech recognition failed to start");
                composer.fail(SPEECH_START_FAILED);
                false
            }
        }
    }

    /// Stops listening and keeps whatever was heard.
    pub fn stop(&mut self, composer: &mut Composer) {
        if let Some(capability) = self.capability.as_mut()
            && self.listening
        {
            capability.stop();
        }
        self.listening = false;
        composer.commit();
    }

    /// Applies one recognizer event to the composer.
    pub fn handle(&mut self, composer: &mut Composer, event: SpeechEvent) {
        match event {
            SpeechEvent::Partial(text) => composer.apply_partial(text),
            SpeechEvent::Final(text) => {
                composer.apply_partial(text);
                composer.commit();
            }
            SpeechEvent::Failed(reason) => {
                warn!(%reason, "speech recognition error");
                composer.fail(format!("Error de transcripción: {reason}"));
                self.listening = false;
            }
        }
    }
}
